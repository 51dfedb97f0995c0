//! Datagroup: the normalized analytical model of a classified dataset.
//!
//! Building a [`Datagroup`] filters excluded members, splits level columns
//! into one time axis and any number of category axes, computes sorted
//! member sets, per-member measure sums and per-measure ranges. Chart
//! engines only ever read from it.

mod members;

pub use members::MemberSums;

use crate::classifier::strip_id_suffix;
use crate::config::DEFAULT_DATACAP;
use crate::error::{Result, ResultExt};
use crate::schema::{DimensionType, Level, Measure, Property};
use crate::types::{Column, DataPoint, Dataset, LevelColumn, PropertyColumn, Value, ValueType};
use crate::utils::Collator;
use indexmap::IndexMap;
use members::{detect_type, measure_range, sum_by_member, unique_members};
use serde::Serialize;
use tracing::{debug, warn};

/// A measure column with its observed range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasureRange {
    pub column: String,
    pub measure: Measure,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_measure: Option<Measure>,
    pub range: (f64, f64),
}

impl MeasureRange {
    pub fn min(&self) -> f64 {
        self.range.0
    }

    pub fn max(&self) -> f64 {
        self.range.1
    }

    /// Whether every observed value is zero or positive.
    pub fn is_non_negative(&self) -> bool {
        self.range.0 >= 0.0
    }
}

/// The schema entity a caption column renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CaptionEntity {
    Level(Level),
    Property(Property),
}

/// A human-readable rendering of an axis's identifier column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelCaption {
    pub entity: CaptionEntity,
    pub value_type: ValueType,
    pub members: Vec<Value>,
}

/// A level usable as a chart axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisSeries {
    /// Column holding the member identifiers.
    pub name: String,
    pub value_type: ValueType,
    /// Unique members, collation-sorted.
    pub members: Vec<Value>,
    pub sum_by_member: MemberSums,
    pub level: Level,
    /// Property columns attached to this level.
    pub properties: Vec<String>,
    pub captions: IndexMap<String, LevelCaption>,
}

impl AxisSeries {
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

/// A hierarchy made available as a chart axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAxis {
    pub dimension: String,
    pub dimension_type: DimensionType,
    pub hierarchy: String,
    /// Ordered by ascending depth.
    pub levels: Vec<AxisSeries>,
}

impl CategoryAxis {
    pub fn deepest(&self) -> Option<&AxisSeries> {
        self.levels.last()
    }

    /// Same dimension and hierarchy.
    pub fn same_hierarchy(&self, other: &CategoryAxis) -> bool {
        self.dimension == other.dimension && self.hierarchy == other.hierarchy
    }
}

/// One level of one axis; the unit chart engines enumerate over.
#[derive(Debug, Clone, Copy)]
pub struct AxisLevel<'a> {
    pub axis: &'a CategoryAxis,
    pub series: &'a AxisSeries,
}

impl AxisLevel<'_> {
    pub fn member_count(&self) -> usize {
        self.series.member_count()
    }
}

/// Normalized analytical model of one dataset.
#[derive(Debug, Clone, Serialize)]
pub struct Datagroup {
    /// Rows left after member exclusion.
    pub dataset: Vec<DataPoint>,
    pub locale: String,
    pub columns: IndexMap<String, Column>,
    pub measure_columns: Vec<MeasureRange>,
    pub time_hierarchy: Option<CategoryAxis>,
    pub non_time_hierarchies: IndexMap<String, CategoryAxis>,
}

static_assertions::assert_impl_all!(Datagroup: Send, Sync);

/// Build a datagroup with the default row cap.
pub fn build_datagroup(dataset: &Dataset) -> Result<Datagroup> {
    Datagroup::build(dataset, DEFAULT_DATACAP)
}

impl Datagroup {
    /// Build the datagroup of `dataset`, analysing at most `datacap` rows for
    /// ranges and member sets.
    ///
    /// # Errors
    ///
    /// Fails when a column mixes value types or a measure holds non-numbers.
    pub fn build(dataset: &Dataset, datacap: usize) -> Result<Datagroup> {
        let collator = Collator::new(&dataset.locale);
        let rows = filter_excluded(dataset);

        let measure_names: Vec<String> = dataset
            .columns
            .values()
            .filter_map(|column| match column {
                Column::Measure(m) => Some(m.name.clone()),
                _ => None,
            })
            .collect();

        let mut measure_columns = Vec::with_capacity(measure_names.len());
        for column in dataset.columns.values() {
            if let Column::Measure(m) = column {
                let range = measure_range(&m.name, &rows, datacap)?;
                measure_columns.push(MeasureRange {
                    column: m.name.clone(),
                    measure: m.measure.clone(),
                    parent_measure: m.parent_measure.clone(),
                    range,
                });
            }
        }

        let builder = AxisBuilder {
            dataset,
            rows: &rows,
            datacap,
            collator: &collator,
            measure_names: &measure_names,
        };

        let mut time_hierarchy: Option<CategoryAxis> = None;
        let mut non_time_hierarchies: IndexMap<String, CategoryAxis> = IndexMap::new();

        for group in group_axis_columns(dataset) {
            let Some(axis) = builder
                .build_axis(&group)
                .context(format!("While building axis '{}'", group[0].hierarchy))?
            else {
                continue;
            };

            if axis.dimension_type == DimensionType::Time {
                if let Some(existing) = &time_hierarchy {
                    warn!(
                        kept = %existing.hierarchy,
                        ignored = %axis.hierarchy,
                        "More than one time hierarchy in dataset; ignoring extra"
                    );
                } else {
                    time_hierarchy = Some(axis);
                }
                continue;
            }

            let key = if non_time_hierarchies.contains_key(&axis.hierarchy) {
                format!("{}.{}", axis.dimension, axis.hierarchy)
            } else {
                axis.hierarchy.clone()
            };
            non_time_hierarchies.insert(key, axis);
        }

        debug!(
            rows = rows.len(),
            measures = measure_columns.len(),
            axes = non_time_hierarchies.len(),
            has_time = time_hierarchy.is_some(),
            "Built datagroup"
        );

        Ok(Datagroup {
            dataset: rows,
            locale: dataset.locale.clone(),
            columns: dataset.columns.clone(),
            measure_columns,
            time_hierarchy,
            non_time_hierarchies,
        })
    }

    pub fn row_count(&self) -> usize {
        self.dataset.len()
    }

    /// Measures that seed charts; attached sub-measures are excluded.
    pub fn mainline_measures(&self) -> impl Iterator<Item = &MeasureRange> {
        self.measure_columns
            .iter()
            .filter(|m| m.parent_measure.is_none())
    }

    /// Every `(axis, level)` pair of the category axes, levels by depth.
    pub fn category_levels(&self) -> Vec<AxisLevel<'_>> {
        self.non_time_hierarchies
            .values()
            .flat_map(|axis| axis.levels.iter().map(move |series| AxisLevel { axis, series }))
            .collect()
    }

    /// Every `(axis, level)` pair of the time axis.
    pub fn time_levels(&self) -> Vec<AxisLevel<'_>> {
        self.time_hierarchy
            .iter()
            .flat_map(|axis| axis.levels.iter().map(move |series| AxisLevel { axis, series }))
            .collect()
    }

    /// The deepest level of the time axis, used as timeline.
    pub fn timeline_level(&self) -> Option<AxisLevel<'_>> {
        let axis = self.time_hierarchy.as_ref()?;
        let series = axis.deepest()?;
        Some(AxisLevel { axis, series })
    }

    /// Number of category axes (excluding time).
    pub fn category_axis_count(&self) -> usize {
        self.non_time_hierarchies.len()
    }

    /// A copy restricted to the rows where `column` equals `member`.
    ///
    /// Axes and ranges are kept as computed on the full dataset.
    pub fn scoped(&self, column: &str, member: &Value) -> Datagroup {
        let key = member.key();
        let dataset = self
            .dataset
            .iter()
            .filter(|row| row.get(column).is_some_and(|value| value.key() == key))
            .cloned()
            .collect();
        Datagroup {
            dataset,
            locale: self.locale.clone(),
            columns: self.columns.clone(),
            measure_columns: self.measure_columns.clone(),
            time_hierarchy: self.time_hierarchy.clone(),
            non_time_hierarchies: self.non_time_hierarchies.clone(),
        }
    }
}

/// Drop rows whose ID member is listed in the level's exclusion annotation.
fn filter_excluded(dataset: &Dataset) -> Vec<DataPoint> {
    let exclusions: Vec<(&str, Vec<String>)> = dataset
        .columns
        .values()
        .filter_map(|column| match column {
            Column::Level(level) if level.is_id => {
                let excluded = level.level.excluded_members();
                (!excluded.is_empty()).then_some((level.name.as_str(), excluded))
            }
            _ => None,
        })
        .collect();

    if exclusions.is_empty() {
        return dataset.data.clone();
    }

    dataset
        .data
        .iter()
        .filter(|row| {
            exclusions.iter().all(|(column, excluded)| {
                row.get(*column)
                    .is_none_or(|value| !excluded.contains(&value.key()))
            })
        })
        .cloned()
        .collect()
}

/// ID level columns grouped by (dimension, hierarchy), in column order.
fn group_axis_columns(dataset: &Dataset) -> Vec<Vec<&LevelColumn>> {
    let mut groups: IndexMap<(&str, &str), Vec<&LevelColumn>> = IndexMap::new();
    for column in dataset.columns.values() {
        if let Column::Level(level) = column
            && level.is_id
        {
            groups
                .entry((level.dimension.as_str(), level.hierarchy.as_str()))
                .or_default()
                .push(level);
        }
    }
    groups
        .into_values()
        .map(|mut group| {
            group.sort_by_key(|level| level.level.depth);
            group
        })
        .collect()
}

struct AxisBuilder<'a> {
    dataset: &'a Dataset,
    rows: &'a [DataPoint],
    datacap: usize,
    collator: &'a Collator,
    measure_names: &'a [String],
}

impl AxisBuilder<'_> {
    /// `Ok(None)` when none of the group's columns carries a value.
    fn build_axis(&self, group: &[&LevelColumn]) -> Result<Option<CategoryAxis>> {
        let Some(first) = group.first() else {
            return Ok(None);
        };

        let mut levels = Vec::with_capacity(group.len());
        for column in group {
            if let Some(series) = self.build_series(column)? {
                levels.push(series);
            }
        }

        if levels.is_empty() {
            debug!(hierarchy = %first.hierarchy, "Skipping axis without values");
            return Ok(None);
        }

        Ok(Some(CategoryAxis {
            dimension: first.dimension.clone(),
            dimension_type: first.dimension_type,
            hierarchy: first.hierarchy.clone(),
            levels,
        }))
    }

    fn build_series(&self, column: &LevelColumn) -> Result<Option<AxisSeries>> {
        let Some(value_type) = detect_type(&column.name, self.rows)? else {
            return Ok(None);
        };

        let properties: Vec<&PropertyColumn> = self
            .dataset
            .columns
            .values()
            .filter_map(|c| match c {
                Column::Property(p) if p.level.name == column.level.name => Some(p),
                _ => None,
            })
            .collect();

        let mut captions = IndexMap::new();
        let label_name = strip_id_suffix(&column.name).unwrap_or(&column.name);
        if label_name != column.name
            && let Some(Column::Level(label)) = self.dataset.columns.get(label_name)
            && label.has_id
            && let Some(caption) =
                self.caption(&label.name, CaptionEntity::Level(label.level.clone()))?
        {
            captions.insert(label.name.clone(), caption);
        }
        for property in properties.iter().filter(|p| p.property.is_caption()) {
            if let Some(caption) =
                self.caption(&property.name, CaptionEntity::Property(property.property.clone()))?
            {
                captions.insert(property.name.clone(), caption);
            }
        }

        Ok(Some(AxisSeries {
            name: column.name.clone(),
            value_type,
            members: unique_members(&column.name, self.rows, self.datacap, self.collator),
            sum_by_member: sum_by_member(&column.name, self.rows, self.measure_names),
            level: column.level.clone(),
            properties: properties.iter().map(|p| p.name.clone()).collect(),
            captions,
        }))
    }

    fn caption(&self, column: &str, entity: CaptionEntity) -> Result<Option<LevelCaption>> {
        let Some(value_type) = detect_type(column, self.rows)? else {
            return Ok(None);
        };
        Ok(Some(LevelCaption {
            entity,
            value_type,
            members: unique_members(column, self.rows, self.datacap, self.collator),
        }))
    }
}
