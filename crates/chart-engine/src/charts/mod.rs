//! Chart eligibility engines.
//!
//! One [`ChartBuilder`] per chart type. Each engine receives the shared
//! datagroup and limits, walks the candidate axis combinations for every
//! mainline measure, and emits a chart for each combination that passes its
//! gates. Rejected candidates are reported through [`Diagnostics`].

mod barchart;
mod choropleth;
mod donut;
mod lineplot;
mod stacked_area;
mod treemap;

pub use barchart::BarchartBuilder;
pub use choropleth::{ChoroplethBuilder, TopojsonProvider, TopojsonRegistry};
pub use donut::DonutBuilder;
pub use lineplot::LineplotBuilder;
pub use stacked_area::StackedAreaBuilder;
pub use treemap::TreemapBuilder;

use crate::config::ChartLimits;
use crate::datagroup::{AxisLevel, Datagroup, MeasureRange};
use crate::error::Result;
use crate::generator::observer::{Diagnostics, RejectionReason};
use crate::types::{Chart, ChartBase, ChartType, SeriesBinding, ValueBinding};
use crate::utils::stable_key;
use std::sync::Arc;

/// Eligibility engine for one chart type.
///
/// Engines must be pure functions of their inputs: the same datagroup and
/// limits always yield the same charts in the same order.
pub trait ChartBuilder: Send + Sync {
    fn chart_type(&self) -> ChartType;

    /// Every chart of this type the datagroup supports.
    ///
    /// An `Err` is isolated by the generator: it drops this engine's output
    /// for the dataset and keeps the others.
    fn build(
        &self,
        datagroup: &Arc<Datagroup>,
        limits: &ChartLimits,
        params: &BuildParams,
    ) -> Result<Vec<Chart>>;
}

/// Per-invocation inputs beyond the datagroup and limits.
#[derive(Clone, Default)]
pub struct BuildParams {
    pub topojson: Option<Arc<dyn TopojsonProvider>>,
    pub diagnostics: Diagnostics,
    /// Copied verbatim into each chart's `extra_config`.
    pub extra_config: serde_json::Map<String, serde_json::Value>,
}

impl BuildParams {
    pub(crate) fn base(
        &self,
        datagroup: &Arc<Datagroup>,
        key: String,
        measure: &MeasureRange,
        series: Vec<SeriesBinding>,
    ) -> ChartBase {
        ChartBase {
            key,
            datagroup: Arc::clone(datagroup),
            values: ValueBinding {
                measure: measure.measure.clone(),
                min_value: measure.min(),
                max_value: measure.max(),
            },
            series,
            extra_config: self.extra_config.clone(),
        }
    }

    pub(crate) fn reject(
        &self,
        chart_type: ChartType,
        measure: &MeasureRange,
        reason: RejectionReason,
    ) {
        self.diagnostics.reject(chart_type, &measure.column, reason);
    }
}

/// The built-in engine for `chart_type`.
pub fn builtin(chart_type: ChartType) -> Box<dyn ChartBuilder> {
    match chart_type {
        ChartType::Barchart => Box::new(BarchartBuilder),
        ChartType::Choropleth => Box::new(ChoroplethBuilder),
        ChartType::Donut => Box::new(DonutBuilder),
        ChartType::Lineplot => Box::new(LineplotBuilder),
        ChartType::Stackedarea => Box::new(StackedAreaBuilder),
        ChartType::Treemap => Box::new(TreemapBuilder),
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Stable key from the chart type, dataset size, measure and axis columns.
pub(crate) fn chart_key<'a>(
    prefix: &[&str],
    datagroup: &Datagroup,
    measure: &MeasureRange,
    columns: impl IntoIterator<Item = &'a str>,
) -> String {
    let mut tokens: Vec<String> = prefix.iter().map(|token| token.to_string()).collect();
    tokens.push(datagroup.row_count().to_string());
    tokens.push(measure.column.clone());
    tokens.extend(columns.into_iter().map(str::to_string));
    stable_key(tokens)
}

pub(crate) fn bindings(levels: &[AxisLevel<'_>]) -> Vec<SeriesBinding> {
    levels
        .iter()
        .map(|level| SeriesBinding::new(level.axis, level.series))
        .collect()
}

/// Deepest time level as a binding, when the datagroup has a time axis.
pub(crate) fn timeline_binding(datagroup: &Datagroup) -> Option<SeriesBinding> {
    datagroup
        .timeline_level()
        .map(|level| SeriesBinding::new(level.axis, level.series))
}

/// With several category axes a chart aggregates across the others, which
/// only makes sense for summable measures or ratios.
pub(crate) fn aggregation_gate(
    datagroup: &Datagroup,
    measure: &MeasureRange,
) -> Option<RejectionReason> {
    let aggregatable = measure.measure.is_summable() || measure.measure.is_ratio();
    (datagroup.category_axis_count() > 1 && !aggregatable).then_some(RejectionReason::NotSummable)
}

/// Member count of `level` within `[min, max]`.
pub(crate) fn members_within(
    level: &AxisLevel<'_>,
    min: usize,
    max: usize,
) -> std::result::Result<(), RejectionReason> {
    let count = level.member_count();
    if count < min {
        Err(RejectionReason::TooFewMembers {
            level: level.series.level.name.clone(),
            count,
            min,
        })
    } else if count > max {
        Err(RejectionReason::TooManyMembers {
            level: level.series.level.name.clone(),
            count,
            max,
        })
    } else {
        Ok(())
    }
}

/// Chosen levels must come from pairwise distinct hierarchies.
pub(crate) fn distinct_hierarchies(levels: &[AxisLevel<'_>]) -> bool {
    levels.iter().enumerate().all(|(i, level)| {
        levels[i + 1..]
            .iter()
            .all(|other| !level.axis.same_hierarchy(other.axis))
    })
}

/// Product of member counts, saturating.
pub(crate) fn shape(levels: &[AxisLevel<'_>]) -> usize {
    levels
        .iter()
        .fold(1usize, |acc, level| acc.saturating_mul(level.member_count()))
}

pub(crate) fn column_names<'a>(levels: &'a [AxisLevel<'a>]) -> impl Iterator<Item = &'a str> {
    levels.iter().map(|level| level.series.name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::types::Value;

    #[test]
    fn test_builtin_covers_every_type() {
        for chart_type in ChartType::ALL {
            assert_eq!(builtin(chart_type).chart_type(), chart_type);
        }
    }

    #[test]
    fn test_chart_key_is_stable_and_discriminating() {
        let dg = fixtures::datagroup(&fixtures::sales_dataset());
        let sales = dg.mainline_measures().next().unwrap();
        let a = chart_key(&["donut"], &dg, sales, ["State ID"]);
        let b = chart_key(&["donut"], &dg, sales, ["State ID"]);
        let c = chart_key(&["donut"], &dg, sales, ["Category"]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, stable_key(["donut", "8", "Sales", "State ID"]));
    }

    #[test]
    fn test_chart_key_with_owned_member_token() {
        let dg = fixtures::datagroup(&fixtures::sales_dataset());
        let sales = dg.mainline_measures().next().unwrap();
        let columns = vec!["State ID".to_string(), Value::from("Toys").key()];
        let key = chart_key(&["choropleth"], &dg, sales, columns.iter().map(String::as_str));
        drop(columns);
        assert_eq!(key, stable_key(["choropleth", "8", "Sales", "State ID", "Toys"]));
    }

    #[test]
    fn test_members_within_bounds() {
        let dataset = fixtures::grid_dataset(
            &[("Category", fixtures::members("C", 3))],
            &["Sales"],
            |_| 1.0,
        );
        let dg = fixtures::datagroup(&dataset);
        let level = dg.category_levels()[0];
        assert!(members_within(&level, 2, 3).is_ok());
        assert!(matches!(
            members_within(&level, 4, 10),
            Err(RejectionReason::TooFewMembers { count: 3, min: 4, .. })
        ));
        assert!(matches!(
            members_within(&level, 1, 2),
            Err(RejectionReason::TooManyMembers { count: 3, max: 2, .. })
        ));
    }

    #[test]
    fn test_aggregation_gate_needs_several_axes() {
        let dataset = fixtures::grid_dataset(
            &[("Category", fixtures::members("C", 2)), ("Channel", fixtures::members("K", 2))],
            &["Price"],
            |i| i as f64,
        );
        let dg = fixtures::datagroup(&dataset);
        let price = dg.mainline_measures().next().unwrap();
        assert_eq!(aggregation_gate(&dg, price), Some(RejectionReason::NotSummable));

        let single = fixtures::grid_dataset(
            &[("Category", fixtures::members("C", 2))],
            &["Price"],
            |i| i as f64,
        );
        let dg = fixtures::datagroup(&single);
        let price = dg.mainline_measures().next().unwrap();
        assert_eq!(aggregation_gate(&dg, price), None);
    }

    #[test]
    fn test_distinct_hierarchies_and_shape() {
        let dataset = fixtures::grid_dataset(
            &[
                ("Category", fixtures::members("C", 2)),
                ("Subcategory", fixtures::members("S", 3)),
                ("Channel", vec![Value::from("web")]),
            ],
            &["Sales"],
            |_| 1.0,
        );
        let dg = fixtures::datagroup(&dataset);
        let levels = dg.category_levels();
        assert_eq!(levels.len(), 3);
        assert!(!distinct_hierarchies(&levels[0..2]));
        assert!(distinct_hierarchies(&[levels[0], levels[2]]));
        assert_eq!(shape(&levels[0..2]), 6);
    }
}
