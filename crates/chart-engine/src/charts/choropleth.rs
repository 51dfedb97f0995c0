//! Choropleth maps over geographic levels.
//!
//! A geo level only becomes a map when the caller supplies geometry for it
//! through a [`TopojsonProvider`]. Non-summable measures cannot be
//! aggregated across another category axis, so when exactly one such axis
//! is narrow enough, the map is split into small multiples, one per member.

use super::{BuildParams, ChartBuilder, bindings, chart_key, column_names, timeline_binding};
use crate::config::ChartLimits;
use crate::datagroup::{AxisLevel, Datagroup, MeasureRange};
use crate::error::Result;
use crate::generator::observer::RejectionReason;
use crate::schema::{DimensionType, Level};
use crate::types::{Chart, ChartType, ChoroplethChart, MemberSplit, SeriesBinding, TopojsonConfig};
use crate::utils::partial_permutations;
use std::collections::HashMap;
use std::sync::Arc;

/// Levels with fewer members than this qualify for small multiples.
const SPLIT_MEMBER_LIMIT: usize = 3;

/// Supplies map geometry for geographic levels.
pub trait TopojsonProvider: Send + Sync {
    /// `None` when the level cannot be drawn as a map.
    fn topojson_for(&self, level: &Level) -> Option<TopojsonConfig>;
}

impl<F> TopojsonProvider for F
where
    F: Fn(&Level) -> Option<TopojsonConfig> + Send + Sync,
{
    fn topojson_for(&self, level: &Level) -> Option<TopojsonConfig> {
        self(level)
    }
}

/// Geometry keyed by level name.
#[derive(Debug, Clone, Default)]
pub struct TopojsonRegistry {
    by_level: HashMap<String, TopojsonConfig>,
}

impl TopojsonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        level: impl Into<String>,
        config: TopojsonConfig,
    ) -> Option<TopojsonConfig> {
        self.by_level.insert(level.into(), config)
    }

    pub fn len(&self) -> usize {
        self.by_level.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_level.is_empty()
    }
}

impl FromIterator<(String, TopojsonConfig)> for TopojsonRegistry {
    fn from_iter<I: IntoIterator<Item = (String, TopojsonConfig)>>(iter: I) -> Self {
        Self {
            by_level: iter.into_iter().collect(),
        }
    }
}

impl TopojsonProvider for TopojsonRegistry {
    fn topojson_for(&self, level: &Level) -> Option<TopojsonConfig> {
        self.by_level.get(&level.name).cloned()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChoroplethBuilder;

impl ChartBuilder for ChoroplethBuilder {
    fn chart_type(&self) -> ChartType {
        ChartType::Choropleth
    }

    fn build(
        &self,
        datagroup: &Arc<Datagroup>,
        _limits: &ChartLimits,
        params: &BuildParams,
    ) -> Result<Vec<Chart>> {
        let candidates = datagroup.category_levels();
        let geo_levels: Vec<AxisLevel<'_>> = candidates
            .iter()
            .copied()
            .filter(|level| level.axis.dimension_type == DimensionType::Geo)
            .collect();
        if geo_levels.is_empty() {
            return Ok(Vec::new());
        }

        let timeline = timeline_binding(datagroup);
        let split_level = small_multiple_level(datagroup);
        let mut charts = Vec::new();

        for measure in datagroup.mainline_measures() {
            for selection in partial_permutations(&geo_levels, 1) {
                let geo = [*selection[0]];
                let level = &geo[0].series.level;
                let topojson = params.topojson.as_ref().and_then(|p| p.topojson_for(level));
                let Some(topojson) = topojson else {
                    params.reject(
                        ChartType::Choropleth,
                        measure,
                        RejectionReason::NoTopojson {
                            level: level.name.clone(),
                        },
                    );
                    continue;
                };

                match split_level.filter(|_| !measure.measure.is_summable()) {
                    Some(split) => charts.extend(small_multiples(
                        datagroup, params, measure, &geo, split, &topojson, &timeline,
                    )),
                    None => {
                        let columns = column_names(&geo);
                        let key = chart_key(&["choropleth"], datagroup, measure, columns);
                        charts.push(Chart::Choropleth(ChoroplethChart {
                            base: params.base(datagroup, key, measure, bindings(&geo)),
                            topojson,
                            split: None,
                            timeline: timeline.clone(),
                        }));
                    }
                }
            }
        }

        Ok(charts)
    }
}

/// The level to split maps by, when exactly one standard axis has a level
/// with fewer than [`SPLIT_MEMBER_LIMIT`] members.
fn small_multiple_level(datagroup: &Datagroup) -> Option<AxisLevel<'_>> {
    let mut narrow = datagroup
        .non_time_hierarchies
        .values()
        .filter(|axis| axis.dimension_type != DimensionType::Geo)
        .filter_map(|axis| {
            axis.levels
                .iter()
                .find(|series| series.member_count() < SPLIT_MEMBER_LIMIT)
                .map(|series| AxisLevel { axis, series })
        });

    match (narrow.next(), narrow.next()) {
        (Some(level), None) => Some(level),
        _ => None,
    }
}

fn small_multiples(
    datagroup: &Arc<Datagroup>,
    params: &BuildParams,
    measure: &MeasureRange,
    geo: &[AxisLevel<'_>],
    split: AxisLevel<'_>,
    topojson: &TopojsonConfig,
    timeline: &Option<SeriesBinding>,
) -> Vec<Chart> {
    let split_binding = SeriesBinding::new(split.axis, split.series);
    split
        .series
        .members
        .iter()
        .map(|member| {
            let member_key = member.key();
            let columns =
                column_names(geo).chain([split.series.name.as_str(), member_key.as_str()]);
            let key = chart_key(&["choropleth"], datagroup, measure, columns);
            let scoped = Arc::new(datagroup.scoped(&split.series.name, member));
            Chart::Choropleth(ChoroplethChart {
                base: params.base(&scoped, key, measure, bindings(geo)),
                topojson: topojson.clone(),
                split: Some(MemberSplit {
                    level: split_binding.clone(),
                    member: member.clone(),
                }),
                timeline: timeline.clone(),
            })
        })
        .collect()
}
