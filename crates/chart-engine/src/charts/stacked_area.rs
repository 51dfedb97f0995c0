//! Stacked area charts: category shares accumulated over time.

use super::{
    BuildParams, ChartBuilder, bindings, chart_key, column_names, distinct_hierarchies, shape,
};
use crate::config::ChartLimits;
use crate::datagroup::{AxisLevel, Datagroup, MeasureRange};
use crate::error::Result;
use crate::generator::observer::RejectionReason;
use crate::types::{Chart, ChartType, SeriesBinding, StackedAreaChart};
use crate::utils::partial_permutations;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default)]
pub struct StackedAreaBuilder;

/// Stacking only adds up for summable, non-negative, non-ratio measures.
fn measure_gate(measure: &MeasureRange) -> Option<RejectionReason> {
    if !measure.measure.is_summable() {
        Some(RejectionReason::NotSummable)
    } else if measure.measure.is_ratio() {
        Some(RejectionReason::Ratio)
    } else if !measure.is_non_negative() {
        Some(RejectionReason::NegativeValues { min: measure.min() })
    } else {
        None
    }
}

impl ChartBuilder for StackedAreaBuilder {
    fn chart_type(&self) -> ChartType {
        ChartType::Stackedarea
    }

    fn build(
        &self,
        datagroup: &Arc<Datagroup>,
        limits: &ChartLimits,
        params: &BuildParams,
    ) -> Result<Vec<Chart>> {
        let mut charts = Vec::new();
        let candidates = datagroup.category_levels();

        for measure in datagroup.mainline_measures() {
            let Some(time) = datagroup.timeline_level() else {
                params.reject(ChartType::Stackedarea, measure, RejectionReason::NoTimeAxis);
                continue;
            };
            if time.member_count() < limits.stacked_time_member_min {
                params.reject(
                    ChartType::Stackedarea,
                    measure,
                    RejectionReason::TooFewMembers {
                        level: time.series.level.name.clone(),
                        count: time.member_count(),
                        min: limits.stacked_time_member_min,
                    },
                );
                continue;
            }
            if let Some(reason) = measure_gate(measure) {
                params.reject(ChartType::Stackedarea, measure, reason);
                continue;
            }
            let timeline = SeriesBinding::new(time.axis, time.series);

            for k in 1..=2 {
                for selection in partial_permutations(&candidates, k) {
                    let levels: Vec<AxisLevel<'_>> = selection.into_iter().copied().collect();
                    if !distinct_hierarchies(&levels) {
                        continue;
                    }
                    let areas = shape(&levels);
                    if areas > limits.stacked_shape_max {
                        params.reject(
                            ChartType::Stackedarea,
                            measure,
                            RejectionReason::ShapeTooLarge {
                                shape: areas,
                                max: limits.stacked_shape_max,
                            },
                        );
                        continue;
                    }

                    let columns =
                        std::iter::once(time.series.name.as_str()).chain(column_names(&levels));
                    let key = chart_key(&["stackedarea"], datagroup, measure, columns);
                    charts.push(Chart::Stackedarea(StackedAreaChart {
                        base: params.base(datagroup, key, measure, bindings(&levels)),
                        timeline: timeline.clone(),
                    }));
                }
            }
        }

        Ok(charts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::types::Dataset;

    fn build(dataset: &Dataset) -> Vec<Chart> {
        StackedAreaBuilder
            .build(&fixtures::datagroup(dataset), &ChartLimits::default(), &BuildParams::default())
            .unwrap()
    }

    fn series_levels(charts: &[Chart]) -> Vec<Vec<String>> {
        charts
            .iter()
            .map(|c| c.series().iter().map(|s| s.level.clone()).collect())
            .collect()
    }

    #[test]
    fn test_pairs_across_hierarchies() {
        let dataset = fixtures::grid_dataset(
            &[
                ("Year", fixtures::years(3)),
                ("Category", fixtures::members("C", 4)),
                ("Channel", fixtures::members("K", 3)),
            ],
            &["Sales"],
            |i| i as f64,
        );
        let charts = build(&dataset);
        assert_eq!(
            series_levels(&charts),
            vec![
                vec!["Category"],
                vec!["Channel"],
                vec!["Category", "Channel"],
                vec!["Channel", "Category"],
            ]
        );
        assert!(charts.iter().all(|c| c.timeline().is_some()));
    }

    #[test]
    fn test_rejects_negative_values() {
        let dataset = fixtures::grid_dataset(
            &[("Year", fixtures::years(3)), ("Category", fixtures::members("C", 4))],
            &["Sales"],
            |i| i as f64 - 5.0,
        );
        assert!(build(&dataset).is_empty());
    }

    #[test]
    fn test_rejects_non_summable_and_ratio() {
        for measure in ["Price", "Margin"] {
            let dataset = fixtures::grid_dataset(
                &[("Year", fixtures::years(3)), ("Category", fixtures::members("C", 4))],
                &[measure],
                |i| i as f64,
            );
            assert!(build(&dataset).is_empty(), "{measure} should not stack");
        }
    }

    #[test]
    fn test_shape_limit() {
        let dataset = fixtures::grid_dataset(
            &[
                ("Year", fixtures::years(2)),
                ("Category", fixtures::members("C", 15)),
                ("Channel", fixtures::members("K", 14)),
            ],
            &["Sales"],
            |_| 1.0,
        );
        // 15 * 14 = 210 > 200
        assert_eq!(series_levels(&build(&dataset)), vec![vec!["Category"], vec!["Channel"]]);
    }

    #[test]
    fn test_needs_time_points() {
        let dataset = fixtures::grid_dataset(
            &[("Year", fixtures::years(1)), ("Category", fixtures::members("C", 4))],
            &["Sales"],
            |_| 1.0,
        );
        assert!(build(&dataset).is_empty());
    }
}
