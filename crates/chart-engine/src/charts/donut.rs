//! Donut charts: one category level split into slices.

use super::{
    BuildParams, ChartBuilder, aggregation_gate, bindings, chart_key, column_names, members_within,
    timeline_binding,
};
use crate::config::ChartLimits;
use crate::datagroup::Datagroup;
use crate::error::Result;
use crate::types::{Chart, ChartType, DonutChart};
use crate::utils::partial_permutations;
use std::sync::Arc;

/// One donut per mainline measure and category level with between two and
/// `DONUT_SHAPE_MAX` members.
#[derive(Debug, Clone, Copy, Default)]
pub struct DonutBuilder;

impl ChartBuilder for DonutBuilder {
    fn chart_type(&self) -> ChartType {
        ChartType::Donut
    }

    fn build(
        &self,
        datagroup: &Arc<Datagroup>,
        limits: &ChartLimits,
        params: &BuildParams,
    ) -> Result<Vec<Chart>> {
        let mut charts = Vec::new();
        let candidates = datagroup.category_levels();
        let timeline = timeline_binding(datagroup);

        for measure in datagroup.mainline_measures() {
            if let Some(reason) = aggregation_gate(datagroup, measure) {
                params.reject(ChartType::Donut, measure, reason);
                continue;
            }

            for selection in partial_permutations(&candidates, 1) {
                let levels = [*selection[0]];
                if let Err(reason) = members_within(&levels[0], 2, limits.donut_shape_max) {
                    params.reject(ChartType::Donut, measure, reason);
                    continue;
                }

                let key = chart_key(&["donut"], datagroup, measure, column_names(&levels));
                charts.push(Chart::Donut(DonutChart {
                    base: params.base(datagroup, key, measure, bindings(&levels)),
                    timeline: timeline.clone(),
                }));
            }
        }

        Ok(charts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::generator::observer::{
        ChartEvent, ClosureChartObserver, Diagnostics, RejectionReason,
    };
    use std::sync::Mutex;

    fn build(dataset: &crate::types::Dataset) -> Vec<Chart> {
        DonutBuilder
            .build(&fixtures::datagroup(dataset), &ChartLimits::default(), &BuildParams::default())
            .unwrap()
    }

    #[test]
    fn test_one_donut_per_category_level() {
        let charts = build(&fixtures::sales_dataset());
        let levels: Vec<_> = charts.iter().map(|c| c.series()[0].level.as_str()).collect();
        assert_eq!(levels, vec!["State", "Category"]);
        // sales dataset has a time axis
        assert!(charts.iter().all(|c| c.timeline().is_some()));
    }

    #[test]
    fn test_shape_limit() {
        let too_many = fixtures::grid_dataset(
            &[("Category", fixtures::members("C", 31))],
            &["Sales"],
            |_| 1.0,
        );
        assert!(build(&too_many).is_empty());

        let at_limit = fixtures::grid_dataset(
            &[("Category", fixtures::members("C", 30))],
            &["Sales"],
            |_| 1.0,
        );
        assert_eq!(build(&at_limit).len(), 1);

        let single = fixtures::grid_dataset(
            &[("Category", fixtures::members("C", 1))],
            &["Sales"],
            |_| 1.0,
        );
        assert!(build(&single).is_empty());
    }

    #[test]
    fn test_average_rejected_across_axes() {
        let dataset = fixtures::grid_dataset(
            &[("Category", fixtures::members("C", 3)), ("Channel", fixtures::members("K", 2))],
            &["Price"],
            |i| i as f64,
        );
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let observer = ClosureChartObserver::new(move |event: &ChartEvent| {
            sink.lock().unwrap().push(event.clone());
        });
        let params = BuildParams {
            diagnostics: Diagnostics::new(Arc::new(observer)),
            ..Default::default()
        };

        let charts = DonutBuilder
            .build(&fixtures::datagroup(&dataset), &ChartLimits::default(), &params)
            .unwrap();
        assert!(charts.is_empty());
        assert!(matches!(
            seen.lock().unwrap().as_slice(),
            [ChartEvent::CandidateRejected {
                reason: RejectionReason::NotSummable,
                ..
            }]
        ));
    }
}
