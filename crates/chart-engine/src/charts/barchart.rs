//! Bar charts, horizontal and vertical.
//!
//! Horizontal bars put one category level on the main axis, optionally
//! stacked by a level of another hierarchy. Vertical bars prefer time as the
//! primary axis; when time is too short to lead, they fall back to the same
//! category enumeration with time treated as an ordinary candidate.

use super::{
    BuildParams, ChartBuilder, aggregation_gate, bindings, chart_key, column_names,
    distinct_hierarchies, members_within, timeline_binding,
};
use crate::config::ChartLimits;
use crate::datagroup::{AxisLevel, Datagroup, MeasureRange};
use crate::error::Result;
use crate::generator::observer::RejectionReason;
use crate::types::{BarChart, Chart, ChartType, Orientation, SeriesBinding};
use crate::utils::partial_permutations;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default)]
pub struct BarchartBuilder;

impl ChartBuilder for BarchartBuilder {
    fn chart_type(&self) -> ChartType {
        ChartType::Barchart
    }

    fn build(
        &self,
        datagroup: &Arc<Datagroup>,
        limits: &ChartLimits,
        params: &BuildParams,
    ) -> Result<Vec<Chart>> {
        let engine = BarEngine {
            datagroup,
            limits,
            params,
        };
        let mut charts = Vec::new();
        for measure in datagroup.mainline_measures() {
            charts.extend(engine.horizontal(measure));
            charts.extend(engine.vertical(measure));
        }
        Ok(charts)
    }
}

struct BarEngine<'a> {
    datagroup: &'a Arc<Datagroup>,
    limits: &'a ChartLimits,
    params: &'a BuildParams,
}

impl BarEngine<'_> {
    fn horizontal(&self, measure: &MeasureRange) -> Vec<Chart> {
        if let Some(reason) = aggregation_gate(self.datagroup, measure) {
            self.params.reject(ChartType::Barchart, measure, reason);
            return Vec::new();
        }

        let timeline = timeline_binding(self.datagroup);
        self.stacked_selections(measure, &self.datagroup.category_levels())
            .into_iter()
            .map(|levels| self.chart(measure, Orientation::Horizontal, &levels, timeline.clone()))
            .collect()
    }

    fn vertical(&self, measure: &MeasureRange) -> Vec<Chart> {
        let time = self.datagroup.timeline_level();
        let time_count = time.map_or(0, |level| level.member_count());

        let time_leads = time_count >= 2
            && self
                .limits
                .barchart_vertical_max_groups
                .is_none_or(|max_groups| time_count >= max_groups);

        if let Some(time) = time.filter(|_| time_leads) {
            return self.time_primary(measure, time);
        }

        // Time too short to lead: offer it as a regular candidate instead.
        let mut candidates = self.datagroup.category_levels();
        if time_count >= 2 {
            candidates.extend(self.datagroup.time_levels());
        }
        self.stacked_selections(measure, &candidates)
            .into_iter()
            .map(|levels| self.chart(measure, Orientation::Vertical, &levels, None))
            .collect()
    }

    /// Time on the primary axis, alone and grouped by each category level.
    fn time_primary(&self, measure: &MeasureRange, time: AxisLevel<'_>) -> Vec<Chart> {
        let mut charts = vec![self.chart(measure, Orientation::Vertical, &[time], None)];
        for level in self.datagroup.category_levels() {
            if let Err(reason) = members_within(&level, 2, self.limits.barchart_year_max_bars) {
                self.params.reject(ChartType::Barchart, measure, reason);
                continue;
            }
            charts.push(self.chart(measure, Orientation::Vertical, &[time, level], None));
        }
        charts
    }

    /// Single levels and ordered pairs from distinct hierarchies whose main
    /// axis and stack fit the bar limits.
    fn stacked_selections<'d>(
        &self,
        measure: &MeasureRange,
        candidates: &[AxisLevel<'d>],
    ) -> Vec<Vec<AxisLevel<'d>>> {
        let mut selections = Vec::new();
        for k in 1..=2 {
            for selection in partial_permutations(candidates, k) {
                let levels: Vec<AxisLevel<'d>> = selection.into_iter().copied().collect();
                if !distinct_hierarchies(&levels) {
                    continue;
                }
                if let Err(reason) = self.bar_gates(&levels) {
                    self.params.reject(ChartType::Barchart, measure, reason);
                    continue;
                }
                selections.push(levels);
            }
        }
        selections
    }

    fn bar_gates(&self, levels: &[AxisLevel<'_>]) -> std::result::Result<(), RejectionReason> {
        if let Some(main) = levels.first() {
            members_within(main, 2, self.limits.barchart_max_bars)?;
        }
        if let Some(stack) = levels.get(1) {
            members_within(stack, 2, self.limits.barchart_max_stacked_bars)?;
        }
        Ok(())
    }

    fn chart(
        &self,
        measure: &MeasureRange,
        orientation: Orientation,
        levels: &[AxisLevel<'_>],
        timeline: Option<SeriesBinding>,
    ) -> Chart {
        let prefix = match orientation {
            Orientation::Horizontal => ["barchart", "horizontal"],
            Orientation::Vertical => ["barchart", "vertical"],
        };
        let key = chart_key(&prefix, self.datagroup, measure, column_names(levels));
        Chart::Barchart(BarChart {
            base: self.params.base(self.datagroup, key, measure, bindings(levels)),
            orientation,
            timeline,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::types::{Dataset, Value};

    fn build_with(dataset: &Dataset, limits: &ChartLimits) -> Vec<Chart> {
        BarchartBuilder
            .build(&fixtures::datagroup(dataset), limits, &BuildParams::default())
            .unwrap()
    }

    fn build(dataset: &Dataset) -> Vec<Chart> {
        build_with(dataset, &ChartLimits::default())
    }

    fn oriented(charts: &[Chart], orientation: Orientation) -> Vec<Vec<String>> {
        charts
            .iter()
            .filter_map(|chart| match chart {
                Chart::Barchart(bar) if bar.orientation == orientation => {
                    Some(bar.base.series.iter().map(|s| s.level.clone()).collect())
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_bar_count_gate() {
        let wide = fixtures::grid_dataset(
            &[("Category", fixtures::members("C", 30))],
            &["Sales"],
            |_| 1.0,
        );
        assert!(build(&wide).is_empty());

        let narrow = fixtures::grid_dataset(
            &[("Category", fixtures::members("C", 15))],
            &["Sales"],
            |_| 1.0,
        );
        let charts = build(&narrow);
        assert_eq!(oriented(&charts, Orientation::Horizontal), vec![vec!["Category"]]);
        assert_eq!(oriented(&charts, Orientation::Vertical), vec![vec!["Category"]]);
    }

    #[test]
    fn test_horizontal_stacks_across_hierarchies() {
        let dataset = fixtures::grid_dataset(
            &[
                ("Category", fixtures::members("C", 3)),
                ("Subcategory", fixtures::members("S", 4)),
                ("Channel", fixtures::members("K", 2)),
            ],
            &["Sales"],
            |_| 1.0,
        );
        let horizontal = oriented(&build(&dataset), Orientation::Horizontal);
        assert_eq!(
            horizontal,
            vec![
                vec!["Category"],
                vec!["Subcategory"],
                vec!["Channel"],
                vec!["Category", "Channel"],
                vec!["Subcategory", "Channel"],
                vec!["Channel", "Category"],
                vec!["Channel", "Subcategory"],
            ]
        );
    }

    #[test]
    fn test_stack_limit() {
        let dataset = fixtures::grid_dataset(
            &[("Category", fixtures::members("C", 11)), ("Channel", fixtures::members("K", 2))],
            &["Sales"],
            |_| 1.0,
        );
        let horizontal = oriented(&build(&dataset), Orientation::Horizontal);
        // 11 categories may lead but not stack
        assert!(horizontal.contains(&vec!["Category".to_string(), "Channel".to_string()]));
        assert!(!horizontal.contains(&vec!["Channel".to_string(), "Category".to_string()]));
    }

    #[test]
    fn test_vertical_time_primary() {
        let dataset = fixtures::grid_dataset(
            &[("Year", fixtures::years(5)), ("Category", fixtures::members("C", 3))],
            &["Sales"],
            |_| 1.0,
        );
        let charts = build(&dataset);
        assert_eq!(
            oriented(&charts, Orientation::Vertical),
            vec![vec!["Year"], vec!["Year", "Category"]]
        );
        let horizontal: Vec<_> = charts
            .iter()
            .filter_map(|c| match c {
                Chart::Barchart(bar) if bar.orientation == Orientation::Horizontal => Some(bar),
                _ => None,
            })
            .collect();
        assert_eq!(horizontal.len(), 1);
        assert_eq!(horizontal[0].timeline.as_ref().unwrap().level, "Year");
    }

    #[test]
    fn test_vertical_falls_back_below_max_groups() {
        let dataset = fixtures::grid_dataset(
            &[("Year", fixtures::years(3)), ("Category", fixtures::members("C", 3))],
            &["Sales"],
            |_| 1.0,
        );
        let limits = ChartLimits::builder().barchart_vertical_max_groups(4).build().unwrap();
        let vertical = oriented(&build_with(&dataset, &limits), Orientation::Vertical);
        assert_eq!(
            vertical,
            vec![
                vec!["Category"],
                vec!["Year"],
                vec!["Category", "Year"],
                vec!["Year", "Category"],
            ]
        );
    }

    #[test]
    fn test_single_year_is_not_an_axis() {
        let dataset = fixtures::grid_dataset(
            &[("Year", vec![Value::from(2020)]), ("Category", fixtures::members("C", 3))],
            &["Sales"],
            |_| 1.0,
        );
        let vertical = oriented(&build(&dataset), Orientation::Vertical);
        assert_eq!(vertical, vec![vec!["Category"]]);
    }

    #[test]
    fn test_average_across_two_axes_has_only_vertical_bars() {
        let dataset = fixtures::grid_dataset(
            &[("Category", fixtures::members("C", 3)), ("Channel", fixtures::members("K", 2))],
            &["Price"],
            |i| i as f64,
        );
        let charts = build(&dataset);
        assert!(oriented(&charts, Orientation::Horizontal).is_empty());
        assert!(!oriented(&charts, Orientation::Vertical).is_empty());

        let single_axis = fixtures::grid_dataset(
            &[("Category", fixtures::members("C", 3))],
            &["Price"],
            |i| i as f64,
        );
        assert_eq!(
            oriented(&build(&single_axis), Orientation::Horizontal),
            vec![vec!["Category"]]
        );
    }

    #[test]
    fn test_keys_differ_by_orientation() {
        let dataset = fixtures::grid_dataset(
            &[("Category", fixtures::members("C", 3))],
            &["Sales"],
            |_| 1.0,
        );
        let charts = build(&dataset);
        assert_eq!(charts.len(), 2);
        assert_ne!(charts[0].key(), charts[1].key());
    }
}
