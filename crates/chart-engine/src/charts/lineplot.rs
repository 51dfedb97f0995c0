//! Line plots over the time axis.

use super::{BuildParams, ChartBuilder, bindings, chart_key, column_names, members_within};
use crate::config::ChartLimits;
use crate::datagroup::Datagroup;
use crate::error::Result;
use crate::generator::observer::RejectionReason;
use crate::types::{Chart, ChartType, LinePlot, SeriesBinding};
use crate::utils::partial_permutations;
use std::sync::Arc;

/// A single-line plot per measure, plus one multi-line plot per category
/// level with between two and `LINEPLOT_LINE_MAX` members. Requires a time
/// axis with at least `LINEPLOT_LINE_POINT_MIN` points.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineplotBuilder;

impl ChartBuilder for LineplotBuilder {
    fn chart_type(&self) -> ChartType {
        ChartType::Lineplot
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
                params.reject(ChartType::Lineplot, measure, RejectionReason::NoTimeAxis);
                continue;
            };
            if time.member_count() < limits.lineplot_line_point_min {
                params.reject(
                    ChartType::Lineplot,
                    measure,
                    RejectionReason::TooFewMembers {
                        level: time.series.level.name.clone(),
                        count: time.member_count(),
                        min: limits.lineplot_line_point_min,
                    },
                );
                continue;
            }
            let timeline = SeriesBinding::new(time.axis, time.series);

            let key = chart_key(&["lineplot"], datagroup, measure, [time.series.name.as_str()]);
            charts.push(Chart::Lineplot(LinePlot {
                base: params.base(datagroup, key, measure, Vec::new()),
                timeline: timeline.clone(),
            }));

            for selection in partial_permutations(&candidates, 1) {
                let levels = [*selection[0]];
                if let Err(reason) = members_within(&levels[0], 2, limits.lineplot_line_max) {
                    params.reject(ChartType::Lineplot, measure, reason);
                    continue;
                }
                let columns =
                    std::iter::once(time.series.name.as_str()).chain(column_names(&levels));
                let key = chart_key(&["lineplot"], datagroup, measure, columns);
                charts.push(Chart::Lineplot(LinePlot {
                    base: params.base(datagroup, key, measure, bindings(&levels)),
                    timeline: timeline.clone(),
                }));
            }
        }

        Ok(charts)
    }
}
