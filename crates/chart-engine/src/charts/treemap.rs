//! Treemaps: nested rectangles for one or two category levels.

use super::{BuildParams, ChartBuilder, bindings, chart_key, column_names, shape, timeline_binding};
use crate::config::ChartLimits;
use crate::datagroup::{AxisLevel, Datagroup, MeasureRange};
use crate::error::Result;
use crate::generator::observer::RejectionReason;
use crate::types::{Chart, ChartType, TreemapChart};
use crate::utils::partial_permutations;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default)]
pub struct TreemapBuilder;

fn measure_gate(measure: &MeasureRange) -> Option<RejectionReason> {
    if !measure.measure.is_summable() {
        Some(RejectionReason::NotSummable)
    } else if !measure.is_non_negative() {
        Some(RejectionReason::NegativeValues { min: measure.min() })
    } else {
        None
    }
}

/// Gates for one ordered selection of levels.
fn selection_gate(levels: &[AxisLevel<'_>], limits: &ChartLimits) -> Option<RejectionReason> {
    if let Some(flat) = levels.iter().find(|level| level.member_count() < 2) {
        return Some(RejectionReason::TooFewMembers {
            level: flat.series.level.name.clone(),
            count: flat.member_count(),
            min: 2,
        });
    }

    // Within one hierarchy the outer rectangle must be the shallower level.
    if let [outer, inner] = levels
        && outer.axis.same_hierarchy(inner.axis)
        && outer.series.level.depth > inner.series.level.depth
    {
        return Some(RejectionReason::DepthOrder {
            outer: outer.series.level.name.clone(),
            inner: inner.series.level.name.clone(),
        });
    }

    let tiles = shape(levels);
    (tiles > limits.tree_map_shape_max).then(|| RejectionReason::ShapeTooLarge {
        shape: tiles,
        max: limits.tree_map_shape_max,
    })
}

impl ChartBuilder for TreemapBuilder {
    fn chart_type(&self) -> ChartType {
        ChartType::Treemap
    }

    fn build(
        &self,
        datagroup: &Arc<Datagroup>,
        limits: &ChartLimits,
        params: &BuildParams,
    ) -> Result<Vec<Chart>> {
        let candidates = datagroup.category_levels();
        if !candidates.iter().any(|level| level.member_count() > 1) {
            return Ok(Vec::new());
        }

        let mut charts = Vec::new();
        let timeline = timeline_binding(datagroup);

        for measure in datagroup.mainline_measures() {
            if let Some(reason) = measure_gate(measure) {
                params.reject(ChartType::Treemap, measure, reason);
                continue;
            }

            for k in 1..=2 {
                for selection in partial_permutations(&candidates, k) {
                    let levels: Vec<AxisLevel<'_>> = selection.into_iter().copied().collect();
                    if let Some(reason) = selection_gate(&levels, limits) {
                        params.reject(ChartType::Treemap, measure, reason);
                        continue;
                    }

                    let key = chart_key(&["treemap"], datagroup, measure, column_names(&levels));
                    charts.push(Chart::Treemap(TreemapChart {
                        base: params.base(datagroup, key, measure, bindings(&levels)),
                        timeline: timeline.clone(),
                    }));
                }
            }
        }

        Ok(charts)
    }
}
