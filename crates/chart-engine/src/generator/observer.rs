//! Diagnostic events emitted while charts are generated.
//!
//! Every decision the engines take (a dataset skipped, a candidate rejected,
//! an engine failing) is logged through `tracing` and, when a caller has
//! registered one, delivered to a [`ChartObserver`]. Events are informational
//! only and never change which charts are produced.
//!
//! # Example
//!
//! ```rust,ignore
//! use chart_engine::{ChartEvent, ChartGenerator};
//!
//! let generator = ChartGenerator::builder()
//!     .on_event(|event| {
//!         if let ChartEvent::CandidateRejected { chart_type, reason, .. } = event {
//!             println!("{chart_type}: {reason}");
//!         }
//!     })
//!     .build()?;
//! ```

use crate::types::ChartType;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Why a candidate chart was not produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionReason {
    /// The measure cannot be aggregated across the other axes.
    NotSummable,
    /// The measure is a percentage or rate.
    Ratio,
    /// The measure has negative values.
    NegativeValues { min: f64 },
    TooFewMembers { level: String, count: usize, min: usize },
    TooManyMembers { level: String, count: usize, max: usize },
    /// Product of member counts exceeds the shape limit.
    ShapeTooLarge { shape: usize, max: usize },
    NoTimeAxis,
    /// A deeper level cannot contain a shallower one.
    DepthOrder { outer: String, inner: String },
    /// No geometry configured for a geographic level.
    NoTopojson { level: String },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSummable => write!(f, "measure is not summable"),
            Self::Ratio => write!(f, "measure is a ratio"),
            Self::NegativeValues { min } => write!(f, "measure has negative values (min {min})"),
            Self::TooFewMembers { level, count, min } => {
                write!(f, "level '{level}' has {count} members, needs at least {min}")
            }
            Self::TooManyMembers { level, count, max } => {
                write!(f, "level '{level}' has {count} members, allows at most {max}")
            }
            Self::ShapeTooLarge { shape, max } => {
                write!(f, "{shape} shapes exceed the limit of {max}")
            }
            Self::NoTimeAxis => write!(f, "dataset has no time axis"),
            Self::DepthOrder { outer, inner } => {
                write!(f, "level '{outer}' is deeper than '{inner}'")
            }
            Self::NoTopojson { level } => write!(f, "no topojson for level '{level}'"),
        }
    }
}

/// Something that happened while generating charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChartEvent {
    DatasetSkipped {
        index: usize,
        reason: String,
    },
    DatagroupBuilt {
        index: usize,
        rows: usize,
        measures: usize,
        axes: usize,
        has_time: bool,
    },
    CandidateRejected {
        chart_type: ChartType,
        measure: String,
        reason: RejectionReason,
    },
    ChartsBuilt {
        chart_type: ChartType,
        count: usize,
    },
    /// An engine returned an error; its charts were dropped.
    EngineFailed {
        chart_type: ChartType,
        error: String,
    },
}

/// Receives [`ChartEvent`]s from the generator.
///
/// Implementations must be cheap: rejections are reported once per
/// candidate, which can be thousands of calls for wide datasets.
pub trait ChartObserver: Send + Sync {
    fn observe(&self, event: &ChartEvent);
}

/// Wrapper that implements [`ChartObserver`] using a closure.
pub struct ClosureChartObserver<F>
where
    F: Fn(&ChartEvent) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureChartObserver<F>
where
    F: Fn(&ChartEvent) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ChartObserver for ClosureChartObserver<F>
where
    F: Fn(&ChartEvent) + Send + Sync,
{
    fn observe(&self, event: &ChartEvent) {
        (self.callback)(event);
    }
}

/// Fan-out point for diagnostics: logs, then forwards to the observer.
#[derive(Clone, Default)]
pub struct Diagnostics {
    observer: Option<Arc<dyn ChartObserver>>,
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl Diagnostics {
    pub fn new(observer: Arc<dyn ChartObserver>) -> Self {
        Self {
            observer: Some(observer),
        }
    }

    pub fn emit(&self, event: ChartEvent) {
        if let Some(observer) = &self.observer {
            observer.observe(&event);
        }
    }

    /// Record a rejected candidate.
    pub fn reject(&self, chart_type: ChartType, measure: &str, reason: RejectionReason) {
        debug!(%chart_type, measure, %reason, "Rejected chart candidate");
        self.emit(ChartEvent::CandidateRejected {
            chart_type,
            measure: measure.to_string(),
            reason,
        });
    }
}

static_assertions::assert_impl_all!(Diagnostics: Send, Sync);
static_assertions::assert_impl_all!(ChartEvent: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closure_observer_receives_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let observer = ClosureChartObserver::new(move |event: &ChartEvent| {
            sink.lock().unwrap().push(event.clone());
        });
        let diagnostics = Diagnostics::new(Arc::new(observer));

        diagnostics.reject(ChartType::Donut, "Sales", RejectionReason::NotSummable);
        diagnostics.emit(ChartEvent::ChartsBuilt {
            chart_type: ChartType::Donut,
            count: 0,
        });

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(
            seen[0],
            ChartEvent::CandidateRejected {
                chart_type: ChartType::Donut,
                measure: "Sales".to_string(),
                reason: RejectionReason::NotSummable,
            }
        );
    }

    #[test]
    fn test_default_diagnostics_is_silent() {
        // Must not panic without an observer.
        Diagnostics::default().reject(ChartType::Treemap, "Sales", RejectionReason::NoTimeAxis);
    }

    #[test]
    fn test_event_serialization() {
        let event = ChartEvent::CandidateRejected {
            chart_type: ChartType::Barchart,
            measure: "Sales".to_string(),
            reason: RejectionReason::TooManyMembers {
                level: "State".to_string(),
                count: 30,
                max: 20,
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "candidate_rejected");
        assert_eq!(json["chart_type"], "barchart");
        assert_eq!(json["reason"]["kind"], "too_many_members");
        assert_eq!(json["reason"]["count"], 30);
    }

    #[test]
    fn test_reason_display() {
        let reason = RejectionReason::DepthOrder {
            outer: "City".to_string(),
            inner: "State".to_string(),
        };
        assert_eq!(reason.to_string(), "level 'City' is deeper than 'State'");
    }
}
