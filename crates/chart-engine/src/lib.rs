//! Chart Recommendation Engine
//!
//! Given tabular results from an OLAP cube and the cube's schema, produce the
//! list of charts that can meaningfully visualize the data.
//!
//! # Overview
//!
//! - **Column Classification**: every dataset column is matched to a measure,
//!   level or property of the cube schema
//! - **Datagroup Building**: rows are normalized into one time axis and any
//!   number of category axes, with sorted members, per-member sums and
//!   measure ranges
//! - **Eligibility Engines**: one engine per chart type (barchart, choropleth,
//!   donut, lineplot, stacked area, treemap) enumerates axis combinations
//!   and applies cardinality, aggregation and sign gates
//! - **Diagnostics**: every rejected candidate is logged with `tracing` and
//!   optionally delivered to a [`ChartObserver`]
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use chart_engine::{ChartGenerator, Dataset, GeneratorConfig, TopojsonRegistry, TopojsonConfig};
//!
//! let dataset = Dataset::from_schema(&cube, rows, "en")?;
//!
//! let mut geometry = TopojsonRegistry::new();
//! geometry.insert("State", TopojsonConfig::new("/topojson/states.json"));
//!
//! let charts = ChartGenerator::builder()
//!     .config(GeneratorConfig::default())
//!     .topojson(geometry)
//!     .build()?
//!     .generate(&[dataset])?;
//!
//! for chart in &charts {
//!     println!("{} {}", chart.chart_type(), chart.key());
//! }
//! ```
//!
//! # Configuration
//!
//! Use [`ChartLimits`] to tune the cardinality gates and [`GeneratorConfig`]
//! to restrict chart types or the number of rows analysed:
//!
//! ```rust,ignore
//! use chart_engine::config::*;
//!
//! let config = GeneratorConfig::builder()
//!     .limits(ChartLimits::builder().barchart_max_bars(12).build()?)
//!     .chart_types([ChartType::Barchart, ChartType::Lineplot])
//!     .datacap(20_000)
//!     .build()?;
//! ```

pub mod charts;
pub mod classifier;
pub mod config;
pub mod datagroup;
pub mod error;
pub mod generator;
pub mod schema;
pub mod types;
pub mod utils;

#[cfg(test)]
mod fixtures;

// Re-exports for convenient access
pub use charts::{
    BarchartBuilder, BuildParams, ChartBuilder, ChoroplethBuilder, DonutBuilder, LineplotBuilder,
    StackedAreaBuilder, TopojsonProvider, TopojsonRegistry, TreemapBuilder,
};
pub use classifier::{ColumnClassifier, classify};
pub use config::{
    ChartLimits, ChartLimitsBuilder, ConfigValidationError, DEFAULT_DATACAP, GeneratorConfig,
    GeneratorConfigBuilder,
};
pub use datagroup::{AxisLevel, AxisSeries, CategoryAxis, Datagroup, MeasureRange, build_datagroup};
pub use error::{ChartError, Result as ChartResult, ResultExt};
pub use generator::observer::{
    ChartEvent, ChartObserver, ClosureChartObserver, Diagnostics, RejectionReason,
};
pub use generator::{ChartGenerator, ChartGeneratorBuilder, generate_charts};
pub use schema::{Aggregator, Cube, Dimension, DimensionType, Hierarchy, Level, Measure, Property};
pub use types::{
    Chart, ChartType, Column, DataPoint, Dataset, Orientation, SeriesBinding, TopojsonConfig,
    Value, ValueBinding, ValueType,
};
pub use utils::{PartialPermutations, partial_permutations, stable_key};
