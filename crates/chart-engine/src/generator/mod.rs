//! Chart generation orchestrator.
//!
//! [`ChartGenerator`] ties the pieces together: for each chartable dataset
//! it builds the datagroup once, runs every requested engine over it and
//! concatenates the results in engine order. A failing engine loses only its
//! own charts for that dataset.

pub mod observer;

use crate::charts::{BuildParams, ChartBuilder, TopojsonProvider, builtin};
use crate::config::GeneratorConfig;
use crate::datagroup::Datagroup;
use crate::error::{ChartError, Result, ResultExt};
use crate::types::{Chart, ChartType, Dataset};
use observer::{ChartEvent, ChartObserver, ClosureChartObserver, Diagnostics};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Generates chart descriptors for classified datasets.
///
/// Use [`ChartGenerator::builder()`] to configure limits, chart types,
/// geometry and diagnostics.
///
/// # Example
///
/// ```rust,ignore
/// use chart_engine::{ChartGenerator, GeneratorConfig, TopojsonConfig};
///
/// let generator = ChartGenerator::builder()
///     .config(GeneratorConfig::default())
///     .topojson(|level: &Level| {
///         (level.name == "State").then(|| TopojsonConfig::new("states.json"))
///     })
///     .on_event(|event| println!("{event:?}"))
///     .build()?;
///
/// let charts = generator.generate(&datasets)?;
/// ```
pub struct ChartGenerator {
    config: GeneratorConfig,
    engines: Vec<Arc<dyn ChartBuilder>>,
    topojson: Option<Arc<dyn TopojsonProvider>>,
    diagnostics: Diagnostics,
}

static_assertions::assert_impl_all!(ChartGenerator: Send, Sync);

impl ChartGenerator {
    pub fn builder() -> ChartGeneratorBuilder {
        ChartGeneratorBuilder::default()
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Chart types this generator runs, in invocation order.
    pub fn chart_types(&self) -> Vec<ChartType> {
        self.engines.iter().map(|engine| engine.chart_type()).collect()
    }

    /// Every chart the datasets support, datasets in input order and engines
    /// in configured order within each dataset.
    ///
    /// Datasets without rows or locale are skipped. Duplicate keys across
    /// engines are kept; deduplication belongs to the consumer.
    ///
    /// # Errors
    ///
    /// Fails when a dataset cannot be modelled (mixed column types, or a
    /// measure holding non-numbers). Engine failures are not errors.
    pub fn generate(&self, datasets: &[Dataset]) -> Result<Vec<Chart>> {
        let mut charts = Vec::new();
        for (index, dataset) in datasets.iter().enumerate() {
            if !dataset.is_chartable() {
                let reason = if dataset.data.is_empty() {
                    "dataset has no rows"
                } else {
                    "dataset has no locale"
                };
                debug!(index, reason, "Skipping dataset");
                self.diagnostics.emit(ChartEvent::DatasetSkipped {
                    index,
                    reason: reason.to_string(),
                });
                continue;
            }
            charts.extend(self.generate_dataset(index, dataset)?);
        }
        Ok(charts)
    }

    fn generate_dataset(&self, index: usize, dataset: &Dataset) -> Result<Vec<Chart>> {
        let datagroup = Datagroup::build(dataset, self.config.datacap)
            .context(format!("While building datagroup for dataset {index}"))?;
        let datagroup = Arc::new(datagroup);

        self.diagnostics.emit(ChartEvent::DatagroupBuilt {
            index,
            rows: datagroup.row_count(),
            measures: datagroup.measure_columns.len(),
            axes: datagroup.category_axis_count(),
            has_time: datagroup.time_hierarchy.is_some(),
        });

        let mut charts = Vec::new();
        for engine in &self.engines {
            let chart_type = engine.chart_type();
            let params = BuildParams {
                topojson: self.topojson.clone(),
                diagnostics: self.diagnostics.clone(),
                extra_config: self.config.extra_config_for(chart_type),
            };

            match engine.build(&datagroup, &self.config.limits, &params) {
                Ok(built) => {
                    debug!(%chart_type, count = built.len(), "Engine finished");
                    self.diagnostics.emit(ChartEvent::ChartsBuilt {
                        chart_type,
                        count: built.len(),
                    });
                    charts.extend(built);
                }
                Err(e) => {
                    warn!(%chart_type, error = %e, "Chart engine failed; skipping its charts");
                    self.diagnostics.emit(ChartEvent::EngineFailed {
                        chart_type,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            index,
            rows = datagroup.row_count(),
            charts = charts.len(),
            "Generated charts for dataset"
        );
        Ok(charts)
    }
}

/// One-shot generation with a config and no geometry or observer.
pub fn generate_charts(datasets: &[Dataset], config: &GeneratorConfig) -> Result<Vec<Chart>> {
    ChartGenerator::builder()
        .config(config.clone())
        .build()?
        .generate(datasets)
}

/// Builder for [`ChartGenerator`].
#[derive(Default)]
pub struct ChartGeneratorBuilder {
    config: Option<GeneratorConfig>,
    topojson: Option<Arc<dyn TopojsonProvider>>,
    observer: Option<Arc<dyn ChartObserver>>,
    engines: Vec<Arc<dyn ChartBuilder>>,
}

static_assertions::assert_impl_all!(ChartGeneratorBuilder: Send);

impl ChartGeneratorBuilder {
    pub fn config(mut self, config: GeneratorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Geometry source for choropleth maps. Without one, no maps are made.
    pub fn topojson<P>(mut self, provider: P) -> Self
    where
        P: TopojsonProvider + 'static,
    {
        self.topojson = Some(Arc::new(provider));
        self
    }

    pub fn observer(mut self, observer: Arc<dyn ChartObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Set a diagnostics callback closure.
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ChartEvent) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(ClosureChartObserver::new(callback)));
        self
    }

    /// Replace the built-in engine for `engine.chart_type()`.
    ///
    /// The engine only runs when its chart type is enabled in the config.
    pub fn engine<E>(mut self, engine: E) -> Self
    where
        E: ChartBuilder + 'static,
    {
        let engine: Arc<dyn ChartBuilder> = Arc::new(engine);
        self.engines
            .retain(|existing| existing.chart_type() != engine.chart_type());
        self.engines.push(engine);
        self
    }

    /// Build the generator.
    ///
    /// # Errors
    ///
    /// Returns [`ChartError::InvalidConfig`] when the configuration fails
    /// validation.
    pub fn build(self) -> Result<ChartGenerator> {
        let config = self.config.unwrap_or_default();
        config
            .validate()
            .map_err(|e| ChartError::InvalidConfig(e.to_string()))?;

        let engines = config
            .chart_types
            .iter()
            .map(|&chart_type| {
                self.engines
                    .iter()
                    .find(|engine| engine.chart_type() == chart_type)
                    .cloned()
                    .unwrap_or_else(|| Arc::from(builtin(chart_type)))
            })
            .collect();

        Ok(ChartGenerator {
            config,
            engines,
            topojson: self.topojson,
            diagnostics: self.observer.map(Diagnostics::new).unwrap_or_default(),
        })
    }
}
