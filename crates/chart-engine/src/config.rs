//! Configuration types for chart generation.
//!
//! [`ChartLimits`] holds the thresholds that bound the combinatorial search
//! and reject unreadable charts. [`GeneratorConfig`] adds the chart types to
//! build and the row cap used while analysing a dataset. Both are built with
//! a fluent builder and validated on `build()`.

use crate::types::ChartType;
use serde::{Deserialize, Serialize};

/// Default number of rows analysed for ranges and member sets.
pub const DEFAULT_DATACAP: usize = 500_000;

/// Thresholds applied by the chart eligibility engines.
///
/// Field names serialize in SCREAMING_SNAKE_CASE (`BARCHART_MAX_BARS`, ...)
/// and missing fields take their default, so a partial JSON object merges
/// over the defaults.
///
/// # Example
///
/// ```rust,ignore
/// use chart_engine::config::ChartLimits;
///
/// let limits: ChartLimits = serde_json::from_str(r#"{"DONUT_SHAPE_MAX": 12}"#)?;
/// assert_eq!(limits.donut_shape_max, 12);
/// assert_eq!(limits.barchart_max_bars, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct ChartLimits {
    /// Max members on the main axis of a barchart.
    /// Default: 20
    pub barchart_max_bars: usize,

    /// Max members on the stacked axis of a barchart.
    /// Default: 10
    pub barchart_max_stacked_bars: usize,

    /// Max members of the category axis paired with time on a vertical barchart.
    /// Default: 20
    pub barchart_year_max_bars: usize,

    /// A time axis with fewer members than this is treated as a plain
    /// category on vertical barcharts. Unset means never.
    /// Default: None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barchart_vertical_max_groups: Option<usize>,

    /// Max members of a donut ring.
    /// Default: 30
    pub donut_shape_max: usize,

    /// Min time members for a lineplot.
    /// Default: 2
    pub lineplot_line_point_min: usize,

    /// Max lines in a lineplot.
    /// Default: 20
    pub lineplot_line_max: usize,

    /// Max product of member counts of the stacked levels.
    /// Default: 200
    pub stacked_shape_max: usize,

    /// Min time members for a stacked area chart.
    /// Default: 2
    pub stacked_time_member_min: usize,

    /// Max product of member counts of the treemap levels.
    /// Default: 1000
    pub tree_map_shape_max: usize,
}

impl Default for ChartLimits {
    fn default() -> Self {
        Self {
            barchart_max_bars: 20,
            barchart_max_stacked_bars: 10,
            barchart_year_max_bars: 20,
            barchart_vertical_max_groups: None,
            donut_shape_max: 30,
            lineplot_line_point_min: 2,
            lineplot_line_max: 20,
            stacked_shape_max: 200,
            stacked_time_member_min: 2,
            tree_map_shape_max: 1000,
        }
    }
}

impl ChartLimits {
    /// Create a new limits builder; unset fields keep their default.
    pub fn builder() -> ChartLimitsBuilder {
        ChartLimitsBuilder::default()
    }

    /// Validate the limits and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let positive = [
            ("BARCHART_MAX_BARS", self.barchart_max_bars),
            ("BARCHART_MAX_STACKED_BARS", self.barchart_max_stacked_bars),
            ("BARCHART_YEAR_MAX_BARS", self.barchart_year_max_bars),
            ("DONUT_SHAPE_MAX", self.donut_shape_max),
            ("LINEPLOT_LINE_POINT_MIN", self.lineplot_line_point_min),
            ("LINEPLOT_LINE_MAX", self.lineplot_line_max),
            ("STACKED_SHAPE_MAX", self.stacked_shape_max),
            ("STACKED_TIME_MEMBER_MIN", self.stacked_time_member_min),
            ("TREE_MAP_SHAPE_MAX", self.tree_map_shape_max),
        ];

        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigValidationError::ZeroLimit(field.to_string()));
            }
        }

        if self.barchart_vertical_max_groups == Some(0) {
            return Err(ConfigValidationError::ZeroLimit(
                "BARCHART_VERTICAL_MAX_GROUPS".to_string(),
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid limit '{0}': must be at least 1")]
    ZeroLimit(String),

    #[error("Invalid datacap: {0} (must be at least 1)")]
    InvalidDatacap(usize),
}

/// Builder for [`ChartLimits`] with fluent API.
#[derive(Debug, Default)]
pub struct ChartLimitsBuilder {
    barchart_max_bars: Option<usize>,
    barchart_max_stacked_bars: Option<usize>,
    barchart_year_max_bars: Option<usize>,
    barchart_vertical_max_groups: Option<usize>,
    donut_shape_max: Option<usize>,
    lineplot_line_point_min: Option<usize>,
    lineplot_line_max: Option<usize>,
    stacked_shape_max: Option<usize>,
    stacked_time_member_min: Option<usize>,
    tree_map_shape_max: Option<usize>,
}

impl ChartLimitsBuilder {
    pub fn barchart_max_bars(mut self, value: usize) -> Self {
        self.barchart_max_bars = Some(value);
        self
    }

    pub fn barchart_max_stacked_bars(mut self, value: usize) -> Self {
        self.barchart_max_stacked_bars = Some(value);
        self
    }

    pub fn barchart_year_max_bars(mut self, value: usize) -> Self {
        self.barchart_year_max_bars = Some(value);
        self
    }

    pub fn barchart_vertical_max_groups(mut self, value: usize) -> Self {
        self.barchart_vertical_max_groups = Some(value);
        self
    }

    pub fn donut_shape_max(mut self, value: usize) -> Self {
        self.donut_shape_max = Some(value);
        self
    }

    pub fn lineplot_line_point_min(mut self, value: usize) -> Self {
        self.lineplot_line_point_min = Some(value);
        self
    }

    pub fn lineplot_line_max(mut self, value: usize) -> Self {
        self.lineplot_line_max = Some(value);
        self
    }

    pub fn stacked_shape_max(mut self, value: usize) -> Self {
        self.stacked_shape_max = Some(value);
        self
    }

    pub fn stacked_time_member_min(mut self, value: usize) -> Self {
        self.stacked_time_member_min = Some(value);
        self
    }

    pub fn tree_map_shape_max(mut self, value: usize) -> Self {
        self.tree_map_shape_max = Some(value);
        self
    }

    /// Build the limits, merging set fields over the defaults.
    pub fn build(self) -> Result<ChartLimits, ConfigValidationError> {
        let defaults = ChartLimits::default();
        let limits = ChartLimits {
            barchart_max_bars: self.barchart_max_bars.unwrap_or(defaults.barchart_max_bars),
            barchart_max_stacked_bars: self
                .barchart_max_stacked_bars
                .unwrap_or(defaults.barchart_max_stacked_bars),
            barchart_year_max_bars: self
                .barchart_year_max_bars
                .unwrap_or(defaults.barchart_year_max_bars),
            barchart_vertical_max_groups: self
                .barchart_vertical_max_groups
                .or(defaults.barchart_vertical_max_groups),
            donut_shape_max: self.donut_shape_max.unwrap_or(defaults.donut_shape_max),
            lineplot_line_point_min: self
                .lineplot_line_point_min
                .unwrap_or(defaults.lineplot_line_point_min),
            lineplot_line_max: self.lineplot_line_max.unwrap_or(defaults.lineplot_line_max),
            stacked_shape_max: self.stacked_shape_max.unwrap_or(defaults.stacked_shape_max),
            stacked_time_member_min: self
                .stacked_time_member_min
                .unwrap_or(defaults.stacked_time_member_min),
            tree_map_shape_max: self.tree_map_shape_max.unwrap_or(defaults.tree_map_shape_max),
        };

        limits.validate()?;
        Ok(limits)
    }
}

/// Configuration for a [`crate::ChartGenerator`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Eligibility thresholds.
    pub limits: ChartLimits,

    /// Chart types to build, in engine invocation order. An empty list runs
    /// no engine, so generation yields no charts.
    /// Default: all six
    pub chart_types: Vec<ChartType>,

    /// Max rows analysed for measure ranges and member sets.
    /// Default: 500,000
    pub datacap: usize,

    /// Opaque per-chart-type settings copied into each chart's `extra_config`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chart_config: Vec<(ChartType, serde_json::Map<String, serde_json::Value>)>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            limits: ChartLimits::default(),
            chart_types: ChartType::ALL.to_vec(),
            datacap: DEFAULT_DATACAP,
            chart_config: Vec::new(),
        }
    }
}

impl GeneratorConfig {
    pub fn builder() -> GeneratorConfigBuilder {
        GeneratorConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.limits.validate()?;
        if self.datacap == 0 {
            return Err(ConfigValidationError::InvalidDatacap(self.datacap));
        }
        Ok(())
    }

    /// Settings registered for a chart type, if any.
    pub fn extra_config_for(
        &self,
        chart_type: ChartType,
    ) -> serde_json::Map<String, serde_json::Value> {
        self.chart_config
            .iter()
            .find(|(kind, _)| *kind == chart_type)
            .map(|(_, config)| config.clone())
            .unwrap_or_default()
    }
}

/// Builder for [`GeneratorConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct GeneratorConfigBuilder {
    limits: Option<ChartLimits>,
    chart_types: Option<Vec<ChartType>>,
    datacap: Option<usize>,
    chart_config: Vec<(ChartType, serde_json::Map<String, serde_json::Value>)>,
}

impl GeneratorConfigBuilder {
    pub fn limits(mut self, limits: ChartLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Restrict generation to these chart types.
    ///
    /// Duplicates are dropped, keeping the first occurrence.
    pub fn chart_types(mut self, chart_types: impl IntoIterator<Item = ChartType>) -> Self {
        let mut unique: Vec<ChartType> = Vec::new();
        for chart_type in chart_types {
            if !unique.contains(&chart_type) {
                unique.push(chart_type);
            }
        }
        self.chart_types = Some(unique);
        self
    }

    pub fn datacap(mut self, datacap: usize) -> Self {
        self.datacap = Some(datacap);
        self
    }

    pub fn chart_config(
        mut self,
        chart_type: ChartType,
        config: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        self.chart_config.retain(|(kind, _)| *kind != chart_type);
        self.chart_config.push((chart_type, config));
        self
    }

    pub fn build(self) -> Result<GeneratorConfig, ConfigValidationError> {
        let config = GeneratorConfig {
            limits: self.limits.unwrap_or_default(),
            chart_types: self.chart_types.unwrap_or_else(|| ChartType::ALL.to_vec()),
            datacap: self.datacap.unwrap_or(DEFAULT_DATACAP),
            chart_config: self.chart_config,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = ChartLimits::default();
        assert_eq!(limits.barchart_max_bars, 20);
        assert_eq!(limits.barchart_max_stacked_bars, 10);
        assert_eq!(limits.barchart_year_max_bars, 20);
        assert_eq!(limits.barchart_vertical_max_groups, None);
        assert_eq!(limits.donut_shape_max, 30);
        assert_eq!(limits.lineplot_line_point_min, 2);
        assert_eq!(limits.lineplot_line_max, 20);
        assert_eq!(limits.stacked_shape_max, 200);
        assert_eq!(limits.stacked_time_member_min, 2);
        assert_eq!(limits.tree_map_shape_max, 1000);
    }

    #[test]
    fn test_limits_merge_from_partial_json() {
        let json = r#"{"BARCHART_MAX_BARS": 5, "BARCHART_VERTICAL_MAX_GROUPS": 4}"#;
        let limits: ChartLimits = serde_json::from_str(json).unwrap();
        assert_eq!(limits.barchart_max_bars, 5);
        assert_eq!(limits.barchart_vertical_max_groups, Some(4));
        assert_eq!(limits.tree_map_shape_max, 1000);
    }

    #[test]
    fn test_limits_serialize_screaming_names() {
        let json = serde_json::to_string(&ChartLimits::default()).unwrap();
        assert!(json.contains("\"TREE_MAP_SHAPE_MAX\":1000"));
        assert!(!json.contains("BARCHART_VERTICAL_MAX_GROUPS"));
    }

    #[test]
    fn test_limits_builder() {
        let limits = ChartLimits::builder()
            .barchart_max_bars(8)
            .stacked_shape_max(50)
            .build()
            .unwrap();
        assert_eq!(limits.barchart_max_bars, 8);
        assert_eq!(limits.stacked_shape_max, 50);
        assert_eq!(limits.donut_shape_max, 30);
    }

    #[test]
    fn test_limits_validation_rejects_zero() {
        let result = ChartLimits::builder().donut_shape_max(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::ZeroLimit(field) if field == "DONUT_SHAPE_MAX"
        ));
    }

    #[test]
    fn test_generator_config_defaults() {
        let config = GeneratorConfig::builder().build().unwrap();
        assert_eq!(config.chart_types, ChartType::ALL.to_vec());
        assert_eq!(config.datacap, DEFAULT_DATACAP);
    }

    #[test]
    fn test_generator_config_dedups_chart_types() {
        let config = GeneratorConfig::builder()
            .chart_types([ChartType::Donut, ChartType::Barchart, ChartType::Donut])
            .build()
            .unwrap();
        assert_eq!(config.chart_types, vec![ChartType::Donut, ChartType::Barchart]);
    }

    #[test]
    fn test_generator_config_validation() {
        assert!(matches!(
            GeneratorConfig::builder().datacap(0).build().unwrap_err(),
            ConfigValidationError::InvalidDatacap(0)
        ));
    }

    #[test]
    fn test_generator_config_accepts_empty_chart_types() {
        let config = GeneratorConfig::builder().chart_types([]).build().unwrap();
        assert!(config.chart_types.is_empty());
    }

    #[test]
    fn test_extra_config_lookup() {
        let mut settings = serde_json::Map::new();
        settings.insert("legend".to_string(), serde_json::json!(false));
        let config = GeneratorConfig::builder()
            .chart_config(ChartType::Treemap, settings)
            .build()
            .unwrap();
        assert_eq!(
            config.extra_config_for(ChartType::Treemap)["legend"],
            serde_json::json!(false)
        );
        assert!(config.extra_config_for(ChartType::Donut).is_empty());
    }
}
