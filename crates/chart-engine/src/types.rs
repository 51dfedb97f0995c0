//! Core data types: dataset rows and columns on the way in, chart
//! descriptors on the way out.

use crate::datagroup::{AxisSeries, CategoryAxis, Datagroup};
use crate::schema::{DimensionType, Level, Measure, Property, Relationship};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

// ============================================================================
// Dataset
// ============================================================================

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

/// Primitive type of a non-null [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Number,
    Boolean,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

impl Value {
    /// `None` for null values.
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(ValueType::Boolean),
            Value::Number(_) => Some(ValueType::Number),
            Value::String(_) => Some(ValueType::String),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Canonical string form, used as map key for per-member lookups.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

/// One row of a result set, keyed by column name.
pub type DataPoint = IndexMap<String, Value>;

/// A column that references a measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureColumn {
    pub name: String,
    pub measure: Measure,
    /// Set when this column is an error/collection measure of another.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_measure: Option<Measure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_relationship: Option<Relationship>,
}

/// A column that references a level of a hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelColumn {
    pub name: String,
    pub dimension: String,
    pub dimension_type: DimensionType,
    pub hierarchy: String,
    pub level: Level,
    /// This column holds the raw member identifier.
    pub is_id: bool,
    /// This column holds only the label; a sibling `<name> ID` column exists.
    pub has_id: bool,
}

/// A column that references a property attached to a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyColumn {
    pub name: String,
    pub dimension: String,
    pub hierarchy: String,
    pub level: Level,
    pub property: Property,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Column {
    Measure(MeasureColumn),
    Level(LevelColumn),
    Property(PropertyColumn),
}

impl Column {
    pub fn name(&self) -> &str {
        match self {
            Column::Measure(c) => &c.name,
            Column::Level(c) => &c.name,
            Column::Property(c) => &c.name,
        }
    }
}

/// A classified result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub columns: IndexMap<String, Column>,
    pub data: Vec<DataPoint>,
    pub locale: String,
}

impl Dataset {
    pub fn new(
        columns: IndexMap<String, Column>,
        data: Vec<DataPoint>,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            columns,
            data,
            locale: locale.into(),
        }
    }

    /// Datasets without rows or locale produce no charts.
    pub fn is_chartable(&self) -> bool {
        !self.data.is_empty() && !self.locale.is_empty()
    }
}

// ============================================================================
// Charts
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Barchart,
    Choropleth,
    Donut,
    Lineplot,
    Stackedarea,
    Treemap,
}

impl ChartType {
    /// Every chart type, in default engine invocation order.
    pub const ALL: [ChartType; 6] = [
        ChartType::Barchart,
        ChartType::Choropleth,
        ChartType::Donut,
        ChartType::Lineplot,
        ChartType::Stackedarea,
        ChartType::Treemap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Barchart => "barchart",
            ChartType::Choropleth => "choropleth",
            ChartType::Donut => "donut",
            ChartType::Lineplot => "lineplot",
            ChartType::Stackedarea => "stackedarea",
            ChartType::Treemap => "treemap",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChartType::ALL
            .into_iter()
            .find(|chart_type| chart_type.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown chart type '{s}'"))
    }
}

/// The measure a chart plots, with its observed range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueBinding {
    pub measure: Measure,
    pub min_value: f64,
    pub max_value: f64,
}

/// One level of one axis, bound to a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesBinding {
    pub dimension: String,
    pub dimension_type: DimensionType,
    pub hierarchy: String,
    pub level: String,
    pub depth: usize,
    /// Column holding the member identifiers.
    pub column: String,
    pub value_type: ValueType,
    pub members: Vec<Value>,
    /// Columns holding human-readable renderings of the members.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub captions: Vec<String>,
}

impl SeriesBinding {
    pub fn new(axis: &CategoryAxis, series: &AxisSeries) -> Self {
        Self {
            dimension: axis.dimension.clone(),
            dimension_type: axis.dimension_type,
            hierarchy: axis.hierarchy.clone(),
            level: series.level.name.clone(),
            depth: series.level.depth,
            column: series.name.clone(),
            value_type: series.value_type,
            members: series.members.clone(),
            captions: series.captions.keys().cloned().collect(),
        }
    }
}

/// Map geometry for a choropleth level, supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TopojsonConfig {
    /// Path or URL of the topojson file.
    pub topojson: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topojson_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topojson_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<String>,
}

impl TopojsonConfig {
    pub fn new(topojson: impl Into<String>) -> Self {
        Self {
            topojson: topojson.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// The member a small-multiple choropleth is scoped to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberSplit {
    pub level: SeriesBinding,
    pub member: Value,
}

/// Fields shared by every chart variant.
#[derive(Debug, Clone, Serialize)]
pub struct ChartBase {
    pub key: String,
    /// Source of the chart's rows; small multiples hold a scoped copy.
    #[serde(skip)]
    pub datagroup: Arc<Datagroup>,
    pub values: ValueBinding,
    pub series: Vec<SeriesBinding>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra_config: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BarChart {
    #[serde(flatten)]
    pub base: ChartBase,
    pub orientation: Orientation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<SeriesBinding>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChoroplethChart {
    #[serde(flatten)]
    pub base: ChartBase,
    pub topojson: TopojsonConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split: Option<MemberSplit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<SeriesBinding>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DonutChart {
    #[serde(flatten)]
    pub base: ChartBase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<SeriesBinding>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinePlot {
    #[serde(flatten)]
    pub base: ChartBase,
    pub timeline: SeriesBinding,
}

#[derive(Debug, Clone, Serialize)]
pub struct StackedAreaChart {
    #[serde(flatten)]
    pub base: ChartBase,
    pub timeline: SeriesBinding,
}

#[derive(Debug, Clone, Serialize)]
pub struct TreemapChart {
    #[serde(flatten)]
    pub base: ChartBase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<SeriesBinding>,
}

/// A fully-parameterized chart descriptor.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Chart {
    Barchart(BarChart),
    Choropleth(ChoroplethChart),
    Donut(DonutChart),
    Lineplot(LinePlot),
    Stackedarea(StackedAreaChart),
    Treemap(TreemapChart),
}

impl Chart {
    pub fn chart_type(&self) -> ChartType {
        match self {
            Chart::Barchart(_) => ChartType::Barchart,
            Chart::Choropleth(_) => ChartType::Choropleth,
            Chart::Donut(_) => ChartType::Donut,
            Chart::Lineplot(_) => ChartType::Lineplot,
            Chart::Stackedarea(_) => ChartType::Stackedarea,
            Chart::Treemap(_) => ChartType::Treemap,
        }
    }

    pub fn base(&self) -> &ChartBase {
        match self {
            Chart::Barchart(c) => &c.base,
            Chart::Choropleth(c) => &c.base,
            Chart::Donut(c) => &c.base,
            Chart::Lineplot(c) => &c.base,
            Chart::Stackedarea(c) => &c.base,
            Chart::Treemap(c) => &c.base,
        }
    }

    pub fn key(&self) -> &str {
        &self.base().key
    }

    pub fn values(&self) -> &ValueBinding {
        &self.base().values
    }

    pub fn series(&self) -> &[SeriesBinding] {
        &self.base().series
    }

    pub fn timeline(&self) -> Option<&SeriesBinding> {
        match self {
            Chart::Barchart(c) => c.timeline.as_ref(),
            Chart::Choropleth(c) => c.timeline.as_ref(),
            Chart::Donut(c) => c.timeline.as_ref(),
            Chart::Lineplot(c) => Some(&c.timeline),
            Chart::Stackedarea(c) => Some(&c.timeline),
            Chart::Treemap(c) => c.timeline.as_ref(),
        }
    }

    pub fn datagroup(&self) -> &Arc<Datagroup> {
        &self.base().datagroup
    }
}
