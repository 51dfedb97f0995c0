//! OLAP schema entities referenced by dataset columns.
//!
//! A [`Cube`] groups measures and dimensions. Dimensions hold hierarchies,
//! hierarchies hold levels ordered from coarse to fine, and levels may carry
//! supplemental properties. These types mirror what a schema endpoint returns
//! and are deserialized directly from its JSON.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Free-form key/value metadata attached to schema entities.
pub type Annotations = IndexMap<String, String>;

/// Annotation holding a measure's units of measurement.
pub const UNITS_ANNOTATION: &str = "units_of_measurement";

/// Annotation holding a comma-separated list of level members to drop.
pub const EXCLUDE_MEMBERS_ANNOTATION: &str = "exclude_members";

/// Annotation marking a property as an alternate caption for its level.
pub const CAPTION_SET_ANNOTATION: &str = "caption_set";

/// Aggregation method of a measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Aggregator {
    #[default]
    Sum,
    Count,
    Average,
    Median,
    Max,
    Min,
    Mode,
    WeightedAverage,
    BasicGroupedMedian,
    ReplicateWeightMoe,
    CalculatedMoe,
    #[serde(other)]
    Unknown,
}

/// Kind of dimension; decides whether its hierarchies become time, geo or
/// standard category axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DimensionType {
    #[default]
    Standard,
    Time,
    Geo,
}

/// How an attached measure relates to its parent measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    Collection,
    Source,
    Moe,
    Uci,
    Lci,
}

/// A numeric fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default)]
    pub aggregator: Aggregator,
    #[serde(default)]
    pub annotations: Annotations,
    /// Error, collection and source measures riding along with this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attached: Vec<AttachedMeasure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachedMeasure {
    pub relationship: Relationship,
    pub measure: Measure,
}

impl Measure {
    pub fn new(name: impl Into<String>, aggregator: Aggregator) -> Self {
        Self {
            name: name.into(),
            caption: None,
            aggregator,
            annotations: Annotations::new(),
            attached: Vec::new(),
        }
    }

    /// Set the units of measurement annotation.
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.annotations
            .insert(UNITS_ANNOTATION.to_string(), units.into());
        self
    }

    /// Attach a sub-measure with the given relationship.
    pub fn with_attached(mut self, relationship: Relationship, measure: Measure) -> Self {
        self.attached.push(AttachedMeasure {
            relationship,
            measure,
        });
        self
    }

    pub fn units(&self) -> Option<&str> {
        self.annotations.get(UNITS_ANNOTATION).map(String::as_str)
    }

    /// SUM and COUNT measures can be added up across category members.
    pub fn is_summable(&self) -> bool {
        matches!(self.aggregator, Aggregator::Sum | Aggregator::Count)
    }

    /// Percentages and rates are meaningful per member without summing.
    pub fn is_ratio(&self) -> bool {
        matches!(self.units(), Some("Percentage" | "Rate"))
    }
}

/// A supplemental attribute attached to a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(default)]
    pub annotations: Annotations,
}

impl Property {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: Annotations::new(),
        }
    }

    /// Whether this property is an alternate, human-readable caption.
    pub fn is_caption(&self) -> bool {
        self.annotations.contains_key(CAPTION_SET_ANNOTATION)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    /// 1-based position within its hierarchy; smaller is coarser.
    pub depth: usize,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub annotations: Annotations,
}

impl Level {
    pub fn new(name: impl Into<String>, depth: usize) -> Self {
        Self {
            name: name.into(),
            depth,
            properties: Vec::new(),
            annotations: Annotations::new(),
        }
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    /// Members listed in the `exclude_members` annotation.
    pub fn excluded_members(&self) -> Vec<String> {
        self.annotations
            .get(EXCLUDE_MEMBERS_ANNOTATION)
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hierarchy {
    pub name: String,
    pub levels: Vec<Level>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    #[serde(rename = "type", default)]
    pub dimension_type: DimensionType,
    pub hierarchies: Vec<Hierarchy>,
    #[serde(default)]
    pub annotations: Annotations,
}

/// A cube: the unit a query runs against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cube {
    pub name: String,
    pub measures: Vec<Measure>,
    pub dimensions: Vec<Dimension>,
    #[serde(default)]
    pub annotations: Annotations,
}
