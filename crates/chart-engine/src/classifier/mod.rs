//! Column classification against an OLAP schema.
//!
//! Every column of a result set must be explained by the cube it was queried
//! from: it is either a measure (possibly an error/collection sub-measure),
//! a level (as its raw identifier or as its display label), or a property
//! attached to a level. A column that matches nothing is fatal for the whole
//! dataset.

mod entities;

use crate::error::{ChartError, Result};
use crate::schema::Cube;
use crate::types::{
    Column, DataPoint, Dataset, LevelColumn, MeasureColumn, PropertyColumn,
};
use entities::{find_level, find_measure, find_property};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Suffix tesseract-style servers append to identifier columns.
pub const ID_SUFFIX: &str = " ID";

static ID_COLUMN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<base>.+) ID$").expect("Invalid regex: ID column"));

/// Split `"State ID"` into `Some("State")`; `None` for non-ID names.
pub(crate) fn strip_id_suffix(name: &str) -> Option<&str> {
    ID_COLUMN
        .captures(name)
        .and_then(|caps| caps.name("base"))
        .map(|base| base.as_str())
}

/// Classify one column of a result set.
///
/// Resolution order: measures (including attached sub-measures) by exact
/// name, then levels by bare or ID-suffixed name, then level properties.
///
/// # Errors
///
/// Returns [`ChartError::MissingEntity`] when no schema entity matches.
pub fn classify(name: &str, cube: &Cube, all_columns: &[String]) -> Result<Column> {
    if let Some((measure, parent)) = find_measure(&cube.measures, name) {
        return Ok(Column::Measure(MeasureColumn {
            name: name.to_string(),
            measure: measure.clone(),
            parent_measure: parent.map(|(parent, _)| parent.clone()),
            parent_relationship: parent.map(|(_, relationship)| relationship),
        }));
    }

    let has_sibling_id = |label: &str| {
        all_columns
            .iter()
            .any(|column| column == &format!("{label}{ID_SUFFIX}"))
    };

    // Exact match first, so a level whose own name ends in " ID" still works.
    if let Some(found) = find_level(cube, name) {
        let has_id = has_sibling_id(name);
        return Ok(Column::Level(LevelColumn {
            name: name.to_string(),
            dimension: found.dimension.name.clone(),
            dimension_type: found.dimension.dimension_type,
            hierarchy: found.hierarchy.name.clone(),
            level: found.level.clone(),
            is_id: !has_id,
            has_id,
        }));
    }

    if let Some(base) = strip_id_suffix(name)
        && let Some(found) = find_level(cube, base)
    {
        return Ok(Column::Level(LevelColumn {
            name: name.to_string(),
            dimension: found.dimension.name.clone(),
            dimension_type: found.dimension.dimension_type,
            hierarchy: found.hierarchy.name.clone(),
            level: found.level.clone(),
            is_id: true,
            has_id: false,
        }));
    }

    if let Some((found, property)) = find_property(cube, name) {
        return Ok(Column::Property(PropertyColumn {
            name: name.to_string(),
            dimension: found.dimension.name.clone(),
            hierarchy: found.hierarchy.name.clone(),
            level: found.level.clone(),
            property: property.clone(),
        }));
    }

    Err(ChartError::MissingEntity {
        column: name.to_string(),
        cube: cube.name.clone(),
    })
}

/// Classifies every column of a raw result set against one cube.
pub struct ColumnClassifier<'a> {
    cube: &'a Cube,
}

impl<'a> ColumnClassifier<'a> {
    pub fn new(cube: &'a Cube) -> Self {
        Self { cube }
    }

    /// Column names in first-seen order across all rows.
    pub fn column_names(rows: &[DataPoint]) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for row in rows {
            for key in row.keys() {
                if !names.contains(key) {
                    names.push(key.clone());
                }
            }
        }
        names
    }

    /// Classify all named columns.
    pub fn classify_all(&self, names: &[String]) -> Result<IndexMap<String, Column>> {
        names
            .iter()
            .map(|name| {
                let column = classify(name, self.cube, names)?;
                debug!(column = %name, kind = column_kind(&column), "Classified column");
                Ok((name.clone(), column))
            })
            .collect()
    }

    /// Build a [`Dataset`] from raw rows, classifying every column found.
    pub fn build_dataset(
        &self,
        rows: Vec<DataPoint>,
        locale: impl Into<String>,
    ) -> Result<Dataset> {
        let names = Self::column_names(&rows);
        let columns = self.classify_all(&names)?;
        Ok(Dataset::new(columns, rows, locale))
    }
}

fn column_kind(column: &Column) -> &'static str {
    match column {
        Column::Measure(_) => "measure",
        Column::Level(_) => "level",
        Column::Property(_) => "property",
    }
}

impl Dataset {
    /// Classify the columns of `rows` against `cube` and wrap them.
    pub fn from_schema(
        cube: &Cube,
        rows: Vec<DataPoint>,
        locale: impl Into<String>,
    ) -> Result<Dataset> {
        ColumnClassifier::new(cube).build_dataset(rows, locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::schema::{DimensionType, Relationship};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_strip_id_suffix() {
        assert_eq!(strip_id_suffix("State ID"), Some("State"));
        assert_eq!(strip_id_suffix("State"), None);
        assert_eq!(strip_id_suffix(" ID"), None);
    }

    #[test]
    fn test_classify_measure() {
        let cube = fixtures::cube();
        let column = classify("Sales", &cube, &names(&["Sales"])).unwrap();
        match column {
            Column::Measure(m) => {
                assert_eq!(m.measure.name, "Sales");
                assert!(m.parent_measure.is_none());
            }
            other => panic!("expected measure, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_attached_measure() {
        let cube = fixtures::cube();
        let column = classify("Sales MOE", &cube, &names(&["Sales", "Sales MOE"])).unwrap();
        match column {
            Column::Measure(m) => {
                assert_eq!(m.parent_measure.unwrap().name, "Sales");
                assert_eq!(m.parent_relationship, Some(Relationship::Moe));
            }
            other => panic!("expected measure, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_id_and_label_pair() {
        let cube = fixtures::cube();
        let all = names(&["State", "State ID", "Sales"]);

        let Column::Level(id) = classify("State ID", &cube, &all).unwrap() else {
            panic!("expected level");
        };
        assert!(id.is_id);
        assert!(!id.has_id);
        assert_eq!(id.level.name, "State");
        assert_eq!(id.dimension_type, DimensionType::Geo);

        let Column::Level(label) = classify("State", &cube, &all).unwrap() else {
            panic!("expected level");
        };
        assert!(!label.is_id);
        assert!(label.has_id);
    }

    #[test]
    fn test_classify_lone_label_is_id() {
        let cube = fixtures::cube();
        let Column::Level(year) = classify("Year", &cube, &names(&["Year"])).unwrap() else {
            panic!("expected level");
        };
        assert!(year.is_id);
        assert!(!year.has_id);
        assert_eq!(year.dimension_type, DimensionType::Time);
    }

    #[test]
    fn test_classify_property() {
        let cube = fixtures::cube();
        let Column::Property(prop) = classify("Population", &cube, &names(&["Population"])).unwrap()
        else {
            panic!("expected property");
        };
        assert_eq!(prop.level.name, "State");
        assert_eq!(prop.property.name, "Population");
    }

    #[test]
    fn test_classify_missing_entity() {
        let cube = fixtures::cube();
        let err = classify("Mystery", &cube, &names(&["Mystery"])).unwrap_err();
        assert_eq!(err.error_code(), "MISSING_ENTITY");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_build_dataset_keeps_column_order() {
        let cube = fixtures::cube();
        let rows = vec![
            fixtures::row(&[("Year", 2020.into()), ("Sales", 1.0.into())]),
            fixtures::row(&[
                ("Year", 2021.into()),
                ("Category", "Toys".into()),
                ("Sales", 2.0.into()),
            ]),
        ];
        let dataset = Dataset::from_schema(&cube, rows, "en").unwrap();
        let order: Vec<_> = dataset.columns.keys().map(String::as_str).collect();
        assert_eq!(order, vec!["Year", "Sales", "Category"]);
    }

    #[test]
    fn test_build_dataset_fails_on_unknown_column() {
        let cube = fixtures::cube();
        let rows = vec![fixtures::row(&[("Year", 2020.into()), ("Bogus", 1.0.into())])];
        assert!(Dataset::from_schema(&cube, rows, "en").is_err());
    }
}
