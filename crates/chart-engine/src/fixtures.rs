//! Shared test fixtures: a small retail cube and dataset builders.

use crate::datagroup::{Datagroup, build_datagroup};
use crate::schema::{
    Aggregator, Cube, Dimension, DimensionType, Hierarchy, Level, Measure, Property, Relationship,
};
use crate::types::{DataPoint, Dataset, Value};
use std::sync::Arc;

fn dimension(
    name: &str,
    dimension_type: DimensionType,
    hierarchy: &str,
    levels: Vec<Level>,
) -> Dimension {
    Dimension {
        name: name.to_string(),
        dimension_type,
        hierarchies: vec![Hierarchy {
            name: hierarchy.to_string(),
            levels,
        }],
        annotations: Default::default(),
    }
}

/// Retail cube: Date (time), Geography (geo), Product and Channel (standard).
pub(crate) fn cube() -> Cube {
    Cube {
        name: "retail".to_string(),
        measures: vec![
            Measure::new("Sales", Aggregator::Sum).with_attached(
                Relationship::Moe,
                Measure::new("Sales MOE", Aggregator::CalculatedMoe),
            ),
            Measure::new("Margin", Aggregator::Average).with_units("Percentage"),
            Measure::new("Price", Aggregator::Average),
            Measure::new("Profit", Aggregator::Sum),
        ],
        dimensions: vec![
            dimension(
                "Date",
                DimensionType::Time,
                "Date",
                vec![Level::new("Year", 1), Level::new("Month", 2)],
            ),
            dimension(
                "Geography",
                DimensionType::Geo,
                "Geography",
                vec![
                    Level::new("State", 1).with_property(Property::new("Population")),
                    Level::new("City", 2),
                ],
            ),
            dimension(
                "Product",
                DimensionType::Standard,
                "Product",
                vec![Level::new("Category", 1), Level::new("Subcategory", 2)],
            ),
            dimension(
                "Channel",
                DimensionType::Standard,
                "Channel",
                vec![Level::new("Channel", 1)],
            ),
        ],
        annotations: Default::default(),
    }
}

pub(crate) fn row(pairs: &[(&str, Value)]) -> DataPoint {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

/// `n` string members: "{prefix} 1" .. "{prefix} n".
pub(crate) fn members(prefix: &str, n: usize) -> Vec<Value> {
    (1..=n).map(|i| Value::from(format!("{prefix} {i}"))).collect()
}

/// `n` consecutive years starting at 2001.
pub(crate) fn years(n: usize) -> Vec<Value> {
    (0..n).map(|i| Value::from(2001.0 + i as f64)).collect()
}

/// Every combination of the given axis members, one row each, with each
/// measure column filled by `value(row_index)`.
pub(crate) fn grid_dataset(
    axes: &[(&str, Vec<Value>)],
    measures: &[&str],
    value: impl Fn(usize) -> f64,
) -> Dataset {
    let mut combos: Vec<Vec<(&str, Value)>> = vec![Vec::new()];
    for (column, values) in axes {
        combos = combos
            .into_iter()
            .flat_map(|prefix| {
                values.iter().map(move |member| {
                    let mut next = prefix.clone();
                    next.push((*column, member.clone()));
                    next
                })
            })
            .collect();
    }

    let rows = combos
        .into_iter()
        .enumerate()
        .map(|(index, mut cells)| {
            for measure in measures {
                cells.push((*measure, Value::from(value(index))));
            }
            row(&cells)
        })
        .collect();

    Dataset::from_schema(&cube(), rows, "en").expect("fixture columns match the cube")
}

pub(crate) fn datagroup(dataset: &Dataset) -> Arc<Datagroup> {
    Arc::new(build_datagroup(dataset).expect("fixture datagroup builds"))
}

/// 8 rows: 2 years x 2 states (ID + label + population) x 2 categories.
pub(crate) fn sales_dataset() -> Dataset {
    let mut rows = Vec::new();
    let mut toys = [10.0, 20.0, 30.0, 40.0].into_iter();
    let mut games = [5.0, 6.0, 7.0, 8.0].into_iter();
    for year in [2020, 2021] {
        for (id, label, population) in [("CA", "California", 39.0), ("OH", "Ohio", 11.0)] {
            for category in ["Games", "Toys"] {
                let sales = if category == "Toys" {
                    toys.next()
                } else {
                    games.next()
                };
                rows.push(row(&[
                    ("Year", year.into()),
                    ("State ID", id.into()),
                    ("State", label.into()),
                    ("Population", population.into()),
                    ("Category", category.into()),
                    ("Sales", sales.unwrap_or_default().into()),
                    ("Sales MOE", 1.0.into()),
                ]));
            }
        }
    }
    Dataset::from_schema(&cube(), rows, "en").expect("fixture columns match the cube")
}
