//! Per-column statistics: value typing, member sets, sums and ranges.

use crate::error::{ChartError, Result};
use crate::types::{DataPoint, Value, ValueType};
use crate::utils::Collator;
use std::collections::{BTreeMap, HashSet};

/// Sums of every measure, per member key then per measure column.
pub type MemberSums = BTreeMap<String, BTreeMap<String, f64>>;

/// The single primitive type of a column's non-null values.
///
/// Returns `Ok(None)` when the column holds no non-null value.
///
/// # Errors
///
/// [`ChartError::MixedTypes`] on the first value whose type differs from the
/// first observed one.
pub(crate) fn detect_type(column: &str, rows: &[DataPoint]) -> Result<Option<ValueType>> {
    let mut detected: Option<ValueType> = None;
    for value in rows.iter().filter_map(|row| row.get(column)) {
        let Some(value_type) = value.value_type() else {
            continue;
        };
        match detected {
            None => detected = Some(value_type),
            Some(expected) if expected != value_type => {
                return Err(ChartError::MixedTypes {
                    column: column.to_string(),
                    expected: expected.to_string(),
                    found: value_type.to_string(),
                });
            }
            Some(_) => {}
        }
    }
    Ok(detected)
}

/// Unique non-null values of a column over the first `datacap` rows, sorted.
pub(crate) fn unique_members(
    column: &str,
    rows: &[DataPoint],
    datacap: usize,
    collator: &Collator,
) -> Vec<Value> {
    let mut seen = HashSet::new();
    let mut members: Vec<Value> = rows
        .iter()
        .take(datacap)
        .filter_map(|row| row.get(column))
        .filter(|value| !value.is_null())
        .filter(|value| seen.insert(value.key()))
        .cloned()
        .collect();
    collator.sort(&mut members);
    members
}

/// Running sum of every measure column, per distinct member of `column`.
pub(crate) fn sum_by_member(column: &str, rows: &[DataPoint], measures: &[String]) -> MemberSums {
    let mut sums = MemberSums::new();
    for row in rows {
        let Some(member) = row.get(column).filter(|value| !value.is_null()) else {
            continue;
        };
        let entry = sums.entry(member.key()).or_default();
        for measure in measures {
            let value = row.get(measure).and_then(Value::as_f64).unwrap_or(0.0);
            *entry.entry(measure.clone()).or_insert(0.0) += value;
        }
    }
    sums
}

/// `(min, max)` of a measure column over the first `datacap` rows.
///
/// A column without numeric values yields `(0.0, 0.0)`.
///
/// # Errors
///
/// [`ChartError::NonNumericMeasure`] if a non-null, non-number value appears.
pub(crate) fn measure_range(
    column: &str,
    rows: &[DataPoint],
    datacap: usize,
) -> Result<(f64, f64)> {
    let mut range: Option<(f64, f64)> = None;
    for value in rows.iter().take(datacap).filter_map(|row| row.get(column)) {
        match value {
            Value::Null => {}
            Value::Number(n) if n.is_nan() => {}
            Value::Number(n) => {
                range = Some(match range {
                    None => (*n, *n),
                    Some((min, max)) => (min.min(*n), max.max(*n)),
                });
            }
            other => {
                return Err(ChartError::NonNumericMeasure {
                    column: column.to_string(),
                    value: format!("{other:?}"),
                });
            }
        }
    }
    Ok(range.unwrap_or((0.0, 0.0)))
}
