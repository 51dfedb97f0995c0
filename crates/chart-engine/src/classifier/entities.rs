//! Schema lookups used by column classification.

use crate::schema::{Cube, Dimension, Hierarchy, Level, Measure, Property, Relationship};

/// A level together with the hierarchy and dimension that own it.
pub(crate) struct LevelMatch<'a> {
    pub dimension: &'a Dimension,
    pub hierarchy: &'a Hierarchy,
    pub level: &'a Level,
}

type ParentLink<'a> = Option<(&'a Measure, Relationship)>;

/// Find a measure by exact name, descending into attached sub-measures.
///
/// For a sub-measure the direct parent and its relationship are returned too.
pub(crate) fn find_measure<'a>(
    measures: &'a [Measure],
    name: &str,
) -> Option<(&'a Measure, ParentLink<'a>)> {
    for measure in measures {
        if measure.name == name {
            return Some((measure, None));
        }
        for attached in &measure.attached {
            if attached.measure.name == name {
                return Some((&attached.measure, Some((measure, attached.relationship))));
            }
            let nested = std::slice::from_ref(&attached.measure);
            if let Some((found, Some(parent))) = find_measure(nested, name) {
                return Some((found, Some(parent)));
            }
        }
    }
    None
}

fn levels(cube: &Cube) -> impl Iterator<Item = LevelMatch<'_>> {
    cube.dimensions.iter().flat_map(|dimension| {
        dimension.hierarchies.iter().flat_map(move |hierarchy| {
            hierarchy.levels.iter().map(move |level| LevelMatch {
                dimension,
                hierarchy,
                level,
            })
        })
    })
}

pub(crate) fn find_level<'a>(cube: &'a Cube, name: &str) -> Option<LevelMatch<'a>> {
    levels(cube).find(|found| found.level.name == name)
}

pub(crate) fn find_property<'a>(
    cube: &'a Cube,
    name: &str,
) -> Option<(LevelMatch<'a>, &'a Property)> {
    levels(cube).find_map(|found| {
        let property = found.level.properties.iter().find(|p| p.name == name)?;
        Some((found, property))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Aggregator;

    #[test]
    fn test_find_nested_attached_measure() {
        let lci = Measure::new("Rate LCI", Aggregator::Unknown);
        let source = Measure::new("Rate Source", Aggregator::Unknown)
            .with_attached(Relationship::Lci, lci);
        let rate = Measure::new("Rate", Aggregator::Average)
            .with_attached(Relationship::Source, source);
        let measures = vec![rate];

        let (found, parent) = find_measure(&measures, "Rate LCI").unwrap();
        assert_eq!(found.name, "Rate LCI");
        let (parent, relationship) = parent.unwrap();
        assert_eq!(parent.name, "Rate Source");
        assert_eq!(relationship, Relationship::Lci);

        assert!(find_measure(&measures, "Nope").is_none());
    }
}
