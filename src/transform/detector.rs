use serde::Serialize;
use std::sync::Arc;

use crate::ast::{ResolvedQuery, ResolvedValue};
use crate::schema::{PropertyDefinition, PropertyKind};

/// Values compared against each property, in the order they appear.
///
/// Properties are kept in first-seen order. Values are not deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectedValues {
    entries: Vec<(Arc<PropertyDefinition>, Vec<ResolvedValue>)>,
}

impl DetectedValues {
    /// Values for a property, looked up case-insensitively.
    pub fn get(&self, property: &str) -> Option<&[ResolvedValue]> {
        self.entries
            .iter()
            .find(|(p, _)| p.is_named(property))
            .map(|(_, values)| values.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PropertyDefinition, &[ResolvedValue])> {
        self.entries.iter().map(|(p, v)| (p.as_ref(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, property: &Arc<PropertyDefinition>, value: ResolvedValue) {
        match self.entries.iter_mut().find(|(p, _)| p == property) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((property.clone(), vec![value])),
        }
    }
}

/// Collect every concrete value compared against each property.
///
/// Walks through AND, OR and NOT alike. Card relationship properties are
/// skipped since their values are other cards, and NULL is not a value.
pub fn detect(query: &ResolvedQuery) -> DetectedValues {
    let mut detected = DetectedValues::default();
    if let Some(filter) = &query.filter {
        filter.for_each_value(&mut |property, _op, value| {
            if matches!(property.definition.kind, PropertyKind::CardRelationship { .. }) {
                return;
            }
            if value.is_null() {
                return;
            }
            detected.push(&property.definition, value.clone());
        });
    }
    tracing::debug!(properties = detected.len(), "detected property values");
    detected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::resolver::resolve;
    use crate::schema::{CardRecord, SchemaSnapshot};

    fn schema() -> SchemaSnapshot {
        SchemaSnapshot::new()
            .with_property(
                PropertyDefinition::new(
                    "Release",
                    "cp_release",
                    PropertyKind::Enumerated { numeric: true },
                )
                .with_values(["1", "2"]),
            )
            .with_property(PropertyDefinition::new(
                "Parent",
                "cp_parent_card_id",
                PropertyKind::CardRelationship { tree: None },
            ))
            .with_card(CardRecord::new(5, 1, "Epic"))
    }

    fn numbers(detected: &DetectedValues, property: &str) -> Vec<String> {
        detected
            .get(property)
            .unwrap_or_default()
            .iter()
            .map(|v| v.to_string())
            .collect()
    }

    fn run(text: &str) -> DetectedValues {
        detect(&resolve(parse(text).unwrap(), &schema()).unwrap())
    }

    #[test]
    fn test_or_and_and_both_collect_in_order() {
        assert_eq!(numbers(&run("release = 1 OR release = 2"), "release"), vec!["1", "2"]);
        assert_eq!(numbers(&run("release = 1 AND release = 2"), "release"), vec!["1", "2"]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        assert_eq!(
            numbers(&run("release = 1 OR release IN (2, 1)"), "release"),
            vec!["1", "2", "1"]
        );
    }

    #[test]
    fn test_negation_still_surfaces_value() {
        assert_eq!(numbers(&run("release != 1"), "release"), vec!["1"]);
        assert_eq!(numbers(&run("NOT release = 2"), "release"), vec!["2"]);
    }

    #[test]
    fn test_card_relationships_are_skipped() {
        let detected = run("parent = NUMBER 1 AND parent = 1");
        assert!(detected.is_empty());
        assert_eq!(detected.get("parent"), None);
    }

    #[test]
    fn test_null_is_not_a_value() {
        assert!(run("release IS NULL").is_empty());
    }
}
