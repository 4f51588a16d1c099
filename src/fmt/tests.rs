use super::*;
use crate::ast::{Resolved, ResolvedQuery};
use crate::parser::parse;
use crate::schema::{PropertyDefinition, PropertyKind};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn roundtrip(input: &str) -> String {
    parse(input).unwrap().to_string()
}

#[test]
fn test_or_is_fully_parenthesized() {
    assert_eq!(
        roundtrip("Feature = Applications OR Feature = Dashboard"),
        "((Feature = Applications) OR (Feature = Dashboard))"
    );
}

#[test]
fn test_and_is_joined_bare() {
    assert_eq!(
        roundtrip("status = open and release IN (1,2)"),
        "status = open AND release IN (1, 2)"
    );
}

#[test]
fn test_canonical_text_is_stable() {
    let inputs = [
        "((Feature = Applications) OR (Feature = Dashboard))",
        "status = open AND ((a = 1) OR (b = 2))",
        "NOT (status = open)",
        "NOT ((a = 1) OR (b = 2))",
        "owner IS NULL AND reviewer IS NOT NULL",
        "'related card' = NUMBER 42",
        "'due date' <= (current release - end date)",
        "owner = CURRENT USER AND 'due date' < TODAY",
        "SELECT name, COUNT(*) FROM TREE Planning WHERE status = open GROUP BY name ORDER BY name DESC LIMIT 10 PAGE 2",
        "FROM TREE 'Release Tree'",
    ];
    for input in inputs {
        assert_eq!(roundtrip(input), input);
    }
}

#[test]
fn test_raw_keeps_written_quotes() {
    assert_eq!(
        roundtrip("\"Feature Thing\" = \"Dashboard\""),
        "\"Feature Thing\" = \"Dashboard\""
    );
}

#[test]
fn test_quote_helpers() {
    assert!(needs_quoting("Project Monitoring"));
    assert!(needs_quoting("and"));
    assert!(needs_quoting("1st"));
    assert!(needs_quoting(""));
    assert!(!needs_quoting("Dashboard"));
    assert_eq!(quote_with("it's", '\''), "'it''s'");
    assert_eq!(quote_if_needed("open"), "open");
    assert_eq!(quote_if_needed("in progress"), "'in progress'");
    assert!(needs_quoting(r"C:\dir"));
    assert_eq!(quote_with(r"a\b", '\''), r"'a\\b'");
    assert_eq!(quote_if_needed(r"C:\dir"), r"'C:\\dir'");
}

#[test]
fn test_backslash_survives_reparse() {
    let query = parse(r"notes = 'a\\b' AND 'odd\\name' = 'it''s'").unwrap();
    let text = query.to_string();
    assert_eq!(text, r"notes = 'a\\b' AND 'odd\\name' = 'it''s'");
    assert_eq!(parse(&text).unwrap(), query);
}

#[test]
fn test_resolved_backslash_survives_reparse() {
    let notes = Arc::new(PropertyDefinition::new("Notes", "cp_notes", PropertyKind::Text));
    let query = ResolvedQuery::with_filter(Condition::comparison(
        BoundProperty::new(notes, PropertyRef::new("notes")),
        Operator::Eq,
        ResolvedValue::Text(r"C:\dir".to_string()),
    ));
    let text = query.to_string();
    assert_eq!(text, r"Notes = 'C:\\dir'");
    match parse(&text).unwrap().filter {
        Some(Condition::Comparison { value, .. }) => {
            assert_eq!(value, Literal::Text { value: r"C:\dir".to_string(), quote: Some('\'') })
        }
        other => panic!("expected a comparison, got {:?}", other),
    }
}

#[test]
fn test_resolved_render_uses_schema_spelling() {
    let feature = Arc::new(
        PropertyDefinition::new(
            "Feature",
            "cp_feature",
            PropertyKind::Enumerated { numeric: false },
        )
        .with_values(["Dashboard", "Project Monitoring"]),
    );
    let due = Arc::new(PropertyDefinition::new(
        "Due Date",
        "cp_due_date",
        PropertyKind::Date,
    ));

    let filter = Condition::<Resolved>::and(vec![
        Condition::comparison(
            BoundProperty::new(feature.clone(), PropertyRef::new("feature")),
            Operator::Eq,
            ResolvedValue::Text("Project Monitoring".to_string()),
        ),
        Condition::comparison(
            BoundProperty::new(due, PropertyRef::quoted("due date", '"')),
            Operator::Gt,
            ResolvedValue::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
        ),
    ]);
    let query = ResolvedQuery::with_filter(filter);

    assert_eq!(
        query.to_string(),
        "Feature = 'Project Monitoring' AND 'Due Date' > '2024-03-01'"
    );
}
