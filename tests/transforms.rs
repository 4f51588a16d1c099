mod common;

use mql::prelude::*;
use pretty_assertions::assert_eq;

use common::{ctx, resolved, schema};

fn detected(query: &str, property: &str) -> Vec<String> {
    detect(&resolved(query))
        .get(property)
        .unwrap_or_default()
        .iter()
        .map(|v| v.to_string())
        .collect()
}

#[test]
fn test_rename_is_isolated_to_one_property() {
    let out = rename_value(
        r#"feature = Dashboard AND "Feature Thing" = "Dashboard""#,
        "Feature",
        "Dashboard",
        "Project Monitoring",
        &schema(),
    )
    .unwrap();
    assert_eq!(out, "Feature = 'Project Monitoring' AND 'Feature Thing' = Dashboard");
}

#[test]
fn test_rename_inside_in_clause() {
    let out = rename_value(
        "feature IN (Dashboard, Notifications)",
        "Feature",
        "Dashboard",
        "Info Radiator",
        &schema(),
    )
    .unwrap();
    assert_eq!(out, "Feature IN ('Info Radiator', Notifications)");
}

#[test]
fn test_rename_to_value_with_backslash() {
    let out = rename_value(
        "feature = Dashboard AND notes = 'x'",
        "Feature",
        "Dashboard",
        r"C:\dir",
        &schema(),
    )
    .unwrap();
    assert_eq!(out, r"Feature = 'C:\\dir' AND Notes = x");

    let reparsed = parse(&out).unwrap();
    let Some(Condition::Composite { children, .. }) = reparsed.filter else {
        panic!("expected an AND composite");
    };
    assert!(matches!(
        &children[0],
        Condition::Comparison { value: Literal::Text { value, .. }, .. } if value == r"C:\dir"
    ));
}

#[test]
fn test_rename_through_nested_conditions() {
    let out = rename_value(
        "NOT (feature = dashboard OR status = open) AND feature != dashboard",
        "feature",
        "dashboard",
        "Radiator",
        &schema(),
    )
    .unwrap();
    assert_eq!(
        out,
        "NOT ((Feature = Radiator) OR (Status = Open)) AND Feature != Radiator"
    );
}

#[test]
fn test_rename_keeps_query_clauses() {
    let out = rename_value(
        "SELECT feature, COUNT(*) WHERE feature = Applications GROUP BY feature",
        "Feature",
        "Applications",
        "Apps",
        &schema(),
    )
    .unwrap();
    assert_eq!(
        out,
        "SELECT feature, COUNT(*) WHERE Feature = Apps GROUP BY Feature"
    );
}

#[test]
fn test_detector_order_and_duplicates() {
    assert_eq!(detected("release = 1 OR release = 2", "Release"), vec!["1", "2"]);
    assert_eq!(detected("release = 1 AND release = 2", "Release"), vec!["1", "2"]);
    assert_eq!(detected("release != 1", "Release"), vec!["1"]);
    assert_eq!(
        detected("release = 1 AND (release IN (1, 3) OR NOT release = 2)", "Release"),
        vec!["1", "1", "3", "2"]
    );
}

#[test]
fn test_detector_skips_card_relationships() {
    let values = detect(&resolved(
        "'related card' = NUMBER 42 AND 'planning release' = 'Release 2'",
    ));
    assert!(values.is_empty());
}

#[test]
fn test_detector_groups_per_property() {
    let values = detect(&resolved(
        "feature = dashboard AND status = open AND feature = applications",
    ));
    let names: Vec<&str> = values.iter().map(|(p, _)| p.name.as_str()).collect();
    assert_eq!(names, vec!["Feature", "Status"]);
    assert_eq!(
        detected("feature = dashboard AND status = open AND feature = applications", "Feature"),
        vec!["Dashboard", "Applications"]
    );
}

#[test]
fn test_live_filters() {
    let filters = extract("where owner = member", &schema(), &ctx()).unwrap();
    assert_eq!(
        filters,
        vec![LiveFilter {
            operator: Operator::Eq,
            property: "Owner".to_string(),
            value: Some("7".to_string()),
        }]
    );

    let filters = extract("where owner is null", &schema(), &ctx()).unwrap();
    assert_eq!(
        filters,
        vec![LiveFilter {
            operator: Operator::Eq,
            property: "Owner".to_string(),
            value: None,
        }]
    );
}

#[test]
fn test_live_filters_resolve_cards_and_variables() {
    let filters = extract(
        "'related card' = NUMBER 42 AND 'due date' < (cut off)",
        &schema(),
        &ctx(),
    )
    .unwrap();
    assert_eq!(
        filters,
        vec![
            LiveFilter {
                operator: Operator::Eq,
                property: "Related Card".to_string(),
                value: Some("100".to_string()),
            },
            LiveFilter {
                operator: Operator::Lt,
                property: "Due Date".to_string(),
                value: Some("2024-09-30".to_string()),
            },
        ]
    );
}

#[test]
fn test_live_filter_rejects_what_the_parser_accepts() {
    for query in [
        "owner = member OR owner = admin",
        "owner IN (member, admin)",
        "status NOT IN (open)",
        "NOT owner = member",
    ] {
        assert!(parse(query).is_ok(), "{}", query);
        assert!(
            matches!(
                extract(query, &schema(), &ctx()),
                Err(TransformError::UnsupportedConstruct { .. })
            ),
            "{}",
            query
        );
    }
}
