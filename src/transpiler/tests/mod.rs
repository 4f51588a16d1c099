//! Transpiler test modules.
//!
//! Tests are organized by category:
//! - `core`: per-kind comparisons, grouping, ordering, tree scope, pagination
//! - `dialects`: identifier quoting and placeholders per SQL dialect

mod core;

use chrono::NaiveDate;

use crate::ast::ResolvedQuery;
use crate::parser::parse;
use crate::resolver::resolve;
use crate::schema::{
    CardRecord, PropertyDefinition, PropertyKind, PropertyValue, SchemaSnapshot, UserId,
};
use crate::transpiler::FixedContext;

pub(super) fn schema() -> SchemaSnapshot {
    SchemaSnapshot::new()
        .with_property(
            PropertyDefinition::new(
                "Status",
                "cp_status",
                PropertyKind::Enumerated { numeric: false },
            )
            .with_values(["New", "Open", "Closed"]),
        )
        .with_property(
            PropertyDefinition::new(
                "Release",
                "cp_release",
                PropertyKind::Enumerated { numeric: true },
            )
            .with_values(["1", "2", "3"]),
        )
        .with_property(PropertyDefinition::new("Size", "cp_size", PropertyKind::Numeric))
        .with_property(PropertyDefinition::new("Name", "cp_name", PropertyKind::Text))
        .with_property(PropertyDefinition::new(
            "Due Date",
            "cp_due_date",
            PropertyKind::Date,
        ))
        .with_property(
            PropertyDefinition::new("Owner", "cp_owner_user_id", PropertyKind::User)
                .with_value(PropertyValue::new(7, "member")),
        )
        .with_property(PropertyDefinition::new(
            "Parent",
            "cp_parent_card_id",
            PropertyKind::CardRelationship {
                tree: Some("Planning".to_string()),
            },
        ))
        .with_card(CardRecord::new(100, 42, "Login page"))
}

pub(super) fn ctx() -> FixedContext {
    FixedContext::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), UserId(9))
}

pub(super) fn resolved(text: &str) -> ResolvedQuery {
    resolve(parse(text).unwrap(), &schema()).unwrap()
}
