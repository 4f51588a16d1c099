#![allow(dead_code)]

use chrono::NaiveDate;
use mql::prelude::*;

/// A small project: managed text, managed numbers, free text, dates, users,
/// a planning tree and a couple of project variables.
pub const SNAPSHOT: &str = r#"
[[properties]]
name = "Feature"
column = "cp_feature"
type = "enumerated"
values = ["Dashboard", "Notifications", "Applications"]

[[properties]]
name = "Feature Thing"
column = "cp_feature_thing"
type = "enumerated"
values = ["Dashboard", "Reports"]

[[properties]]
name = "Status"
column = "cp_status"
type = "enumerated"
values = ["New", "Open", "In Progress", "Closed"]

[[properties]]
name = "Release"
column = "cp_release"
type = "enumerated"
numeric = true
values = ["1", "2", "3"]

[[properties]]
name = "Estimate"
column = "cp_estimate"
type = "numeric"

[[properties]]
name = "Notes"
column = "cp_notes"
type = "text"

[[properties]]
name = "Due Date"
column = "cp_due_date"
type = "date"

[[properties]]
name = "Owner"
column = "cp_owner_user_id"
type = "user"
values = [
    { id = 7, value = "member", display_name = "Team Member" },
    { id = 8, value = "admin" },
]

[[properties]]
name = "Related Card"
column = "cp_related_card_card_id"
type = "card_relationship"

[[properties]]
name = "Planning Release"
column = "cp_planning_release_card_id"
type = "card_relationship"
tree = "Planning"

[[cards]]
id = 100
number = 42
name = "Login page"
values = { "Due Date" = "2024-05-01", "Release" = "2" }

[[cards]]
id = 101
number = 43
name = "Release 2"

[[variables]]
name = "Current Release"
type = "card"
value = "43"

[[variables]]
name = "Launch Card"
type = "card"
value = "42"

[[variables]]
name = "cut off"
type = "date"
value = "2024-09-30"
"#;

pub fn schema() -> SchemaSnapshot {
    SchemaSnapshot::from_toml_str(SNAPSHOT).expect("fixture snapshot parses")
}

pub fn ctx() -> FixedContext {
    FixedContext::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), UserId(9))
}

pub fn resolved(text: &str) -> ResolvedQuery {
    resolve(parse(text).unwrap(), &schema()).unwrap()
}

pub fn postgres(text: &str) -> CompiledSql {
    compile(&resolved(text), &ctx(), Dialect::Postgres).unwrap()
}
