//! Core SQL compiler tests.

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

use super::{ctx, resolved};
use crate::error::CompileError;
use crate::transpiler::{BoundValue, CompiledSql, Dialect, compile};

fn pg(text: &str) -> CompiledSql {
    compile(&resolved(text), &ctx(), Dialect::Postgres).unwrap()
}

fn text(s: &str) -> BoundValue {
    BoundValue::Text(s.to_string())
}

#[test]
fn test_text_equality_is_case_insensitive() {
    let sql = pg("status = open");
    assert_eq!(
        sql.text,
        "SELECT cards.* FROM cards WHERE LOWER(cards.cp_status) = LOWER($1)"
    );
    assert_eq!(sql.params, vec![text("Open")]);
}

#[test]
fn test_numbers_and_and() {
    let sql = pg("size > 3 AND release = 2");
    assert_eq!(
        sql.text,
        "SELECT cards.* FROM cards WHERE cards.cp_size > $1 AND cards.cp_release = $2"
    );
    assert_eq!(
        sql.params,
        vec![
            BoundValue::Number(Decimal::from(3)),
            BoundValue::Number(Decimal::from(2)),
        ]
    );
}

#[test]
fn test_not_equal_includes_null() {
    assert_eq!(
        pg("status != open").text,
        "SELECT cards.* FROM cards WHERE (cards.cp_status IS NULL OR LOWER(cards.cp_status) <> LOWER($1))"
    );
}

#[test]
fn test_null_comparisons() {
    let sql = pg("owner IS NULL AND 'due date' IS NOT NULL");
    assert_eq!(
        sql.text,
        "SELECT cards.* FROM cards WHERE cards.cp_owner_user_id IS NULL AND cards.cp_due_date IS NOT NULL"
    );
    assert!(sql.params.is_empty());
}

#[test]
fn test_or_parenthesization() {
    assert_eq!(
        pg("status = new OR status = open").text,
        "SELECT cards.* FROM cards WHERE ((LOWER(cards.cp_status) = LOWER($1)) OR (LOWER(cards.cp_status) = LOWER($2)))"
    );
}

#[test]
fn test_not() {
    assert_eq!(
        pg("NOT size = 1").text,
        "SELECT cards.* FROM cards WHERE NOT (cards.cp_size = $1)"
    );
}

#[test]
fn test_enumerated_ordering_uses_positions() {
    let sql = pg("status < closed");
    assert_eq!(
        sql.text,
        "SELECT cards.* FROM cards WHERE cards.cp_status IN ($1, $2)"
    );
    assert_eq!(sql.params, vec![text("New"), text("Open")]);

    let sql = pg("release >= 2");
    assert_eq!(
        sql.params,
        vec![
            BoundValue::Number(Decimal::from(2)),
            BoundValue::Number(Decimal::from(3)),
        ]
    );

    assert_eq!(pg("status < new").text, "SELECT cards.* FROM cards WHERE 1 = 0");
}

#[test]
fn test_in_list() {
    let sql = pg("release IN (1, 3)");
    assert_eq!(
        sql.text,
        "SELECT cards.* FROM cards WHERE cards.cp_release IN ($1, $2)"
    );

    let sql = pg("status IN (open, NULL)");
    assert_eq!(
        sql.text,
        "SELECT cards.* FROM cards WHERE (cards.cp_status IS NULL OR LOWER(cards.cp_status) IN (LOWER($1)))"
    );
}

#[test]
fn test_specials_bound_from_context() {
    let sql = pg("owner = current user AND 'due date' < today");
    assert_eq!(
        sql.text,
        "SELECT cards.* FROM cards WHERE cards.cp_owner_user_id = $1 AND cards.cp_due_date < $2"
    );
    assert_eq!(
        sql.params,
        vec![
            BoundValue::Int(9),
            BoundValue::Date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()),
        ]
    );
}

#[test]
fn test_users_and_cards_bind_ids() {
    assert_eq!(pg("owner = member").params, vec![BoundValue::Int(7)]);

    let sql = pg("parent = NUMBER 42");
    assert_eq!(
        sql.text,
        "SELECT cards.* FROM cards WHERE cards.cp_parent_card_id = $1"
    );
    assert_eq!(sql.params, vec![BoundValue::Int(100)]);
}

#[test]
fn test_aggregates_and_group_by() {
    assert_eq!(
        pg("SELECT status, COUNT(*), SUM(size) GROUP BY status").text,
        "SELECT cards.cp_status, COUNT(*), SUM(cards.cp_size) FROM cards GROUP BY cards.cp_status"
    );
}

#[test]
fn test_missing_group_by() {
    let err = compile(&resolved("SELECT name, COUNT(*)"), &ctx(), Dialect::Postgres).unwrap_err();
    assert_eq!(
        err,
        CompileError::MissingGroupBy {
            column: "Name".to_string(),
        }
    );
}

#[test]
fn test_group_by_without_aggregates() {
    assert_eq!(
        pg("SELECT size GROUP BY size ORDER BY size DESC").text,
        "SELECT cards.cp_size FROM cards GROUP BY cards.cp_size ORDER BY cards.cp_size DESC"
    );

    let err = compile(&resolved("SELECT name GROUP BY status"), &ctx(), Dialect::Postgres)
        .unwrap_err();
    assert_eq!(
        err,
        CompileError::MissingGroupBy {
            column: "Name".to_string(),
        }
    );

    let err = compile(&resolved("status = open GROUP BY status"), &ctx(), Dialect::Postgres)
        .unwrap_err();
    assert_eq!(
        err,
        CompileError::MissingGroupBy {
            column: "*".to_string(),
        }
    );
}

#[test]
fn test_ungrouped_order_column() {
    let err = compile(
        &resolved("SELECT status, COUNT(*) GROUP BY status ORDER BY size"),
        &ctx(),
        Dialect::Postgres,
    )
    .unwrap_err();
    assert_eq!(
        err,
        CompileError::MissingGroupBy {
            column: "Size".to_string(),
        }
    );

    let err = compile(&resolved("SELECT COUNT(*) ORDER BY status"), &ctx(), Dialect::Postgres)
        .unwrap_err();
    assert_eq!(
        err,
        CompileError::MissingGroupBy {
            column: "Status".to_string(),
        }
    );
}

#[test]
fn test_relationship_order_joins_once() {
    assert_eq!(
        pg("ORDER BY parent, parent DESC").text,
        "SELECT cards.* FROM cards \
         LEFT JOIN cards AS rel_cp_parent_card_id ON rel_cp_parent_card_id.id = cards.cp_parent_card_id \
         ORDER BY rel_cp_parent_card_id.number ASC, rel_cp_parent_card_id.number DESC"
    );
}

#[test]
fn test_enumerated_order_by_position() {
    let sql = pg("SELECT name ORDER BY status DESC");
    assert_eq!(
        sql.text,
        "SELECT cards.cp_name FROM cards ORDER BY CASE cards.cp_status WHEN $1 THEN 1 WHEN $2 THEN 2 WHEN $3 THEN 3 END DESC"
    );
    assert_eq!(sql.params, vec![text("New"), text("Open"), text("Closed")]);
}

#[test]
fn test_tree_scope() {
    let sql = pg("SELECT name FROM TREE Planning WHERE status = open");
    assert_eq!(
        sql.text,
        "SELECT cards.cp_name FROM cards \
         INNER JOIN tree_belongings ON tree_belongings.card_id = cards.id AND tree_belongings.tree_name = $1 \
         WHERE LOWER(cards.cp_status) = LOWER($2)"
    );
    assert_eq!(sql.params, vec![text("Planning"), text("Open")]);
}

#[test]
fn test_pagination() {
    assert_eq!(
        pg("status = open LIMIT 10 PAGE 3").text,
        "SELECT cards.* FROM cards WHERE LOWER(cards.cp_status) = LOWER($1) LIMIT 10 OFFSET 20"
    );
    assert_eq!(
        pg("status = open PAGE 2").text,
        "SELECT cards.* FROM cards WHERE LOWER(cards.cp_status) = LOWER($1) LIMIT 25 OFFSET 25"
    );
    assert_eq!(
        pg("status = open LIMIT 5 PAGE 1").text,
        "SELECT cards.* FROM cards WHERE LOWER(cards.cp_status) = LOWER($1) LIMIT 5"
    );
}

#[test]
fn test_literals_never_reach_sql_text() {
    let payload = "x'; DROP TABLE cards; --";
    let sql = pg("name = 'x''; DROP TABLE cards; --' OR name IN ('a\"b', 'c;d')");
    assert!(!sql.text.contains(payload));
    assert!(!sql.text.contains("DROP"));
    assert!(!sql.text.contains(';'));
    assert!(!sql.text.contains('\''));
    assert_eq!(sql.params[0], text(payload));
    assert_eq!(sql.params.len(), 3);
}

#[test]
fn test_variable_binds_terminal_value() {
    let schema = super::schema().with_variable(
        "current release",
        crate::ast::ResolvedValue::number("3").unwrap(),
    );
    let query =
        crate::resolver::resolve(crate::parser::parse("release = (current release)").unwrap(), &schema)
            .unwrap();
    let sql = compile(&query, &ctx(), Dialect::Postgres).unwrap();
    assert_eq!(sql.params, vec![BoundValue::Number(Decimal::from(3))]);
}
