//! SELECT SQL generation.

use crate::ast::{BoundProperty, ResolvedQuery, SelectColumn, SortOrder};
use crate::error::CompileError;
use crate::schema::PropertyKind;
use crate::transpiler::conditions::{ConditionWriter, ParamContext, enumerated_param};
use crate::transpiler::context::EvalContext;
use crate::transpiler::traits::SqlGenerator;
use crate::transpiler::{BoundValue, CardTables, CompiledSql};

/// Rows per page when `PAGE` is given without `LIMIT`.
pub const DEFAULT_PAGE_SIZE: u64 = 25;

/// Generate SELECT SQL.
pub fn build_select(
    query: &ResolvedQuery,
    generator: &dyn SqlGenerator,
    ctx: &dyn EvalContext,
    tables: &CardTables,
) -> Result<CompiledSql, CompileError> {
    check_grouping(query)?;

    let writer = ConditionWriter {
        generator,
        ctx,
        table: &tables.cards,
    };
    let mut params = ParamContext::new();
    let cards = generator.quote_identifier(&tables.cards);

    // Columns
    let mut sql = String::from("SELECT ");
    if query.select.is_empty() {
        sql.push_str(&format!("{}.*", cards));
    } else {
        let cols: Vec<String> = query
            .select
            .iter()
            .map(|c| match c {
                SelectColumn::Property(p) => writer.column(&p.definition),
                SelectColumn::Aggregate { func, target: None } => format!("{}(*)", func),
                SelectColumn::Aggregate {
                    func,
                    target: Some(p),
                } => format!("{}({})", func, writer.column(&p.definition)),
            })
            .collect();
        sql.push_str(&cols.join(", "));
    }

    // FROM
    sql.push_str(" FROM ");
    sql.push_str(&cards);

    // Tree scope
    if let Some(tree) = &query.tree_scope {
        let hierarchy = &tables.hierarchy;
        let placeholder = params.add_param(BoundValue::Text(tree.clone()), generator);
        sql.push_str(&format!(
            " INNER JOIN {} ON {} = {} AND {} = {}",
            generator.quote_identifier(hierarchy),
            generator.qualified(hierarchy, "card_id"),
            generator.qualified(&tables.cards, "id"),
            generator.qualified(hierarchy, "tree_name"),
            placeholder
        ));
    }

    // Relationship joins, one per related column
    let mut aliases: Vec<String> = Vec::new();
    for order in &query.order_by {
        if let PropertyKind::CardRelationship { .. } = order.property.definition.kind {
            let alias = relationship_alias(&order.property);
            if aliases.contains(&alias) {
                continue;
            }
            sql.push_str(&format!(
                " LEFT JOIN {} AS {} ON {} = {}",
                cards,
                generator.quote_identifier(&alias),
                generator.qualified(&alias, "id"),
                writer.column(&order.property.definition)
            ));
            tracing::debug!(alias = %alias, "added relationship join");
            aliases.push(alias);
        }
    }

    // WHERE
    if let Some(filter) = &query.filter {
        sql.push_str(" WHERE ");
        sql.push_str(&writer.condition(filter, &mut params));
    }

    // GROUP BY
    if !query.group_by.is_empty() {
        let cols: Vec<String> = query
            .group_by
            .iter()
            .map(|p| writer.column(&p.definition))
            .collect();
        sql.push_str(" GROUP BY ");
        sql.push_str(&cols.join(", "));
    }

    // ORDER BY
    if !query.order_by.is_empty() {
        let items: Vec<String> = query
            .order_by
            .iter()
            .map(|o| {
                let dir = match o.order {
                    SortOrder::Asc => "ASC",
                    SortOrder::Desc => "DESC",
                };
                format!("{} {}", order_expr(&o.property, &writer, &mut params), dir)
            })
            .collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&items.join(", "));
    }

    // LIMIT / OFFSET
    let (limit, offset) = pagination(query);
    if (limit.is_some() || offset.is_some())
        && query.order_by.is_empty()
        && !generator.paginates_without_order()
    {
        return Err(CompileError::Unsupported {
            dialect: generator.name().to_string(),
            feature: "LIMIT or PAGE without ORDER BY".to_string(),
        });
    }
    sql.push_str(&generator.limit_offset(limit, offset));

    Ok(CompiledSql {
        text: sql,
        params: params.params,
    })
}

/// Once a query groups or aggregates, every plain selected or sorted column
/// must be grouped, and `cards.*` is off the table.
fn check_grouping(query: &ResolvedQuery) -> Result<(), CompileError> {
    if !query.has_aggregates() && query.group_by.is_empty() {
        return Ok(());
    }
    if query.select.is_empty() {
        return Err(CompileError::MissingGroupBy {
            column: "*".to_string(),
        });
    }

    let selected = query.select.iter().filter_map(|c| match c {
        SelectColumn::Property(p) => Some(p),
        SelectColumn::Aggregate { .. } => None,
    });
    let sorted = query.order_by.iter().map(|o| &o.property);
    for p in selected.chain(sorted) {
        if !query.group_by.iter().any(|g| g == p) {
            return Err(CompileError::MissingGroupBy {
                column: p.name().to_string(),
            });
        }
    }
    Ok(())
}

fn relationship_alias(property: &BoundProperty) -> String {
    format!("rel_{}", property.column())
}

fn order_expr(
    property: &BoundProperty,
    writer: &ConditionWriter<'_>,
    params: &mut ParamContext,
) -> String {
    let definition = &property.definition;
    match &definition.kind {
        PropertyKind::CardRelationship { .. } => writer
            .generator
            .qualified(&relationship_alias(property), "number"),
        // Managed values sort by their position in the list.
        PropertyKind::Enumerated { .. } if !definition.values.is_empty() => {
            let mut case = format!("CASE {}", writer.column(definition));
            for (i, value) in definition.values.iter().enumerate() {
                let placeholder =
                    params.add_param(enumerated_param(definition, &value.value), writer.generator);
                case.push_str(&format!(" WHEN {} THEN {}", placeholder, i + 1));
            }
            case.push_str(" END");
            case
        }
        _ => writer.column(definition),
    }
}

/// `(limit, offset)`; `PAGE` is 1-based.
fn pagination(query: &ResolvedQuery) -> (Option<u64>, Option<u64>) {
    match query.page {
        None => (query.limit, None),
        Some(page) => {
            let size = query.limit.unwrap_or_else(|| {
                tracing::warn!(page, size = DEFAULT_PAGE_SIZE, "PAGE without LIMIT");
                DEFAULT_PAGE_SIZE
            });
            let offset = (page > 1).then(|| (page - 1).saturating_mul(size));
            (Some(size), offset)
        }
    }
}
