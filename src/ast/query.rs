use serde::Serialize;

use super::{AggregateFunc, Condition, Raw, Resolved, SortOrder, Stage};

/// One entry of the select list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound = "")]
pub enum SelectColumn<S: Stage = Raw> {
    Property(S::Property),
    /// `target` is `None` for `COUNT(*)`.
    Aggregate {
        func: AggregateFunc,
        target: Option<S::Property>,
    },
}

impl<S: Stage> SelectColumn<S> {
    pub fn is_aggregate(&self) -> bool {
        matches!(self, SelectColumn::Aggregate { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound = "")]
pub struct OrderBy<S: Stage = Raw> {
    pub property: S::Property,
    pub order: SortOrder,
}

/// Root of the AST.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound = "")]
pub struct Query<S: Stage = Raw> {
    /// Order and spelling exactly as written; it is shown back to users.
    pub select: Vec<SelectColumn<S>>,
    /// `FROM TREE <name>`
    pub tree_scope: Option<String>,
    /// The `WHERE` condition (or the whole text for a bare filter).
    pub filter: Option<Condition<S>>,
    pub group_by: Vec<S::Property>,
    pub order_by: Vec<OrderBy<S>>,
    pub limit: Option<u64>,
    /// 1-based page number.
    pub page: Option<u64>,
}

/// A query whose every property and value is bound to the schema.
pub type ResolvedQuery = Query<Resolved>;

impl<S: Stage> Default for Query<S> {
    fn default() -> Self {
        Self {
            select: Vec::new(),
            tree_scope: None,
            filter: None,
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            page: None,
        }
    }
}

impl<S: Stage> Query<S> {
    /// A bare filter with no select list.
    pub fn with_filter(filter: Condition<S>) -> Self {
        Self {
            filter: Some(filter),
            ..Self::default()
        }
    }

    pub fn has_aggregates(&self) -> bool {
        self.select.iter().any(SelectColumn::is_aggregate)
    }

    /// True when the text had no `SELECT` and no trailing clauses.
    pub fn is_filter_only(&self) -> bool {
        self.select.is_empty()
            && self.group_by.is_empty()
            && self.order_by.is_empty()
            && self.limit.is_none()
            && self.page.is_none()
    }
}
