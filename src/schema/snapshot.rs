//! In-memory [`SchemaLookup`] loaded from a TOML file.
//!
//! ```toml
//! [[properties]]
//! name = "Status"
//! column = "cp_status"
//! type = "enumerated"
//! values = ["New", "Open", "Closed"]
//!
//! [[properties]]
//! name = "Owner"
//! column = "cp_owner_user_id"
//! type = "user"
//! values = [{ id = 7, value = "member", display_name = "Team Member" }]
//!
//! [[cards]]
//! id = 100
//! number = 42
//! name = "Login page"
//! values = { "Due Date" = "2024-05-01" }
//!
//! [[variables]]
//! name = "current iteration"
//! type = "card"
//! value = "42"
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::{
    CardId, CardReference, PropertyDefinition, PropertyKind, PropertyValue, SchemaLookup,
};
use crate::ast::ResolvedValue;
use crate::error::{MqlError, MqlResult};
use crate::resolver::{parse_date, resolve_stored_value};

/// A card known to the snapshot, with its stored property values as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRecord {
    pub id: CardId,
    pub number: i64,
    pub name: String,
    pub values: Vec<(String, String)>,
}

impl CardRecord {
    pub fn new(id: i64, number: i64, name: impl Into<String>) -> Self {
        Self {
            id: CardId(id),
            number,
            name: name.into(),
            values: Vec::new(),
        }
    }

    pub fn with_value(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.push((property.into(), value.into()));
        self
    }

    fn value_of(&self, property: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SchemaSnapshot {
    properties: Vec<Arc<PropertyDefinition>>,
    cards: Vec<CardRecord>,
    variables: HashMap<String, ResolvedValue>,
}

/// Variable names compare case-insensitively with whitespace collapsed.
fn variable_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl SchemaSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, property: PropertyDefinition) -> Self {
        self.properties.push(Arc::new(property));
        self
    }

    pub fn with_card(mut self, card: CardRecord) -> Self {
        self.cards.push(card);
        self
    }

    pub fn with_variable(mut self, name: &str, value: ResolvedValue) -> Self {
        self.variables.insert(variable_key(name), value);
        self
    }

    pub fn properties(&self) -> &[Arc<PropertyDefinition>] {
        &self.properties
    }

    pub fn cards(&self) -> &[CardRecord] {
        &self.cards
    }

    /// Load a snapshot file.
    pub fn load(path: &Path) -> MqlResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            MqlError::Config(format!("cannot read schema {}: {}", path.display(), e))
        })?;
        let snapshot = Self::from_toml_str(&text)?;
        tracing::info!(
            path = %path.display(),
            properties = snapshot.properties.len(),
            cards = snapshot.cards.len(),
            variables = snapshot.variables.len(),
            "loaded schema snapshot"
        );
        Ok(snapshot)
    }

    pub fn from_toml_str(text: &str) -> MqlResult<Self> {
        let file: SnapshotFile =
            toml::from_str(text).map_err(|e| MqlError::Config(format!("invalid schema: {}", e)))?;

        let mut snapshot = SchemaSnapshot::new();
        for entry in file.properties {
            snapshot = snapshot.with_property(entry.into_definition());
        }
        for card in file.cards {
            let mut record = CardRecord::new(card.id, card.number, card.name);
            record.values = card.values.into_iter().collect();
            snapshot = snapshot.with_card(record);
        }
        for var in file.variables {
            let value = snapshot.variable_value(&var)?;
            snapshot.variables.insert(variable_key(&var.name), value);
        }
        Ok(snapshot)
    }

    fn variable_value(&self, var: &VariableEntry) -> MqlResult<ResolvedValue> {
        let text = match (&var.kind, var.value.as_deref()) {
            (VariableKind::Unset, _) | (_, None) => return Ok(ResolvedValue::Null),
            (_, Some(text)) => text,
        };
        let bad = |what: &str| {
            MqlError::Config(format!(
                "project variable '{}': '{}' is not a valid {}",
                var.name, text, what
            ))
        };

        match var.kind {
            VariableKind::Unset => Ok(ResolvedValue::Null),
            VariableKind::Text => Ok(ResolvedValue::Text(text.to_string())),
            VariableKind::Number => ResolvedValue::number(text).ok_or_else(|| bad("number")),
            VariableKind::Date => parse_date(text)
                .map(ResolvedValue::Date)
                .ok_or_else(|| bad("date")),
            VariableKind::Card => {
                let reference = match text.trim().parse::<i64>() {
                    Ok(n) => CardReference::Number(n),
                    Err(_) => CardReference::Display(text.to_string()),
                };
                let id = self
                    .resolve_card_reference(&reference)
                    .ok_or_else(|| bad("card"))?;
                Ok(ResolvedValue::Card { id, reference })
            }
            VariableKind::User => self
                .properties
                .iter()
                .filter(|p| p.kind == PropertyKind::User)
                .flat_map(|p| p.values.iter())
                .find(|v| v.answers_to(text))
                .map(|v| ResolvedValue::User {
                    id: super::UserId(v.id),
                    login: v.value.clone(),
                })
                .ok_or_else(|| bad("user")),
        }
    }
}

impl SchemaLookup for SchemaSnapshot {
    fn find_property(&self, name: &str) -> Option<Arc<PropertyDefinition>> {
        self.properties.iter().find(|p| p.is_named(name.trim())).cloned()
    }

    fn resolve_card_reference(&self, reference: &CardReference) -> Option<CardId> {
        if let Some(number) = reference.number() {
            return self.cards.iter().find(|c| c.number == number).map(|c| c.id);
        }
        match reference {
            CardReference::Display(name) => self
                .cards
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
                .map(|c| c.id),
            CardReference::Number(_) => None,
        }
    }

    fn resolve_project_variable(&self, name: &str) -> Option<ResolvedValue> {
        self.variables.get(&variable_key(name)).cloned()
    }

    fn property_names(&self) -> Vec<String> {
        self.properties.iter().map(|p| p.name.clone()).collect()
    }

    fn card_property_value(
        &self,
        card: CardId,
        property: &PropertyDefinition,
    ) -> Option<ResolvedValue> {
        let record = self.cards.iter().find(|c| c.id == card)?;
        let text = record.value_of(&property.name)?;
        match resolve_stored_value(self, property, text) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(
                    card = %card,
                    property = %property.name,
                    "ignoring stored value: {}",
                    e
                );
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    properties: Vec<PropertyEntry>,
    #[serde(default)]
    cards: Vec<CardEntry>,
    #[serde(default)]
    variables: Vec<VariableEntry>,
}

#[derive(Debug, Deserialize)]
struct PropertyEntry {
    name: String,
    column: String,
    #[serde(flatten)]
    kind: PropertyKind,
    #[serde(default)]
    values: Vec<ValueEntry>,
}

/// A legal value, either just its text or with an explicit id.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ValueEntry {
    Plain(String),
    Full(PropertyValue),
}

impl PropertyEntry {
    fn into_definition(self) -> PropertyDefinition {
        let mut definition = PropertyDefinition::new(self.name, self.column, self.kind);
        for (i, entry) in self.values.into_iter().enumerate() {
            let value = match entry {
                ValueEntry::Plain(text) => PropertyValue::new(i as i64 + 1, text),
                ValueEntry::Full(value) => value,
            };
            definition = definition.with_value(value);
        }
        definition
    }
}

#[derive(Debug, Deserialize)]
struct CardEntry {
    id: i64,
    number: i64,
    name: String,
    #[serde(default)]
    values: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum VariableKind {
    Card,
    User,
    Date,
    Number,
    Text,
    Unset,
}

#[derive(Debug, Deserialize)]
struct VariableEntry {
    name: String,
    #[serde(rename = "type")]
    kind: VariableKind,
    #[serde(default)]
    value: Option<String>,
}
