//! CLI and executor configuration.
//!
//! Looked up as `mql.toml` in the working directory, then
//! `<config dir>/mql/config.toml`. Missing files mean defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{MqlError, MqlResult};
use crate::schema::UserId;
use crate::transpiler::{CardTables, ClockContext, Dialect};

pub const LOCAL_CONFIG: &str = "mql.toml";

/// Main configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MqlConfig {
    /// Path to a schema snapshot file
    pub schema: Option<PathBuf>,

    /// SQL dialect; guessed from `database_url` when unset
    pub dialect: Option<Dialect>,

    /// Database connection URL
    pub database_url: Option<String>,

    pub card_table: String,
    pub hierarchy_table: String,

    /// Project time zone as minutes east of UTC, for `TODAY`
    pub utc_offset_minutes: i32,

    /// User id bound to `CURRENT USER`
    pub current_user: i64,
}

impl Default for MqlConfig {
    fn default() -> Self {
        let tables = CardTables::default();
        Self {
            schema: None,
            dialect: None,
            database_url: None,
            card_table: tables.cards,
            hierarchy_table: tables.hierarchy,
            utc_offset_minutes: 0,
            current_user: 0,
        }
    }
}

impl MqlConfig {
    /// Load from the first config file found, or defaults.
    pub fn discover() -> MqlResult<Self> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => {
                tracing::debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// `mql.toml` if present, else the per-user config file if present.
    pub fn default_path() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_CONFIG);
        if local.exists() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("mql").join("config.toml"))
            .filter(|path| path.exists())
    }

    pub fn load(path: &Path) -> MqlResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MqlError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> MqlResult<Self> {
        toml::from_str(content).map_err(|e| MqlError::Config(format!("invalid config: {}", e)))
    }

    /// Explicit dialect, else the URL's, else Postgres.
    pub fn dialect(&self) -> Dialect {
        self.dialect
            .or_else(|| self.database_url.as_deref().and_then(Dialect::from_url))
            .unwrap_or_default()
    }

    pub fn tables(&self) -> CardTables {
        CardTables {
            cards: self.card_table.clone(),
            hierarchy: self.hierarchy_table.clone(),
        }
    }

    pub fn eval_context(&self) -> ClockContext {
        ClockContext::new(self.utc_offset_minutes, UserId(self.current_user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MqlConfig::from_toml_str("").unwrap();
        assert_eq!(config, MqlConfig::default());
        assert_eq!(config.card_table, "cards");
        assert_eq!(config.dialect(), Dialect::Postgres);
    }

    #[test]
    fn test_parse_full() {
        let config = MqlConfig::from_toml_str(
            r#"
schema = "schema.toml"
dialect = "sqlserver"
database_url = "postgres://localhost/mql"
card_table = "project_1_cards"
utc_offset_minutes = -300
current_user = 12
"#,
        )
        .unwrap();
        assert_eq!(config.schema, Some(PathBuf::from("schema.toml")));
        assert_eq!(config.dialect(), Dialect::SqlServer);
        assert_eq!(config.tables().cards, "project_1_cards");
        assert_eq!(config.tables().hierarchy, "tree_belongings");
        assert_eq!(config.eval_context().user, UserId(12));
    }

    #[test]
    fn test_dialect_from_url() {
        let config = MqlConfig {
            database_url: Some("sqlite://cards.db".to_string()),
            ..MqlConfig::default()
        };
        assert_eq!(config.dialect(), Dialect::SQLite);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            MqlConfig::from_toml_str("dialect = \"oracle\""),
            Err(MqlError::Config(_))
        ));
    }
}
