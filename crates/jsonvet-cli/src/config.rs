//! # Run Configuration
//!
//! Loaded from a YAML file (`constants.yaml` by default):
//!
//! ```yaml
//! schemas_dir: /opt/audit/schemas
//! table_columns:
//!   users.schema: settings.users.settings
//!   datasources.schema: settings.datasources.connection_settings
//! ```
//!
//! `table_columns` maps each schema file name (minus extension) to the
//! dotted `table.field` column it validates. The mapping must cover
//! every file in `schemas_dir`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// The YAML run configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding the JSON Schema files.
    pub schemas_dir: PathBuf,
    /// Schema-file identifier to dotted column spec.
    pub table_columns: BTreeMap<String, String>,
}

impl Config {
    /// Load and parse the configuration file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("cannot parse config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let config: Config = serde_yaml::from_str(
            "schemas_dir: /opt/audit/schemas\n\
             table_columns:\n\
             \x20 users.schema: settings.users.settings\n",
        )
        .unwrap();
        assert_eq!(config.schemas_dir, PathBuf::from("/opt/audit/schemas"));
        assert_eq!(
            config.table_columns.get("users.schema").map(String::as_str),
            Some("settings.users.settings")
        );
    }

    #[test]
    fn rejects_unknown_fields() {
        let result: Result<Config, _> = serde_yaml::from_str(
            "schemas_dir: /x\ntable_columns: {}\nsurprise: 1\n",
        );
        assert!(result.is_err());
    }
}
