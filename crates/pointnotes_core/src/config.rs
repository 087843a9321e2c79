//! Store location and key namespace configuration.
//!
//! # Responsibility
//! - Resolve where the notes database and key-value document live.
//! - Derive the namespaced points key.
//!
//! # Invariants
//! - Blank environment overrides are ignored.

use std::path::PathBuf;

/// Overrides the directory holding both stores.
pub const DATA_DIR_ENV: &str = "POINTNOTES_DATA_DIR";
/// Overrides the key namespace.
pub const NAMESPACE_ENV: &str = "POINTNOTES_NAMESPACE";

const DEFAULT_DB_FILE_NAME: &str = "pointnotes.sqlite3";
const DEFAULT_KV_FILE_NAME: &str = "pointnotes_kv.json";
const DEFAULT_NAMESPACE: &str = "pointnotes";
const POINTS_KEY_SUFFIX: &str = "points";

/// Locations and naming for the two durable stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub db_file_name: String,
    pub kv_file_name: String,
    pub namespace: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::in_dir(std::env::temp_dir())
    }
}

impl StoreConfig {
    /// Default file names and namespace rooted at `data_dir`.
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            db_file_name: DEFAULT_DB_FILE_NAME.to_string(),
            kv_file_name: DEFAULT_KV_FILE_NAME.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    /// Defaults overridden by `POINTNOTES_DATA_DIR` and `POINTNOTES_NAMESPACE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(dir) = non_blank(lookup(DATA_DIR_ENV)) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(namespace) = non_blank(lookup(NAMESPACE_ENV)) {
            config.namespace = namespace;
        }
        config
    }

    /// Replaces the namespace, ignoring blank input.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        if let Some(namespace) = non_blank(Some(namespace.into())) {
            self.namespace = namespace;
        }
        self
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file_name)
    }

    pub fn kv_path(&self) -> PathBuf {
        self.data_dir.join(&self.kv_file_name)
    }

    /// Key holding the points counter, e.g. `pointnotes:points`.
    pub fn points_key(&self) -> String {
        format!("{}:{POINTS_KEY_SUFFIX}", self.namespace)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{StoreConfig, DATA_DIR_ENV, NAMESPACE_ENV};
    use std::path::PathBuf;

    #[test]
    fn defaults_use_temp_dir_and_default_namespace() {
        let config = StoreConfig::default();
        assert_eq!(config.data_dir, std::env::temp_dir());
        assert_eq!(config.points_key(), "pointnotes:points");
        assert!(config.db_path().ends_with("pointnotes.sqlite3"));
        assert!(config.kv_path().ends_with("pointnotes_kv.json"));
    }

    #[test]
    fn lookup_overrides_apply_and_blank_values_are_ignored() {
        let config = StoreConfig::from_lookup(|name| match name {
            DATA_DIR_ENV => Some(" /data/app ".to_string()),
            NAMESPACE_ENV => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.data_dir, PathBuf::from("/data/app"));
        assert_eq!(config.namespace, "pointnotes");

        let config = StoreConfig::from_lookup(|name| {
            (name == NAMESPACE_ENV).then(|| "todo".to_string())
        });
        assert_eq!(config.points_key(), "todo:points");
    }

    #[test]
    fn with_namespace_ignores_blank() {
        let config = StoreConfig::in_dir("/tmp/x").with_namespace("");
        assert_eq!(config.namespace, "pointnotes");
        let config = config.with_namespace("mine");
        assert_eq!(config.points_key(), "mine:points");
    }
}
