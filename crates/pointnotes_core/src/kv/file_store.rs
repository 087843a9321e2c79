//! JSON-file backed key-value store.
//!
//! # Invariants
//! - The document on disk is a flat JSON object of string values.
//! - Writes go to a sibling temp file, are synced, then renamed over the
//!   document, so readers observe either the old or the new document.

use super::{KeyValueStore, KvError, KvResult};
use log::{debug, error, warn};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const TEMP_SUFFIX: &str = "tmp";

/// Durable key-value store persisted as a single JSON document.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileKeyValueStore {
    /// Opens the document at `path`, creating parent directories as needed.
    ///
    /// A missing document is treated as an empty store; nothing is written
    /// until the first `set`.
    pub fn open(path: impl AsRef<Path>) -> KvResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| KvError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let entries = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|source| KvError::InvalidData {
                    path: path.clone(),
                    source,
                })?
            }
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(KvError::Io { path, source }),
        };

        debug!(
            "event=kv_open module=kv status=ok keys={}",
            entries.len()
        );
        Ok(Self { path, entries })
    }

    /// Returns the document path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> KvResult<()> {
        let encoded = serde_json::to_vec_pretty(entries).map_err(KvError::Serialize)?;
        let temp_path = self.path.with_extension(TEMP_SUFFIX);

        let write_temp = || -> std::io::Result<()> {
            let mut file = File::create(&temp_path)?;
            file.write_all(&encoded)?;
            file.sync_all()?;
            Ok(())
        };
        if let Err(source) = write_temp() {
            discard_temp(&temp_path);
            return Err(KvError::Io {
                path: temp_path,
                source,
            });
        }

        fs::rename(&temp_path, &self.path).map_err(|source| {
            error!("event=kv_write module=kv status=error error_code=rename_failed error={source}");
            discard_temp(&temp_path);
            KvError::Io {
                path: self.path.clone(),
                source,
            }
        })
    }
}

fn discard_temp(temp_path: &Path) {
    if temp_path.is_file() {
        if let Err(err) = fs::remove_file(temp_path) {
            warn!("event=kv_write module=kv status=error error_code=temp_cleanup_failed error={err}");
        }
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> KvResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> KvResult<()> {
        let mut next = self.entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        self.entries = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::FileKeyValueStore;
    use crate::kv::{KeyValueStore, KvError};

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("kv.json");

        let mut store = FileKeyValueStore::open(&path).unwrap();
        assert_eq!(store.get("app:points").unwrap(), None);
        store.set("app:points", "7").unwrap();
        drop(store);

        let reopened = FileKeyValueStore::open(&path).unwrap();
        assert_eq!(reopened.get("app:points").unwrap().as_deref(), Some("7"));
    }

    #[test]
    fn corrupt_document_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = FileKeyValueStore::open(&path).unwrap_err();
        assert!(matches!(err, KvError::InvalidData { .. }));
    }

    #[test]
    fn failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.json");
        let mut store = FileKeyValueStore::open(&path).unwrap();

        // A non-empty directory at the document path cannot be replaced.
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupied"), "x").unwrap();

        assert!(store.set("app:points", "1").is_err());
        assert!(!path.with_extension("tmp").exists());
        assert_eq!(store.get("app:points").unwrap(), None);
    }

    #[test]
    fn failed_write_keeps_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.json");
        let mut store = FileKeyValueStore::open(&path).unwrap();
        store.set("app:points", "1").unwrap();

        // A directory at the temp path makes the next write fail.
        std::fs::create_dir(path.with_extension("tmp")).unwrap();
        assert!(store.set("app:points", "2").is_err());
        assert_eq!(store.get("app:points").unwrap().as_deref(), Some("1"));
    }
}
