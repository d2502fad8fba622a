use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use snafu::ResultExt;

use super::KeyValueStore;
use super::error::{
    CreateStoreDirectorySnafu, EncodeStoreFileSnafu, ParseStoreFileSnafu, ReadStoreFileSnafu,
    RenameStoreFileSnafu, StorageError, StorageResult, WriteStoreFileSnafu,
};

/// Key-value store backed by one JSON object file.
///
/// A missing file reads as an empty store. Writes go to a sibling temp file
/// first and are renamed over the original.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> StorageResult<BTreeMap<String, String>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(source) => {
                return Err(StorageError::ReadStoreFile {
                    stage: "file-store-read",
                    path: display_path(&self.path),
                    source,
                });
            }
        };

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&contents).context(ParseStoreFileSnafu {
            stage: "file-store-parse",
            path: display_path(&self.path),
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).context(CreateStoreDirectorySnafu {
                    stage: "file-store-create-directory",
                    path: display_path(parent),
                })?;
            }
        }

        let content = serde_json::to_string_pretty(entries).context(EncodeStoreFileSnafu {
            stage: "file-store-encode",
            path: display_path(&self.path),
        })?;

        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, content).context(WriteStoreFileSnafu {
            stage: "file-store-write-temporary",
            path: display_path(&temp_path),
        })?;

        std::fs::rename(&temp_path, &self.path).context(RenameStoreFileSnafu {
            stage: "file-store-rename-temporary",
            from: display_path(&temp_path),
            to: display_path(&self.path),
        })
    }

    fn modify<F>(&self, stage: &'static str, apply: F) -> StorageResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StorageError::LockPoisoned { stage })?;
        let mut entries = self.read_entries()?;
        apply(&mut entries);
        self.write_entries(&entries)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.modify("file-store-set-item", |entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        if !self.path.exists() {
            return Ok(());
        }

        self.modify("file-store-remove-item", |entries| {
            entries.remove(key);
        })
    }
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}
