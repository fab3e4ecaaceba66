//! Draft persistence.
//!
//! A draft is the last autosaved [`Payload`] of a form, stored as JSON under
//! a short key. [`FileDraftStore`] keeps one `<key>.json` per draft;
//! [`MemoryDraftStore`] is for tests and embedders without a disk.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use intake_types::Payload;
use intake_utils::{atomic_write, recover_bak_file};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("draft IO failed: {0}")]
    Io(#[from] io::Error),
    #[error("draft is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid draft key `{0}`")]
    InvalidKey(String),
}

pub trait DraftStore: Send + Sync {
    /// `Ok(None)` when nothing is stored under `key`.
    fn load(&self, key: &str) -> Result<Option<Payload>, DraftError>;
    fn save(&self, key: &str, draft: &Payload) -> Result<(), DraftError>;
    /// Removing a missing draft is not an error.
    fn remove(&self, key: &str) -> Result<(), DraftError>;
}

#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryDraftStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored JSON, as a browser's storage would hold it.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    pub fn insert_raw(&self, key: impl Into<String>, json: impl Into<String>) {
        self.entries().insert(key.into(), json.into());
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DraftStore for MemoryDraftStore {
    fn load(&self, key: &str) -> Result<Option<Payload>, DraftError> {
        let Some(raw) = self.raw(key) else {
            return Ok(None);
        };
        Ok(Some(Payload::from_json(&raw)?))
    }

    fn save(&self, key: &str, draft: &Payload) -> Result<(), DraftError> {
        let json = draft.to_json()?;
        self.insert_raw(key, json);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DraftError> {
        self.entries().remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FileDraftStore {
    dir: PathBuf,
}

impl FileDraftStore {
    /// The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf, DraftError> {
        let valid = !key.is_empty()
            && key
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        if !valid {
            return Err(DraftError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl DraftStore for FileDraftStore {
    fn load(&self, key: &str) -> Result<Option<Payload>, DraftError> {
        let path = self.path_for(key)?;
        recover_bak_file(&path);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(Payload::from_json(&raw)?))
    }

    fn save(&self, key: &str, draft: &Payload) -> Result<(), DraftError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        let json = draft.to_json()?;
        atomic_write(&path, json.as_bytes())?;
        tracing::debug!(path = %path.display(), fields = draft.len(), "Draft written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DraftError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use intake_types::PayloadValue;
    use tempfile::tempdir;

    use super::*;

    fn sample() -> Payload {
        let mut draft = Payload::new();
        draft.insert("firstName", "Jane");
        draft.insert("technologies", PayloadValue::List(vec!["react".into()]));
        draft
    }

    #[test]
    fn file_store_round_trips_and_removes() {
        let dir = tempdir().unwrap();
        let store = FileDraftStore::new(dir.path().join("drafts"));

        assert!(store.load("webduos_project_form").unwrap().is_none());
        store.save("webduos_project_form", &sample()).unwrap();
        assert_eq!(store.load("webduos_project_form").unwrap(), Some(sample()));

        store.remove("webduos_project_form").unwrap();
        assert!(store.load("webduos_project_form").unwrap().is_none());
        store.remove("webduos_project_form").unwrap();
    }

    #[test]
    fn file_store_recovers_interrupted_write() {
        let dir = tempdir().unwrap();
        let store = FileDraftStore::new(dir.path());
        let path = store.path_for("quote").unwrap();
        fs::write(path.with_extension("bak"), sample().to_json().unwrap()).unwrap();

        assert_eq!(store.load("quote").unwrap(), Some(sample()));
        assert!(path.exists());
    }

    #[test]
    fn corrupt_draft_is_a_json_error() {
        let dir = tempdir().unwrap();
        let store = FileDraftStore::new(dir.path());
        fs::write(store.path_for("quote").unwrap(), "{not json").unwrap();
        assert!(matches!(store.load("quote"), Err(DraftError::Json(_))));
    }

    #[test]
    fn rejects_path_like_keys() {
        let store = FileDraftStore::new("/tmp");
        for key in ["", "../etc/passwd", "a/b", "a.b"] {
            assert!(matches!(store.path_for(key), Err(DraftError::InvalidKey(_))), "{key}");
        }
    }

    #[test]
    fn memory_store_keeps_json_text() {
        let store = MemoryDraftStore::new();
        store.save("k", &sample()).unwrap();
        assert_eq!(
            store.raw("k").unwrap(),
            r#"{"firstName":"Jane","technologies":["react"]}"#
        );
        assert_eq!(store.load("k").unwrap(), Some(sample()));
        store.remove("k").unwrap();
        assert!(store.load("k").unwrap().is_none());
    }
}
