//! Session document store.
//!
//! The data directory is treated as an append-only log keyed by
//! timestamp: the sampler only ever publishes new documents with an
//! atomic rename and nothing ever edits a published file. That rename
//! is the whole consistency mechanism; readers see either a complete
//! document or none at all.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File extension for session documents.
const DOC_EXTENSION: &str = "json";

/// Errors that can occur in the store layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Session id is not a plain file stem (traversal attempt or junk).
    #[error("invalid session id: '{0}'")]
    InvalidId(String),

    /// No document with the requested id.
    #[error("session not found: '{0}'")]
    NotFound(String),

    /// A document for this end time already exists. Two sessions must
    /// never share an end time at microsecond precision.
    #[error("session document already exists: {0}")]
    Collision(PathBuf),
}

/// One completed sampling session.
///
/// `samples` holds the raw probe exit codes in probe order; 0 means
/// the target was reachable, anything else is passed through verbatim
/// from the probe. Timestamps serialize as RFC 3339 UTC strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDocument {
    /// Instant the session began, before the first probe.
    pub start_time: DateTime<Utc>,
    /// Instant the session completed, after the last probe. Also the
    /// document's identity: the filename is derived from it.
    pub end_time: DateTime<Utc>,
    /// Per-probe status codes, in probe order.
    pub samples: Vec<i32>,
}

impl SessionDocument {
    /// The document's identifier: its end time at microsecond
    /// precision, sortable and collision-resistant under
    /// one-sampler-at-a-time operation.
    pub fn id(&self) -> String {
        self.end_time.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

/// Check that a session id names a plain file stem and nothing else.
fn validate_id(id: &str) -> Result<(), StoreError> {
    if id.is_empty()
        || id.contains('/')
        || id.contains('\\')
        || id.contains("..")
        || id.contains('\0')
    {
        return Err(StoreError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// A single source's directory of session documents.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Open a store over an existing directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Open a store, creating the directory if needed.
    ///
    /// # Errors
    /// Returns `StoreError::Io` if the directory cannot be created.
    /// This is the one unrecoverable filesystem error at startup.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// The directory this store reads and writes.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Atomically publish a completed session document.
    ///
    /// Writes the serialized document to a temporary file in the same
    /// directory, then renames it into place, so no reader can ever
    /// observe a truncated document.
    ///
    /// # Errors
    /// Returns `StoreError::Collision` if a document with the same end
    /// time already exists, `Io`/`Json` on write failures.
    pub fn write(&self, doc: &SessionDocument) -> Result<PathBuf, StoreError> {
        let id = doc.id();
        let path = self.dir.join(format!("{id}.{DOC_EXTENSION}"));
        if path.exists() {
            return Err(StoreError::Collision(path));
        }

        let tmp = self.dir.join(format!("{id}.{DOC_EXTENSION}.tmp"));
        let bytes = serde_json::to_vec(doc)?;
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &path)?;
        Ok(path)
    }

    /// List session ids, ascending.
    ///
    /// Filters directory entries to the document extension and strips
    /// it; ids are timestamp-derived, so ascending order is
    /// chronological.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(DOC_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Read the raw bytes of one session document.
    ///
    /// # Errors
    /// Returns `StoreError::InvalidId` for ids that are not plain file
    /// stems, `NotFound` if no such document exists.
    pub fn read(&self, id: &str) -> Result<Vec<u8>, StoreError> {
        validate_id(id)?;
        let path = self.dir.join(format!("{id}.{DOC_EXTENSION}"));
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Ordered mapping from source name to its session store.
///
/// Built once at startup from `name:path` pairs; the read-only shared
/// state behind every viewer request.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    sources: BTreeMap<String, SessionStore>,
}

impl SourceMap {
    /// Build a map from (name, directory) pairs.
    pub fn new(pairs: impl IntoIterator<Item = (String, PathBuf)>) -> Self {
        let sources = pairs
            .into_iter()
            .map(|(name, dir)| (name, SessionStore::new(dir)))
            .collect();
        Self { sources }
    }

    /// Look up a registered source. Unregistered names get `None`,
    /// never a fallback directory.
    pub fn get(&self, name: &str) -> Option<&SessionStore> {
        self.sources.get(name)
    }

    /// Configured source names, ascending.
    pub fn names(&self) -> Vec<String> {
        self.sources.keys().cloned().collect()
    }

    /// Number of configured sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether no sources are configured.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
