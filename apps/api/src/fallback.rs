//! Local JSON-file store used when the remote database rejects a write.
//!
//! Each record kind lives in its own file holding a single JSON array. A write
//! reads the whole array, pushes one record and rewrites the file through a
//! temp file that is atomically persisted over the target. The read-modify-write
//! cycle is serialized by a process-wide mutex; writers in other processes are
//! not coordinated.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::models::RecordKind;

#[derive(Debug, Error)]
pub enum FallbackError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt JSON in {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("email already present in {}", .path.display())]
    DuplicateEmail { path: PathBuf },

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Clone)]
pub struct LocalJsonStore {
    dir: Arc<PathBuf>,
    write_lock: Arc<Mutex<()>>,
}

impl LocalJsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Arc::new(dir.into()),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path_for(&self, kind: RecordKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// Appends one record to the kind's file, creating the directory and file
    /// on first use.
    pub async fn append<T: Serialize>(
        &self,
        kind: RecordKind,
        record: &T,
    ) -> Result<(), FallbackError> {
        let value = serde_json::to_value(record)?;
        let path = self.path_for(kind);
        let _guard = self.write_lock.lock().await;

        let count = tokio::task::spawn_blocking(move || -> Result<usize, FallbackError> {
            let mut items = read_array(&path)?;
            items.push(value);
            write_array(&path, &items)?;
            Ok(items.len())
        })
        .await??;

        debug!(%kind, count, "Appended record to local fallback file");
        Ok(())
    }

    /// Returns every record in the kind's file. A missing or empty file is `[]`.
    pub async fn list<T: DeserializeOwned + Send + 'static>(
        &self,
        kind: RecordKind,
    ) -> Result<Vec<T>, FallbackError> {
        let path = self.path_for(kind);
        tokio::task::spawn_blocking(move || -> Result<Vec<T>, FallbackError> {
            let items = read_array(&path)?;
            items
                .into_iter()
                .map(|v| {
                    serde_json::from_value(v).map_err(|source| FallbackError::Corrupt {
                        path: path.clone(),
                        source,
                    })
                })
                .collect()
        })
        .await?
    }

    /// Appends `record` unless a record with the same `email` (exact match)
    /// is already in the file. The check and the write share one locked
    /// read-modify-write cycle.
    pub async fn append_unique_email<T: Serialize>(
        &self,
        kind: RecordKind,
        email: &str,
        record: &T,
    ) -> Result<(), FallbackError> {
        let value = serde_json::to_value(record)?;
        let path = self.path_for(kind);
        let email = email.to_string();
        let _guard = self.write_lock.lock().await;

        let count = tokio::task::spawn_blocking(move || -> Result<usize, FallbackError> {
            let mut items = read_array(&path)?;
            if items
                .iter()
                .any(|item| item.get("email").and_then(Value::as_str) == Some(email.as_str()))
            {
                return Err(FallbackError::DuplicateEmail { path });
            }
            items.push(value);
            write_array(&path, &items)?;
            Ok(items.len())
        })
        .await??;

        debug!(%kind, count, "Appended record to local fallback file");
        Ok(())
    }
}

fn read_array(path: &Path) -> Result<Vec<Value>, FallbackError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(FallbackError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&raw).map_err(|source| FallbackError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn write_array(path: &Path, items: &[Value]) -> Result<(), FallbackError> {
    let io_err = |source| FallbackError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(io_err)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    serde_json::to_writer_pretty(&mut tmp, items)?;
    tmp.write_all(b"\n").map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
