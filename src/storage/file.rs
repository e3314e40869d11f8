//! JSON file state store
//!
//! The record lives in a single JSON file. Saves go to a temporary file
//! next to the target which is synced and then renamed over it, so a
//! reader observes either the old or the new record.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{instrument, trace};

use crate::state::MonitorState;

use super::backend::{StateStore, validate};
use super::error::StorageResult;

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the record, `.` for a bare file name
    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("state.json"));
        name.push(format!(".{}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }
}

/// Flush a directory's entries to disk
async fn sync_dir(dir: &Path) -> std::io::Result<()> {
    tokio::fs::File::open(dir).await?.sync_all().await
}

#[async_trait]
impl StateStore for FileStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn read(&self) -> StorageResult<Option<MonitorState>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                trace!("no stored state yet");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let state: MonitorState = serde_json::from_str(&content)?;
        validate(state).map(Some)
    }

    #[instrument(skip(self, state), fields(path = %self.path.display()))]
    async fn save(&self, state: &MonitorState) -> StorageResult<()> {
        let content = serde_json::to_vec_pretty(state)?;

        tokio::fs::create_dir_all(self.directory()).await?;

        let temp_path = self.temp_path();
        let written = async {
            let mut file = tokio::fs::File::create(&temp_path).await?;
            file.write_all(&content).await?;
            file.sync_all().await?;
            tokio::fs::rename(&temp_path, &self.path).await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        // the rename only survives a crash once the directory entry is on disk
        sync_dir(self.directory()).await?;

        trace!("state saved");
        Ok(())
    }
}
