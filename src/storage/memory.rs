//! In-memory state store (no persistence)
//!
//! Useful for tests and dry runs. Saves can be made to fail on demand
//! to exercise the persistence failure path.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::state::MonitorState;

use super::backend::StateStore;
use super::error::{StorageError, StorageResult};

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<Option<MonitorState>>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: MonitorState) -> Self {
        Self {
            state: RwLock::new(Some(state)),
            ..Self::default()
        }
    }

    /// Make every following save fail (or succeed again)
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> Option<MonitorState> {
        self.state.read().await.clone()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn read(&self) -> StorageResult<Option<MonitorState>> {
        Ok(self.state.read().await.clone())
    }

    async fn save(&self, state: &MonitorState) -> StorageResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::BackendError(
                "in-memory store is set to fail".to_string(),
            ));
        }

        debug!("in-memory store: saving state");
        *self.state.write().await = Some(state.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
