//! State store trait definition

use async_trait::async_trait;
use tracing::warn;

use crate::state::MonitorState;

use super::error::{StorageError, StorageResult};

/// Trait for the durable home of the monitoring state
///
/// The store is the only component allowed to touch durable storage.
/// Only one cycle is ever active, so implementations need no locking
/// beyond making `save` atomic.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the stored record, `Ok(None)` if none exists yet
    async fn read(&self) -> StorageResult<Option<MonitorState>>;

    /// Atomically replace the stored record
    ///
    /// A concurrent reader must see either the previous or the new
    /// record, never a partial write.
    async fn save(&self, state: &MonitorState) -> StorageResult<()>;

    /// Load the state for a new cycle
    ///
    /// A missing record yields the zero state. An unreadable or corrupt
    /// record is logged and also yields the zero state, so the monitor
    /// keeps running after losing its state.
    async fn load(&self) -> MonitorState {
        match self.read().await {
            Ok(Some(state)) => state,
            Ok(None) => MonitorState::default(),
            Err(e) => {
                warn!("discarding unreadable monitor state: {e}");
                MonitorState::default()
            }
        }
    }
}

/// Reject records that parse but break the state invariants
pub fn validate(state: MonitorState) -> StorageResult<MonitorState> {
    if let Some(value) = state.last_value
        && (!value.is_finite() || value < 0.0)
    {
        return Err(StorageError::InvalidState(format!(
            "last value must be finite and non-negative, got {value}"
        )));
    }

    if let Some(value) = state.alert_reference
        && (!value.is_finite() || value < 0.0)
    {
        return Err(StorageError::InvalidState(format!(
            "alert reference must be finite and non-negative, got {value}"
        )));
    }

    if !state.threshold.is_finite() {
        return Err(StorageError::InvalidState(format!(
            "threshold must be finite, got {}",
            state.threshold
        )));
    }

    Ok(state)
}
