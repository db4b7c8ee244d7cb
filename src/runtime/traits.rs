//! Trait abstractions for runtime I/O
//!
//! The transport and the persistence backend are collaborators; these
//! traits let the manager run against real or mock implementations.

use crate::activity::Activity;
use crate::db::Database;
use crate::dialog::DialogStack;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Failure to deliver an outbound activity
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct SendError {
    pub message: String,
}

impl SendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Acknowledgement for a delivered activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceResponse {
    pub id: String,
}

/// Outbound side of the transport
#[async_trait]
pub trait ActivitySender: Send + Sync {
    async fn send(&self, activity: &Activity) -> Result<ResourceResponse, SendError>;
}

/// Persistence for dialog stacks, keyed by conversation
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the stack saved at the end of the previous turn
    async fn load_stack(&self, conversation_id: &str) -> Result<Option<DialogStack>, String>;

    /// Replace the saved stack
    async fn save_stack(&self, conversation_id: &str, stack: &DialogStack) -> Result<(), String>;

    /// Forget the conversation entirely
    async fn delete_stack(&self, conversation_id: &str) -> Result<(), String>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: ActivitySender + ?Sized> ActivitySender for Arc<T> {
    async fn send(&self, activity: &Activity) -> Result<ResourceResponse, SendError> {
        (**self).send(activity).await
    }
}

#[async_trait]
impl<T: StateStore + ?Sized> StateStore for Arc<T> {
    async fn load_stack(&self, conversation_id: &str) -> Result<Option<DialogStack>, String> {
        (**self).load_stack(conversation_id).await
    }

    async fn save_stack(&self, conversation_id: &str, stack: &DialogStack) -> Result<(), String> {
        (**self).save_stack(conversation_id, stack).await
    }

    async fn delete_stack(&self, conversation_id: &str) -> Result<(), String> {
        (**self).delete_stack(conversation_id).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use the SQLite database as a [`StateStore`]
#[derive(Clone)]
pub struct SqliteStateStore {
    db: Database,
}

impl SqliteStateStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn inner(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn load_stack(&self, conversation_id: &str) -> Result<Option<DialogStack>, String> {
        self.db
            .load_stack(conversation_id)
            .map_err(|e| e.to_string())
    }

    async fn save_stack(&self, conversation_id: &str, stack: &DialogStack) -> Result<(), String> {
        self.db
            .save_stack(conversation_id, stack)
            .map_err(|e| e.to_string())
    }

    async fn delete_stack(&self, conversation_id: &str) -> Result<(), String> {
        self.db
            .delete_stack(conversation_id)
            .map_err(|e| e.to_string())
    }
}
