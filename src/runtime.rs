//! Runtime for executing conversation turns
//!
//! Loads a conversation's dialog stack, dispatches the turn, and saves the
//! stack once the turn has finished.

mod executor;
mod memory;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::DialogManager;
pub use memory::MemoryStateStore;
pub use traits::*;

/// Configuration for the console runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub db_path: String,
    pub channel_id: String,
    pub conversation_id: String,
    /// Dialog begun when a conversation has nothing on its stack
    pub root_dialog: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        Self {
            db_path: format!("{home}/.dialog-stack/dialogs.db"),
            channel_id: "console".to_string(),
            conversation_id: "console".to_string(),
            root_dialog: "main".to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            db_path: std::env::var("DIALOG_DB_PATH").unwrap_or(defaults.db_path),
            channel_id: std::env::var("DIALOG_CHANNEL_ID").unwrap_or(defaults.channel_id),
            conversation_id: std::env::var("DIALOG_CONVERSATION_ID")
                .unwrap_or(defaults.conversation_id),
            root_dialog: std::env::var("DIALOG_ROOT").unwrap_or(defaults.root_dialog),
        }
    }
}
