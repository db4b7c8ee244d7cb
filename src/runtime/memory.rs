//! In-memory state store

use super::traits::StateStore;
use crate::dialog::DialogStack;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Keeps stacks as serialized JSON so every load hands out fresh frames,
/// the same as a real backend would.
#[derive(Default)]
pub struct MemoryStateStore {
    stacks: Mutex<HashMap<String, String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of conversations with a saved stack
    pub fn len(&self) -> usize {
        self.stacks.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw JSON saved for a conversation
    pub fn raw(&self, conversation_id: &str) -> Option<String> {
        self.try_raw(conversation_id).ok().flatten()
    }

    fn try_raw(&self, conversation_id: &str) -> Result<Option<String>, String> {
        let stacks = self.stacks.lock().map_err(|e| e.to_string())?;
        Ok(stacks.get(conversation_id).cloned())
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load_stack(&self, conversation_id: &str) -> Result<Option<DialogStack>, String> {
        let raw = self.try_raw(conversation_id)?;
        raw.map(|json| serde_json::from_str(&json).map_err(|e| e.to_string()))
            .transpose()
    }

    async fn save_stack(&self, conversation_id: &str, stack: &DialogStack) -> Result<(), String> {
        let json = serde_json::to_string(stack).map_err(|e| e.to_string())?;
        self.stacks
            .lock()
            .map_err(|e| e.to_string())?
            .insert(conversation_id.to_string(), json);
        Ok(())
    }

    async fn delete_stack(&self, conversation_id: &str) -> Result<(), String> {
        self.stacks
            .lock()
            .map_err(|e| e.to_string())?
            .remove(conversation_id);
        Ok(())
    }
}
