//! Registry of dialogs available to a conversation

use super::{Dialog, DialogError};
use std::collections::HashMap;
use std::sync::Arc;

/// Dialogs keyed by id.
///
/// Built once at startup and shared read-only (behind an `Arc`) by every
/// conversation.
#[derive(Default)]
pub struct DialogSet {
    dialogs: HashMap<String, Arc<dyn Dialog>>,
}

impl DialogSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dialog under its own id
    pub fn add(&mut self, dialog: impl Dialog + 'static) -> Result<&mut Self, DialogError> {
        let id = dialog.id().to_string();
        if id.trim().is_empty() {
            return Err(DialogError::Configuration(
                "dialog id must not be empty".to_string(),
            ));
        }
        if self.dialogs.contains_key(&id) {
            return Err(DialogError::Configuration(format!(
                "a dialog with id '{id}' is already registered"
            )));
        }
        tracing::debug!(dialog_id = %id, "Registered dialog");
        self.dialogs.insert(id, Arc::new(dialog));
        Ok(self)
    }

    /// Builder-style [`DialogSet::add`]
    pub fn with(mut self, dialog: impl Dialog + 'static) -> Result<Self, DialogError> {
        self.add(dialog)?;
        Ok(self)
    }

    pub fn find(&self, id: &str) -> Option<Arc<dyn Dialog>> {
        self.dialogs.get(id).cloned()
    }

    /// Like [`DialogSet::find`] but missing ids are an error
    pub fn resolve(&self, id: &str) -> Result<Arc<dyn Dialog>, DialogError> {
        self.find(id).ok_or_else(|| {
            tracing::warn!(dialog_id = %id, "Dialog not registered");
            DialogError::UnknownDialog(id.to_string())
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.dialogs.contains_key(id)
    }

    /// Registered ids, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.dialogs.keys().cloned().collect();
        ids.sort();
        ids
    }
}
