//! Stack frames and their persisted state

use super::waterfall::WaterfallState;
use crate::prompt::PromptState;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-dialog-kind frame state.
///
/// The stack manager treats this as opaque; only the dialog that owns the
/// frame reads or writes it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DialogState {
    #[default]
    Empty,
    Prompt(PromptState),
    Waterfall(WaterfallState),
    /// Free-form state for application dialogs
    Custom { data: Value },
}

impl DialogState {
    pub fn kind(&self) -> &'static str {
        match self {
            DialogState::Empty => "empty",
            DialogState::Prompt(_) => "prompt",
            DialogState::Waterfall(_) => "waterfall",
            DialogState::Custom { .. } => "custom",
        }
    }
}

/// One stack frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogInstance {
    pub id: String,
    #[serde(default)]
    pub state: DialogState,
}

impl DialogInstance {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: DialogState::Empty,
        }
    }
}

/// Ordered frames; the last one is active
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DialogStack {
    frames: Vec<DialogInstance>,
}

impl DialogStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instance: DialogInstance) {
        self.frames.push(instance);
    }

    pub fn pop(&mut self) -> Option<DialogInstance> {
        self.frames.pop()
    }

    /// Drop every frame above `depth`
    pub fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth);
    }

    pub fn top(&self) -> Option<&DialogInstance> {
        self.frames.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut DialogInstance> {
        self.frames.last_mut()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames from bottom to top
    pub fn frames(&self) -> &[DialogInstance] {
        &self.frames
    }

    /// Dialog ids from bottom to top
    pub fn ids(&self) -> Vec<&str> {
        self.frames.iter().map(|f| f.id.as_str()).collect()
    }
}
