//! Dialog stack machine
//!
//! A dialog is a resumable unit of conversation occupying one stack frame.
//! Every turn is dispatched to the dialog on top of the stack; when a dialog
//! ends, its frame is popped and the dialog beneath it is resumed with the
//! result.

mod context;
mod error;
mod instance;
mod set;
pub mod waterfall;

pub use context::DialogContext;
pub use error::DialogError;
pub use instance::{DialogInstance, DialogStack, DialogState};
pub use set::DialogSet;
pub use waterfall::{StepAction, WaterfallDialog, WaterfallState, WaterfallStepContext};

use crate::prompt::PromptOptions;
use crate::turn::Turn;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of dispatching a turn to the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogTurnStatus {
    /// Nothing on the stack
    Empty,
    /// The active dialog expects another user turn
    Waiting,
    /// The last dialog on the stack ended normally
    Complete,
    /// The stack was unwound by a cancellation
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DialogTurnResult {
    pub status: DialogTurnStatus,
    pub result: Option<Value>,
}

impl DialogTurnResult {
    pub fn empty() -> Self {
        Self {
            status: DialogTurnStatus::Empty,
            result: None,
        }
    }

    pub fn waiting() -> Self {
        Self {
            status: DialogTurnStatus::Waiting,
            result: None,
        }
    }

    pub fn complete(result: Option<Value>) -> Self {
        Self {
            status: DialogTurnStatus::Complete,
            result,
        }
    }

    pub fn cancelled() -> Self {
        Self {
            status: DialogTurnStatus::Cancelled,
            result: None,
        }
    }
}

/// Why a dialog is being resumed or ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogReason {
    BeginCalled,
    ContinueCalled,
    EndCalled,
    ReplaceCalled,
    CancelCalled,
    NextCalled,
}

/// Arguments passed to a dialog when it is begun
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DialogOptions {
    #[default]
    None,
    Prompt(PromptOptions),
    Value(Value),
}

impl DialogOptions {
    pub fn value(&self) -> Option<&Value> {
        match self {
            DialogOptions::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl From<PromptOptions> for DialogOptions {
    fn from(options: PromptOptions) -> Self {
        DialogOptions::Prompt(options)
    }
}

/// Lifecycle contract every dialog implements.
///
/// Only `begin_dialog` is required. By default a dialog ends itself on the
/// next turn and passes a child's result straight through to its parent.
#[async_trait]
pub trait Dialog: Send + Sync {
    /// Registry key, unique within a [`DialogSet`]
    fn id(&self) -> &str;

    /// Called when the dialog is pushed; its frame is already on top
    async fn begin_dialog(
        &self,
        dc: &mut DialogContext,
        options: DialogOptions,
    ) -> Result<DialogTurnResult, DialogError>;

    /// Called for each turn while the dialog is on top of the stack
    async fn continue_dialog(
        &self,
        dc: &mut DialogContext,
    ) -> Result<DialogTurnResult, DialogError> {
        dc.end_dialog(None).await
    }

    /// Called when a dialog this one started has ended
    async fn resume_dialog(
        &self,
        dc: &mut DialogContext,
        _reason: DialogReason,
        result: Option<Value>,
    ) -> Result<DialogTurnResult, DialogError> {
        dc.end_dialog(result).await
    }

    /// Re-send whatever the dialog is waiting on
    async fn reprompt_dialog(
        &self,
        _turn: &mut Turn,
        _instance: &DialogInstance,
    ) -> Result<(), DialogError> {
        Ok(())
    }

    /// Cleanup hook, called right after the frame is popped
    async fn end_dialog(
        &self,
        _turn: &mut Turn,
        _instance: &DialogInstance,
        _reason: DialogReason,
    ) -> Result<(), DialogError> {
        Ok(())
    }
}
