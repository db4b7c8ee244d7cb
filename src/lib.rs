//! Dialog stack engine
//!
//! Multi-turn conversations as a stack of resumable dialogs. Each turn is
//! routed to the dialog on top of the conversation's stack; dialogs begin
//! children, wait for replies and hand results back to their parents.
//! Typed prompts ask for a single value and re-ask until the reply is
//! recognized.

pub mod activity;
pub mod choices;
pub mod db;
pub mod dialog;
pub mod prompt;
pub mod runtime;
pub mod turn;

pub use activity::{Activity, ActivityType, Attachment, InputHint};
pub use dialog::{
    Dialog, DialogContext, DialogError, DialogOptions, DialogReason, DialogSet, DialogTurnResult,
    DialogTurnStatus, StepAction, WaterfallDialog,
};
pub use prompt::{
    AttachmentPrompt, ChoicePrompt, ConfirmPrompt, NumberPrompt, Prompt, PromptOptions,
    TextPrompt,
};
pub use runtime::{DialogManager, MemoryStateStore, RuntimeConfig, SqliteStateStore};
pub use turn::Turn;
