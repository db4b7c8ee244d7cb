//! Per-turn stack manager

use super::{
    DialogError, DialogInstance, DialogOptions, DialogReason, DialogSet, DialogStack, DialogState,
    DialogTurnResult,
};
use crate::prompt::PromptOptions;
use crate::turn::Turn;
use serde_json::Value;
use std::sync::Arc;

/// Owns one conversation's dialog stack for the duration of a turn and
/// dispatches the turn to the active dialog.
pub struct DialogContext {
    dialogs: Arc<DialogSet>,
    /// The inbound activity and outbound channel for this turn
    pub turn: Turn,
    stack: DialogStack,
}

impl DialogContext {
    pub fn new(dialogs: Arc<DialogSet>, turn: Turn, stack: DialogStack) -> Self {
        Self {
            dialogs,
            turn,
            stack,
        }
    }

    pub fn dialogs(&self) -> &DialogSet {
        &self.dialogs
    }

    pub fn stack(&self) -> &DialogStack {
        &self.stack
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Frame on top of the stack, if any
    pub fn active_dialog(&self) -> Option<&DialogInstance> {
        self.stack.top()
    }

    /// State of the active frame
    pub fn active_state(&self) -> Option<&DialogState> {
        self.stack.top().map(|f| &f.state)
    }

    /// Replace the state of the active frame
    pub fn set_active_state(&mut self, state: DialogState) -> Result<(), DialogError> {
        let frame = self.stack.top_mut().ok_or_else(|| {
            DialogError::Configuration("no active dialog to update".to_string())
        })?;
        frame.state = state;
        Ok(())
    }

    /// Give back the turn and the stack to persist
    pub fn into_parts(self) -> (Turn, DialogStack) {
        (self.turn, self.stack)
    }

    /// Push a new dialog and start it
    pub async fn begin_dialog(
        &mut self,
        dialog_id: &str,
        options: DialogOptions,
    ) -> Result<DialogTurnResult, DialogError> {
        let dialog = self.dialogs.resolve(dialog_id)?;

        let depth = self.stack.len();
        self.stack.push(DialogInstance::new(dialog_id));
        tracing::debug!(
            dialog_id = %dialog_id,
            depth = self.stack.len(),
            "Dialog begun"
        );

        let outcome = dialog.begin_dialog(self, options).await;
        if outcome.is_err() {
            // A failed begin leaves no frames behind, including any children it pushed
            self.stack.truncate(depth);
        }
        outcome
    }

    /// Shorthand for beginning a prompt dialog
    pub async fn prompt(
        &mut self,
        dialog_id: &str,
        options: PromptOptions,
    ) -> Result<DialogTurnResult, DialogError> {
        self.begin_dialog(dialog_id, DialogOptions::Prompt(options)).await
    }

    /// Route the current turn to the active dialog
    pub async fn continue_dialog(&mut self) -> Result<DialogTurnResult, DialogError> {
        let Some(top) = self.stack.top() else {
            return Ok(DialogTurnResult::empty());
        };
        let dialog = self.dialogs.resolve(&top.id)?;
        dialog.continue_dialog(self).await
    }

    /// End the active dialog and resume its parent with `result`.
    ///
    /// When the stack becomes empty the turn completes with `result`.
    pub async fn end_dialog(
        &mut self,
        result: Option<Value>,
    ) -> Result<DialogTurnResult, DialogError> {
        self.end_active_dialog(DialogReason::EndCalled).await?;

        let Some(top) = self.stack.top() else {
            return Ok(DialogTurnResult::complete(result));
        };
        let dialog = self.dialogs.resolve(&top.id)?;
        tracing::debug!(
            dialog_id = %top.id,
            depth = self.stack.len(),
            "Resuming parent dialog"
        );
        dialog
            .resume_dialog(self, DialogReason::EndCalled, result)
            .await
    }

    /// Pop every frame. An empty stack is a no-op reported as `Empty`.
    pub async fn cancel_all_dialogs(&mut self) -> Result<DialogTurnResult, DialogError> {
        if self.stack.is_empty() {
            return Ok(DialogTurnResult::empty());
        }
        while !self.stack.is_empty() {
            self.end_active_dialog(DialogReason::CancelCalled).await?;
        }
        tracing::debug!("All dialogs cancelled");
        Ok(DialogTurnResult::cancelled())
    }

    /// End the active dialog and start another one in its place without
    /// resuming the parent
    pub async fn replace_dialog(
        &mut self,
        dialog_id: &str,
        options: DialogOptions,
    ) -> Result<DialogTurnResult, DialogError> {
        self.end_active_dialog(DialogReason::ReplaceCalled).await?;
        self.begin_dialog(dialog_id, options).await
    }

    /// Ask the active dialog to re-send its prompt
    pub async fn reprompt_dialog(&mut self) -> Result<(), DialogError> {
        let Some(top) = self.stack.top() else {
            return Ok(());
        };
        let dialog = self.dialogs.resolve(&top.id)?;
        dialog.reprompt_dialog(&mut self.turn, top).await
    }

    async fn end_active_dialog(&mut self, reason: DialogReason) -> Result<(), DialogError> {
        let Some(instance) = self.stack.pop() else {
            return Ok(());
        };
        let dialog = self.dialogs.resolve(&instance.id)?;
        tracing::debug!(
            dialog_id = %instance.id,
            depth = self.stack.len(),
            reason = ?reason,
            "Dialog ended"
        );
        dialog.end_dialog(&mut self.turn, &instance, reason).await
    }
}
