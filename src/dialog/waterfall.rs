//! Sequential multi-step dialogs
//!
//! A waterfall runs its steps in order. Each step is a plain function that
//! inspects the previous step's result and returns a [`StepAction`]; the
//! dialog applies the action to the stack. Steps that start a child dialog
//! are resumed with the child's result on a later turn.

use super::{
    Dialog, DialogContext, DialogError, DialogOptions, DialogReason, DialogState,
    DialogTurnResult,
};
use crate::activity::Activity;
use crate::prompt::PromptOptions;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Persisted state of a running waterfall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallState {
    /// Value passed when the waterfall was begun
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
    /// Scratch values shared by all steps
    #[serde(default)]
    pub values: Map<String, Value>,
    /// Index of the step that ran last
    pub step_index: usize,
    pub instance_id: String,
}

impl WaterfallState {
    fn new(options: Option<Value>) -> Self {
        Self {
            options,
            values: Map::new(),
            step_index: 0,
            instance_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// What a step wants to happen next
#[derive(Debug, Clone, PartialEq)]
pub enum StepAction {
    /// Begin a prompt; its result is handed to the next step
    Prompt {
        dialog_id: String,
        options: PromptOptions,
    },
    /// Begin any child dialog; its result is handed to the next step
    BeginDialog {
        dialog_id: String,
        options: DialogOptions,
    },
    /// Run the next step immediately with the given result
    Next(Option<Value>),
    /// End the waterfall, returning the value to the parent
    EndDialog(Option<Value>),
    /// Wait for the next message; its text becomes the next step's result
    Wait,
    /// Unwind the whole stack
    CancelAll,
}

impl StepAction {
    pub fn prompt(dialog_id: impl Into<String>, options: PromptOptions) -> Self {
        StepAction::Prompt {
            dialog_id: dialog_id.into(),
            options,
        }
    }

    pub fn begin(dialog_id: impl Into<String>, options: DialogOptions) -> Self {
        StepAction::BeginDialog {
            dialog_id: dialog_id.into(),
            options,
        }
    }
}

/// Everything a step can see and change
pub struct WaterfallStepContext {
    index: usize,
    reason: DialogReason,
    result: Option<Value>,
    options: Option<Value>,
    /// Values kept across steps and turns
    pub values: Map<String, Value>,
    replies: Vec<Activity>,
}

impl WaterfallStepContext {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Why this step is running
    pub fn reason(&self) -> DialogReason {
        self.reason
    }

    /// Result of the previous step or child dialog
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn result_str(&self) -> Option<&str> {
        self.result.as_ref().and_then(Value::as_str)
    }

    pub fn options(&self) -> Option<&Value> {
        self.options.as_ref()
    }

    /// Queue a reply, sent before the step's action is applied
    pub fn send(&mut self, activity: Activity) {
        self.replies.push(activity);
    }

    pub fn send_text(&mut self, text: impl Into<String>) {
        self.send(Activity::message(text));
    }
}

type WaterfallStep = Box<dyn Fn(&mut WaterfallStepContext) -> StepAction + Send + Sync>;

/// Dialog made of ordered steps
pub struct WaterfallDialog {
    id: String,
    steps: Vec<WaterfallStep>,
}

impl WaterfallDialog {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step
    #[must_use]
    pub fn step<F>(mut self, step: F) -> Self
    where
        F: Fn(&mut WaterfallStepContext) -> StepAction + Send + Sync + 'static,
    {
        self.steps.push(Box::new(step));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn state(&self, dc: &DialogContext) -> Result<WaterfallState, DialogError> {
        match dc.active_state() {
            Some(DialogState::Waterfall(state)) => Ok(state.clone()),
            _ => Err(DialogError::StateMismatch {
                dialog_id: self.id.clone(),
                expected: "waterfall",
            }),
        }
    }

    /// Run steps from `index` until one of them yields control
    async fn run_steps(
        &self,
        dc: &mut DialogContext,
        mut index: usize,
        mut reason: DialogReason,
        mut result: Option<Value>,
    ) -> Result<DialogTurnResult, DialogError> {
        loop {
            let Some(step) = self.steps.get(index) else {
                tracing::debug!(
                    dialog_id = %self.id,
                    steps = self.steps.len(),
                    "Waterfall finished"
                );
                return dc.end_dialog(result).await;
            };

            let mut state = self.state(dc)?;
            let mut step_context = WaterfallStepContext {
                index,
                reason,
                result: result.take(),
                options: state.options.clone(),
                values: std::mem::take(&mut state.values),
                replies: Vec::new(),
            };
            tracing::debug!(
                dialog_id = %self.id,
                instance_id = %state.instance_id,
                step = index,
                reason = ?reason,
                "Running waterfall step"
            );
            let action = step(&mut step_context);

            state.values = step_context.values;
            state.step_index = index;
            dc.set_active_state(DialogState::Waterfall(state))?;

            for reply in step_context.replies {
                dc.turn.send_activity(reply).await?;
            }

            match action {
                StepAction::Next(next) => {
                    index += 1;
                    reason = DialogReason::NextCalled;
                    result = next;
                }
                StepAction::Prompt { dialog_id, options } => {
                    return dc.prompt(&dialog_id, options).await;
                }
                StepAction::BeginDialog { dialog_id, options } => {
                    return dc.begin_dialog(&dialog_id, options).await;
                }
                StepAction::EndDialog(value) => return dc.end_dialog(value).await,
                StepAction::Wait => return Ok(DialogTurnResult::waiting()),
                StepAction::CancelAll => return dc.cancel_all_dialogs().await,
            }
        }
    }
}

#[async_trait]
impl Dialog for WaterfallDialog {
    fn id(&self) -> &str {
        &self.id
    }

    async fn begin_dialog(
        &self,
        dc: &mut DialogContext,
        options: DialogOptions,
    ) -> Result<DialogTurnResult, DialogError> {
        let options = match options {
            DialogOptions::None => None,
            DialogOptions::Value(value) => Some(value),
            DialogOptions::Prompt(prompt) => Some(serde_json::to_value(prompt)?),
        };
        let state = WaterfallState::new(options);
        tracing::debug!(dialog_id = %self.id, instance_id = %state.instance_id, "Waterfall begun");
        dc.set_active_state(DialogState::Waterfall(state))?;

        self.run_steps(dc, 0, DialogReason::BeginCalled, None).await
    }

    async fn continue_dialog(
        &self,
        dc: &mut DialogContext,
    ) -> Result<DialogTurnResult, DialogError> {
        if !dc.turn.activity().is_message() {
            return Ok(DialogTurnResult::waiting());
        }
        let state = self.state(dc)?;
        let text = Value::String(dc.turn.activity().text().to_string());
        self.run_steps(dc, state.step_index + 1, DialogReason::ContinueCalled, Some(text))
            .await
    }

    async fn resume_dialog(
        &self,
        dc: &mut DialogContext,
        reason: DialogReason,
        result: Option<Value>,
    ) -> Result<DialogTurnResult, DialogError> {
        let state = self.state(dc)?;
        self.run_steps(dc, state.step_index + 1, reason, result).await
    }
}
