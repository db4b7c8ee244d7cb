//! Typed prompts
//!
//! A prompt is a dialog that asks the user for one value, re-asks until a
//! reply is recognized (and accepted by the optional validator), then ends
//! with the value. The per-type behaviour lives in a [`PromptKind`];
//! [`Prompt`] supplies the shared state machine.

mod attachment;
mod choice;
mod confirm;
mod number;
mod text;

#[cfg(test)]
mod proptests;

pub use attachment::{AttachmentKind, AttachmentPrompt};
pub use choice::{ChoiceKind, ChoicePrompt};
pub use confirm::{ConfirmKind, ConfirmPrompt};
pub use number::{NumberKind, NumberPrompt};
pub use text::{TextKind, TextPrompt};

use crate::activity::{Activity, InputHint};
use crate::choices::{Choice, ChoiceFactory, ChoiceFactoryOptions, ListStyle};
use crate::dialog::{
    Dialog, DialogContext, DialogError, DialogInstance, DialogOptions, DialogReason, DialogState,
    DialogTurnResult,
};
use crate::turn::Turn;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key of the retry counter in [`PromptState::state`]
pub const ATTEMPT_COUNT_KEY: &str = "attemptCount";

/// Arguments a prompt is begun with
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<Activity>,
    /// Sent instead of `prompt` after a rejected reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_prompt: Option<Activity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Choice>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<ListStyle>,
    /// Free-form data for validators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validations: Option<Value>,
}

impl PromptOptions {
    pub fn new(prompt: Activity) -> Self {
        Self {
            prompt: Some(prompt),
            ..Self::default()
        }
    }

    pub fn text(prompt: impl Into<String>) -> Self {
        Self::new(Activity::message(prompt))
    }

    #[must_use]
    pub fn with_retry_prompt(mut self, retry_prompt: Activity) -> Self {
        self.retry_prompt = Some(retry_prompt);
        self
    }

    #[must_use]
    pub fn with_choices(mut self, choices: Vec<Choice>) -> Self {
        self.choices = Some(choices);
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: ListStyle) -> Self {
        self.style = Some(style);
        self
    }

    #[must_use]
    pub fn with_validations(mut self, validations: Value) -> Self {
        self.validations = Some(validations);
        self
    }

    /// The activity to send, falling back to `prompt` when retrying without
    /// a retry prompt
    pub fn prompt_for(&self, is_retry: bool) -> Option<&Activity> {
        if is_retry {
            self.retry_prompt.as_ref().or(self.prompt.as_ref())
        } else {
            self.prompt.as_ref()
        }
    }
}

/// Frame state of an active prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptState {
    pub options: PromptOptions,
    /// Kind-specific values plus the retry counter
    #[serde(default)]
    pub state: Map<String, Value>,
}

impl PromptState {
    pub fn new(options: PromptOptions) -> Self {
        let mut state = Map::new();
        state.insert(ATTEMPT_COUNT_KEY.to_string(), Value::from(0_u64));
        Self { options, state }
    }

    /// Message turns processed since the prompt was begun
    pub fn attempt_count(&self) -> u64 {
        self.state
            .get(ATTEMPT_COUNT_KEY)
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }
}

/// Outcome of recognizing a reply
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRecognizerResult<T> {
    pub succeeded: bool,
    pub value: Option<T>,
}

impl<T> PromptRecognizerResult<T> {
    pub fn succeeded(value: T) -> Self {
        Self {
            succeeded: true,
            value: Some(value),
        }
    }

    pub fn failed() -> Self {
        Self {
            succeeded: false,
            value: None,
        }
    }
}

impl<T> From<Option<T>> for PromptRecognizerResult<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(Self::failed, Self::succeeded)
    }
}

/// What a validator gets to look at
pub struct PromptValidatorContext<'a, T> {
    pub recognized: &'a PromptRecognizerResult<T>,
    /// The current turn; a validator that replies suppresses the retry prompt
    pub turn: &'a mut Turn,
    pub options: &'a PromptOptions,
    pub attempt_count: u64,
}

/// Decides whether a recognized reply is acceptable
#[async_trait]
pub trait PromptValidator<T: Send + Sync>: Send + Sync {
    async fn validate(&self, ctx: &mut PromptValidatorContext<'_, T>) -> Result<bool, DialogError>;
}

#[async_trait]
impl<T, F> PromptValidator<T> for F
where
    T: Send + Sync,
    F: Fn(&PromptRecognizerResult<T>) -> bool + Send + Sync,
{
    async fn validate(&self, ctx: &mut PromptValidatorContext<'_, T>) -> Result<bool, DialogError> {
        Ok(self(ctx.recognized))
    }
}

/// Per-type behaviour of a prompt
#[async_trait]
pub trait PromptKind: Send + Sync + 'static {
    type Value: Serialize + Send + Sync;

    /// Send the prompt, or the retry prompt when `is_retry`
    async fn on_prompt(
        &self,
        turn: &mut Turn,
        _state: &Map<String, Value>,
        options: &PromptOptions,
        is_retry: bool,
    ) -> Result<(), DialogError> {
        if let Some(activity) = options.prompt_for(is_retry) {
            turn.send_activity(activity.clone()).await?;
        }
        Ok(())
    }

    /// Try to extract a value from the inbound message
    async fn recognize(
        &self,
        turn: &Turn,
        state: &Map<String, Value>,
        options: &PromptOptions,
    ) -> Result<PromptRecognizerResult<Self::Value>, DialogError>;
}

/// Dialog that asks for a value of type `K::Value`
pub struct Prompt<K: PromptKind> {
    id: String,
    kind: K,
    validator: Option<Box<dyn PromptValidator<K::Value>>>,
    default_options: Option<PromptOptions>,
}

impl<K: PromptKind + Default> Prompt<K> {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_kind(id, K::default())
    }
}

impl<K: PromptKind> Prompt<K> {
    pub fn with_kind(id: impl Into<String>, kind: K) -> Self {
        Self {
            id: id.into(),
            kind,
            validator: None,
            default_options: None,
        }
    }

    /// Replace the default acceptance rule (recognition succeeded)
    #[must_use]
    pub fn with_validator(mut self, validator: impl PromptValidator<K::Value> + 'static) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    /// Options used when the prompt is begun without any
    #[must_use]
    pub fn with_default_options(mut self, options: PromptOptions) -> Self {
        self.default_options = Some(options);
        self
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    fn state(&self, instance: Option<&DialogInstance>) -> Result<PromptState, DialogError> {
        match instance.map(|i| &i.state) {
            Some(DialogState::Prompt(state)) => Ok(state.clone()),
            _ => Err(DialogError::StateMismatch {
                dialog_id: self.id.clone(),
                expected: "prompt",
            }),
        }
    }

    fn resolve_options(&self, options: DialogOptions) -> Result<PromptOptions, DialogError> {
        match options {
            DialogOptions::Prompt(options) => Ok(options),
            DialogOptions::None => self.default_options.clone().ok_or_else(|| {
                DialogError::Configuration(format!("prompt '{}' begun without options", self.id))
            }),
            DialogOptions::Value(_) => Err(DialogError::Configuration(format!(
                "prompt '{}' needs prompt options",
                self.id
            ))),
        }
    }
}

#[async_trait]
impl<K: PromptKind> Dialog for Prompt<K> {
    fn id(&self) -> &str {
        &self.id
    }

    async fn begin_dialog(
        &self,
        dc: &mut DialogContext,
        options: DialogOptions,
    ) -> Result<DialogTurnResult, DialogError> {
        let mut options = self.resolve_options(options)?;
        for activity in [&mut options.prompt, &mut options.retry_prompt]
            .into_iter()
            .flatten()
        {
            activity.input_hint.get_or_insert(InputHint::ExpectingInput);
        }

        let state = PromptState::new(options);
        dc.set_active_state(DialogState::Prompt(state.clone()))?;
        self.kind
            .on_prompt(&mut dc.turn, &state.state, &state.options, false)
            .await?;
        Ok(DialogTurnResult::waiting())
    }

    async fn continue_dialog(
        &self,
        dc: &mut DialogContext,
    ) -> Result<DialogTurnResult, DialogError> {
        if !dc.turn.activity().is_message() {
            return Ok(DialogTurnResult::waiting());
        }

        let mut state = self.state(dc.active_dialog())?;
        let attempt_count = state.attempt_count() + 1;
        state
            .state
            .insert(ATTEMPT_COUNT_KEY.to_string(), Value::from(attempt_count));

        let recognized = self
            .kind
            .recognize(&dc.turn, &state.state, &state.options)
            .await?;
        let accepted = match &self.validator {
            Some(validator) => {
                let mut ctx = PromptValidatorContext {
                    recognized: &recognized,
                    turn: &mut dc.turn,
                    options: &state.options,
                    attempt_count,
                };
                validator.validate(&mut ctx).await?
            }
            None => recognized.succeeded,
        };
        dc.set_active_state(DialogState::Prompt(state.clone()))?;

        if accepted {
            let value = recognized.value.map(serde_json::to_value).transpose()?;
            return dc.end_dialog(value).await;
        }

        tracing::debug!(
            dialog_id = %self.id,
            attempt = attempt_count,
            "Prompt reply rejected"
        );
        if !dc.turn.responded() {
            self.kind
                .on_prompt(&mut dc.turn, &state.state, &state.options, true)
                .await?;
        }
        Ok(DialogTurnResult::waiting())
    }

    async fn resume_dialog(
        &self,
        dc: &mut DialogContext,
        _reason: DialogReason,
        _result: Option<Value>,
    ) -> Result<DialogTurnResult, DialogError> {
        dc.reprompt_dialog().await?;
        Ok(DialogTurnResult::waiting())
    }

    async fn reprompt_dialog(
        &self,
        turn: &mut Turn,
        instance: &DialogInstance,
    ) -> Result<(), DialogError> {
        let state = self.state(Some(instance))?;
        self.kind
            .on_prompt(turn, &state.state, &state.options, false)
            .await
    }
}

/// Render `choices` into (a copy of) `prompt` using `style`
pub fn append_choices(
    prompt: Option<&Activity>,
    channel_id: &str,
    choices: &[Choice],
    style: ListStyle,
    options: &ChoiceFactoryOptions,
) -> Activity {
    let text = prompt.and_then(|p| p.text.as_deref());
    let rendered = match style {
        ListStyle::None => Activity::message(text.unwrap_or_default()),
        ListStyle::Auto => ChoiceFactory::for_channel(channel_id, choices, text, None, options),
        ListStyle::Inline => ChoiceFactory::inline(choices, text, None, options),
        ListStyle::List => ChoiceFactory::list(choices, text, None, options),
        ListStyle::SuggestedAction => ChoiceFactory::suggested_action(choices, text, None),
    };

    let Some(prompt) = prompt else {
        return rendered.with_input_hint(InputHint::ExpectingInput);
    };
    let mut merged = prompt.clone();
    merged.text = rendered.text;
    if rendered.suggested_actions.is_some() {
        merged.suggested_actions = rendered.suggested_actions;
    }
    merged
}

/// Shared `on_prompt` for kinds that present choices
async fn send_with_choices(
    turn: &mut Turn,
    options: &PromptOptions,
    is_retry: bool,
    choices: &[Choice],
    style: ListStyle,
    factory_options: &ChoiceFactoryOptions,
) -> Result<(), DialogError> {
    let prompt = options.prompt_for(is_retry);
    if prompt.is_none() && choices.is_empty() {
        return Ok(());
    }
    let activity = append_choices(prompt, turn.channel_id(), choices, style, factory_options);
    turn.send_activity(activity).await?;
    Ok(())
}
