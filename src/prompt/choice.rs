//! Multiple choice prompt

use super::{send_with_choices, Prompt, PromptKind, PromptOptions, PromptRecognizerResult};
use crate::choices::{
    recognize_choices, ChoiceFactoryOptions, FindChoicesOptions, FoundChoice, ListStyle,
};
use crate::dialog::DialogError;
use crate::turn::Turn;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Recognizes one of `PromptOptions::choices`
#[derive(Debug, Clone, Default)]
pub struct ChoiceKind {
    /// Rendering used when the options don't name a style
    pub style: ListStyle,
    pub choice_options: ChoiceFactoryOptions,
    pub recognizer_options: FindChoicesOptions,
}

pub type ChoicePrompt = Prompt<ChoiceKind>;

#[async_trait]
impl PromptKind for ChoiceKind {
    type Value = FoundChoice;

    async fn on_prompt(
        &self,
        turn: &mut Turn,
        _state: &Map<String, Value>,
        options: &PromptOptions,
        is_retry: bool,
    ) -> Result<(), DialogError> {
        let choices = options.choices.as_deref().unwrap_or_default();
        let style = options.style.unwrap_or(self.style);
        send_with_choices(turn, options, is_retry, choices, style, &self.choice_options).await
    }

    async fn recognize(
        &self,
        turn: &Turn,
        _state: &Map<String, Value>,
        options: &PromptOptions,
    ) -> Result<PromptRecognizerResult<FoundChoice>, DialogError> {
        let choices = options.choices.as_deref().unwrap_or_default();
        let found = recognize_choices(turn.activity().text(), choices, &self.recognizer_options)
            .into_iter()
            .next()
            .map(|m| m.resolution);
        Ok(found.into())
    }
}
