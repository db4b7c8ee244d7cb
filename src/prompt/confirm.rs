//! Yes/no prompt

use super::{send_with_choices, Prompt, PromptKind, PromptOptions, PromptRecognizerResult};
use crate::choices::{
    recognize_choices, tokenize, Choice, ChoiceFactoryOptions, FindChoicesOptions, ListStyle,
};
use crate::dialog::DialogError;
use crate::turn::Turn;
use async_trait::async_trait;
use serde_json::{Map, Value};

const YES_WORDS: &[&str] = &[
    "yes", "y", "yeah", "yep", "yup", "sure", "ok", "okay", "true", "correct", "affirmative",
];
const NO_WORDS: &[&str] = &["no", "n", "nope", "nah", "false", "negative", "never"];

/// Recognizes yes/no answers as `bool`
#[derive(Debug, Clone)]
pub struct ConfirmKind {
    /// Rendering used when the options don't name a style
    pub style: ListStyle,
    pub choice_options: ChoiceFactoryOptions,
    /// Rendered choices, in (yes, no) order
    pub confirm_choices: (Choice, Choice),
}

impl Default for ConfirmKind {
    fn default() -> Self {
        Self {
            style: ListStyle::Auto,
            choice_options: ChoiceFactoryOptions::default(),
            confirm_choices: (Choice::new("Yes"), Choice::new("No")),
        }
    }
}

pub type ConfirmPrompt = Prompt<ConfirmKind>;

impl ConfirmKind {
    fn choices(&self) -> [Choice; 2] {
        [self.confirm_choices.0.clone(), self.confirm_choices.1.clone()]
    }

    /// First yes/no word in the utterance
    fn recognize_words(text: &str) -> Option<bool> {
        tokenize(text, None).iter().find_map(|token| {
            let word = token.normalized.as_str();
            if YES_WORDS.contains(&word) {
                Some(true)
            } else if NO_WORDS.contains(&word) {
                Some(false)
            } else {
                None
            }
        })
    }
}

#[async_trait]
impl PromptKind for ConfirmKind {
    type Value = bool;

    async fn on_prompt(
        &self,
        turn: &mut Turn,
        _state: &Map<String, Value>,
        options: &PromptOptions,
        is_retry: bool,
    ) -> Result<(), DialogError> {
        let style = options.style.unwrap_or(self.style);
        send_with_choices(
            turn,
            options,
            is_retry,
            &self.choices(),
            style,
            &self.choice_options,
        )
        .await
    }

    async fn recognize(
        &self,
        turn: &Turn,
        _state: &Map<String, Value>,
        _options: &PromptOptions,
    ) -> Result<PromptRecognizerResult<bool>, DialogError> {
        let text = turn.activity().text();
        if let Some(answer) = Self::recognize_words(text) {
            return Ok(PromptRecognizerResult::succeeded(answer));
        }

        // "1"/"2" and friends only make sense when the choices were numbered
        if self.choice_options.include_numbers {
            let find_options = FindChoicesOptions::default();
            let answer = recognize_choices(text, &self.choices(), &find_options)
                .first()
                .map(|m| m.resolution.index == 0);
            return Ok(answer.into());
        }
        Ok(PromptRecognizerResult::failed())
    }
}
