//! Free text prompt

use super::{Prompt, PromptKind, PromptOptions, PromptRecognizerResult};
use crate::dialog::DialogError;
use crate::turn::Turn;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Accepts any message with visible text
#[derive(Debug, Clone, Copy, Default)]
pub struct TextKind;

pub type TextPrompt = Prompt<TextKind>;

#[async_trait]
impl PromptKind for TextKind {
    type Value = String;

    async fn recognize(
        &self,
        turn: &Turn,
        _state: &Map<String, Value>,
        _options: &PromptOptions,
    ) -> Result<PromptRecognizerResult<String>, DialogError> {
        let text = turn.activity().text();
        if text.trim().is_empty() {
            return Ok(PromptRecognizerResult::failed());
        }
        Ok(PromptRecognizerResult::succeeded(text.to_string()))
    }
}
