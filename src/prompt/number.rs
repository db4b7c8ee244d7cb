//! Numeric prompt

use super::{Prompt, PromptKind, PromptOptions, PromptRecognizerResult};
use crate::dialog::DialogError;
use crate::turn::Turn;
use async_trait::async_trait;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-+]?(?:\d{1,3}(?:,\d{3})+|\d+)?(?:\.\d+)?").expect("valid number pattern")
});

/// Recognizes the first number in the reply
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberKind;

pub type NumberPrompt = Prompt<NumberKind>;

/// First numeric literal in `text`, with thousands separators removed
pub fn parse_number(text: &str) -> Option<f64> {
    NUMBER
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|s| s.bytes().any(|b| b.is_ascii_digit()))
        .find_map(|s| s.replace(',', "").parse::<f64>().ok())
}

#[async_trait]
impl PromptKind for NumberKind {
    type Value = f64;

    async fn recognize(
        &self,
        turn: &Turn,
        _state: &Map<String, Value>,
        _options: &PromptOptions,
    ) -> Result<PromptRecognizerResult<f64>, DialogError> {
        Ok(parse_number(turn.activity().text()).into())
    }
}
