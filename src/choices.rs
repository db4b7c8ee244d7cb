//! Choice recognition and rendering
//!
//! Prompts match user replies against candidate choices using the
//! tokenizer, and render the candidates into outbound prompts.

pub mod channel;
mod factory;
mod find;
mod recognize;
pub mod tokenizer;

#[cfg(test)]
mod proptests;

pub use factory::{ChoiceFactory, ChoiceFactoryOptions};
pub use find::{find_choices, find_values, FindChoicesOptions, FindValuesOptions};
pub use recognize::recognize_choices;
pub use tokenizer::{tokenize, Token, TokenizerFn};

use crate::activity::CardAction;
use serde::{Deserialize, Serialize};

/// A candidate the user can pick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<CardAction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
}

impl Choice {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            action: None,
            synonyms: Vec::new(),
        }
    }

    pub fn with_synonyms<I, S>(mut self, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.synonyms.extend(synonyms.into_iter().map(Into::into));
        self
    }

    pub fn with_action(mut self, action: CardAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Text shown to the user for this choice
    pub fn title(&self) -> &str {
        self.action.as_ref().map_or(&self.value, |a| &a.title)
    }

    /// Build a list of plain choices from strings
    pub fn from_values<I, S>(values: I) -> Vec<Choice>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        values.into_iter().map(Choice::new).collect()
    }
}

/// A searchable value tagged with its position in the caller's list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedValue {
    pub value: String,
    pub index: usize,
}

impl SortedValue {
    pub fn new(value: impl Into<String>, index: usize) -> Self {
        Self {
            value: value.into(),
            index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundValue {
    pub value: String,
    pub index: usize,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundChoice {
    pub value: String,
    pub index: usize,
    pub score: f64,
    /// The value, action title or synonym that matched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonym: Option<String>,
}

/// A recognized span of the utterance and what it resolved to
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResult<T> {
    /// Inclusive byte offset of the first character
    pub start: usize,
    /// Inclusive byte offset of the last character
    pub end: usize,
    pub type_name: &'static str,
    pub text: String,
    pub resolution: T,
}

/// How choices are rendered into a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListStyle {
    /// Don't render the choices
    None,
    /// Pick a style from the channel's capabilities
    #[default]
    Auto,
    Inline,
    List,
    SuggestedAction,
}
