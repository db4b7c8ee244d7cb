//! Attachment prompt

use super::{Prompt, PromptKind, PromptOptions, PromptRecognizerResult};
use crate::activity::Attachment;
use crate::dialog::DialogError;
use crate::turn::Turn;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Succeeds when the reply carries at least one attachment
#[derive(Debug, Clone, Copy, Default)]
pub struct AttachmentKind;

pub type AttachmentPrompt = Prompt<AttachmentKind>;

#[async_trait]
impl PromptKind for AttachmentKind {
    type Value = Vec<Attachment>;

    async fn recognize(
        &self,
        turn: &Turn,
        _state: &Map<String, Value>,
        _options: &PromptOptions,
    ) -> Result<PromptRecognizerResult<Vec<Attachment>>, DialogError> {
        let attachments = &turn.activity().attachments;
        if attachments.is_empty() {
            return Ok(PromptRecognizerResult::failed());
        }
        Ok(PromptRecognizerResult::succeeded(attachments.clone()))
    }
}
