//! Minimal activity schema
//!
//! The transport owns the full envelope. The engine only needs the fields
//! below to route a turn, recognize replies and render prompts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of inbound or outbound activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityType {
    #[default]
    Message,
    Typing,
    ConversationUpdate,
    Event,
    EndOfConversation,
}

/// Hint to the channel about whether the bot expects a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputHint {
    AcceptingInput,
    IgnoringInput,
    ExpectingInput,
}

/// File or card attached to a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Attachment {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            content_url: None,
            content: None,
            name: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.content_url = Some(url.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Clickable action offered alongside a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionType {
    /// Posts the value back to the bot as if the user typed it
    #[default]
    ImBack,
    PostBack,
    OpenUrl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardAction {
    #[serde(rename = "type", default)]
    pub action_type: ActionType,
    pub title: String,
    pub value: String,
}

impl CardAction {
    pub fn im_back(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            action_type: ActionType::ImBack,
            title: title.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SuggestedActions {
    pub actions: Vec<CardAction>,
}

/// One inbound or outbound exchange unit
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type", default)]
    pub activity_type: ActivityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub conversation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speak: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_hint: Option<InputHint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_actions: Option<SuggestedActions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Activity {
    /// Plain text message
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            activity_type: ActivityType::Message,
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn typing() -> Self {
        Self {
            activity_type: ActivityType::Typing,
            ..Self::default()
        }
    }

    pub fn event(value: Value) -> Self {
        Self {
            activity_type: ActivityType::Event,
            value: Some(value),
            ..Self::default()
        }
    }

    pub fn with_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = channel_id.into();
        self
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = conversation_id.into();
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn with_input_hint(mut self, hint: InputHint) -> Self {
        self.input_hint = Some(hint);
        self
    }

    pub fn is_message(&self) -> bool {
        self.activity_type == ActivityType::Message
    }

    /// Message text, or the empty string
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    /// Activity addressed back into the same conversation and channel
    pub fn reply_to(&self, mut reply: Activity) -> Activity {
        if reply.channel_id.is_empty() {
            reply.channel_id.clone_from(&self.channel_id);
        }
        if reply.conversation_id.is_empty() {
            reply.conversation_id.clone_from(&self.conversation_id);
        }
        if reply.locale.is_none() {
            reply.locale.clone_from(&self.locale);
        }
        reply
    }
}
