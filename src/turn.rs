//! Per-turn context handed to dialogs

use crate::activity::Activity;
use crate::runtime::{ActivitySender, ResourceResponse, SendError};
use std::sync::Arc;

/// One inbound activity plus the means to reply to it.
///
/// Created fresh for every turn and dropped when the turn ends. Tracks
/// whether anything has been sent so prompts can skip their retry message
/// when a validator already replied.
pub struct Turn {
    activity: Activity,
    sender: Arc<dyn ActivitySender>,
    responded: bool,
}

impl Turn {
    pub fn new(activity: Activity, sender: Arc<dyn ActivitySender>) -> Self {
        Self {
            activity,
            sender,
            responded: false,
        }
    }

    /// The inbound activity
    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    pub fn conversation_id(&self) -> &str {
        &self.activity.conversation_id
    }

    pub fn channel_id(&self) -> &str {
        &self.activity.channel_id
    }

    /// Whether a reply has been sent during this turn
    pub fn responded(&self) -> bool {
        self.responded
    }

    /// Send a reply, addressed to the inbound conversation.
    ///
    /// Transport failures are returned unchanged; nothing is retried.
    pub async fn send_activity(
        &mut self,
        activity: Activity,
    ) -> Result<ResourceResponse, SendError> {
        let reply = self.activity.reply_to(activity);
        let response = self.sender.send(&reply).await?;
        self.responded = true;
        tracing::debug!(
            conversation_id = %reply.conversation_id,
            activity_id = %response.id,
            "Reply sent"
        );
        Ok(response)
    }

    pub async fn send_text(
        &mut self,
        text: impl Into<String>,
    ) -> Result<ResourceResponse, SendError> {
        self.send_activity(Activity::message(text)).await
    }
}
