//! Mock implementations for testing
//!
//! These mocks enable end-to-end dialog tests without a real transport or
//! database.

use super::executor::DialogManager;
use super::memory::MemoryStateStore;
use super::traits::*;
use crate::activity::Activity;
use crate::dialog::{DialogSet, DialogStack, DialogTurnResult};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

// ============================================================================
// Recording Sender
// ============================================================================

/// Sender that records every outbound activity
#[allow(dead_code)]
pub struct RecordingSender {
    sent: Mutex<Vec<Activity>>,
    failures: Mutex<VecDeque<SendError>>,
}

#[allow(dead_code)]
impl RecordingSender {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
        }
    }

    /// Fail the next send with `error` instead of recording it
    pub fn fail_next(&self, error: SendError) {
        self.failures.lock().unwrap().push_back(error);
    }

    /// Everything sent so far
    pub fn sent(&self) -> Vec<Activity> {
        self.sent.lock().unwrap().clone()
    }

    /// Text of everything sent so far
    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|a| a.text().to_string())
            .collect()
    }

    /// Remove and return everything sent so far
    pub fn drain(&self) -> Vec<Activity> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }
}

impl Default for RecordingSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActivitySender for RecordingSender {
    async fn send(&self, activity: &Activity) -> Result<ResourceResponse, SendError> {
        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(activity.clone());
        Ok(ResourceResponse {
            id: format!("activity-{}", sent.len()),
        })
    }
}

// ============================================================================
// Failing Store
// ============================================================================

/// Store whose every operation fails
pub struct FailingStore;

#[async_trait]
impl StateStore for FailingStore {
    async fn load_stack(&self, _conversation_id: &str) -> Result<Option<DialogStack>, String> {
        Err("storage offline".to_string())
    }

    async fn save_stack(&self, _conversation_id: &str, _stack: &DialogStack) -> Result<(), String> {
        Err("storage offline".to_string())
    }

    async fn delete_stack(&self, _conversation_id: &str) -> Result<(), String> {
        Err("storage offline".to_string())
    }
}

// ============================================================================
// Test Flow
// ============================================================================

/// Scripted conversation against a [`DialogManager`] with in-memory state.
///
/// ```ignore
/// let mut flow = TestFlow::new(dialogs, "main");
/// flow.send("hi").await;
/// flow.assert_reply("What's your name?");
/// ```
#[allow(dead_code)]
pub struct TestFlow {
    manager: DialogManager<MemoryStateStore, RecordingSender>,
    conversation_id: String,
    channel_id: String,
    seen: usize,
    pub last_result: Option<DialogTurnResult>,
}

#[allow(dead_code)]
impl TestFlow {
    pub fn new(dialogs: DialogSet, root_dialog: &str) -> Self {
        let manager = DialogManager::new(
            Arc::new(dialogs),
            root_dialog,
            MemoryStateStore::new(),
            RecordingSender::new(),
        )
        .expect("root dialog registered");
        Self {
            manager,
            conversation_id: "test-conversation".to_string(),
            channel_id: "test".to_string(),
            seen: 0,
            last_result: None,
        }
    }

    pub fn channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = channel_id.into();
        self
    }

    /// Send a message turn and return its result
    pub async fn send(&mut self, text: &str) -> DialogTurnResult {
        self.send_activity(Activity::message(text)).await
    }

    /// Send an arbitrary activity, addressed to the flow's conversation
    pub async fn send_activity(&mut self, activity: Activity) -> DialogTurnResult {
        let activity = activity
            .with_channel(self.channel_id.clone())
            .with_conversation(self.conversation_id.clone());
        let result = self.manager.on_turn(activity).await.expect("turn failed");
        self.last_result = Some(result.clone());
        result
    }

    /// Replies not yet consumed by [`TestFlow::assert_reply`]
    pub fn pending_replies(&self) -> Vec<Activity> {
        self.manager.sender().sent()[self.seen..].to_vec()
    }

    /// Assert the next unconsumed reply has `text`
    pub fn assert_reply(&mut self, text: &str) -> Activity {
        let sent = self.manager.sender().sent();
        let reply = sent
            .get(self.seen)
            .unwrap_or_else(|| panic!("expected reply {text:?}, nothing was sent"))
            .clone();
        assert_eq!(reply.text(), text);
        self.seen += 1;
        reply
    }

    /// Assert every reply has been consumed
    pub fn assert_no_reply(&self) {
        let pending = self.pending_replies();
        assert!(pending.is_empty(), "unexpected replies: {pending:?}");
    }

    /// Depth of the persisted stack
    pub async fn depth(&self) -> usize {
        self.stack().await.len()
    }

    pub async fn stack(&self) -> DialogStack {
        self.manager
            .store()
            .load_stack(&self.conversation_id)
            .await
            .unwrap()
            .unwrap_or_default()
    }

    pub fn sender(&self) -> &RecordingSender {
        self.manager.sender()
    }
}
