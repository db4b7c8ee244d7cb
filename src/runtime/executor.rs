//! Turn executor

use super::traits::{ActivitySender, StateStore};
use crate::activity::Activity;
use crate::dialog::{
    DialogContext, DialogError, DialogOptions, DialogSet, DialogTurnResult, DialogTurnStatus,
};
use crate::turn::Turn;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Runs turns for any number of conversations against one dialog set.
///
/// Turns of the same conversation are serialized; different conversations
/// run concurrently. The stack is written back only when a turn succeeds,
/// so a failing turn leaves the previously saved state untouched.
pub struct DialogManager<S, A>
where
    S: StateStore + 'static,
    A: ActivitySender + 'static,
{
    dialogs: Arc<DialogSet>,
    root_dialog: String,
    store: S,
    sender: Arc<A>,
    conversations: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S, A> DialogManager<S, A>
where
    S: StateStore + 'static,
    A: ActivitySender + 'static,
{
    pub fn new(
        dialogs: Arc<DialogSet>,
        root_dialog: impl Into<String>,
        store: S,
        sender: A,
    ) -> Result<Self, DialogError> {
        let root_dialog = root_dialog.into();
        if !dialogs.contains(&root_dialog) {
            return Err(DialogError::Configuration(format!(
                "root dialog '{root_dialog}' is not registered"
            )));
        }
        Ok(Self {
            dialogs,
            root_dialog,
            store,
            sender: Arc::new(sender),
            conversations: RwLock::new(HashMap::new()),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn sender(&self) -> &Arc<A> {
        &self.sender
    }

    /// Process one inbound activity.
    ///
    /// Continues the active dialog, or begins the root dialog when the
    /// conversation has nothing on its stack and the activity is a message.
    /// Typing indicators and events never start a conversation.
    pub async fn on_turn(&self, activity: Activity) -> Result<DialogTurnResult, DialogError> {
        let root_dialog = self.root_dialog.clone();
        self.run_turn(activity, |mut dc| async move {
            let mut result = dc.continue_dialog().await?;
            if result.status == DialogTurnStatus::Empty && dc.turn.activity().is_message() {
                result = dc.begin_dialog(&root_dialog, DialogOptions::None).await?;
            }
            Ok((dc, result))
        })
        .await
    }

    /// Unwind every dialog of the activity's conversation
    pub async fn cancel_all(&self, activity: Activity) -> Result<DialogTurnResult, DialogError> {
        self.run_turn(activity, |mut dc| async move {
            let result = dc.cancel_all_dialogs().await?;
            Ok((dc, result))
        })
        .await
    }

    async fn run_turn<F, Fut>(
        &self,
        activity: Activity,
        handler: F,
    ) -> Result<DialogTurnResult, DialogError>
    where
        F: FnOnce(DialogContext) -> Fut,
        Fut: std::future::Future<Output = Result<(DialogContext, DialogTurnResult), DialogError>>,
    {
        let conversation_id = activity.conversation_id.clone();
        if conversation_id.is_empty() {
            return Err(DialogError::Configuration(
                "activity has no conversation id".to_string(),
            ));
        }

        let lock = self.conversation_lock(&conversation_id).await;
        let outcome = {
            let _guard = lock.lock().await;
            self.run_locked(&conversation_id, activity, handler).await
        };
        drop(lock);
        self.release_idle_locks().await;

        if let Err(e) = &outcome {
            tracing::warn!(
                conversation_id = %conversation_id,
                error = %e,
                corrupt_state = e.is_corruption(),
                "Turn failed, state not saved"
            );
        }
        outcome
    }

    async fn run_locked<F, Fut>(
        &self,
        conversation_id: &str,
        activity: Activity,
        handler: F,
    ) -> Result<DialogTurnResult, DialogError>
    where
        F: FnOnce(DialogContext) -> Fut,
        Fut: std::future::Future<Output = Result<(DialogContext, DialogTurnResult), DialogError>>,
    {
        let stack = self
            .store
            .load_stack(conversation_id)
            .await
            .map_err(DialogError::Storage)?
            .unwrap_or_default();

        let sender: Arc<dyn ActivitySender> = self.sender.clone();
        let turn = Turn::new(activity, sender);
        let dc = DialogContext::new(self.dialogs.clone(), turn, stack);

        let (dc, result) = handler(dc).await?;
        let (turn, stack) = dc.into_parts();

        self.store
            .save_stack(conversation_id, &stack)
            .await
            .map_err(DialogError::Storage)?;

        tracing::info!(
            conversation_id = %conversation_id,
            status = ?result.status,
            depth = stack.len(),
            responded = turn.responded(),
            "Turn processed"
        );
        Ok(result)
    }

    async fn conversation_lock(&self, conversation_id: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.conversations.read().await.get(conversation_id) {
            return lock.clone();
        }
        self.conversations
            .write()
            .await
            .entry(conversation_id.to_string())
            .or_default()
            .clone()
    }

    /// Forget locks nobody is holding or waiting on
    async fn release_idle_locks(&self) {
        self.conversations
            .write()
            .await
            .retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::dialog::DialogStack;
    use crate::prompt::{ConfirmPrompt, PromptOptions, TextPrompt};
    use crate::runtime::testing::{FailingStore, RecordingSender};
    use crate::runtime::{MemoryStateStore, SqliteStateStore};

    fn dialogs() -> Arc<DialogSet> {
        Arc::new(
            DialogSet::new()
                .with(TextPrompt::new("name").with_default_options(PromptOptions::new(
                    Activity::message("What's your name?"),
                )))
                .unwrap()
                .with(ConfirmPrompt::new("confirm"))
                .unwrap(),
        )
    }

    fn message(conversation_id: &str, text: &str) -> Activity {
        Activity::message(text)
            .with_channel("test")
            .with_conversation(conversation_id)
    }

    #[test]
    fn test_unregistered_root_rejected() {
        let err = DialogManager::new(
            dialogs(),
            "ghost",
            MemoryStateStore::new(),
            RecordingSender::new(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, DialogError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_begins_root_then_continues() {
        let manager =
            DialogManager::new(dialogs(), "name", MemoryStateStore::new(), RecordingSender::new())
                .unwrap();

        let result = manager.on_turn(message("conv-1", "hi")).await.unwrap();
        assert_eq!(result.status, DialogTurnStatus::Waiting);
        assert_eq!(manager.sender().texts(), vec!["What's your name?"]);

        let stack = manager.store().load_stack("conv-1").await.unwrap().unwrap();
        assert_eq!(stack.ids(), vec!["name"]);

        let result = manager.on_turn(message("conv-1", "Ada")).await.unwrap();
        assert_eq!(result.status, DialogTurnStatus::Complete);
        assert_eq!(result.result, Some(serde_json::json!("Ada")));
        let stack = manager.store().load_stack("conv-1").await.unwrap().unwrap();
        assert!(stack.is_empty());
    }

    #[tokio::test]
    async fn test_non_message_does_not_begin_root() {
        let manager =
            DialogManager::new(dialogs(), "name", MemoryStateStore::new(), RecordingSender::new())
                .unwrap();

        let typing = Activity::typing().with_channel("test").with_conversation("conv-1");
        let result = manager.on_turn(typing).await.unwrap();
        assert_eq!(result.status, DialogTurnStatus::Empty);
        assert!(manager.sender().sent().is_empty());
        let stack = manager.store().load_stack("conv-1").await.unwrap().unwrap();
        assert!(stack.is_empty());

        let result = manager.on_turn(message("conv-1", "hi")).await.unwrap();
        assert_eq!(result.status, DialogTurnStatus::Waiting);
        assert_eq!(manager.sender().texts(), vec!["What's your name?"]);
    }

    #[tokio::test]
    async fn test_sqlite_store_end_to_end() {
        let db = Database::open_in_memory().unwrap();
        let manager = DialogManager::new(
            dialogs(),
            "name",
            SqliteStateStore::new(db),
            RecordingSender::new(),
        )
        .unwrap();

        manager.on_turn(message("conv-1", "hi")).await.unwrap();
        let stack = manager.store().inner().load_stack("conv-1").unwrap().unwrap();
        assert_eq!(stack.ids(), vec!["name"]);

        // Blank reply is rejected and the attempt is persisted
        manager.on_turn(message("conv-1", "  ")).await.unwrap();
        let stack = manager.store().inner().load_stack("conv-1").unwrap().unwrap();
        match &stack.frames()[0].state {
            crate::dialog::DialogState::Prompt(state) => assert_eq!(state.attempt_count(), 1),
            other => panic!("expected prompt state, got {}", other.kind()),
        }

        let result = manager.on_turn(message("conv-1", "Ada")).await.unwrap();
        assert_eq!(result.status, DialogTurnStatus::Complete);
        assert_eq!(result.result, Some(serde_json::json!("Ada")));
        let stack = manager.store().inner().load_stack("conv-1").unwrap().unwrap();
        assert!(stack.is_empty());
        assert_eq!(manager.sender().texts(), vec!["What's your name?", "What's your name?"]);
    }

    #[tokio::test]
    async fn test_conversations_are_independent() {
        let manager =
            DialogManager::new(dialogs(), "name", MemoryStateStore::new(), RecordingSender::new())
                .unwrap();

        manager.on_turn(message("conv-1", "hi")).await.unwrap();
        manager.on_turn(message("conv-2", "hi")).await.unwrap();
        let result = manager.on_turn(message("conv-1", "Ada")).await.unwrap();
        assert_eq!(result.status, DialogTurnStatus::Complete);

        let other = manager.store().load_stack("conv-2").await.unwrap().unwrap();
        assert_eq!(other.ids(), vec!["name"]);
    }

    #[tokio::test]
    async fn test_concurrent_turns_for_many_conversations() {
        let manager = Arc::new(
            DialogManager::new(dialogs(), "name", MemoryStateStore::new(), RecordingSender::new())
                .unwrap(),
        );

        let mut handles = Vec::new();
        for i in 0..8 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                manager.on_turn(message(&format!("conv-{i}"), "hi")).await
            }));
        }
        for handle in handles {
            let result = handle.await.unwrap().unwrap();
            assert_eq!(result.status, DialogTurnStatus::Waiting);
        }
        assert_eq!(manager.store().len(), 8);
        assert!(manager.conversations.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_conversation_id() {
        let manager =
            DialogManager::new(dialogs(), "name", MemoryStateStore::new(), RecordingSender::new())
                .unwrap();
        let err = manager.on_turn(Activity::message("hi")).await.unwrap_err();
        assert!(matches!(err, DialogError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_send_failure_keeps_previous_state() {
        let manager =
            DialogManager::new(dialogs(), "name", MemoryStateStore::new(), RecordingSender::new())
                .unwrap();
        manager.on_turn(message("conv-1", "hi")).await.unwrap();
        let before = manager.store().raw("conv-1");

        // An empty reply is rejected and the retry prompt fails to send
        manager.sender().fail_next(crate::runtime::SendError::new("socket closed"));
        let err = manager.on_turn(message("conv-1", "")).await.unwrap_err();
        match err {
            DialogError::Send(e) => assert_eq!(e.message, "socket closed"),
            other => panic!("expected send error, got {other:?}"),
        }
        assert_eq!(manager.store().raw("conv-1"), before);
    }

    #[tokio::test]
    async fn test_unknown_frame_surfaces_and_is_not_overwritten() {
        let store = MemoryStateStore::new();
        let mut stack = DialogStack::new();
        stack.push(crate::dialog::DialogInstance::new("deleted-dialog"));
        store.save_stack("conv-1", &stack).await.unwrap();

        let manager = DialogManager::new(dialogs(), "name", store, RecordingSender::new()).unwrap();
        let err = manager.on_turn(message("conv-1", "hi")).await.unwrap_err();
        assert!(matches!(err, DialogError::UnknownDialog(id) if id == "deleted-dialog"));

        let saved = manager.store().load_stack("conv-1").await.unwrap().unwrap();
        assert_eq!(saved, stack);
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces() {
        let manager =
            DialogManager::new(dialogs(), "name", FailingStore, RecordingSender::new()).unwrap();
        let err = manager.on_turn(message("conv-1", "hi")).await.unwrap_err();
        assert!(matches!(err, DialogError::Storage(_)));
        assert!(manager.sender().sent().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_all() {
        let manager =
            DialogManager::new(dialogs(), "name", MemoryStateStore::new(), RecordingSender::new())
                .unwrap();
        manager.on_turn(message("conv-1", "hi")).await.unwrap();

        let result = manager.cancel_all(message("conv-1", "cancel")).await.unwrap();
        assert_eq!(result.status, DialogTurnStatus::Cancelled);
        let stack = manager.store().load_stack("conv-1").await.unwrap().unwrap();
        assert!(stack.is_empty());

        let result = manager.cancel_all(message("conv-1", "cancel")).await.unwrap();
        assert_eq!(result.status, DialogTurnStatus::Empty);
    }
}
