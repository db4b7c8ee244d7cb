//! Property-based tests for the prompt retry loop

use super::*;
use crate::activity::Activity;
use crate::dialog::{DialogSet, DialogTurnStatus};
use crate::runtime::testing::TestFlow;
use proptest::prelude::*;

// ============================================================================
// Generators
// ============================================================================

/// One inbound turn: a reply that no prompt below recognizes, or a
/// non-message activity
#[derive(Debug, Clone)]
enum Inbound {
    Unrecognized(String),
    Typing,
    Event,
}

fn arb_inbound() -> impl Strategy<Value = Inbound> {
    prop_oneof![
        4 => "[a-z]{0,3}[zqx]{2}[a-z]{0,10}".prop_map(Inbound::Unrecognized),
        4 => Just(Inbound::Unrecognized(String::new())),
        1 => Just(Inbound::Typing),
        1 => Just(Inbound::Event),
    ]
}

impl Inbound {
    fn activity(&self) -> Activity {
        match self {
            Inbound::Unrecognized(text) => Activity::message(text.clone()),
            Inbound::Typing => Activity::typing(),
            Inbound::Event => Activity::event(serde_json::json!({"name": "ping"})),
        }
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

fn attempt_count(stack: &crate::dialog::DialogStack) -> u64 {
    match &stack.frames()[0].state {
        DialogState::Prompt(state) => state.attempt_count(),
        other => panic!("expected prompt state, got {}", other.kind()),
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Each rejected message bumps the attempt counter by one and sends
    /// exactly one retry; other activities change nothing.
    #[test]
    fn prop_rejected_replies_retry_once(
        turns in proptest::collection::vec(arb_inbound(), 1..12)
    ) {
        runtime().block_on(async {
            let set = DialogSet::new()
                .with(
                    ConfirmPrompt::new("confirm")
                        .with_default_options(
                            PromptOptions::text("Continue?")
                                .with_retry_prompt(Activity::message("Yes or no?")),
                        ),
                )
                .unwrap();
            let mut flow = TestFlow::new(set, "confirm");
            flow.send("start").await;
            flow.assert_reply("Continue? (1) Yes or (2) No");

            let mut expected_attempts = 0;
            for inbound in &turns {
                let result = flow.send_activity(inbound.activity()).await;
                assert_eq!(result.status, DialogTurnStatus::Waiting);

                if matches!(inbound, Inbound::Unrecognized(_)) {
                    expected_attempts += 1;
                    flow.assert_reply("Yes or no? (1) Yes or (2) No");
                }
                flow.assert_no_reply();

                let stack = flow.stack().await;
                assert_eq!(stack.len(), 1);
                assert_eq!(attempt_count(&stack), expected_attempts);
            }
        });
    }

    /// A validator that always replies suppresses every retry prompt
    #[test]
    fn prop_validator_reply_suppresses_retry(
        texts in proptest::collection::vec("[a-z ]{0,12}", 1..8)
    ) {
        runtime().block_on(async {
            struct Scold;

            #[async_trait]
            impl PromptValidator<String> for Scold {
                async fn validate(
                    &self,
                    ctx: &mut PromptValidatorContext<'_, String>,
                ) -> Result<bool, DialogError> {
                    ctx.turn.send_text("nope").await?;
                    Ok(false)
                }
            }

            let set = DialogSet::new()
                .with(
                    TextPrompt::new("name")
                        .with_default_options(PromptOptions::text("Name?"))
                        .with_validator(Scold),
                )
                .unwrap();
            let mut flow = TestFlow::new(set, "name");
            flow.send("start").await;
            flow.assert_reply("Name?");

            for text in &texts {
                flow.send(text).await;
                flow.assert_reply("nope");
                flow.assert_no_reply();
            }
            assert_eq!(attempt_count(&flow.stack().await), texts.len() as u64);
        });
    }
}
