//! Property-based tests for the state machine
//!
//! A small driver plays random sequences of submissions, generated replies,
//! timer firings and teardowns against `transition` and records every
//! appended message, the way the runtime would.

use super::state::*;
use super::*;
use crate::classifier::Category;
use crate::conversation::{ConversationId, Message, MessageId, Role};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> ConvContext {
    ConvContext::new(ConversationId::from("prop-conv"))
}

#[derive(Debug, Clone)]
enum Op {
    Submit(String),
    /// Generate the reply for the n-th turn still generating
    Generate(usize),
    /// Fire the timer of the n-th scheduled turn
    Fire(usize),
    /// Fire the timer of the n-th turn that is already due but held back
    Refire(usize),
    /// Fire a timer for a turn that does not exist
    Stray,
    Teardown,
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("show me the stock chart".to_string()),
        Just("What's the latest news?".to_string()),
        Just("chart and news".to_string()),
        Just("hello".to_string()),
        Just("   ".to_string()),
        "[a-zA-Z ]{0,20}",
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => arb_text().prop_map(Op::Submit),
        4 => (0usize..4).prop_map(Op::Generate),
        4 => (0usize..4).prop_map(Op::Fire),
        2 => (0usize..4).prop_map(Op::Refire),
        1 => Just(Op::Stray),
        1 => Just(Op::Teardown),
    ]
}

/// Runtime stand-in: applies effects to a message log
#[derive(Default)]
struct Driver {
    state: ConvState,
    log: Vec<Message>,
    submitted: Vec<MessageId>,
    cancelled: bool,
}

impl Driver {
    fn apply(&mut self, event: Event) -> Result<Vec<Effect>, TransitionError> {
        let result = transition(&self.state, &test_context(), event)?;
        self.state = result.new_state;
        for effect in &result.effects {
            match effect {
                Effect::AppendMessage { message } => self.log.push(message.clone()),
                Effect::CancelDeliveries => self.cancelled = true,
                _ => {}
            }
        }
        Ok(result.effects)
    }

    fn nth_in_phase(&self, n: usize, phase: TurnPhase, due: bool) -> Option<MessageId> {
        let matching: Vec<_> = self
            .state
            .pending_turns()
            .iter()
            .filter(|t| t.phase == phase && t.due == due)
            .collect();
        if matching.is_empty() {
            None
        } else {
            Some(matching[n % matching.len()].turn_id)
        }
    }

    fn run(&mut self, op: Op) {
        let event = match op {
            Op::Submit(text) => {
                let message_id = MessageId::next();
                if !text.trim().is_empty() && !self.state.is_closed() {
                    self.submitted.push(message_id);
                }
                Event::UserMessage { text, message_id }
            }
            Op::Generate(n) => match self.nth_in_phase(n, TurnPhase::Generating, false) {
                Some(turn_id) => Event::ReplyReady {
                    turn_id,
                    reply: Message::assistant(MessageId::next(), format!("reply to {turn_id}")),
                },
                None => return,
            },
            Op::Fire(n) => match self.nth_in_phase(n, TurnPhase::Scheduled, false) {
                Some(turn_id) => Event::DeliveryDue { turn_id },
                None => return,
            },
            Op::Refire(n) => match self.nth_in_phase(n, TurnPhase::Scheduled, true) {
                Some(turn_id) => Event::DeliveryDue { turn_id },
                None => return,
            },
            Op::Stray => Event::DeliveryDue {
                turn_id: MessageId::next(),
            },
            Op::Teardown => Event::Teardown,
        };
        // Closed rejecting user messages is covered separately
        let _ = self.apply(event);
    }
}

fn is_valid_state(state: &ConvState) -> bool {
    match state {
        ConvState::Idle | ConvState::Closed => true,
        ConvState::Responding { turns } => {
            !turns.is_empty()
                && turns.windows(2).all(|w| w[0].turn_id < w[1].turn_id)
                && turns.iter().all(|t| match t.phase {
                    TurnPhase::Generating => t.reply.is_none() && !t.due,
                    TurnPhase::Scheduled => t.reply.is_some(),
                    _ => false,
                })
                // the first turn is never left waiting once it is due
                && !turns[0].is_deliverable()
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Invariant 1: every reachable state is well formed
    #[test]
    fn prop_transitions_preserve_validity(ops in proptest::collection::vec(arb_op(), 0..40)) {
        let mut driver = Driver::default();
        for op in ops {
            driver.run(op);
            prop_assert!(is_valid_state(&driver.state), "Invalid state: {:?}", driver.state);
        }
    }

    // Invariant 2: each turn appends its user message before its reply, and
    // replies appear in submission order
    #[test]
    fn prop_replies_follow_their_turns_in_order(ops in proptest::collection::vec(arb_op(), 0..40)) {
        let mut driver = Driver::default();
        for op in ops {
            driver.run(op);
        }

        let users: Vec<MessageId> = driver
            .log
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| m.id)
            .collect();
        prop_assert_eq!(&users, &driver.submitted);

        let replies = driver.log.iter().filter(|m| m.role == Role::Assistant).count();
        prop_assert!(replies <= driver.submitted.len(), "a reply was delivered twice");

        let mut replied = 0usize;
        for (position, message) in driver.log.iter().enumerate() {
            if message.role == Role::Assistant {
                let turn = driver.submitted[replied];
                let expected = format!("reply to {turn}");
                prop_assert_eq!(message.content.as_deref(), Some(expected.as_str()));
                let user_pos = driver.log.iter().position(|m| m.id == turn);
                prop_assert!(user_pos.is_some_and(|p| p < position));
                replied += 1;
            }
        }
    }

    // Invariant 3: nothing is appended after teardown
    #[test]
    fn prop_closed_absorbs_everything(
        before in proptest::collection::vec(arb_op(), 0..20),
        after in proptest::collection::vec(arb_op(), 0..20),
    ) {
        let mut driver = Driver::default();
        for op in before {
            driver.run(op);
        }
        driver.run(Op::Teardown);
        prop_assert!(driver.cancelled);
        let appended = driver.log.len();

        for op in after {
            driver.run(op);
        }
        prop_assert_eq!(driver.log.len(), appended);
        prop_assert!(driver.state.is_closed());
    }

    // Invariant 4: blank input never changes anything
    #[test]
    fn prop_blank_input_is_inert(blank in "[ \t\n]{0,10}", ops in proptest::collection::vec(arb_op(), 0..20)) {
        let mut driver = Driver::default();
        for op in ops {
            driver.run(op);
        }
        let before = driver.state.clone();
        let effects = driver
            .apply(Event::UserMessage { text: blank, message_id: MessageId::next() });
        if !before.is_closed() {
            prop_assert_eq!(effects.map(|e| e.len()), Ok(0));
        }
        prop_assert_eq!(driver.state, before);
    }

    // Invariant 5: classification recorded on the turn matches the classifier
    #[test]
    fn prop_turn_category_matches_classifier(text in arb_text()) {
        prop_assume!(!text.trim().is_empty());
        let ctx = test_context();
        let result = transition(
            &ConvState::Idle,
            &ctx,
            Event::UserMessage { text: text.clone(), message_id: MessageId::next() },
        ).unwrap();
        let category: Category = result.new_state.pending_turns()[0].category;
        prop_assert_eq!(category, ctx.classifier.classify(&text));
    }
}
