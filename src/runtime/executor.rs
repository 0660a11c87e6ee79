//! Conversation runtime executor

use super::traits::{Clock, MessageStore};
use super::ConversationUpdate;

use crate::reply::ReplyComposer;
use crate::state_machine::{transition, ConvContext, ConvState, Effect, Event};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

/// Owns one conversation's dispatch state and executes its effects
pub struct ConversationRuntime<S, C>
where
    S: MessageStore + Clone + 'static,
    C: Clock + 'static,
{
    context: ConvContext,
    state: ConvState,
    store: S,
    clock: C,
    composer: ReplyComposer,
    event_rx: mpsc::Receiver<Event>,
    /// Scheduled deliveries only hold a weak sender, so they cannot keep a
    /// discarded conversation alive
    event_tx: mpsc::WeakSender<Event>,
    updates_tx: broadcast::Sender<ConversationUpdate>,
    /// Parent of every delivery timer's token
    delivery_cancel: CancellationToken,
}

impl<S, C> ConversationRuntime<S, C>
where
    S: MessageStore + Clone + 'static,
    C: Clock + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        context: ConvContext,
        store: S,
        clock: C,
        composer: ReplyComposer,
        event_rx: mpsc::Receiver<Event>,
        event_tx: &mpsc::Sender<Event>,
        updates_tx: broadcast::Sender<ConversationUpdate>,
    ) -> Self {
        Self {
            context,
            state: ConvState::Idle,
            store,
            clock,
            composer,
            event_rx,
            event_tx: event_tx.downgrade(),
            updates_tx,
            delivery_cancel: CancellationToken::new(),
        }
    }

    /// Token cancelled when the conversation is torn down
    pub fn delivery_token(&self) -> CancellationToken {
        self.delivery_cancel.clone()
    }

    pub async fn run(mut self) {
        let conv_id = self.context.conversation_id.clone();
        tracing::info!(conv_id = %conv_id, "Starting conversation runtime");

        // Process events in a loop until torn down or every sender is gone
        while let Some(event) = self.event_rx.recv().await {
            if let Err(e) = self.process_event(event).await {
                tracing::error!(conv_id = %conv_id, error = %e, "Error handling event");
                let _ = self.updates_tx.send(ConversationUpdate::Error { message: e });
            }
            if self.state.is_closed() {
                break;
            }
        }

        self.delivery_cancel.cancel();
        let _ = self.updates_tx.send(ConversationUpdate::Closed);
        tracing::info!(conv_id = %conv_id, "Conversation runtime stopped");
    }

    async fn process_event(&mut self, event: Event) -> Result<(), String> {
        // Effects may generate follow-up events (reply generation)
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            // Pure state transition
            let result = transition(&self.state, &self.context, current_event)
                .map_err(|e| e.to_string())?;

            let old_state = std::mem::replace(&mut self.state, result.new_state);
            if old_state.name() != self.state.name() {
                tracing::debug!(
                    conv_id = %self.context.conversation_id,
                    from = old_state.name(),
                    to = self.state.name(),
                    "State change"
                );
                let _ = self.updates_tx.send(ConversationUpdate::StateChange {
                    state: self.state.name(),
                });
                if self.state.is_idle() {
                    tracing::debug!(conv_id = %self.context.conversation_id, "All replies delivered");
                }
            }

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect).await? {
                    events_to_process.push(generated_event);
                }
            }
        }

        Ok(())
    }

    /// Execute an effect and optionally return a generated event
    async fn execute_effect(&mut self, effect: Effect) -> Result<Option<Event>, String> {
        match effect {
            Effect::AppendMessage { message } => {
                let appended = self
                    .store
                    .append(&self.context.conversation_id, message.clone())
                    .await
                    .map_err(|e| e.to_string())?;

                if appended {
                    let _ = self.updates_tx.send(ConversationUpdate::Message { message });
                } else {
                    tracing::debug!(
                        conv_id = %self.context.conversation_id,
                        message_id = %message.id,
                        "Conversation discarded, dropping message"
                    );
                }
                Ok(None)
            }

            Effect::GenerateReply { turn_id, category } => {
                tracing::info!(
                    conv_id = %self.context.conversation_id,
                    turn_id = %turn_id,
                    category = %category,
                    "Generating reply"
                );
                let reply = self.composer.compose(category, self.clock.today());
                Ok(Some(Event::ReplyReady { turn_id, reply }))
            }

            Effect::ScheduleDelivery { turn_id, delay } => {
                let cancel_token = self.delivery_cancel.child_token();
                let event_tx = self.event_tx.clone();

                tokio::spawn(async move {
                    tokio::select! {
                        biased;

                        () = cancel_token.cancelled() => {
                            tracing::debug!(turn_id = %turn_id, "Delivery cancelled");
                        }

                        () = tokio::time::sleep(delay) => {
                            let Some(event_tx) = event_tx.upgrade() else {
                                tracing::debug!(turn_id = %turn_id, "Conversation gone, dropping delivery");
                                return;
                            };
                            // A closed receiver means the runtime already stopped
                            if event_tx.send(Event::DeliveryDue { turn_id }).await.is_err() {
                                tracing::debug!(turn_id = %turn_id, "Runtime stopped, dropping delivery");
                            }
                        }
                    }
                });
                Ok(None)
            }

            Effect::CancelDeliveries => {
                tracing::info!(conv_id = %self.context.conversation_id, "Cancelling pending deliveries");
                self.delivery_cancel.cancel();
                Ok(None)
            }

            Effect::NotifyPhase { turn_id, phase } => {
                let _ = self
                    .updates_tx
                    .send(ConversationUpdate::TurnPhase { turn_id, phase });
                Ok(None)
            }
        }
    }
}
