use std::sync::Arc;

use legends_llm::{GenerationOutput, QueryGateway, QueryRequest, QueryResult};

use crate::chat::events::{SendOutcome, Submit};
use crate::chat::starters::example_prompt;
use crate::chat::store::{BeginRejection, ConversationStore, PendingTurn};

/// A request that has been recorded in the store but not answered yet.
#[derive(Debug)]
pub struct InFlight {
    pub pending: PendingTurn,
    pub request: QueryRequest,
}

/// Coordinator between the conversation store and the query gateway.
///
/// The presentation layer owns one session and only reads state through
/// [`ChatSession::store`]; every mutation goes through the methods here.
pub struct ChatSession {
    store: ConversationStore,
    gateway: Arc<dyn QueryGateway>,
}

impl ChatSession {
    pub fn new(gateway: Arc<dyn QueryGateway>) -> Self {
        Self::with_store(ConversationStore::new(), gateway)
    }

    pub fn with_store(store: ConversationStore, gateway: Arc<dyn QueryGateway>) -> Self {
        Self { store, gateway }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn gateway(&self) -> &Arc<dyn QueryGateway> {
        &self.gateway
    }

    /// Swaps the gateway used by later sends, e.g. after a new API key is saved.
    pub fn set_gateway(&mut self, gateway: Arc<dyn QueryGateway>) {
        tracing::info!(provider = gateway.id(), model = gateway.model(), "gateway replaced");
        self.gateway = gateway;
    }

    /// Starter prompts are only offered on an idle, empty conversation.
    pub fn shows_example_prompts(&self) -> bool {
        self.store.is_empty() && !self.store.is_busy()
    }

    /// True while a request is in flight for the trailing user turn.
    pub fn is_waiting_for_model(&self) -> bool {
        self.store.is_busy() && self.store.last().is_some_and(|turn| turn.is_user())
    }

    /// First phase of a send: records the provisional user turn and builds the request.
    pub fn begin_send(&mut self, submit: Submit) -> Result<InFlight, BeginRejection> {
        let Submit {
            prompt,
            attachments,
        } = submit;

        let pending = self
            .store
            .begin(prompt.clone(), attachments.clone())
            .inspect_err(|rejection| {
                tracing::debug!(?rejection, "submit ignored");
            })?;

        Ok(InFlight {
            pending,
            request: QueryRequest::new(prompt, attachments),
        })
    }

    /// Second phase of a send: reconciles the gateway result into the store.
    pub fn settle(
        &mut self,
        pending: PendingTurn,
        result: QueryResult<GenerationOutput>,
    ) -> SendOutcome {
        let user_turn_id = pending.turn_id();

        match result {
            Ok(GenerationOutput { text, sources }) => {
                let model_turn_id = self.store.commit(pending, text, sources);
                SendOutcome::Answered {
                    user_turn_id,
                    model_turn_id,
                }
            }
            Err(error) => {
                tracing::warn!(
                    user_turn_id = user_turn_id.0,
                    stage = error.stage(),
                    "query failed; retracting user turn"
                );
                let message = error.user_message();
                self.store.abort(pending, message.clone());
                SendOutcome::Failed { message }
            }
        }
    }

    /// Sends one turn and waits for it to settle.
    pub async fn send(&mut self, submit: Submit) -> SendOutcome {
        let InFlight { pending, request } = match self.begin_send(submit) {
            Ok(in_flight) => in_flight,
            Err(rejection) => return SendOutcome::Ignored(rejection),
        };

        let gateway = Arc::clone(&self.gateway);
        let result = gateway.run_query(request).await;
        self.settle(pending, result)
    }

    /// Sends the starter prompt at `index`; `None` when there is no such prompt
    /// or starters are not on offer anymore.
    pub async fn send_example(&mut self, index: usize) -> Option<SendOutcome> {
        if !self.shows_example_prompts() {
            return None;
        }

        let prompt = example_prompt(index)?;
        Some(self.send(Submit::prompt_only(prompt)).await)
    }
}
