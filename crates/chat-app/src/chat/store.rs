use legends_llm::{Attachment, Source};

use crate::chat::message::{Turn, TurnId};

/// Handle to a provisional user turn whose request has not settled yet.
///
/// Deliberately neither `Clone` nor `Copy`: a pending turn settles exactly once,
/// through [`ConversationStore::commit`] or [`ConversationStore::abort`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a pending turn must be committed or aborted"]
pub struct PendingTurn {
    turn_id: TurnId,
}

impl PendingTurn {
    pub fn turn_id(&self) -> TurnId {
        self.turn_id
    }
}

/// Rejection reason for [`ConversationStore::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginRejection {
    /// Another request is still in flight.
    Busy,
    /// Neither text nor attachments were supplied.
    EmptyTurn,
}

/// Owned conversation state plus the transient UI flags around it.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    turns: Vec<Turn>,
    busy: bool,
    last_error: Option<String>,
    next_turn_id: u64,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.last_error = error;
    }

    /// Appends a user turn. Returns `None` without touching state when both
    /// `text` and `attachments` are empty.
    pub fn append_user(
        &mut self,
        text: impl Into<String>,
        attachments: Vec<Attachment>,
    ) -> Option<TurnId> {
        let text = text.into();
        if text.is_empty() && attachments.is_empty() {
            return None;
        }

        let id = self.alloc_turn_id();
        self.turns.push(Turn::user(id, text, attachments));
        Some(id)
    }

    pub fn append_model(&mut self, text: impl Into<String>, sources: Vec<Source>) -> TurnId {
        let id = self.alloc_turn_id();
        self.turns.push(Turn::model(id, text, sources));
        id
    }

    /// Removes `turn_id` only while it is still the last turn.
    pub fn rollback(&mut self, turn_id: TurnId) -> bool {
        if self.turns.last().is_some_and(|turn| turn.id == turn_id) {
            self.turns.pop();
            true
        } else {
            false
        }
    }

    /// Opens a request: clears the previous error, appends the provisional
    /// user turn and marks the store busy.
    pub fn begin(
        &mut self,
        text: impl Into<String>,
        attachments: Vec<Attachment>,
    ) -> Result<PendingTurn, BeginRejection> {
        if self.busy {
            return Err(BeginRejection::Busy);
        }

        let turn_id = self
            .append_user(text, attachments)
            .ok_or(BeginRejection::EmptyTurn)?;

        self.set_error(None);
        self.set_busy(true);
        Ok(PendingTurn { turn_id })
    }

    /// Settles a request successfully by appending the model answer.
    pub fn commit(
        &mut self,
        pending: PendingTurn,
        text: impl Into<String>,
        sources: Vec<Source>,
    ) -> TurnId {
        let model_turn_id = self.append_model(text, sources);
        tracing::debug!(
            user_turn_id = pending.turn_id.0,
            model_turn_id = model_turn_id.0,
            "request committed"
        );
        self.set_busy(false);
        model_turn_id
    }

    /// Settles a request as failed: retracts the user turn and records `message`.
    pub fn abort(&mut self, pending: PendingTurn, message: impl Into<String>) {
        if !self.rollback(pending.turn_id) {
            tracing::warn!(
                user_turn_id = pending.turn_id.0,
                "pending turn was no longer last; nothing rolled back"
            );
        }

        self.set_error(Some(message.into()));
        self.set_busy(false);
    }

    fn alloc_turn_id(&mut self) -> TurnId {
        self.next_turn_id = self.next_turn_id.saturating_add(1);
        TurnId::new(self.next_turn_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::Role;

    fn image() -> Attachment {
        Attachment::new("shot.png", "image/png", "data:image/png;base64,AAAA")
    }

    #[test]
    fn empty_user_turn_is_a_no_op() {
        let mut store = ConversationStore::new();
        assert_eq!(store.append_user("", vec![]), None);
        assert!(store.is_empty());
    }

    #[test]
    fn attachment_only_user_turn_is_accepted() {
        let mut store = ConversationStore::new();
        let id = store.append_user("", vec![image()]).expect("attachment counts");
        assert_eq!(store.last().map(|turn| turn.id), Some(id));
        assert_eq!(store.turns()[0].attachments.len(), 1);
    }

    #[test]
    fn rollback_only_removes_the_last_turn() {
        let mut store = ConversationStore::new();
        let user = store.append_user("hi", vec![]).expect("non-empty");
        let model = store.append_model("hello", vec![]);

        assert!(!store.rollback(user));
        assert_eq!(store.len(), 2);

        assert!(store.rollback(model));
        assert!(store.rollback(user));
        assert!(store.is_empty());
    }

    #[test]
    fn turn_ids_are_not_reused_after_rollback() {
        let mut store = ConversationStore::new();
        let first = store.append_user("one", vec![]).expect("non-empty");
        assert!(store.rollback(first));
        let second = store.append_user("two", vec![]).expect("non-empty");
        assert_ne!(first, second);
        assert!(!store.rollback(first));
    }

    #[test]
    fn model_turn_filters_incomplete_sources() {
        let mut store = ConversationStore::new();
        store.append_model(
            "answer",
            vec![
                Source::new("http://a", "A"),
                Source::new("", "no uri"),
                Source::new("http://b", ""),
            ],
        );

        let turn = store.last().expect("model turn appended");
        assert_eq!(turn.role, Role::Model);
        assert_eq!(turn.sources, vec![Source::new("http://a", "A")]);
    }

    #[test]
    fn begin_rejects_while_busy() {
        let mut store = ConversationStore::new();
        let pending = store.begin("first", vec![]).expect("idle store accepts");

        assert_eq!(store.begin("second", vec![]), Err(BeginRejection::Busy));
        assert_eq!(store.len(), 1);

        store.commit(pending, "answer", vec![]);
        assert!(!store.is_busy());
    }

    #[test]
    fn begin_rejects_empty_turn_without_touching_flags() {
        let mut store = ConversationStore::new();
        store.set_error(Some("old".to_string()));

        assert_eq!(store.begin("", vec![]), Err(BeginRejection::EmptyTurn));
        assert!(!store.is_busy());
        assert_eq!(store.last_error(), Some("old"));
    }

    #[test]
    fn commit_appends_model_turn_and_clears_busy() {
        let mut store = ConversationStore::new();
        store.set_error(Some("previous failure".to_string()));

        let pending = store.begin("question", vec![]).expect("idle store accepts");
        assert!(store.is_busy());
        assert_eq!(store.last_error(), None);

        store.commit(pending, "X", vec![Source::new("http://a", "A")]);
        assert_eq!(store.len(), 2);
        assert!(!store.is_busy());
        assert_eq!(store.turns()[1].text, "X");
    }

    #[test]
    fn abort_retracts_user_turn_and_records_error() {
        let mut store = ConversationStore::new();
        let pending = store.begin("question", vec![]).expect("idle store accepts");

        store.abort(pending, "Failed");
        assert!(store.is_empty());
        assert!(!store.is_busy());
        assert_eq!(store.last_error(), Some("Failed"));
    }
}
