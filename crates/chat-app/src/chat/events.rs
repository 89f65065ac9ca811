use legends_llm::Attachment;

use crate::chat::message::TurnId;
use crate::chat::store::BeginRejection;

/// Emitted when the user submits a prompt with its attachments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submit {
    pub prompt: String,
    pub attachments: Vec<Attachment>,
}

impl Submit {
    /// Creates a submit event. Surrounding whitespace is trimmed from the prompt.
    pub fn new(prompt: impl AsRef<str>, attachments: Vec<Attachment>) -> Self {
        Self {
            prompt: prompt.as_ref().trim().to_string(),
            attachments,
        }
    }

    pub fn prompt_only(prompt: impl AsRef<str>) -> Self {
        Self::new(prompt, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.prompt.is_empty() && self.attachments.is_empty()
    }
}

/// How one submit settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Answered {
        user_turn_id: TurnId,
        model_turn_id: TurnId,
    },
    /// The provisional user turn was retracted; `message` is what the user sees.
    Failed { message: String },
    /// Nothing was sent.
    Ignored(BeginRejection),
}

impl SendOutcome {
    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered { .. })
    }
}
