use legends_llm::{Attachment, Source};

/// Stable identifier for one turn.
///
/// Identifiers are never reused within a store, even after a rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TurnId(pub u64);

impl TurnId {
    /// Creates a typed turn identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Chat speaker role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

/// One entry of the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub id: TurnId,
    pub role: Role,
    pub text: String,
    pub attachments: Vec<Attachment>,
    /// Citations backing a model answer. Always empty on user turns.
    pub sources: Vec<Source>,
}

impl Turn {
    pub fn user(id: TurnId, text: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            id,
            role: Role::User,
            text: text.into(),
            attachments,
            sources: Vec::new(),
        }
    }

    /// Creates a model turn, keeping only sources with both a URI and a title.
    pub fn model(id: TurnId, text: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            id,
            role: Role::Model,
            text: text.into(),
            attachments: Vec::new(),
            sources: sources.into_iter().filter(Source::is_complete).collect(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}
