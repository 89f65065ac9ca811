pub mod composer;
/// Event contracts between the presentation layer and the session.
pub mod events;
/// Turn model shared by the store and the presentation layer.
pub mod message;
pub mod render;
pub mod session;
pub mod starters;
/// Conversation state and its two-phase request bookkeeping.
pub mod store;

pub use composer::Composer;
pub use events::{SendOutcome, Submit};
pub use message::{Role, Turn, TurnId};
pub use render::{TextSegment, split_links};
pub use session::{ChatSession, InFlight};
pub use starters::{EXAMPLE_PROMPTS, example_prompt};
pub use store::{BeginRejection, ConversationStore, PendingTurn};
