//! Chat state machine and conversation model.
//!
//! - `Orchestrator`: turns user actions and network completions into commands
//! - `ConversationLog` / `Message`: what the user sees
//! - `Event` / `Command`: the orchestrator's typed input and output

pub mod conversation;
pub mod events;
pub mod ids;
pub mod message;
pub mod orchestrator;

pub use conversation::ConversationLog;
pub use events::{Command, ConfirmAction, Event, Rejection};
pub use ids::RequestId;
pub use message::{Message, Role};
pub use orchestrator::{
    APOLOGY_MESSAGE, CONNECTION_LOST_MESSAGE, Orchestrator, PendingRequest, Phase,
    TIMEOUT_MESSAGE,
};
