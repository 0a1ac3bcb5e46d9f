//! Response bodies of the assistant API.

use serde::{Deserialize, Serialize};

/// Success body of `POST /chat`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChatReply {
    /// Assistant reply; absent when the service had nothing to say.
    #[serde(default)]
    pub response: Option<String>,
}

/// One stored exchange entry returned by the history endpoint.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Message text as stored.
    pub message: String,
    /// `"user"` for user messages; anything else is the assistant.
    pub role: String,
    /// Server-side timestamp, when the service provides one.
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HistoryEntry {
    /// Whether this entry was authored by the user.
    #[must_use]
    pub fn is_user(&self) -> bool {
        self.role == "user"
    }
}
