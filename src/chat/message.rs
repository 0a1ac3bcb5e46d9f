//! Conversation messages.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::HistoryEntry;
use crate::sanitize::{self, Sanitizer};

/// Author of a message.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Typed by the user.
    User,
    /// Produced by the assistant or by the client on its behalf.
    Bot,
}

impl Role {
    /// Stable string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }

    /// Map a stored history role; only `"user"` is a user.
    #[must_use]
    pub fn from_history(role: &str) -> Self {
        if role == "user" { Self::User } else { Self::Bot }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of the conversation log. Immutable once built.
///
/// User text is kept verbatim and must be shown as literal text. Bot text is
/// sanitized markup (see [`crate::sanitize`]).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    text: String,
}

impl Message {
    /// A user message, stored verbatim.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// A bot message from raw assistant text.
    #[must_use]
    pub fn bot(raw: &str, sanitizer: &Sanitizer) -> Self {
        Self {
            role: Role::Bot,
            text: sanitizer.sanitize(raw),
        }
    }

    /// A bot-side notice written by the client itself.
    ///
    /// The text is escaped but not stripped, so embedded user input such as
    /// an identity keeps every character.
    #[must_use]
    pub fn notice(text: &str) -> Self {
        Self {
            role: Role::Bot,
            text: sanitize::to_markup(text),
        }
    }

    /// Rebuild a message from a stored history entry.
    #[must_use]
    pub fn from_history(entry: &HistoryEntry, sanitizer: &Sanitizer) -> Self {
        match Role::from_history(&entry.role) {
            Role::User => Self::user(entry.message.clone()),
            Role::Bot => Self::bot(&entry.message, sanitizer),
        }
    }

    /// Author.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Stored text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether [`Self::text`] is markup rather than literal text.
    #[must_use]
    pub const fn is_markup(&self) -> bool {
        matches!(self.role, Role::Bot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_text_is_verbatim() {
        let message = Message::user("**bold** <b>raw</b>");
        assert_eq!(message.text(), "**bold** <b>raw</b>");
        assert!(!message.is_markup());
    }

    #[test]
    fn test_bot_text_is_sanitized() {
        let sanitizer = Sanitizer::new().unwrap();
        let message = Message::bot("# Tip\n- read", &sanitizer);
        assert_eq!(message.role(), Role::Bot);
        assert_eq!(message.text(), " Tip<br>\u{2022} read");
        assert!(message.is_markup());
    }

    #[test]
    fn test_notice_escapes_without_stripping() {
        let message = Message::notice("Hi john_doe(2) & <co>");
        assert_eq!(message.role(), Role::Bot);
        assert_eq!(message.text(), "Hi john_doe(2) &amp; &lt;co&gt;");
        assert!(message.is_markup());
    }

    #[test]
    fn test_history_roles() {
        let sanitizer = Sanitizer::new().unwrap();
        let entry = |role: &str| HistoryEntry {
            message: "*x*".to_string(),
            role: role.to_string(),
            timestamp: None,
        };

        assert_eq!(Message::from_history(&entry("user"), &sanitizer), Message::user("*x*"));
        assert_eq!(Message::from_history(&entry("assistant"), &sanitizer).text(), "x");
        assert_eq!(Message::from_history(&entry("bot"), &sanitizer).role(), Role::Bot);
    }
}
