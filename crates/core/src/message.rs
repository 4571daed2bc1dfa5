//! Chat message types.
//!
//! A chat session is an ordered sequence of [`AssistantMessage`]s. The
//! session lives with the caller; the core only sees the turns the caller
//! chooses to replay into the next prompt.

use serde::{Deserialize, Serialize};

/// The role of a message sender in a chat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
}

impl Role {
    /// Label used when a turn is rendered into prompt text.
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// A single chat turn half: one question or one reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantMessage {
    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,
}

impl AssistantMessage {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
