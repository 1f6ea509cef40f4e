//! Chat-message types for the external generation provider.

use serde::{Deserialize, Serialize};

/// Chat role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }
}

/// Output of the generation provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    /// The answer text.
    pub content: String,
    /// Optional reasoning trace, for models that expose one.
    #[serde(default)]
    pub thinking: Option<String>,
}
