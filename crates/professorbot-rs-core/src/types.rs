//! Core data types shared across the dialogue API.

use crate::stage::Stage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a session.
pub type SessionId = Uuid;

/// Message stored in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role that produced the message.
    pub role: Role,
    /// Message content.
    pub content: String,
    /// Timestamp for the message.
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Speaker role for a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instruction segment; never shown to the student.
    System,
    /// Student-authored message.
    User,
    /// Generator reply, opening message, or substituted warning.
    Assistant,
}

impl Role {
    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Lifecycle of one dialogue.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DialogueState {
    /// No messages yet; the opening message has not been appended.
    AwaitingFirstPrompt,
    /// Accepting student input.
    Active,
    /// Termination marker observed; terminal.
    Completed,
}

impl DialogueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogueState::AwaitingFirstPrompt => "awaiting_first_prompt",
            DialogueState::Active => "active",
            DialogueState::Completed => "completed",
        }
    }
}

impl fmt::Display for DialogueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full session state with its conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    /// Session identifier.
    pub id: SessionId,
    /// Topic that parameterises this dialogue.
    pub topic_id: String,
    /// Ordered, append-only conversation.
    pub messages: Vec<Message>,
    /// Number of accepted student submissions.
    pub user_turn_count: u32,
    pub state: DialogueState,
    /// True while a generator call for this session is outstanding.
    pub in_flight: bool,
    /// Current stage for staged topics.
    pub stage: Option<Stage>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Summary view of a session for listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    pub id: SessionId,
    pub topic_id: String,
    pub message_count: usize,
    pub user_turn_count: u32,
    pub state: DialogueState,
    pub created_at: DateTime<Utc>,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id,
            topic_id: session.topic_id.clone(),
            message_count: session.messages.len(),
            user_turn_count: session.user_turn_count,
            state: session.state,
            created_at: session.created_at,
        }
    }
}

/// Result of one accepted student submission.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Generator reply appended to the conversation, if the call succeeded.
    pub reply: Option<String>,
    /// Warning appended instead of a reply when the call failed.
    pub warning: Option<String>,
    /// State after the turn.
    pub state: DialogueState,
    pub user_turn_count: u32,
    /// True when the driver closed the dialogue at the hard turn limit.
    pub forced_close: bool,
}
