//! Per-session dialogue state machine.
//!
//! `AwaitingFirstPrompt -> Active -> Completed`. All transitions are plain
//! synchronous mutations so the driver can apply them under the store lock
//! and release it before awaiting the generator.

use crate::error::CoreError;
use crate::stage::Stage;
use crate::types::{DialogueState, Message, Role, Session};
use chrono::Utc;
use uuid::Uuid;

impl Session {
    /// Fresh session with no messages.
    pub fn new(topic_id: impl Into<String>, staged: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic_id: topic_id.into(),
            messages: Vec::new(),
            user_turn_count: 0,
            state: DialogueState::AwaitingFirstPrompt,
            in_flight: false,
            stage: staged.then(Stage::default),
            created_at: Utc::now(),
        }
    }

    /// Append the opening assistant message and become `Active`.
    ///
    /// No-op unless the session is still awaiting its first prompt.
    pub fn open(&mut self, opening: &str) -> bool {
        if self.state != DialogueState::AwaitingFirstPrompt {
            return false;
        }
        self.messages.push(Message::assistant(opening));
        self.state = DialogueState::Active;
        true
    }

    /// Accept one student submission and mark a generator call outstanding.
    pub fn begin_turn(&mut self, input: &str) -> Result<(), CoreError> {
        match self.state {
            DialogueState::Completed => return Err(CoreError::SessionCompleted(self.id)),
            DialogueState::AwaitingFirstPrompt | DialogueState::Active => {}
        }
        if self.in_flight {
            return Err(CoreError::TurnInFlight(self.id));
        }
        if input.trim().is_empty() {
            return Err(CoreError::EmptyInput);
        }
        self.messages.push(Message::user(input));
        self.user_turn_count += 1;
        self.in_flight = true;
        Ok(())
    }

    /// Append a generator reply; completes the session when it carries `marker`.
    pub fn record_reply(&mut self, reply: &str, marker: &str) -> DialogueState {
        self.in_flight = false;
        self.messages.push(Message::assistant(reply));
        if reply.contains(marker) {
            self.state = DialogueState::Completed;
        }
        self.state
    }

    /// Append a substituted warning. Never completes the session.
    pub fn record_warning(&mut self, warning: &str) {
        self.in_flight = false;
        self.messages.push(Message::assistant(warning));
    }

    /// Append a closing message that begins with `marker` and complete.
    pub fn force_close(&mut self, marker: &str, closing: &str) {
        self.in_flight = false;
        self.messages
            .push(Message::assistant(format!("{marker} {closing}")));
        self.state = DialogueState::Completed;
    }

    pub fn is_completed(&self) -> bool {
        self.state == DialogueState::Completed
    }

    /// Most recent message authored by `role`.
    pub fn last_message(&self, role: Role) -> Option<&Message> {
        self.messages.iter().rev().find(|message| message.role == role)
    }
}
