//! Error types for the dialogue core crate.

use crate::types::SessionId;
use thiserror::Error;

/// Errors returned by dialogue driver operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Session id is unknown to the driver.
    #[error("unknown session: {0}")]
    UnknownSession(SessionId),
    /// The session already received the termination marker.
    #[error("session {0} is completed; start a new session to continue")]
    SessionCompleted(SessionId),
    /// A generator call for this session has not returned yet.
    #[error("session {0} is waiting for a reply")]
    TurnInFlight(SessionId),
    /// Submitted text was empty after trimming.
    #[error("input is empty")]
    EmptyInput,
    /// Transcript export requested before the session completed.
    #[error("transcript for session {0} is available after approval")]
    TranscriptUnavailable(SessionId),
    /// The topic does not define a summary instruction.
    #[error("topic {0} does not offer a summary")]
    SummaryUnavailable(String),
    /// Generator call failed outside the turn loop.
    #[error("generator error: {0}")]
    Generator(#[from] GeneratorError),
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the external dialogue generator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    /// No credential could be resolved; carries the key name that was looked up.
    #[error("missing credential {0}")]
    MissingCredential(String),
    /// The provider could not be constructed.
    #[error("failed to build provider: {0}")]
    Build(String),
    /// The provider call failed (network, authentication, quota).
    #[error("provider call failed: {0}")]
    Provider(String),
    /// The provider answered without any text.
    #[error("provider returned an empty reply")]
    EmptyReply,
}

impl GeneratorError {
    /// Warning text substituted into the conversation in place of a reply.
    pub fn warning(&self) -> String {
        match self {
            GeneratorError::MissingCredential(key) => {
                format!("⚠️ Missing {key}. Add it to the secrets file or environment variables.")
            }
            GeneratorError::Build(err) | GeneratorError::Provider(err) => {
                format!("⚠️ Could not reach the model ({err}). Please send your message again.")
            }
            GeneratorError::EmptyReply => {
                "⚠️ The model returned an empty reply. Please send your message again."
                    .to_string()
            }
        }
    }
}
