//! Dialogue core for ProfessorBot.
//!
//! One generic [`DialogueDriver`] runs every topic: it keeps sessions in
//! memory, assembles the outbound prompt each turn, calls the hosted model
//! through [`Generator`], detects the termination marker and exports the
//! transcript once a session is completed.

pub mod credentials;
pub mod driver;
pub mod error;
pub mod generator;
pub mod prompt;
mod session;
mod sessions;
pub mod stage;
pub mod transcript;
pub mod types;

pub use credentials::resolve_api_key;
pub use driver::{DialogueDriver, DriverSettings};
pub use error::{CoreError, GeneratorError};
pub use generator::Generator;
pub use prompt::{PromptSegment, TurnPrompt};
pub use stage::Stage;
pub use transcript::Transcript;
pub use types::{
    DialogueState, Message, Role, Session, SessionId, SessionSummary, TurnOutcome,
};
