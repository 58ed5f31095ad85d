//! Test helpers shared across ProfessorBot crates.

pub mod llm;

pub use llm::{FailingLLM, FixedChatResponse, GatedLLM, ScriptedLLM};
