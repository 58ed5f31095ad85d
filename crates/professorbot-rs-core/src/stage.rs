//! Keyword stage tracker for staged reflection topics.
//!
//! Advancement is a best-effort heuristic over plain substring checks. It can
//! skip or stall a stage when wording is unusual; callers must not treat the
//! current stage as an exact reading of the conversation.

use serde::{Deserialize, Serialize};

/// Reflection flow stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Stage {
    /// A: define the decision, options, choice and outcome.
    #[default]
    DecisionDefinition,
    /// B: define both weekly concepts.
    ConceptBinding,
    /// C: analyse the decision with each concept separately.
    SeparateAnalyses,
    /// D: integrate the concepts and wrap up.
    Integration,
}

impl Stage {
    /// Single-letter label shown in the UI.
    pub fn label(&self) -> char {
        match self {
            Stage::DecisionDefinition => 'A',
            Stage::ConceptBinding => 'B',
            Stage::SeparateAnalyses => 'C',
            Stage::Integration => 'D',
        }
    }

    /// Trailing system instruction for this stage.
    pub fn instruction(&self) -> &'static str {
        match self {
            Stage::DecisionDefinition => {
                "Stage A (Decision definition): Ask for (1) the decision, (2) at least two options, \
                 (3) what they chose, (4) outcome/feelings. Then restate decision in 2–3 sentences and confirm."
            }
            Stage::ConceptBinding => {
                "Stage B (Concept binding): Ask student to define Concept 1 and Concept 2 in one sentence each, \
                 then check/correct and confirm they will use both."
            }
            Stage::SeparateAnalyses => {
                "Stage C (Separate analyses): First analyze with Concept 1 (mechanism + 2 evidence details + counterfactual), \
                 then Concept 2 similarly."
            }
            Stage::Integration => {
                "Stage D (Integration + reflection): Ask how concepts relate (complement/conflict/causal chain), \
                 then prompt 2 actionable takeaways. End with a structured submission-ready summary."
            }
        }
    }

    /// Stage after one completed turn. Moves at most one step.
    pub fn advance(self, user_text: &str, assistant_text: &str, concepts_provided: bool) -> Stage {
        match self {
            Stage::DecisionDefinition => {
                let user_text = user_text.to_lowercase();
                if user_text.contains("option") || user_text.contains("chose") {
                    Stage::ConceptBinding
                } else {
                    self
                }
            }
            Stage::ConceptBinding if concepts_provided => Stage::SeparateAnalyses,
            Stage::SeparateAnalyses => {
                let assistant_text = assistant_text.to_lowercase();
                if assistant_text.contains("concept 2") || assistant_text.contains("second concept")
                {
                    Stage::Integration
                } else {
                    self
                }
            }
            other => other,
        }
    }
}
