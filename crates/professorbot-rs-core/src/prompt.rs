//! Outbound prompt assembly.
//!
//! Every generator call receives role-tagged segments in a fixed order:
//! persona, procedure, turn-count directive, the conversation verbatim and,
//! for staged topics, one trailing stage instruction. Order and roles are
//! part of the contract with the procedure text and must not change.

use crate::stage::Stage;
use crate::types::{Message, Role};

/// Substituted for persona placeholders without a configured concept.
pub const MISSING_CONCEPT: &str = "[Not provided yet]";

const CONCEPT_PLACEHOLDER_PREFIX: &str = "{concept_";

/// One role-tagged entry of the outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSegment {
    pub role: Role,
    pub content: String,
}

impl PromptSegment {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

impl From<&Message> for PromptSegment {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Inputs for a single turn prompt.
#[derive(Debug, Clone, Copy)]
pub struct TurnPrompt<'a> {
    /// Persona text with placeholders already rendered.
    pub persona: &'a str,
    pub procedure: &'a str,
    pub user_turn_count: u32,
    pub max_turns: u32,
    pub conversation: &'a [Message],
    pub stage: Option<Stage>,
}

impl TurnPrompt<'_> {
    /// Build the ordered segment list.
    pub fn assemble(&self) -> Vec<PromptSegment> {
        let mut segments = Vec::with_capacity(self.conversation.len() + 4);
        segments.push(PromptSegment::system(self.persona));
        segments.push(PromptSegment::system(self.procedure));
        segments.push(PromptSegment::system(turn_directive(
            self.user_turn_count,
            self.max_turns,
        )));
        segments.extend(self.conversation.iter().map(PromptSegment::from));
        if let Some(stage) = self.stage {
            segments.push(PromptSegment::system(stage.instruction()));
        }
        segments
    }
}

/// Segments for a one-off summary request; the conversation is not extended.
pub fn summary_prompt(
    persona: &str,
    procedure: &str,
    conversation: &[Message],
    instruction: &str,
) -> Vec<PromptSegment> {
    let mut segments = Vec::with_capacity(conversation.len() + 3);
    segments.push(PromptSegment::system(persona));
    segments.push(PromptSegment::system(procedure));
    segments.extend(conversation.iter().map(PromptSegment::from));
    segments.push(PromptSegment::system(instruction));
    segments
}

/// Advisory turn-count directive.
pub fn turn_directive(user_turn_count: u32, max_turns: u32) -> String {
    format!("User turn count so far: {user_turn_count}. If >= {max_turns}, you must end now.")
}

/// Replace `{concept_N}` placeholders (1-based) with configured concepts.
///
/// Missing or blank concepts render as [`MISSING_CONCEPT`]. Malformed
/// placeholders are left untouched.
pub fn render_persona(persona: &str, concepts: &[String]) -> String {
    let mut rendered = String::with_capacity(persona.len());
    let mut rest = persona;
    while let Some(start) = rest.find(CONCEPT_PLACEHOLDER_PREFIX) {
        rendered.push_str(&rest[..start]);
        let after = &rest[start + CONCEPT_PLACEHOLDER_PREFIX.len()..];
        match parse_slot(after) {
            Some((slot, consumed)) => {
                let concept = concepts
                    .get(slot - 1)
                    .map(|concept| concept.trim())
                    .filter(|concept| !concept.is_empty())
                    .unwrap_or(MISSING_CONCEPT);
                rendered.push_str(concept);
                rest = &after[consumed..];
            }
            None => {
                rendered.push_str(CONCEPT_PLACEHOLDER_PREFIX);
                rest = after;
            }
        }
    }
    rendered.push_str(rest);
    rendered
}

/// Highest concept slot referenced by the persona, zero if none.
pub fn concept_slots(persona: &str) -> usize {
    let mut highest = 0;
    let mut rest = persona;
    while let Some(start) = rest.find(CONCEPT_PLACEHOLDER_PREFIX) {
        let after = &rest[start + CONCEPT_PLACEHOLDER_PREFIX.len()..];
        if let Some((slot, _)) = parse_slot(after) {
            highest = highest.max(slot);
        }
        rest = after;
    }
    highest
}

/// True when every slot the persona references has a non-blank concept.
pub fn concepts_provided(persona: &str, concepts: &[String]) -> bool {
    let slots = concept_slots(persona);
    slots > 0
        && (0..slots).all(|idx| {
            concepts
                .get(idx)
                .is_some_and(|concept| !concept.trim().is_empty())
        })
}

/// Parse `N}` at the start of `text`; returns the slot and bytes consumed.
fn parse_slot(text: &str) -> Option<(usize, usize)> {
    let digits = text.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || !text[digits..].starts_with('}') {
        return None;
    }
    let slot = text[..digits].parse::<usize>().ok().filter(|slot| *slot >= 1)?;
    Some((slot, digits + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn alternating(count: usize) -> Vec<Message> {
        (0..count)
            .map(|idx| {
                if idx % 2 == 0 {
                    Message::assistant(format!("assistant {idx}"))
                } else {
                    Message::user(format!("user {idx}"))
                }
            })
            .collect()
    }

    #[test]
    fn segments_follow_fixed_order() {
        let conversation = alternating(5);
        let segments = TurnPrompt {
            persona: "persona",
            procedure: "procedure",
            user_turn_count: 2,
            max_turns: 15,
            conversation: &conversation,
            stage: None,
        }
        .assemble();

        assert_eq!(segments.len(), conversation.len() + 3);
        assert_eq!(segments[0], PromptSegment::system("persona"));
        assert_eq!(segments[1], PromptSegment::system("procedure"));
        assert_eq!(
            segments[2],
            PromptSegment::system("User turn count so far: 2. If >= 15, you must end now.")
        );
        for (segment, message) in segments[3..].iter().zip(&conversation) {
            assert_eq!(segment.role, message.role);
            assert_eq!(segment.content, message.content);
        }
    }

    #[test]
    fn staged_prompt_appends_one_trailing_instruction() {
        let conversation = alternating(3);
        let segments = TurnPrompt {
            persona: "p",
            procedure: "q",
            user_turn_count: 1,
            max_turns: 30,
            conversation: &conversation,
            stage: Some(Stage::ConceptBinding),
        }
        .assemble();
        assert_eq!(segments.len(), conversation.len() + 4);
        assert_eq!(
            segments.last(),
            Some(&PromptSegment::system(Stage::ConceptBinding.instruction()))
        );
    }

    #[test]
    fn summary_prompt_ends_with_instruction() {
        let conversation = alternating(2);
        let segments = summary_prompt("p", "q", &conversation, "summarise");
        assert_eq!(segments.len(), 5);
        assert_eq!(segments[4], PromptSegment::system("summarise"));
    }

    #[test]
    fn persona_renders_concepts_and_placeholders() {
        let persona = "Concept 1: {concept_1}\nConcept 2: {concept_2}\nKeep {concept_x} and {concept_0}";
        let rendered = render_persona(persona, &["anchoring".to_string(), "  ".to_string()]);
        assert_eq!(
            rendered,
            "Concept 1: anchoring\nConcept 2: [Not provided yet]\nKeep {concept_x} and {concept_0}"
        );
    }

    #[test]
    fn concept_slots_track_highest_placeholder() {
        assert_eq!(concept_slots("no placeholders"), 0);
        assert_eq!(concept_slots("{concept_2} then {concept_1}"), 2);
        assert!(!concepts_provided("{concept_1} {concept_2}", &["a".to_string()]));
        assert!(concepts_provided(
            "{concept_1} {concept_2}",
            &["a".to_string(), "b".to_string()]
        ));
        assert!(!concepts_provided("plain persona", &["a".to_string()]));
    }
}
