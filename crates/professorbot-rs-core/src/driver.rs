//! Generic dialogue driver parameterised by topic data.

use crate::error::{CoreError, GeneratorError};
use crate::generator::Generator;
use crate::prompt::{self, TurnPrompt};
use crate::sessions::SessionStore;
use crate::transcript::Transcript;
use crate::types::{DialogueState, Session, SessionId, SessionSummary, TurnOutcome};
use chrono::Local;
use log::{debug, info, warn};
use professorbot_rs_config::{ProfessorBotConfig, Topic};
use std::sync::Arc;

/// Closing text appended after the marker when the hard turn limit is hit.
const FORCED_CLOSING: &str = "We have reached the end of this conversation. \
     Thank you for your answers; the conversation is concluded and I will see you next time.";

/// Effective per-topic settings after applying config defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverSettings {
    /// Exact phrase whose presence in a reply completes the dialogue.
    pub marker: String,
    /// Advisory ceiling announced in the turn directive.
    pub max_turns: u32,
    /// Enforced ceiling; `None` leaves termination to the generator.
    pub hard_turn_limit: Option<u32>,
    pub concepts: Vec<String>,
    /// Credential name reported when no generator is available.
    pub credential_name: String,
}

impl DriverSettings {
    pub fn for_topic(topic: &Topic, config: &ProfessorBotConfig) -> Self {
        Self {
            marker: topic.marker_or(&config.dialogue).to_string(),
            max_turns: topic.max_turns_or(&config.dialogue),
            hard_turn_limit: config.dialogue.hard_turn_limit,
            concepts: config.dialogue.concepts.clone(),
            credential_name: config.credentials.env_var.clone(),
        }
    }
}

/// Runs sessions for one topic.
#[derive(Clone)]
pub struct DialogueDriver {
    topic: Arc<Topic>,
    settings: Arc<DriverSettings>,
    /// Persona with concept placeholders rendered.
    persona: Arc<str>,
    generator: Option<Generator>,
    sessions: SessionStore,
}

impl DialogueDriver {
    /// Create a driver. A `None` generator turns every reply into the missing-credential warning.
    pub fn new(topic: Topic, settings: DriverSettings, generator: Option<Generator>) -> Self {
        let persona: Arc<str> = prompt::render_persona(&topic.persona, &settings.concepts).into();
        info!(
            "dialogue driver ready (topic={}, generator={}, max_turns={}, hard_turn_limit={:?})",
            topic.id,
            generator
                .as_ref()
                .map(Generator::model)
                .unwrap_or("<missing credential>"),
            settings.max_turns,
            settings.hard_turn_limit
        );
        Self {
            topic: Arc::new(topic),
            settings: Arc::new(settings),
            persona,
            generator,
            sessions: SessionStore::new(),
        }
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn settings(&self) -> &DriverSettings {
        &self.settings
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Model name of the generator, if one is configured.
    pub fn model(&self) -> Option<&str> {
        self.generator.as_ref().map(Generator::model)
    }

    /// Create a session and append the topic's opening message.
    pub fn start_session(&self) -> SessionId {
        let mut session = Session::new(self.topic.id.clone(), self.topic.staged);
        session.open(&self.topic.opening);
        self.sessions.insert(session)
    }

    /// Submit one student message and wait for the reply.
    ///
    /// Generator failures never surface as errors here: a warning message is
    /// appended and the session stays `Active`.
    pub async fn submit(
        &self,
        session_id: SessionId,
        input: &str,
    ) -> Result<TurnOutcome, CoreError> {
        let segments = self.sessions.update(session_id, |session| {
            session.open(&self.topic.opening);
            session.begin_turn(input)?;
            Ok::<_, CoreError>(
                TurnPrompt {
                    persona: &self.persona,
                    procedure: &self.topic.procedure,
                    user_turn_count: session.user_turn_count,
                    max_turns: self.settings.max_turns,
                    conversation: &session.messages,
                    stage: session.stage,
                }
                .assemble(),
            )
        })??;
        debug!(
            "turn accepted (session_id={}, segments={})",
            session_id,
            segments.len()
        );

        let result = match &self.generator {
            Some(generator) => generator.generate(&segments).await,
            None => Err(GeneratorError::MissingCredential(
                self.settings.credential_name.clone(),
            )),
        };

        self.sessions.update(session_id, |session| match result {
            Ok(reply) => self.apply_reply(session, input, reply),
            Err(err) => {
                warn!(
                    "substituting warning for failed turn (session_id={}, err={})",
                    session_id, err
                );
                let warning = err.warning();
                session.record_warning(&warning);
                TurnOutcome {
                    reply: None,
                    warning: Some(warning),
                    state: session.state,
                    user_turn_count: session.user_turn_count,
                    forced_close: false,
                }
            }
        })
    }

    fn apply_reply(&self, session: &mut Session, input: &str, reply: String) -> TurnOutcome {
        let marker = self.settings.marker.as_str();
        let mut state = session.record_reply(&reply, marker);
        let mut forced_close = false;
        if state != DialogueState::Completed
            && let Some(limit) = self.settings.hard_turn_limit
            && session.user_turn_count >= limit
        {
            info!(
                "hard turn limit reached; closing session (session_id={}, turns={})",
                session.id, session.user_turn_count
            );
            session.force_close(marker, FORCED_CLOSING);
            state = session.state;
            forced_close = true;
        }
        if let Some(stage) = session.stage {
            let provided = prompt::concepts_provided(&self.topic.persona, &self.settings.concepts);
            let next = stage.advance(input, &reply, provided);
            if next != stage {
                debug!(
                    "stage advanced (session_id={}, from={}, to={})",
                    session.id,
                    stage.label(),
                    next.label()
                );
                session.stage = Some(next);
            }
        }
        if state == DialogueState::Completed {
            info!(
                "session completed (session_id={}, turns={})",
                session.id, session.user_turn_count
            );
        }
        TurnOutcome {
            reply: Some(reply),
            warning: None,
            state,
            user_turn_count: session.user_turn_count,
            forced_close,
        }
    }

    /// Render the transcript of a completed session.
    pub fn transcript(&self, session_id: SessionId) -> Result<Transcript, CoreError> {
        let session = self.sessions.get(session_id)?;
        if !session.is_completed() {
            return Err(CoreError::TranscriptUnavailable(session_id));
        }
        Ok(Transcript::new(&session.messages, Local::now()))
    }

    /// Ask for a submission-ready summary without extending the conversation.
    pub async fn summarize(&self, session_id: SessionId) -> Result<String, CoreError> {
        let Some(instruction) = self.topic.summary_instruction.as_deref() else {
            return Err(CoreError::SummaryUnavailable(self.topic.id.clone()));
        };
        let session = self.sessions.get(session_id)?;
        let segments = prompt::summary_prompt(
            &self.persona,
            &self.topic.procedure,
            &session.messages,
            instruction,
        );
        let generator = self.generator.as_ref().ok_or_else(|| {
            GeneratorError::MissingCredential(self.settings.credential_name.clone())
        })?;
        info!("summary requested (session_id={})", session_id);
        Ok(generator.generate(&segments).await?)
    }

    /// Discard a session and open a fresh one for the same topic.
    pub fn reset(&self, session_id: SessionId) -> Result<SessionId, CoreError> {
        if !self.sessions.remove(session_id) {
            return Err(CoreError::UnknownSession(session_id));
        }
        info!("session reset (session_id={})", session_id);
        Ok(self.start_session())
    }

    /// Snapshot of a session.
    pub fn session(&self, session_id: SessionId) -> Result<Session, CoreError> {
        self.sessions.get(session_id)
    }

    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        self.sessions.list()
    }
}

#[cfg(test)]
mod tests {
    use super::{DialogueDriver, DriverSettings};
    use professorbot_rs_config::{DEFAULT_TERMINATION_MARKER, ProfessorBotConfig, TopicCatalog};
    use pretty_assertions::assert_eq;

    #[test]
    fn settings_apply_topic_overrides() {
        let catalog = TopicCatalog::builtin().expect("catalog");
        let config = ProfessorBotConfig::default();

        let settings = DriverSettings::for_topic(catalog.get("reflection").expect("topic"), &config);
        assert_eq!(settings.max_turns, 30);
        assert_eq!(settings.marker, DEFAULT_TERMINATION_MARKER);
        assert_eq!(settings.credential_name, "OPENAI_API_KEY");
        assert_eq!(settings.hard_turn_limit, None);

        let settings = DriverSettings::for_topic(catalog.get("brain-2").expect("topic"), &config);
        assert_eq!(settings.max_turns, 15);
    }

    #[test]
    fn persona_is_rendered_once_with_concepts() {
        let catalog = TopicCatalog::builtin().expect("catalog");
        let topic = catalog.get("reflection").expect("topic").clone();
        let mut settings = DriverSettings::for_topic(&topic, &ProfessorBotConfig::default());
        settings.concepts = vec!["anchoring".to_string()];
        let driver = DialogueDriver::new(topic, settings, None);
        assert!(driver.persona.contains("Concept 1: anchoring"));
        assert!(driver.persona.contains("Concept 2: [Not provided yet]"));
        assert!(!driver.has_generator());
    }
}
