use autoagents_llm::chat::ChatRole;
use pretty_assertions::assert_eq;
use professorbot_rs_config::{DEFAULT_TERMINATION_MARKER, ProfessorBotConfig, Topic, TopicCatalog};
use professorbot_rs_core::{
    CoreError, DialogueDriver, DialogueState, DriverSettings, Generator, Role, Stage, transcript,
};
use professorbot_rs_test_utils::{FailingLLM, GatedLLM, ScriptedLLM};
use std::sync::Arc;

fn topic(id: &str) -> Topic {
    TopicCatalog::builtin()
        .expect("catalog")
        .get(id)
        .expect("topic")
        .clone()
}

fn driver_with(id: &str, llm: Option<Arc<dyn autoagents_llm::LLMProvider>>) -> DialogueDriver {
    let topic = topic(id);
    let settings = DriverSettings::for_topic(&topic, &ProfessorBotConfig::default());
    DialogueDriver::new(
        topic,
        settings,
        llm.map(|llm| Generator::new(llm, "test-model")),
    )
}

fn approval(text: &str) -> String {
    format!("{DEFAULT_TERMINATION_MARKER} {text}")
}

#[test]
fn new_session_opens_with_identifier_question() {
    let driver = driver_with("mind-1", None);
    let session_id = driver.start_session();
    let session = driver.session(session_id).expect("session");
    assert_eq!(session.state, DialogueState::Active);
    assert_eq!(session.messages.len(), 1);
    assert_eq!(session.messages[0].role, Role::Assistant);
    assert!(session.messages[0].content.contains("Penn ID"));
    assert_eq!(session.user_turn_count, 0);
}

#[tokio::test]
async fn turn_count_tracks_submissions() {
    let llm = Arc::new(ScriptedLLM::new(["q1", "q2", "q3"]));
    let driver = driver_with("brain-1", Some(llm.clone()));
    let session_id = driver.start_session();
    for (idx, input) in ["12345678", "Because of sunk costs", "I would stay"]
        .into_iter()
        .enumerate()
    {
        let outcome = driver.submit(session_id, input).await.expect("submit");
        assert_eq!(outcome.user_turn_count, idx as u32 + 1);
        assert_eq!(outcome.state, DialogueState::Active);
    }
    let session = driver.session(session_id).expect("session");
    assert_eq!(session.user_turn_count, 3);
    assert_eq!(session.messages.len(), 7);
}

#[tokio::test]
async fn outbound_prompt_has_k_plus_three_segments() {
    let llm = Arc::new(ScriptedLLM::new(["What was your choice?"]));
    let driver = driver_with("behavior-2", Some(llm.clone()));
    let session_id = driver.start_session();
    driver.submit(session_id, "12345678").await.expect("submit");

    let call = llm.last_call().expect("call");
    // opening + user message
    assert_eq!(call.len(), 2 + 3);
    let topic = driver.topic();
    assert_eq!(call[0].role, ChatRole::System);
    assert_eq!(call[0].content, topic.persona);
    assert_eq!(call[1].content, topic.procedure);
    assert_eq!(
        call[2].content,
        "User turn count so far: 1. If >= 15, you must end now."
    );
    assert_eq!(call[3].role, ChatRole::Assistant);
    assert_eq!(call[3].content, topic.opening);
    assert_eq!(call[4].role, ChatRole::User);
    assert_eq!(call[4].content, "12345678");
}

#[tokio::test]
async fn connectivity_failure_appends_warning_and_stays_active() {
    let driver = driver_with("mind-2", Some(Arc::new(FailingLLM::new("connection reset"))));
    let session_id = driver.start_session();
    let outcome = driver.submit(session_id, "12345678").await.expect("submit");

    assert_eq!(outcome.reply, None);
    assert_eq!(outcome.state, DialogueState::Active);
    assert_eq!(outcome.user_turn_count, 1);
    let warning = outcome.warning.expect("warning");
    assert!(warning.starts_with("⚠️"));
    assert!(warning.contains("connection reset"));

    let session = driver.session(session_id).expect("session");
    let last = session.messages.last().expect("message");
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(last.content, warning);
    assert!(matches!(
        driver.transcript(session_id),
        Err(CoreError::TranscriptUnavailable(_))
    ));
}

#[tokio::test]
async fn missing_credential_warns_every_turn() {
    let driver = driver_with("rationality-2", None);
    let session_id = driver.start_session();
    for turn in 1..=2 {
        let outcome = driver.submit(session_id, "hello").await.expect("submit");
        assert_eq!(
            outcome.warning.as_deref(),
            Some("⚠️ Missing OPENAI_API_KEY. Add it to the secrets file or environment variables.")
        );
        assert_eq!(outcome.user_turn_count, turn);
        assert_eq!(outcome.state, DialogueState::Active);
    }
}

#[tokio::test]
async fn user_can_retry_after_failure() {
    let llm = Arc::new(
        ScriptedLLM::default()
            .then_fail("timeout")
            .then_reply("Thanks, what decision?"),
    );
    let driver = driver_with("mind-1", Some(llm));
    let session_id = driver.start_session();
    let first = driver.submit(session_id, "12345678").await.expect("submit");
    assert!(first.warning.is_some());
    let second = driver.submit(session_id, "12345678").await.expect("submit");
    assert_eq!(second.reply.as_deref(), Some("Thanks, what decision?"));
    assert_eq!(second.user_turn_count, 2);
}

#[tokio::test]
async fn marker_reply_completes_and_unlocks_transcript() {
    let llm = Arc::new(ScriptedLLM::new([
        "Tell me about the choice.".to_string(),
        approval("The conversation is concluded."),
    ]));
    let driver = driver_with("behavior-1", Some(llm));
    let session_id = driver.start_session();

    driver.submit(session_id, "12345678").await.expect("submit");
    assert!(matches!(
        driver.transcript(session_id),
        Err(CoreError::TranscriptUnavailable(_))
    ));

    let outcome = driver.submit(session_id, "I chose A").await.expect("submit");
    assert_eq!(outcome.state, DialogueState::Completed);
    assert!(!outcome.forced_close);

    let first = driver.transcript(session_id).expect("transcript");
    let second = driver.transcript(session_id).expect("transcript");
    assert_eq!(first.contents, second.contents);
    assert!(first.file_name.starts_with("transcript_"));
    assert!(first.file_name.ends_with(".txt"));
    assert!(first.contents.starts_with("ASSISTANT:\n"));
    assert_eq!(first.contents.matches(transcript::BLOCK_SEPARATOR).count(), 4);

    match driver.submit(session_id, "one more thing").await {
        Err(CoreError::SessionCompleted(id)) => assert_eq!(id, session_id),
        other => panic!("unexpected result: {other:?}"),
    }
    let session = driver.session(session_id).expect("session");
    assert_eq!(session.state, DialogueState::Completed);
    assert_eq!(session.user_turn_count, 2);
}

#[tokio::test]
async fn partial_marker_does_not_complete() {
    let llm = Arc::new(ScriptedLLM::new([
        "You are approved to download transcript soon, but not yet.",
    ]));
    let driver = driver_with("brain-2", Some(llm));
    let session_id = driver.start_session();
    let outcome = driver.submit(session_id, "12345678").await.expect("submit");
    assert_eq!(outcome.state, DialogueState::Active);
}

#[tokio::test]
async fn blank_input_is_rejected_without_counting() {
    let llm = Arc::new(ScriptedLLM::new(["unused"]));
    let driver = driver_with("mind-1", Some(llm.clone()));
    let session_id = driver.start_session();
    assert!(matches!(
        driver.submit(session_id, "   ").await,
        Err(CoreError::EmptyInput)
    ));
    assert_eq!(driver.session(session_id).expect("session").user_turn_count, 0);
    assert!(llm.calls().is_empty());
}

#[tokio::test]
async fn concurrent_submission_is_rejected_while_in_flight() {
    let llm = Arc::new(GatedLLM::new("Next question"));
    let driver = driver_with("mind-1", Some(llm.clone()));
    let session_id = driver.start_session();

    let pending = {
        let driver = driver.clone();
        tokio::spawn(async move { driver.submit(session_id, "first").await })
    };
    llm.wait_for_call().await;

    match driver.submit(session_id, "second").await {
        Err(CoreError::TurnInFlight(id)) => assert_eq!(id, session_id),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(driver.session(session_id).expect("session").in_flight);

    llm.release();
    let outcome = pending.await.expect("join").expect("submit");
    assert_eq!(outcome.reply.as_deref(), Some("Next question"));
    assert_eq!(outcome.user_turn_count, 1);
    assert!(!driver.session(session_id).expect("session").in_flight);
}

#[tokio::test]
async fn hard_turn_limit_forces_completion() {
    let topic = topic("mind-1");
    let mut config = ProfessorBotConfig::default();
    config.dialogue.hard_turn_limit = Some(2);
    let settings = DriverSettings::for_topic(&topic, &config);
    let llm = Arc::new(ScriptedLLM::new(["q1", "q2"]));
    let driver = DialogueDriver::new(topic, settings, Some(Generator::new(llm, "m")));
    let session_id = driver.start_session();

    let first = driver.submit(session_id, "a").await.expect("submit");
    assert_eq!(first.state, DialogueState::Active);
    let second = driver.submit(session_id, "b").await.expect("submit");
    assert_eq!(second.state, DialogueState::Completed);
    assert!(second.forced_close);
    assert_eq!(second.reply.as_deref(), Some("q2"));

    let session = driver.session(session_id).expect("session");
    let closing = session.messages.last().expect("closing");
    assert_eq!(closing.role, Role::Assistant);
    assert!(closing.content.starts_with(DEFAULT_TERMINATION_MARKER));
    assert!(driver.transcript(session_id).is_ok());
}

#[tokio::test]
async fn advisory_limit_alone_never_forces_completion() {
    let topic = topic("mind-1");
    let mut config = ProfessorBotConfig::default();
    config.dialogue.max_turns = 1;
    let settings = DriverSettings::for_topic(&topic, &config);
    let llm = Arc::new(ScriptedLLM::new(["q1", "q2", "q3"]));
    let driver = DialogueDriver::new(topic, settings, Some(Generator::new(llm, "m")));
    let session_id = driver.start_session();
    for _ in 0..3 {
        let outcome = driver.submit(session_id, "answer").await.expect("submit");
        assert_eq!(outcome.state, DialogueState::Active);
    }
}

#[tokio::test]
async fn custom_marker_is_honoured() {
    let mut topic = topic("brain-1");
    topic.marker = Some("[[SESSION_COMPLETE]]".to_string());
    let settings = DriverSettings::for_topic(&topic, &ProfessorBotConfig::default());
    let llm = Arc::new(ScriptedLLM::new([
        format!("{DEFAULT_TERMINATION_MARKER} wrong marker"),
        "[[SESSION_COMPLETE]] done".to_string(),
    ]));
    let driver = DialogueDriver::new(topic, settings, Some(Generator::new(llm, "m")));
    let session_id = driver.start_session();
    assert_eq!(
        driver.submit(session_id, "a").await.expect("submit").state,
        DialogueState::Active
    );
    assert_eq!(
        driver.submit(session_id, "b").await.expect("submit").state,
        DialogueState::Completed
    );
}

#[tokio::test]
async fn staged_topic_appends_stage_instruction_and_advances() {
    let topic = topic("reflection");
    let mut config = ProfessorBotConfig::default();
    config.dialogue.concepts = vec!["anchoring".to_string(), "loss aversion".to_string()];
    let settings = DriverSettings::for_topic(&topic, &config);
    let llm = Arc::new(ScriptedLLM::new([
        "Define both concepts.",
        "Good. Now analyse with concept 1.",
        "Now the second concept.",
    ]));
    let driver = DialogueDriver::new(topic, settings, Some(Generator::new(llm.clone(), "m")));
    let session_id = driver.start_session();

    driver
        .submit(session_id, "My options were rent or buy; I chose rent.")
        .await
        .expect("submit");
    let call = llm.last_call().expect("call");
    // opening + user message + trailing stage instruction
    assert_eq!(call.len(), 2 + 4);
    assert_eq!(
        call.last().map(|message| message.content.as_str()),
        Some(Stage::DecisionDefinition.instruction())
    );
    assert!(call[0].content.contains("Concept 2: loss aversion"));
    assert_eq!(
        driver.session(session_id).expect("session").stage,
        Some(Stage::ConceptBinding)
    );

    driver.submit(session_id, "Anchoring is ...").await.expect("submit");
    assert_eq!(
        driver.session(session_id).expect("session").stage,
        Some(Stage::SeparateAnalyses)
    );

    driver.submit(session_id, "Here is my analysis").await.expect("submit");
    assert_eq!(
        driver.session(session_id).expect("session").stage,
        Some(Stage::Integration)
    );
}

#[tokio::test]
async fn failed_turn_leaves_stage_unchanged() {
    let failing: Arc<dyn autoagents_llm::LLMProvider> =
        Arc::new(FailingLLM::new("connection reset"));
    for driver in [driver_with("reflection", None), driver_with("reflection", Some(failing))] {
        let session_id = driver.start_session();
        let outcome = driver
            .submit(session_id, "My options were rent or buy; I chose rent.")
            .await
            .expect("submit");
        assert!(outcome.warning.is_some());
        let session = driver.session(session_id).expect("session");
        assert_eq!(session.user_turn_count, 1);
        assert_eq!(session.stage, Some(Stage::DecisionDefinition));
    }
}

#[tokio::test]
async fn summary_does_not_extend_conversation() {
    let llm = Arc::new(ScriptedLLM::new(["Which decision?", "## Decision\nRent"]));
    let driver = driver_with("reflection", Some(llm.clone()));
    let session_id = driver.start_session();
    driver.submit(session_id, "I chose to rent").await.expect("submit");

    let summary = driver.summarize(session_id).await.expect("summary");
    assert_eq!(summary, "## Decision\nRent");
    let session = driver.session(session_id).expect("session");
    assert_eq!(session.messages.len(), 3);
    let call = llm.last_call().expect("call");
    assert_eq!(
        call.last().map(|message| message.content.as_str()),
        driver.topic().summary_instruction.as_deref()
    );
}

#[tokio::test]
async fn summary_requires_topic_support() {
    let driver = driver_with("mind-1", Some(Arc::new(ScriptedLLM::default())));
    let session_id = driver.start_session();
    match driver.summarize(session_id).await {
        Err(CoreError::SummaryUnavailable(topic)) => assert_eq!(topic, "mind-1"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn reset_replaces_session() {
    let llm = Arc::new(ScriptedLLM::new([approval("bye")]));
    let driver = driver_with("mind-1", Some(llm));
    let old_id = driver.start_session();
    driver.submit(old_id, "12345678").await.expect("submit");

    let new_id = driver.reset(old_id).expect("reset");
    assert_ne!(new_id, old_id);
    assert!(matches!(
        driver.session(old_id),
        Err(CoreError::UnknownSession(_))
    ));
    let session = driver.session(new_id).expect("session");
    assert_eq!(session.state, DialogueState::Active);
    assert_eq!(session.messages.len(), 1);
    assert_eq!(driver.list_sessions().len(), 1);
    assert!(matches!(driver.reset(old_id), Err(CoreError::UnknownSession(_))));
}
