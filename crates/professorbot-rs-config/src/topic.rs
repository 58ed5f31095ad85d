//! Topic records and the catalogue that resolves them.
//!
//! Every dialogue page is described by a [`Topic`]: persona and procedure
//! instructions, the opening assistant message, and optional overrides for
//! the termination marker and turn ceiling. Built-in topics are embedded at
//! compile time; additional topics are discovered from configured directories.

use crate::error::{parse_json5, read_file};
use crate::{ConfigError, DialogueConfig, ModelConfig, TopicsConfig};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File extension used for topic definitions on disk.
const TOPIC_EXTENSION: &str = "json5";

const BUILTIN_TOPICS: [(&str, &str); 9] = [
    ("behavior-1", include_str!("../topics/behavior-1.json5")),
    ("behavior-2", include_str!("../topics/behavior-2.json5")),
    ("behavior-3", include_str!("../topics/behavior-3.json5")),
    ("brain-1", include_str!("../topics/brain-1.json5")),
    ("brain-2", include_str!("../topics/brain-2.json5")),
    ("mind-1", include_str!("../topics/mind-1.json5")),
    ("mind-2", include_str!("../topics/mind-2.json5")),
    ("rationality-2", include_str!("../topics/rationality-2.json5")),
    ("reflection", include_str!("../topics/reflection.json5")),
];

/// Data that parameterises one scripted dialogue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Topic {
    pub id: String,
    pub title: String,
    /// Markdown shown above the conversation.
    #[serde(default)]
    pub welcome: String,
    /// Persona and goal instruction; may contain `{concept_N}` placeholders.
    pub persona: String,
    /// Step-by-step procedure instruction.
    pub procedure: String,
    /// Fixed assistant message that opens every session.
    pub opening: String,
    #[serde(default)]
    pub marker: Option<String>,
    #[serde(default)]
    pub max_turns: Option<u32>,
    /// Model name that replaces the configured one for this topic.
    #[serde(default)]
    pub model: Option<String>,
    /// Whether the keyword stage tracker contributes a trailing directive.
    #[serde(default)]
    pub staged: bool,
    #[serde(default)]
    pub summary_instruction: Option<String>,
}

impl Topic {
    /// Parse a topic from JSON5 contents.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let topic: Topic = parse_json5(contents, "topic")?;
        topic.validate()?;
        Ok(topic)
    }

    /// Load a topic from a JSON5 file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("loading topic from path: {}", path.display());
        let contents = read_file(path)?;
        let topic: Topic = parse_json5(&contents, &path.display().to_string())?;
        topic.validate()?;
        Ok(topic)
    }

    /// Termination marker for this topic, falling back to the dialogue default.
    pub fn marker_or<'a>(&'a self, dialogue: &'a DialogueConfig) -> &'a str {
        self.marker.as_deref().unwrap_or(&dialogue.marker)
    }

    /// Advisory turn ceiling for this topic, falling back to the dialogue default.
    pub fn max_turns_or(&self, dialogue: &DialogueConfig) -> u32 {
        self.max_turns.unwrap_or(dialogue.max_turns)
    }

    /// Model settings for this topic; only the name can be overridden.
    pub fn model_config(&self, model: &ModelConfig) -> ModelConfig {
        let mut model = model.clone();
        if let Some(name) = &self.model {
            model.name.clone_from(name);
        }
        model
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("id", &self.id),
            ("persona", &self.persona),
            ("procedure", &self.procedure),
            ("opening", &self.opening),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidField {
                    path: format!("topic({}).{field}", self.id),
                    message: "must not be empty".to_string(),
                });
            }
        }
        if let Some(marker) = &self.marker
            && marker.trim().is_empty()
        {
            return Err(ConfigError::InvalidField {
                path: format!("topic({}).marker", self.id),
                message: "must not be empty".to_string(),
            });
        }
        if let Some(model) = &self.model
            && model.trim().is_empty()
        {
            return Err(ConfigError::InvalidField {
                path: format!("topic({}).model", self.id),
                message: "must not be empty".to_string(),
            });
        }
        if self.max_turns == Some(0) {
            return Err(ConfigError::InvalidField {
                path: format!("topic({}).max_turns", self.id),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Topics keyed by id, built-ins first, configured directories layered on top.
#[derive(Debug, Clone, Default)]
pub struct TopicCatalog {
    topics: BTreeMap<String, Topic>,
}

impl TopicCatalog {
    /// Catalogue containing only the embedded topics.
    pub fn builtin() -> Result<Self, ConfigError> {
        let mut topics = BTreeMap::new();
        for (id, contents) in BUILTIN_TOPICS {
            let topic = Topic::parse(contents)?;
            if topic.id != id {
                return Err(ConfigError::Invalid(format!(
                    "built-in topic {id} declares id {}",
                    topic.id
                )));
            }
            topics.insert(topic.id.clone(), topic);
        }
        Ok(Self { topics })
    }

    /// Built-in topics plus every `*.json5` file in the configured directories.
    ///
    /// Relative directories resolve against `cwd`. A directory topic with the
    /// same id as a built-in replaces it.
    pub fn load(config: &TopicsConfig, cwd: &Path) -> Result<Self, ConfigError> {
        let mut catalog = Self::builtin()?;
        for root in &config.paths {
            let root = if root.is_absolute() {
                root.clone()
            } else {
                cwd.join(root)
            };
            if !root.is_dir() {
                debug!("skipping missing topic dir: {}", root.display());
                continue;
            }
            for path in discover_topic_files(&root)? {
                let topic = Topic::load_from_path(&path)?;
                debug!(
                    "loaded topic (id={}, path={})",
                    topic.id,
                    path.display()
                );
                catalog.insert(topic);
            }
        }
        info!("topic catalog loaded (count={})", catalog.topics.len());
        Ok(catalog)
    }

    /// Add or replace a topic.
    pub fn insert(&mut self, topic: Topic) {
        self.topics.insert(topic.id.clone(), topic);
    }

    /// Look up a topic by id.
    pub fn get(&self, id: &str) -> Result<&Topic, ConfigError> {
        self.topics
            .get(id)
            .ok_or_else(|| ConfigError::UnknownTopic(id.to_string()))
    }

    /// Topic ids in sorted order.
    pub fn ids(&self) -> Vec<String> {
        self.topics.keys().cloned().collect()
    }

    /// Iterate topics in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Topic> {
        self.topics.values()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

fn discover_topic_files(root: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let mut files = Vec::new();
    let entries = fs::read_dir(root).map_err(|err| ConfigError::read(root, err))?;
    for entry in entries {
        let path = entry.map_err(|err| ConfigError::read(root, err))?.path();
        if path.is_file()
            && path.extension().and_then(|ext| ext.to_str()) == Some(TOPIC_EXTENSION)
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::{Topic, TopicCatalog};
    use crate::{
        ConfigError, DEFAULT_TERMINATION_MARKER, DialogueConfig, ModelConfig, TopicsConfig,
    };
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn builtin_catalog_has_every_page() {
        let catalog = TopicCatalog::builtin().expect("catalog");
        assert_eq!(
            catalog.ids(),
            vec![
                "behavior-1",
                "behavior-2",
                "behavior-3",
                "brain-1",
                "brain-2",
                "mind-1",
                "mind-2",
                "rationality-2",
                "reflection",
            ]
        );
    }

    #[test]
    fn professorbot_topics_ask_for_identifier_and_name_the_marker() {
        let catalog = TopicCatalog::builtin().expect("catalog");
        for topic in catalog.iter().filter(|topic| !topic.staged) {
            assert!(topic.opening.contains("Penn ID"), "{}", topic.id);
            assert!(
                topic.procedure.contains(DEFAULT_TERMINATION_MARKER),
                "{}",
                topic.id
            );
            assert_eq!(topic.summary_instruction, None);
        }
    }

    #[test]
    fn page_titles_match_their_welcome_text() {
        let catalog = TopicCatalog::builtin().expect("catalog");
        for topic in catalog.iter().filter(|topic| !topic.staged) {
            let page = topic
                .title
                .strip_prefix("ProfessorBot - ")
                .expect("page title");
            assert!(
                topic.welcome.contains(&format!("**ProfessorBot – {page}**")),
                "{}",
                topic.id
            );
        }
        let rationality = catalog.get("rationality-2").expect("rationality-2");
        assert_eq!(rationality.title, "ProfessorBot - Rationality II");
        assert!(catalog.get("rationality-1").is_err());
    }

    #[test]
    fn reflection_topic_is_staged_with_summary() {
        let catalog = TopicCatalog::builtin().expect("catalog");
        let topic = catalog.get("reflection").expect("reflection");
        assert!(topic.staged);
        assert!(topic.persona.contains("{concept_1}"));
        assert!(topic.summary_instruction.is_some());
        assert_eq!(topic.max_turns_or(&DialogueConfig::default()), 30);
        assert_eq!(
            topic.model_config(&ModelConfig::default()).name,
            "gpt-4o-mini"
        );
    }

    #[test]
    fn topic_overrides_fall_back_to_dialogue_defaults() {
        let catalog = TopicCatalog::builtin().expect("catalog");
        let topic = catalog.get("mind-1").expect("mind-1");
        let dialogue = DialogueConfig::default();
        assert_eq!(topic.marker_or(&dialogue), DEFAULT_TERMINATION_MARKER);
        assert_eq!(topic.max_turns_or(&dialogue), 15);
        let model = ModelConfig {
            temperature: 0.2,
            ..ModelConfig::default()
        };
        let resolved = topic.model_config(&model);
        assert_eq!(resolved.name, "gpt-4.1");
        assert_eq!(resolved.temperature, 0.2);
    }

    #[test]
    fn unknown_topic_is_an_error() {
        let catalog = TopicCatalog::builtin().expect("catalog");
        match catalog.get("astrology") {
            Err(ConfigError::UnknownTopic(id)) => assert_eq!(id, "astrology"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_procedure() {
        let err = Topic::parse(
            r#"{ id: "x", title: "X", persona: "p", procedure: " ", opening: "hi" }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("topic(x).procedure"));
    }

    #[test]
    fn directory_topics_extend_and_replace_builtins() {
        let root = tempdir().expect("root");
        let dir = root.path().join("topics");
        fs::create_dir_all(&dir).expect("dir");
        fs::write(
            dir.join("sunk-cost.json5"),
            r#"{
                id: "sunk-cost",
                title: "Sunk cost",
                persona: "You are ProfessorBot.",
                procedure: "1. Ask for an example.",
                opening: "Hello!",
                marker: "[[DONE]]",
            }"#,
        )
        .expect("write");
        fs::write(
            dir.join("mind-1.json5"),
            r#"{ id: "mind-1", title: "Mind (local)", persona: "p", procedure: "q", opening: "o" }"#,
        )
        .expect("write");
        fs::write(dir.join("notes.txt"), "ignored").expect("write");

        let config = TopicsConfig {
            paths: vec!["topics".into(), "missing".into()],
        };
        let catalog = TopicCatalog::load(&config, root.path()).expect("catalog");
        assert_eq!(catalog.len(), 10);
        let topic = catalog.get("sunk-cost").expect("sunk-cost");
        assert_eq!(topic.marker_or(&DialogueConfig::default()), "[[DONE]]");
        assert_eq!(catalog.get("mind-1").expect("mind-1").title, "Mind (local)");
    }
}
