//! Configuration schema for ProfessorBot.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Literal phrase the generator is instructed to open its final reply with.
pub const DEFAULT_TERMINATION_MARKER: &str =
    "You are approved to download transcript and submit to canvas.";

/// Root config for a ProfessorBot deployment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProfessorBotConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub dialogue: DialogueConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub transcripts: TranscriptConfig,
    #[serde(default)]
    pub topics: TopicsConfig,
}

impl ProfessorBotConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> ProfessorBotConfigBuilder {
        ProfessorBotConfigBuilder::new()
    }
}

/// Builder for assembling a `ProfessorBotConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct ProfessorBotConfigBuilder {
    config: ProfessorBotConfig,
}

impl ProfessorBotConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: ProfessorBotConfig::default(),
        }
    }

    /// Replace the model configuration.
    pub fn model(mut self, model: ModelConfig) -> Self {
        self.config.model = model;
        self
    }

    /// Replace the dialogue configuration.
    pub fn dialogue(mut self, dialogue: DialogueConfig) -> Self {
        self.config.dialogue = dialogue;
        self
    }

    /// Replace the credential lookup configuration.
    pub fn credentials(mut self, credentials: CredentialsConfig) -> Self {
        self.config.credentials = credentials;
        self
    }

    /// Replace the transcript export configuration.
    pub fn transcripts(mut self, transcripts: TranscriptConfig) -> Self {
        self.config.transcripts = transcripts;
        self
    }

    /// Replace the topic discovery configuration.
    pub fn topics(mut self, topics: TopicsConfig) -> Self {
        self.config.topics = topics;
        self
    }

    /// Finalize and return the built `ProfessorBotConfig`.
    pub fn build(self) -> ProfessorBotConfig {
        self.config
    }
}

/// Hosted model used as the dialogue generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_provider")]
    pub provider: String,
    #[serde(default = "default_model_name")]
    pub name: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_model_provider(),
            name: default_model_name(),
            temperature: default_temperature(),
        }
    }
}

fn default_model_provider() -> String {
    "openai".to_string()
}

fn default_model_name() -> String {
    "gpt-4.1".to_string()
}

fn default_temperature() -> f32 {
    0.4
}

/// Dialogue defaults shared by every topic unless the topic overrides them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueConfig {
    /// Topic id opened when none is given on the command line.
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Advisory turn ceiling announced to the generator every turn.
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
    /// Optional enforced ceiling after which the driver closes the dialogue itself.
    #[serde(default)]
    pub hard_turn_limit: Option<u32>,
    #[serde(default = "default_marker")]
    pub marker: String,
    /// Weekly concepts substituted into `{concept_N}` persona placeholders.
    #[serde(default)]
    pub concepts: Vec<String>,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            topic: default_topic(),
            max_turns: default_max_turns(),
            hard_turn_limit: None,
            marker: default_marker(),
            concepts: Vec::new(),
        }
    }
}

fn default_topic() -> String {
    "mind-1".to_string()
}

fn default_max_turns() -> u32 {
    15
}

fn default_marker() -> String {
    DEFAULT_TERMINATION_MARKER.to_string()
}

/// Where the API credential is looked up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Key name used both in the secrets file and the process environment.
    #[serde(default = "default_env_var")]
    pub env_var: String,
    /// Optional JSON5 secrets file consulted before the environment.
    #[serde(default)]
    pub secrets_path: Option<PathBuf>,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            env_var: default_env_var(),
            secrets_path: None,
        }
    }
}

fn default_env_var() -> String {
    "OPENAI_API_KEY".to_string()
}

/// Transcript export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    #[serde(default = "default_transcript_dir")]
    pub dir: PathBuf,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            dir: default_transcript_dir(),
        }
    }
}

fn default_transcript_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Extra topic directories scanned in addition to the built-in catalogue.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TopicsConfig {
    #[serde(default)]
    pub paths: Vec<PathBuf>,
}
