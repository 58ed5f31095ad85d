//! Command-line options and their config overrides.

use anyhow::Context;
use clap::Parser;
use log::{debug, info};
use professorbot_rs_config::{LayeredConfigOptions, ProfessorBotConfig};
use std::path::{Path, PathBuf};

/// Command-line options for the `professorbot` binary.
#[derive(Debug, Parser)]
#[command(name = "professorbot", version, about)]
pub struct Cli {
    /// Extra professorbot.json5 files layered on top of the discovered ones
    #[arg(long)]
    pub config: Vec<PathBuf>,
    /// Topic id to open (see --list-topics)
    #[arg(long)]
    pub topic: Option<String>,
    /// Model name for the hosted generator; wins over a topic's own model
    #[arg(long)]
    pub model: Option<String>,
    /// Weekly concept, repeat for each placeholder in order
    #[arg(long = "concept")]
    pub concepts: Vec<String>,
    /// Directory transcripts are saved into
    #[arg(long)]
    pub transcript_dir: Option<PathBuf>,
    /// Print the available topics and exit
    #[arg(long)]
    pub list_topics: bool,
}

impl Cli {
    /// Load the layered config for `cwd` and apply the command-line overrides.
    pub fn load_config(&self, cwd: &Path) -> anyhow::Result<ProfessorBotConfig> {
        self.load_config_with(LayeredConfigOptions::new(cwd))
    }

    /// Same as [`Cli::load_config`] with explicit layer locations.
    pub fn load_config_with(
        &self,
        options: LayeredConfigOptions,
    ) -> anyhow::Result<ProfessorBotConfig> {
        let cwd = options.cwd.clone();
        let options = self
            .config
            .iter()
            .fold(options, |options, path| options.with_runtime_path(cwd.join(path)));
        info!(
            "loading layered config (cwd={}, runtime_layers={})",
            cwd.display(),
            self.config.len()
        );
        let layered = ProfessorBotConfig::load_layered_with_options(options)
            .context("failed to load layered config")?;
        debug!("layered config loaded (layers={})", layered.layers.len());
        let mut config = layered.config;
        self.apply_overrides(&mut config);
        config
            .validate()
            .context("invalid command-line override")?;
        Ok(config)
    }

    /// Apply flags that take precedence over every config layer.
    pub fn apply_overrides(&self, config: &mut ProfessorBotConfig) {
        if let Some(topic) = self.topic.as_ref() {
            config.dialogue.topic.clone_from(topic);
        }
        if let Some(model) = self.model.as_ref() {
            config.model.name.clone_from(model);
        }
        if !self.concepts.is_empty() {
            config.dialogue.concepts = self.concepts.clone();
        }
        if let Some(dir) = self.transcript_dir.as_ref() {
            config.transcripts.dir.clone_from(dir);
        }
        debug!(
            "applied command-line overrides (topic_set={}, model_set={}, concepts={}, transcript_dir_set={})",
            self.topic.is_some(),
            self.model.is_some(),
            self.concepts.len(),
            self.transcript_dir.is_some()
        );
    }
}
