//! Driver wiring from a loaded config.

use anyhow::Context;
use log::{info, warn};
use professorbot_rs_config::{ProfessorBotConfig, TopicCatalog};
use professorbot_rs_core::{DialogueDriver, DriverSettings, Generator, resolve_api_key};
use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Build a driver for the configured topic.
///
/// The model name comes from `model_override` when set, then the topic, then
/// the config layers. A missing credential or a provider that fails to build
/// is not fatal: the driver runs without a generator and every turn yields a
/// warning instead.
pub fn build_driver(
    config: &ProfessorBotConfig,
    cwd: &Path,
    model_override: Option<&str>,
) -> anyhow::Result<DialogueDriver> {
    let catalog = TopicCatalog::load(&config.topics, cwd).context("failed to load topics")?;
    let topic = catalog
        .get(&config.dialogue.topic)
        .with_context(|| format!("available topics: {}", catalog.ids().join(", ")))?
        .clone();
    let settings = DriverSettings::for_topic(&topic, config);
    let mut model = topic.model_config(&config.model);
    if let Some(name) = model_override {
        model.name = name.to_string();
    }

    let generator = match resolve_api_key(&config.credentials, cwd) {
        Some(api_key) => match Generator::openai(&model, api_key) {
            Ok(generator) => Some(generator),
            Err(err) => {
                warn!("failed to build generator (err={})", err);
                None
            }
        },
        None => {
            warn!(
                "no credential found; replies will be warnings (key={})",
                config.credentials.env_var
            );
            None
        }
    };

    info!(
        "driver configured (topic={}, model={}, generator_set={})",
        topic.id,
        model.name,
        generator.is_some()
    );
    Ok(DialogueDriver::new(topic, settings, generator))
}

/// Transcript directory resolved against `cwd`.
pub fn transcript_dir(config: &ProfessorBotConfig, cwd: &Path) -> PathBuf {
    cwd.join(&config.transcripts.dir)
}

/// One `id  title` line per topic, ordered by id.
pub fn topic_listing(catalog: &TopicCatalog) -> String {
    let width = catalog
        .iter()
        .map(|topic| topic.id.len())
        .max()
        .unwrap_or(0);
    catalog.iter().fold(String::new(), |mut out, topic| {
        let _ = writeln!(out, "{:<width$}  {}", topic.id, topic.title);
        out
    })
}
