//! Layered configuration loader.
//!
//! Layers are discovered in precedence order (user, project, cwd, repo,
//! runtime). Each one is checked against the schema before merging so that
//! errors name the file they came from; the merged value is then decoded and
//! validated as a whole.

mod merge;
mod schema;
mod stack;


use crate::error::{parse_json5, read_file};
use crate::{ConfigError, ProfessorBotConfig};
use directories::UserDirs;
use log::{debug, info};
use serde_json::Value;
use stack::LayerStack;
use std::io;
use std::path::{Path, PathBuf};

/// Config filename looked up in every local layer.
const DEFAULT_CONFIG_FILE: &str = "professorbot.json5";
/// Directory holding the user and repo layers.
const DEFAULT_CONFIG_DIR: &str = ".professorbot";
const DEFAULT_PROJECT_ROOT_MARKERS: &[&str] = &[".git"];

/// Effective config plus the layers that produced it.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub config: ProfessorBotConfig,
    /// Loaded layers, lowest precedence first.
    pub layers: Vec<ConfigLayer>,
}

/// Where a config layer was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// `~/.professorbot/professorbot.json5`.
    User,
    /// `professorbot.json5` at the project root.
    Project,
    /// `professorbot.json5` in the working directory.
    Cwd,
    /// `.professorbot/professorbot.json5` under the project root.
    Repo,
    /// Paths passed on the command line; highest precedence.
    Runtime,
}

impl ConfigLayerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigLayerSource::User => "user",
            ConfigLayerSource::Project => "project",
            ConfigLayerSource::Cwd => "cwd",
            ConfigLayerSource::Repo => "repo",
            ConfigLayerSource::Runtime => "runtime",
        }
    }
}

/// One loaded layer.
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    pub source: ConfigLayerSource,
    pub path: Option<PathBuf>,
}

/// Where to look for layers.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Directory the cwd and project layers are resolved from.
    pub cwd: PathBuf,
    /// User layer; `None` skips it.
    pub user_config_path: Option<PathBuf>,
    /// Required layers applied last, in order.
    pub runtime_paths: Vec<PathBuf>,
    /// Entries whose presence marks a directory as the project root.
    pub project_root_markers: Vec<String>,
}

impl LayeredConfigOptions {
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            user_config_path: default_user_config_path(),
            runtime_paths: Vec::new(),
            project_root_markers: DEFAULT_PROJECT_ROOT_MARKERS
                .iter()
                .map(|marker| marker.to_string())
                .collect(),
        }
    }

    /// Add a runtime layer applied after every discovered one.
    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Project, cwd and repo candidates in precedence order.
    fn local_candidates(&self, cwd: &Path) -> Vec<(ConfigLayerSource, PathBuf)> {
        let project_root = cwd.ancestors().find(|dir| {
            self.project_root_markers
                .iter()
                .any(|marker| dir.join(marker).exists())
        });
        let Some(root) = project_root else {
            debug!("no project root above {}", cwd.display());
            return vec![(ConfigLayerSource::Cwd, cwd.join(DEFAULT_CONFIG_FILE))];
        };
        debug!("project root resolved: {}", root.display());
        vec![
            (ConfigLayerSource::Project, root.join(DEFAULT_CONFIG_FILE)),
            (ConfigLayerSource::Cwd, cwd.join(DEFAULT_CONFIG_FILE)),
            (
                ConfigLayerSource::Repo,
                root.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE),
            ),
        ]
    }
}

impl ProfessorBotConfig {
    /// Load one config file without layering.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("loading config from path: {}", path.display());
        let origin = path.display().to_string();
        let value: Value = parse_json5(&read_file(path)?, &origin)?;
        config_from_value(value, &origin)
    }

    /// Load a config from JSON5 text without layering.
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        let value: Value = parse_json5(contents, "config")?;
        config_from_value(value, "config")
    }

    /// Load the layer stack from the default locations.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        info!(
            "loading layered config with defaults (cwd={})",
            cwd.as_ref().display()
        );
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load the layer stack described by `options`.
    ///
    /// Precedence (low -> high): user, project, cwd, repo, runtime. Missing
    /// discovered layers are skipped; a missing runtime layer is an error.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let cwd = resolve_cwd(&options.cwd)?;
        let mut stack = LayerStack::default();

        if let Some(path) = options.user_config_path.as_deref() {
            stack.push_if_present(ConfigLayerSource::User, path)?;
        }
        for (source, path) in options.local_candidates(&cwd) {
            stack.push_if_present(source, &path)?;
        }
        for path in &options.runtime_paths {
            stack.push(ConfigLayerSource::Runtime, path)?;
        }

        let (merged, layers) = stack.finish();
        let config = config_from_value(merged, "effective")?;
        info!("layered config loaded (layers={})", layers.len());
        Ok(LayeredConfig { config, layers })
    }

    /// Validate configuration invariants that cannot be expressed in serde.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dialogue.max_turns == 0 {
            return Err(ConfigError::Invalid(
                "dialogue.max_turns must be at least 1".to_string(),
            ));
        }
        if self.dialogue.hard_turn_limit == Some(0) {
            return Err(ConfigError::Invalid(
                "dialogue.hard_turn_limit must be at least 1".to_string(),
            ));
        }
        if self.dialogue.marker.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "dialogue.marker must not be empty".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigError::Invalid(
                "model.temperature must be between 0 and 2".to_string(),
            ));
        }
        if self.credentials.env_var.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "credentials.env_var must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn config_from_value(value: Value, origin: &str) -> Result<ProfessorBotConfig, ConfigError> {
    schema::validate_layer_schema(&value, origin)?;
    let config: ProfessorBotConfig =
        serde_json::from_value(value).map_err(|source| ConfigError::Decode {
            origin: origin.to_string(),
            source,
        })?;
    config.validate()?;
    Ok(config)
}

/// Canonical cwd; a directory that does not exist yet is used as given.
fn resolve_cwd(cwd: &Path) -> Result<PathBuf, ConfigError> {
    match cwd.canonicalize() {
        Ok(path) => Ok(path),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(cwd.to_path_buf()),
        Err(err) => Err(ConfigError::read(cwd, err)),
    }
}

fn default_user_config_path() -> Option<PathBuf> {
    UserDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(DEFAULT_CONFIG_DIR)
            .join(DEFAULT_CONFIG_FILE)
    })
}
