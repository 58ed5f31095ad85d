//! Ordered stack of config layers read from disk.

use super::{ConfigLayer, ConfigLayerSource, merge, schema};
use crate::ConfigError;
use crate::error::{parse_json5, read_file};
use log::debug;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Layers pushed lowest precedence first.
///
/// Each file is read at most once, even when two discovery rules resolve to
/// the same path (for example project root == cwd).
#[derive(Default)]
pub(super) struct LayerStack {
    layers: Vec<(ConfigLayer, Value)>,
    visited: HashSet<PathBuf>,
}

impl LayerStack {
    /// Push the layer at `path` when the file exists.
    pub(super) fn push_if_present(
        &mut self,
        source: ConfigLayerSource,
        path: &Path,
    ) -> Result<(), ConfigError> {
        if !path.is_file() {
            debug!(
                "no config layer (source={}, path={})",
                source.as_str(),
                path.display()
            );
            return Ok(());
        }
        self.push(source, path)
    }

    /// Push the layer at `path`; a missing file is an error.
    pub(super) fn push(&mut self, source: ConfigLayerSource, path: &Path) -> Result<(), ConfigError> {
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if !self.visited.insert(key) {
            debug!(
                "config layer already loaded (source={}, path={})",
                source.as_str(),
                path.display()
            );
            return Ok(());
        }
        let origin = format!("{}({})", source.as_str(), path.display());
        let value: Value = parse_json5(&read_file(path)?, &origin)?;
        schema::validate_layer_schema(&value, &origin)?;
        debug!("config layer loaded ({origin})");
        self.layers.push((
            ConfigLayer {
                source,
                path: Some(path.to_path_buf()),
            },
            value,
        ));
        Ok(())
    }

    /// Fold every layer into one value and return it with the layer metadata.
    pub(super) fn finish(self) -> (Value, Vec<ConfigLayer>) {
        let mut merged = Value::Object(Map::new());
        let mut meta = Vec::with_capacity(self.layers.len());
        for (layer, value) in self.layers {
            merge::merge_json_values(&mut merged, &value);
            meta.push(layer);
        }
        (merged, meta)
    }
}
