//! Schema validation helpers for ProfessorBot JSON5 configuration.

use crate::ConfigError;
use serde_json::{Map, Value};

const SUPPORTED_PROVIDERS: [&str; 1] = ["openai"];

/// Validate a single config layer against the schema.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    ensure_allowed_keys(
        map,
        &[
            "$schema",
            "model",
            "dialogue",
            "credentials",
            "transcripts",
            "topics",
        ],
        layer,
        "",
    )?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = map.get("model") {
        validate_model(value, layer, "model")?;
    }
    if let Some(value) = map.get("dialogue") {
        validate_dialogue(value, layer, "dialogue")?;
    }
    if let Some(value) = map.get("credentials") {
        validate_credentials(value, layer, "credentials")?;
    }
    if let Some(value) = map.get("transcripts") {
        let map = expect_object(value, layer, "transcripts")?;
        ensure_allowed_keys(map, &["dir"], layer, "transcripts")?;
        if let Some(value) = map.get("dir") {
            expect_string(value, layer, "transcripts.dir")?;
        }
    }
    if let Some(value) = map.get("topics") {
        let map = expect_object(value, layer, "topics")?;
        ensure_allowed_keys(map, &["paths"], layer, "topics")?;
        if let Some(value) = map.get("paths") {
            validate_string_array(value, layer, "topics.paths")?;
        }
    }

    Ok(())
}

/// Validate the "model" block.
fn validate_model(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["provider", "name", "temperature"], layer, path)?;
    if let Some(value) = map.get("provider") {
        let provider_path = join_path(path, "provider");
        expect_string(value, layer, &provider_path)?;
        if !value
            .as_str()
            .is_some_and(|provider| SUPPORTED_PROVIDERS.contains(&provider))
        {
            return Err(invalid_field(layer, &provider_path, "unsupported provider"));
        }
    }
    if let Some(value) = map.get("name") {
        expect_string(value, layer, &join_path(path, "name"))?;
    }
    if let Some(value) = map.get("temperature") {
        let temperature_path = join_path(path, "temperature");
        expect_f64(value, layer, &temperature_path)?;
        if !value
            .as_f64()
            .is_some_and(|temperature| (0.0..=2.0).contains(&temperature))
        {
            return Err(invalid_field(
                layer,
                &temperature_path,
                "expected number between 0 and 2",
            ));
        }
    }
    Ok(())
}

/// Validate the "dialogue" block.
fn validate_dialogue(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["topic", "max_turns", "hard_turn_limit", "marker", "concepts"],
        layer,
        path,
    )?;
    if let Some(value) = map.get("topic") {
        expect_string(value, layer, &join_path(path, "topic"))?;
    }
    if let Some(value) = map.get("max_turns") {
        expect_positive_u64(value, layer, &join_path(path, "max_turns"))?;
    }
    if let Some(value) = map.get("hard_turn_limit")
        && !value.is_null()
    {
        expect_positive_u64(value, layer, &join_path(path, "hard_turn_limit"))?;
    }
    if let Some(value) = map.get("marker") {
        let marker_path = join_path(path, "marker");
        expect_string(value, layer, &marker_path)?;
        if value.as_str().is_some_and(|marker| marker.trim().is_empty()) {
            return Err(invalid_field(layer, &marker_path, "must not be empty"));
        }
    }
    if let Some(value) = map.get("concepts") {
        validate_string_array(value, layer, &join_path(path, "concepts"))?;
    }
    Ok(())
}

/// Validate the "credentials" block.
fn validate_credentials(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["env_var", "secrets_path"], layer, path)?;
    if let Some(value) = map.get("env_var") {
        expect_string(value, layer, &join_path(path, "env_var"))?;
    }
    if let Some(value) = map.get("secrets_path")
        && !value.is_null()
    {
        expect_string(value, layer, &join_path(path, "secrets_path"))?;
    }
    Ok(())
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(layer, path, "expected object")),
    }
}

/// Expect a JSON string or return a typed error.
fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.as_str().is_some() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string"))
    }
}

/// Expect an integer of at least one.
fn expect_positive_u64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    match value.as_u64() {
        Some(count) if count >= 1 => Ok(()),
        Some(_) => Err(invalid_field(layer, path, "must be at least 1")),
        None => Err(invalid_field(layer, path, "expected integer")),
    }
}

/// Expect a JSON f64 or return a typed error.
fn expect_f64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_f64() || value.is_u64() || value.is_i64() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected number"))
    }
}

/// Validate that a value is an array of strings.
fn validate_string_array(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let Value::Array(arr) = value else {
        return Err(invalid_field(layer, path, "expected array"));
    };
    for (idx, entry) in arr.iter().enumerate() {
        if entry.as_str().is_none() {
            return Err(invalid_field(
                layer,
                &format!("{path}[{idx}]"),
                "expected string",
            ));
        }
    }
    Ok(())
}

/// Ensure an object contains only allowed keys.
fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    for key in map.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(invalid_field(layer, &join_path(path, key), "unknown key"));
        }
    }
    Ok(())
}

/// Join nested paths for better error messages.
fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Build a structured invalid-field error.
fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let normalized_path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{normalized_path}"),
        message: message.to_string(),
    }
}
