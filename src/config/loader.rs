//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::config::validation::{lint_config, validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse configuration text. TOML when `is_toml`, JSON otherwise.
pub fn parse_config(content: &str, is_toml: bool) -> Result<RouterConfig, ConfigError> {
    let config: RouterConfig = if is_toml {
        toml::from_str(content)?
    } else {
        serde_json::from_str(content)?
    };

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a JSON or `.toml` file.
pub fn load_config(path: &Path) -> Result<RouterConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    parse_config(&content, is_toml)
}

/// Accept a load result, falling back to defaults on error.
///
/// Warnings (rules that never match, targets without an upstream) are logged
/// but never reject the file.
pub fn or_default(path: &Path, loaded: Result<RouterConfig, ConfigError>) -> RouterConfig {
    match loaded {
        Ok(config) => {
            for warning in lint_config(&config) {
                tracing::warn!(path = ?path, "{}", warning);
            }
            tracing::info!(
                path = ?path,
                rules = config.plugin.rules.len(),
                default_target = %config.plugin.default_target,
                "Loaded configuration"
            );
            config
        }
        Err(e) => {
            tracing::warn!(
                path = ?path,
                error = %e,
                "Failed to load configuration, using defaults"
            );
            RouterConfig::default()
        }
    }
}

/// Load configuration, falling back to defaults when the file is absent or
/// unusable.
pub fn load_or_default(path: &Path) -> RouterConfig {
    or_default(path, load_config(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir()
            .join(format!("smart-router-{}-{}", std::process::id(), name));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_json_file() {
        let path = temp_file(
            "load.json",
            r#"{"default_target":"blue","rules":[{"name":"r","priority":1,"target":"green",
                "conditions":[{"type":"header","key":"X-Canary","operator":"exists"}]}]}"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.plugin.default_target, "blue");
        assert_eq!(config.plugin.rules[0].target, "green");
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_toml_file() {
        let path = temp_file("load.toml", "default_target = \"blue\"\n");
        let config = load_config(&path).unwrap();
        assert_eq!(config.plugin.default_target, "blue");
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(parse_config("{not json", false), Err(ConfigError::Json(_))));
        assert!(matches!(parse_config("= broken", true), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_validation_error() {
        let err = parse_config(r#"{"timeouts":{"request_secs":0}}"#, false).unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors, vec![ValidationError::ZeroTimeout]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rules_survive_missing_upstream() {
        let path = temp_file(
            "partial-upstreams.json",
            r#"{"default_target":"v1","upstreams":{"v1":"http://127.0.0.1:3001"},
                "rules":[{"name":"beta","priority":1,"target":"v2",
                "conditions":[{"type":"cookie","key":"beta","operator":"exists"}]}]}"#,
        );
        let config = load_or_default(&path);
        assert_eq!(config.plugin.rules.len(), 1);
        assert_eq!(config.plugin.rules[0].target, "v2");
        assert_eq!(config.upstreams.len(), 1);
        fs::remove_file(path).ok();

        let config = parse_config(r#"{"default_target":""}"#, false).unwrap();
        assert_eq!(config.plugin.default_target, "");
    }

    #[test]
    fn test_fallback_to_defaults() {
        let missing = std::env::temp_dir().join("smart-router-does-not-exist.json");
        let config = load_or_default(&missing);
        assert_eq!(config.plugin.default_target, "v1");
        assert!(config.plugin.rules.is_empty());

        let path = temp_file("garbage.json", "not json at all");
        let config = load_or_default(&path);
        assert_eq!(config.plugin.log_level, "info");
        assert!(config.plugin.rules.is_empty());
        fs::remove_file(path).ok();
    }
}
