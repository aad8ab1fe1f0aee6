//! Configuration loading.
//!
//! `load_config` reads a TOML file, deserializes the server settings and
//! route table, and runs the semantic validation pass before anything
//! else boots. Validation reports every problem in one error instead of
//! one per restart.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config: AppConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_io_error_naming_the_path() {
        let err = load_config(Path::new("/nonexistent/plinth.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/plinth.toml"));
    }

    #[test]
    fn reserved_route_fails_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[[routes]]\npath = \"/_private\"\ncontroller = \"x\"").unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn validation_errors_are_joined_into_one_message() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[store]\nhost = \"\"\n\n[[routes]]\npath = \"/_private\"\ncontroller = \"x\""
        )
        .unwrap();
        let err = load_config(file.path()).unwrap_err();
        let ConfigError::Validation(errors) = &err else {
            panic!("expected validation failure, got {err}");
        };
        assert!(errors.len() >= 2);
        assert!(err.to_string().contains("; "));
    }

    #[test]
    fn shipped_example_config_loads() {
        let config = load_config(Path::new("plinth.toml")).unwrap();
        assert!(!config.routes.is_empty());
        assert!(Path::new(&config.server.not_found_page).exists());
    }
}
