//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Enforce the reserved `/_` route namespace
//! - Detect conflicting routes (same path and method)
//! - Validate store settings (host/port/database, paired credentials)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::routing::RESERVED_PREFIX;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("route '{0}' uses the reserved '{RESERVED_PREFIX}' prefix for system routes")]
    ReservedPath(String),

    #[error("route '{path}' registered twice for the same method")]
    DuplicateRoute { path: String },

    #[error("route '{0}' has an empty controller name")]
    EmptyController(String),

    #[error("route '{path}' field '{field}' requests both lowercase and uppercase")]
    ConflictingCasing { path: String, field: String },

    #[error("store.{0} must not be empty")]
    EmptyStoreField(&'static str),

    #[error("store.port must not be zero")]
    ZeroPort,

    #[error("store credentials must set username and password together")]
    HalfCredentials,

    #[error("store.max_connect_attempts must be at least 1")]
    NoConnectAttempts,
}

/// Validate an already-parsed configuration, collecting every error.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    for route in &config.routes {
        if route.path.starts_with(RESERVED_PREFIX) {
            errors.push(ValidationError::ReservedPath(route.path.clone()));
        }
        if route.controller.is_empty() {
            errors.push(ValidationError::EmptyController(route.path.clone()));
        }
        if !seen.insert((route.path.clone(), route.method)) {
            errors.push(ValidationError::DuplicateRoute {
                path: route.path.clone(),
            });
        }
        if let Some(params) = &route.params {
            for (field, spec) in params {
                if spec.lowercase && spec.uppercase {
                    errors.push(ValidationError::ConflictingCasing {
                        path: route.path.clone(),
                        field: field.clone(),
                    });
                }
            }
        }
    }

    if config.store.host.is_empty() {
        errors.push(ValidationError::EmptyStoreField("host"));
    }
    if config.store.database.is_empty() {
        errors.push(ValidationError::EmptyStoreField("database"));
    }
    if config.store.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }
    if config.store.username.is_some() != config.store.password.is_some() {
        errors.push(ValidationError::HalfCredentials);
    }
    if config.store.max_connect_attempts == 0 {
        errors.push(ValidationError::NoConnectAttempts);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{RouteConfig, RouteMethod};

    fn route(path: &str) -> RouteConfig {
        RouteConfig {
            path: path.to_string(),
            controller: "noop".to_string(),
            method: RouteMethod::All,
            params: None,
            middlewares: Vec::new(),
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn reserved_prefix_is_rejected() {
        let mut config = AppConfig::default();
        config.routes.push(route("/_email/test"));
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::ReservedPath(_)));
    }

    #[test]
    fn duplicate_path_and_method_is_rejected() {
        let mut config = AppConfig::default();
        config.routes.push(route("/users"));
        config.routes.push(route("/users"));
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::DuplicateRoute { .. })));
    }

    #[test]
    fn same_path_different_method_is_fine() {
        let mut config = AppConfig::default();
        let mut get = route("/users");
        get.method = RouteMethod::Get;
        let mut post = route("/users");
        post.method = RouteMethod::Post;
        config.routes.push(get);
        config.routes.push(post);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn half_set_credentials_are_rejected() {
        let mut config = AppConfig::default();
        config.store.username = Some("svc".into());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::HalfCredentials)));
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = AppConfig::default();
        config.routes.push(route("/_a"));
        config.store.host.clear();
        config.store.port = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
