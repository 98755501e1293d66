//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate listener addresses and detect collisions
//! - Validate value ranges (body limit > 0)
//! - Validate seed routes exactly as the admin API would
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashMap;
use std::net::SocketAddr;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::ServerConfig;
use crate::routing::RouteError;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{first} and {second} share address {value}")]
    DuplicateAddress {
        first: &'static str,
        second: &'static str,
        value: String,
    },

    #[error("execution.default_entrypoint must not be empty")]
    EmptyEntrypoint,

    #[error("execution.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("observability.log_level: invalid filter {0:?}")]
    InvalidLogLevel(String),

    #[error("routes[{position}]: {reason}")]
    InvalidRoute { position: usize, reason: RouteError },
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let listeners = [
        ("user.bind_address", &config.user.bind_address),
        ("control.bind_address", &config.control.bind_address),
        ("data.bind_address", &config.data.bind_address),
    ];

    let mut seen: HashMap<SocketAddr, &'static str> = HashMap::new();
    for (field, value) in listeners {
        match value.parse::<SocketAddr>() {
            // Port 0 asks the OS for a fresh port, so it never collides
            Ok(addr) if addr.port() != 0 => {
                if let Some(first) = seen.insert(addr, field) {
                    errors.push(ValidationError::DuplicateAddress {
                        first,
                        second: field,
                        value: value.clone(),
                    });
                }
            }
            Ok(_) => {}
            Err(_) => errors.push(ValidationError::InvalidAddress {
                field,
                value: value.clone(),
            }),
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.execution.default_entrypoint.trim().is_empty() {
        errors.push(ValidationError::EmptyEntrypoint);
    }

    if config.execution.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if EnvFilter::try_new(&config.observability.log_level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    for (position, route) in config.routes.iter().enumerate() {
        if let Err(reason) = route.to_new_route(&config.execution.default_entrypoint) {
            errors.push(ValidationError::InvalidRoute { position, reason });
        }
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
    use crate::config::schema::RouteConfig;
    use crate::routing::PatternError;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&ServerConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ServerConfig::default();
        config.user.bind_address = "not-an-address".into();
        config.data.bind_address = config.control.bind_address.clone();
        config.execution.max_body_size = 0;
        config.routes.push(RouteConfig {
            method: "GET".into(),
            url_pattern: "missing-slash".into(),
            entrypoint: None,
            command: String::new(),
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::InvalidAddress {
            field: "user.bind_address",
            value: "not-an-address".into(),
        }));
        assert!(errors.contains(&ValidationError::DuplicateAddress {
            first: "control.bind_address",
            second: "data.bind_address",
            value: "127.0.0.1:8081".into(),
        }));
        assert!(errors.contains(&ValidationError::ZeroBodyLimit));
        assert!(errors.contains(&ValidationError::InvalidRoute {
            position: 0,
            reason: RouteError::Pattern(PatternError::MissingLeadingSlash("missing-slash".into())),
        }));
    }

    #[test]
    fn test_ephemeral_ports_do_not_collide() {
        let mut config = ServerConfig::default();
        config.user.bind_address = "127.0.0.1:0".into();
        config.control.bind_address = "127.0.0.1:0".into();
        config.data.bind_address = "127.0.0.1:0".into();
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = ServerConfig::default();
        config.observability.metrics_address = "nope".into();
        assert_eq!(validate_config(&config), Ok(()));

        config.observability.metrics_enabled = true;
        assert_eq!(validate_config(&config).unwrap_err().len(), 1);
    }
}
