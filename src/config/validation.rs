//! Configuration validation logic.

use crate::config::schema::IngressConfig;

/// Error type for configuration validation failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Validation error: {0}")]
pub struct ValidationError(pub String);

/// Validate an IngressConfig for semantic correctness.
pub fn validate_config(config: &IngressConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError(format!(
            "listener.bind_address '{}' is not a valid socket address",
            config.listener.bind_address
        )));
    }

    if config.listener.max_connections == 0 {
        errors.push(ValidationError(
            "listener.max_connections must be > 0".to_string(),
        ));
    }

    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError(
            "listener.max_body_bytes must be > 0".to_string(),
        ));
    }

    if config.completer.workers == 0 {
        errors.push(ValidationError("completer.workers must be > 0".to_string()));
    }
    if config.completer.queue_size == 0 {
        errors.push(ValidationError(
            "completer.queue_size must be > 0".to_string(),
        ));
    }

    if config.server_ip.trim().is_empty() {
        errors.push(ValidationError("server_ip must not be blank".to_string()));
    }

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.trim().is_empty() || tls.key_path.trim().is_empty() {
            errors.push(ValidationError(
                "listener.tls requires both cert_path and key_path".to_string(),
            ));
        }
    }

    if config.listener.idle_timeout_secs == 0 {
        tracing::warn!("listener.idle_timeout_secs is 0, idle connections close immediately");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
