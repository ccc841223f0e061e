//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Tier table must be non-empty and strictly ascending
//! - Value ranges (selection ratio, log level, metrics address)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FaultToleranceConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::FaultToleranceConfig;
use crate::error::PolicyError;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("latency tiers: {0}")]
    Tiers(#[from] PolicyError),

    #[error("selection.top_ratio must be in (0, 1], got {0}")]
    TopRatio(f64),

    #[error("unknown log level '{0}'")]
    LogLevel(String),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &FaultToleranceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = config.latency.policy() {
        errors.push(ValidationError::from(e));
    }

    let ratio = config.selection.top_ratio;
    if !(ratio.is_finite() && ratio > 0.0 && ratio <= 1.0) {
        errors.push(ValidationError::TopRatio(ratio));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::LogLevel(config.observability.log_level.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
