//! Crate-wide error type.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by the simulator, the safety layer, policies, and reporting.
#[derive(Debug, Error)]
pub enum EmsError {
    /// One or more configuration values are out of range.
    #[error("invalid configuration: {}", join_config_errors(.0))]
    Config(Vec<ConfigError>),

    /// Action vector has a length other than 1 or 2.
    #[error(
        "action must be [battery_kw] or legacy [battery_kw, grid_kw], got {0} element(s)"
    )]
    MalformedAction(usize),

    /// Observation vector is too short for the consumer.
    #[error("observation must have at least {expected} elements, got {actual}")]
    MalformedObservation { expected: usize, actual: usize },

    /// Input data does not have the expected shape.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// `step` was called on a simulator that is not in the running state.
    #[error("episode is not running; call reset before step")]
    EpisodeNotRunning,

    /// A required external resource is missing or unavailable.
    #[error("resource unavailable: {resource} ({reason})")]
    Resource { resource: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl EmsError {
    /// Shorthand for a single-field configuration error.
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config(vec![ConfigError {
            field: field.into(),
            message: message.into(),
        }])
    }

    pub fn resource(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resource {
            resource: resource.into(),
            reason: reason.into(),
        }
    }
}

fn join_config_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T, E = EmsError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_lists_every_field() {
        let err = EmsError::Config(vec![
            ConfigError {
                field: "battery.capacity_kwh".into(),
                message: "must be > 0".into(),
            },
            ConfigError {
                field: "environment.horizon".into(),
                message: "must be > 0".into(),
            },
        ]);
        let msg = err.to_string();
        assert!(msg.contains("battery.capacity_kwh"));
        assert!(msg.contains("environment.horizon"));
    }

    #[test]
    fn resource_error_names_the_resource() {
        let err = EmsError::resource("models/sac.zip", "file not found");
        assert!(err.to_string().contains("models/sac.zip"));
    }
}
