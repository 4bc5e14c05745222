use thiserror::Error;

/// Errors loading or validating configuration. A `ConfigError` is always
/// surfaced to the operator and always prevents the workflow from
/// starting, per spec, configuration errors are never retried or
/// recovered from inside the running system.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl ConfigError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
