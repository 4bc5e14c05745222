use std::process::ExitCode;

use glidepath::GlidepathError;
use glidepath_config::ConfigError;

/// Exit codes per spec: 0 success, 2 usage error, 3 configuration error,
/// 4 broker/runtime error, 5 run completed with errors.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Workflow(#[from] GlidepathError),

    /// A run's own bookkeeping reports one or more failed trades. Not a
    /// Rust error in the usual sense; the workflow completed, but the
    /// operator surface still needs a distinct non-zero exit for it.
    #[error("run completed with {failed} failed trade(s) out of {total}")]
    CompletedWithErrors { failed: usize, total: usize },
}

impl CliError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Usage(_) => ExitCode::from(2),
            CliError::Config(_) => ExitCode::from(3),
            CliError::Workflow(_) => ExitCode::from(4),
            CliError::CompletedWithErrors { .. } => ExitCode::from(5),
        }
    }
}
