#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]

//! # Config
//!
//! The typed configuration surface (spec.md §6): a `config.toml` file
//! overlaid with environment variables, deserialized into [`Config`], then
//! validated once at startup. A `ConfigError` here always prevents the
//! workflow from starting, it is never retried or recovered from inside
//! a running system.
//!
//! [`Config`] also converts into each stage's own tuning struct
//! ([`GatingLimits`](glidepath_risk::GatingLimits),
//! [`PortfolioLimits`](glidepath_portfolio::PortfolioLimits),
//! [`ExecutionParams`](glidepath_execution::ExecutionParams)), so it is the
//! single source of truth for every numeric knob scattered across the
//! other crates.

pub mod error;
pub mod settings;

pub use error::ConfigError;
pub use settings::{Config, Mode};

const ENV_PREFIX: &str = "GLIDEPATH";

/// Loads `config.toml` from the current directory, overlaid with any
/// `GLIDEPATH_*` environment variables (e.g. `GLIDEPATH_MODE=live`), then
/// validates the result.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from("config")
}

/// Loads from an explicit file stem (without extension), still overlaid
/// with `GLIDEPATH_*` environment variables. Exists so tests and
/// alternate deployments can point at a file other than `config.toml`
/// without this crate reaching into the process's current directory.
pub fn load_config_from(file_stem: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(file_stem).required(false))
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    let config: Config = builder.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_with_no_file_and_no_env_falls_back_to_nothing_and_fails_deserialization() {
        // With neither a file nor env vars present, `config` has no source
        // for any field, so deserialization itself fails before validation
        // runs, confirms the loader doesn't silently fabricate defaults.
        let result = load_config_from("glidepath-config-test-fixture-that-does-not-exist");
        assert!(result.is_err());
    }
}
