use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Prefix of environment overrides (`SVAULT__SESSION__INVALIDATE_AFTER_SECS=0`).
pub const ENV_PREFIX: &str = "SVAULT";

#[svault_derive::svault_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads configuration from a file layered with environment overrides.
///
/// 1. **Base File**: any format the `config` crate understands. An explicit `path` must
///    exist; without one, `svault` (extension probed) in the working directory is read when
///    present.
/// 2. **Environment Overrides**: variables prefixed with `SVAULT__`, nested with double
///    underscores (`SVAULT__KEYSTORE__STRATEGY` maps to `keystore.strategy`).
///
/// # Errors
/// [`ConfigError::Config`] if an explicit file is missing, a file is malformed, or the merged
/// values do not fit `T`.
///
/// # Example
/// ```rust
/// use svault::config::load_config;
/// use svault::domain::config::VaultConfig;
///
/// let cfg: VaultConfig = load_config(Some("config/local")).unwrap_or_default();
/// assert_eq!(cfg.session.invalidate_after_secs, 10);
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    load_layers(path, environment())
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

fn load_layers<T>(path: Option<impl AsRef<Path>>, env: Environment) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let (effective_path, required) = match path {
        Some(p) => (p.as_ref().to_path_buf(), true),
        None => (PathBuf::from("svault"), false),
    };

    info!(path = %effective_path.display(), required, "Loading configuration");

    Config::builder()
        .add_source(File::from(effective_path.as_path()).required(required))
        .add_source(env)
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")
}
