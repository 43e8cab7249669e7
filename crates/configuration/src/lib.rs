use crate::error::ConfigError;
use config::builder::DefaultState;
use config::ConfigBuilder;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{
    BootstrapSettings, Config, DatabaseSettings, LoggingSettings, ReportSettings,
    SeedErrorPolicy, ServerSettings,
};

/// Looked up in the working directory when no `--config` path is given.
pub const DEFAULT_CONFIG_FILE: &str = "salesapp";

/// libpq-style variables and the keys they override.
const PG_ENV_OVERRIDES: [(&str, &str); 4] = [
    ("PGHOST", "database.host"),
    ("PGUSER", "database.user"),
    ("PGPASSWORD", "database.password"),
    ("PGPORT", "database.port"),
];

/// Loads the application configuration.
///
/// Layers, weakest first: built-in defaults, the TOML file (`path`, or an optional
/// `salesapp.toml`), `SALESAPP__SECTION__KEY` variables, and finally the libpq
/// variables `PGHOST`, `PGUSER`, `PGPASSWORD` and `PGPORT`.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let builder = with_defaults(config::Config::builder())?
        .add_source(file)
        .add_source(config::Environment::with_prefix("SALESAPP").separator("__"));
    let builder = with_pg_env(builder, |key| std::env::var(key).ok())?;

    build(builder)
}

fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder
        .set_default("database.host", "localhost")?
        .set_default("database.port", 5432_i64)?
        .set_default("database.user", "postgres")?
        .set_default("database.password", "")?
        .set_default("database.name", "salesapp")?
        .set_default("database.admin_database", "postgres")?
        .set_default("database.max_connections", 10_i64)?
        .set_default("server.port", 3000_i64)?
        .set_default("server.public_dir", "public")?
        .set_default("bootstrap.reset", false)?
        .set_default("bootstrap.on_seed_error", "skip")?
        .set_default("report.year", 2025_i64)?)
}

fn with_pg_env(
    mut builder: ConfigBuilder<DefaultState>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    for (var, key) in PG_ENV_OVERRIDES {
        builder = builder.set_override_option(key, lookup(var))?;
    }
    Ok(builder)
}

fn build(builder: ConfigBuilder<DefaultState>) -> Result<Config, ConfigError> {
    let config = builder.build()?.try_deserialize::<Config>()?;
    validate(&config)?;
    tracing::debug!(?config, "Configuration loaded.");
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if !is_plain_identifier(&config.database.name) {
        return Err(ConfigError::Invalid {
            key: "database.name",
            reason: format!("'{}' is not a plain identifier", config.database.name),
        });
    }
    if config.database.max_connections == 0 {
        return Err(ConfigError::Invalid {
            key: "database.max_connections",
            reason: "must be at least 1".to_string(),
        });
    }
    if config.server.port == 0 {
        return Err(ConfigError::Invalid {
            key: "server.port",
            reason: "must not be 0".to_string(),
        });
    }
    Ok(())
}

/// ASCII letters, digits and `_`, not starting with a digit, at most 63 bytes
/// (the PostgreSQL identifier limit).
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    name.len() <= 63
        && (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
