use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseSettings,
    pub server: ServerSettings,
    pub bootstrap: BootstrapSettings,
    pub report: ReportSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Where the PostgreSQL server lives and which database the app owns.
#[derive(Clone, Deserialize)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// The application database. Created by the bootstrapper when absent.
    pub name: String,
    /// The maintenance database used to check for and create `name`.
    pub admin_database: String,
    /// Upper bound of the shared connection pool.
    pub max_connections: u32,
}

// Hand-written so the password never reaches a log line.
impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("admin_database", &self.admin_database)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// The HTTP listen port.
    pub port: u16,
    /// Directory of static assets served for unmatched paths.
    pub public_dir: PathBuf,
}

/// Controls the one-time schema setup that runs before the listener starts.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapSettings {
    /// Drop and recreate every table. Without it existing data is kept.
    pub reset: bool,
    /// Directory holding `customers.csv`, `products.csv` and `sales.csv`.
    /// Only read on a reset run.
    #[serde(default)]
    pub seed_dir: Option<PathBuf>,
    pub on_seed_error: SeedErrorPolicy,
}

/// What the seed loader does with a row it cannot insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum SeedErrorPolicy {
    /// Log the row and carry on with the next one.
    Skip,
    /// Stop seeding altogether at the first failing row.
    Abort,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportSettings {
    /// Calendar year summarised on the dashboard.
    pub year: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSettings {
    /// When set, logs are also written to a daily rolling file in this directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}
