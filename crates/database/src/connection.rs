use crate::error::DbError;
use configuration::DatabaseSettings;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgConnection, PgPool};
use std::time::Duration;

/// Builds connection options for `database` on the configured server.
pub fn connect_options(settings: &DatabaseSettings, database: &str) -> PgConnectOptions {
    let options = PgConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .username(&settings.user)
        .database(database);

    if settings.password.is_empty() {
        options
    } else {
        options.password(&settings.password)
    }
}

/// Creates the process-wide connection pool for the application database.
///
/// The pool connects lazily: it is created before the bootstrapper has made sure
/// the database exists, and the server keeps running (answering 500s) when the
/// database is unreachable.
pub fn connect(settings: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy_with(connect_options(settings, &settings.name))
}

/// Opens a single connection to the administrative database (`postgres` by default).
pub async fn connect_admin(settings: &DatabaseSettings) -> Result<PgConnection, DbError> {
    let conn = connect_options(settings, &settings.admin_database)
        .connect()
        .await?;
    Ok(conn)
}
