//! One-time schema setup, run before the HTTP listener starts.
//!
//! The steps are: make sure the application database exists (via the
//! administrative database), create the three tables, and on a reset run
//! reload them from the seed files.

use crate::connection::connect_admin;
use crate::repository::DbRepository;
use crate::seed::{self, SeedReport};
use crate::DbError;
use configuration::{is_plain_identifier, BootstrapSettings, DatabaseSettings};
use sqlx::{Connection, PgConnection, PgPool};

/// Dependents first: `sales` references the other two tables.
const DROP_TABLES: [&str; 3] = [
    "DROP TABLE IF EXISTS sales",
    "DROP TABLE IF EXISTS customers",
    "DROP TABLE IF EXISTS products",
];

/// Referenced tables first.
const CREATE_TABLES: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS customers (
        id SERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        email VARCHAR(100) UNIQUE NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id SERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        price NUMERIC(10, 2) NOT NULL CHECK (price > 0)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sales (
        id SERIAL PRIMARY KEY,
        customer_id INTEGER NOT NULL REFERENCES customers(id),
        product_id INTEGER NOT NULL REFERENCES products(id),
        quantity INTEGER NOT NULL CHECK (quantity > 0),
        sale_date TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
];

/// What a bootstrap run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub database_created: bool,
    pub tables_reset: bool,
    pub seed: Option<SeedReport>,
}

/// Runs every bootstrap step against `pool`, which must point at `db.name`.
///
/// A failed database check is logged and the remaining steps still run, since
/// the database may well exist already. The run then reports that failure.
/// Seeding needs the tables, so a failed table step ends the run at once.
pub async fn run(
    db: &DatabaseSettings,
    settings: &BootstrapSettings,
    pool: &PgPool,
) -> Result<BootstrapReport, DbError> {
    let (database_created, database_error) = match ensure_database(db).await {
        Ok(created) => (created, None),
        Err(e) => {
            tracing::error!(
                error = %e,
                database = %db.name,
                "Could not make sure the database exists; continuing with table setup."
            );
            (false, Some(e))
        }
    };

    if let Err(e) = create_tables(pool, settings.reset).await {
        tracing::error!(error = %e, "Table setup failed.");
        return Err(e);
    }

    let seed = match (&settings.seed_dir, settings.reset) {
        (Some(dir), true) => {
            let repo = DbRepository::new(pool.clone());
            Some(seed::load_all(&repo, dir, settings.on_seed_error).await?)
        }
        (Some(dir), false) => {
            tracing::info!(
                dir = %dir.display(),
                "Seed directory ignored: seed data is only loaded on a reset run."
            );
            None
        }
        (None, _) => None,
    };

    if let Some(e) = database_error {
        return Err(e);
    }

    Ok(BootstrapReport {
        database_created,
        tables_reset: settings.reset,
        seed,
    })
}

/// Creates the application database when it is missing. Returns whether it was created.
pub async fn ensure_database(db: &DatabaseSettings) -> Result<bool, DbError> {
    let quoted = quote_identifier(&db.name)?;
    let mut conn = connect_admin(db).await?;

    let result = create_database_if_missing(&mut conn, &db.name, &quoted).await;

    if let Err(e) = conn.close().await {
        tracing::warn!(error = %e, "Failed to close the administrative connection.");
    }

    let created = result?;
    if created {
        tracing::info!(database = %db.name, "Database created.");
    } else {
        tracing::info!(database = %db.name, "Database already exists.");
    }
    Ok(created)
}

async fn create_database_if_missing(
    conn: &mut PgConnection,
    name: &str,
    quoted: &str,
) -> Result<bool, DbError> {
    let exists = sqlx::query("SELECT 1 FROM pg_database WHERE datname = $1")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?
        .is_some();

    if exists {
        return Ok(false);
    }

    // CREATE DATABASE takes no bind parameters; `quoted` comes from `quote_identifier`.
    sqlx::query(&format!("CREATE DATABASE {quoted}"))
        .execute(&mut *conn)
        .await?;
    Ok(true)
}

/// Creates the three tables, dropping them (and their data) first when `reset` is set.
pub async fn create_tables(pool: &PgPool, reset: bool) -> Result<(), DbError> {
    if reset {
        for statement in DROP_TABLES {
            sqlx::query(statement).execute(pool).await?;
        }
        tracing::warn!("Existing tables dropped (reset requested).");
    }

    for statement in CREATE_TABLES {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!("Tables customers, products and sales are ready.");
    Ok(())
}

/// Double-quotes a database name after checking it is a plain identifier, so it
/// can be spliced into DDL.
pub fn quote_identifier(name: &str) -> Result<String, DbError> {
    if !is_plain_identifier(name) {
        return Err(DbError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{name}\""))
}
