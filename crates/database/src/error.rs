use core_types::CoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database query failed: {0}")]
    Query(sqlx::Error),

    #[error("Unique constraint violated ({})", .constraint.as_deref().unwrap_or("unknown"))]
    UniqueViolation { constraint: Option<String> },

    #[error("Foreign key constraint violated ({})", .constraint.as_deref().unwrap_or("unknown"))]
    ForeignKeyViolation { constraint: Option<String> },

    #[error("'{0}' is not a valid database name")]
    InvalidIdentifier(String),

    #[error("Failed to read seed file {path}: {source}")]
    SeedFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed seed row: {0}")]
    SeedFormat(#[from] csv::Error),

    #[error("Invalid seed row: {0} (field `{field}`)", field = .0.field())]
    Invalid(#[from] CoreError),

    #[error("Invalid sale date '{0}'")]
    InvalidSaleDate(String),

    #[error("Seeding {table} stopped at line {line}: {reason}")]
    SeedAborted {
        table: &'static str,
        line: u64,
        reason: String,
    },
}

// Constraint violations get their own variants so callers can answer with a
// conflict instead of a generic failure.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().map(str::to_string);
            if db_err.is_unique_violation() {
                return DbError::UniqueViolation { constraint };
            }
            if db_err.is_foreign_key_violation() {
                return DbError::ForeignKeyViolation { constraint };
            }
        }
        DbError::Query(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_seed_rows_name_the_field() {
        let err = DbError::from(CoreError::InvalidCustomer("email"));
        assert_eq!(
            err.to_string(),
            "Invalid seed row: Invalid customer data (field `email`)"
        );
    }
}
