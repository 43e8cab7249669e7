use thiserror::Error;

/// A field-level validation failure. The `Display` text is safe to show to a client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid product data")]
    InvalidProduct(&'static str),

    #[error("Invalid customer data")]
    InvalidCustomer(&'static str),

    #[error("Invalid sale data")]
    InvalidSale(&'static str),
}

impl CoreError {
    /// The offending field, for server-side logging.
    pub fn field(&self) -> &'static str {
        match self {
            CoreError::InvalidProduct(field)
            | CoreError::InvalidCustomer(field)
            | CoreError::InvalidSale(field) => field,
        }
    }
}
