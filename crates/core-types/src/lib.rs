pub mod error;
pub mod structs;
pub mod validation;

// Re-export the core types to provide a clean public API.
pub use error::CoreError;
pub use structs::{Customer, CustomerOption, MonthlySales, Product, Sale};
pub use validation::{NewCustomer, NewProduct, NewSale};
