use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row of the `customers` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Customer {
    pub id: i32,
    pub name: String,
    pub email: String,
}

/// The slimmed-down customer shown in the sale registration form.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CustomerOption {
    pub id: i32,
    pub name: String,
}

/// A row of the `products` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
}

/// A row of the `sales` table. A sale is a single line item.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Sale {
    pub id: i32,
    pub customer_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub sale_date: NaiveDateTime,
}

/// One bar of the dashboard: the revenue of a calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySales {
    /// Human readable month name, e.g. "March".
    pub month: String,
    /// Month number, 1 to 12.
    pub month_num: i32,
    /// `sum(quantity * price)` over the month.
    pub total: Decimal,
}

impl MonthlySales {
    /// Builds a row from the raw aggregate. Postgres pads `TO_CHAR(.., 'Month')`
    /// to nine characters, so the label is trimmed here.
    pub fn new(month: &str, month_num: i32, total: Decimal) -> Self {
        Self {
            month: month.trim().to_string(),
            month_num,
            total,
        }
    }
}
