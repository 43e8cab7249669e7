//! Bulk-loads the demo data from CSV files.
//!
//! Each file has a header row naming exactly the insertable columns of its table:
//!
//! | file            | columns                                       |
//! |-----------------|-----------------------------------------------|
//! | `customers.csv` | `name,email`                                  |
//! | `products.csv`  | `name,price`                                  |
//! | `sales.csv`     | `customer_id,product_id,quantity,sale_date`   |
//!
//! Files are loaded in that order so the foreign keys of `sales.csv` resolve.
//! Rows are inserted one at a time through `DbRepository`, after the same field
//! validation the HTTP forms use.

use crate::repository::DbRepository;
use crate::DbError;
use chrono::{NaiveDate, NaiveDateTime};
use configuration::SeedErrorPolicy;
use core_types::{NewCustomer, NewProduct, NewSale};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::Path;

pub const CUSTOMERS_FILE: &str = "customers.csv";
pub const PRODUCTS_FILE: &str = "products.csv";
pub const SALES_FILE: &str = "sales.csv";

#[derive(Debug, Deserialize)]
struct CustomerRow {
    name: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct ProductRow {
    name: String,
    price: String,
}

#[derive(Debug, Deserialize)]
struct SaleRow {
    customer_id: String,
    product_id: String,
    quantity: String,
    #[serde(default)]
    sale_date: String,
}

impl TryFrom<CustomerRow> for NewCustomer {
    type Error = DbError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        Ok(NewCustomer::parse(Some(&row.name), Some(&row.email))?)
    }
}

impl TryFrom<ProductRow> for NewProduct {
    type Error = DbError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(NewProduct::parse(Some(&row.name), Some(&row.price))?)
    }
}

impl SaleRow {
    fn into_sale(self) -> Result<(NewSale, Option<NaiveDateTime>), DbError> {
        let sale = NewSale::parse(
            Some(&self.customer_id),
            Some(&self.product_id),
            Some(&self.quantity),
        )?;
        Ok((sale, parse_sale_date(&self.sale_date)?))
    }
}

/// Outcome of loading one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReport {
    pub table: &'static str,
    pub inserted: u64,
    pub skipped: u64,
}

impl TableReport {
    fn new(table: &'static str) -> Self {
        Self {
            table,
            inserted: 0,
            skipped: 0,
        }
    }

    /// Counts a row outcome, or turns its failure into an abort under `SeedErrorPolicy::Abort`.
    fn record(
        &mut self,
        line: u64,
        outcome: Result<(), DbError>,
        policy: SeedErrorPolicy,
    ) -> Result<(), DbError> {
        match (outcome, policy) {
            (Ok(()), _) => {
                self.inserted += 1;
                Ok(())
            }
            (Err(e), SeedErrorPolicy::Skip) => {
                tracing::warn!(table = self.table, line, error = %e, "Skipping seed row.");
                self.skipped += 1;
                Ok(())
            }
            (Err(e), SeedErrorPolicy::Abort) => Err(DbError::SeedAborted {
                table: self.table,
                line,
                reason: e.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub tables: Vec<TableReport>,
}

impl SeedReport {
    pub fn inserted(&self, table: &str) -> u64 {
        self.tables
            .iter()
            .filter(|report| report.table == table)
            .map(|report| report.inserted)
            .sum()
    }
}

/// Loads `customers.csv`, `products.csv` and `sales.csv` from `dir`, in that order.
/// A missing file is logged and skipped.
pub async fn load_all(
    repo: &DbRepository,
    dir: &Path,
    policy: SeedErrorPolicy,
) -> Result<SeedReport, DbError> {
    let mut report = SeedReport::default();

    let mut customers = TableReport::new("customers");
    if let Some(bytes) = read_seed_file(&dir.join(CUSTOMERS_FILE)).await? {
        for (line, row) in parse_rows::<CustomerRow>(&bytes) {
            let outcome = match row.and_then(NewCustomer::try_from) {
                Ok(customer) => repo.insert_customer(&customer).await.map(drop),
                Err(e) => Err(e),
            };
            customers.record(line, outcome, policy)?;
        }
    }
    log_table(&customers);
    report.tables.push(customers);

    let mut products = TableReport::new("products");
    if let Some(bytes) = read_seed_file(&dir.join(PRODUCTS_FILE)).await? {
        for (line, row) in parse_rows::<ProductRow>(&bytes) {
            let outcome = match row.and_then(NewProduct::try_from) {
                Ok(product) => repo.insert_product(&product).await.map(drop),
                Err(e) => Err(e),
            };
            products.record(line, outcome, policy)?;
        }
    }
    log_table(&products);
    report.tables.push(products);

    let mut sales = TableReport::new("sales");
    if let Some(bytes) = read_seed_file(&dir.join(SALES_FILE)).await? {
        for (line, row) in parse_rows::<SaleRow>(&bytes) {
            let outcome = match row.and_then(SaleRow::into_sale) {
                Ok((sale, sale_date)) => repo.insert_sale(&sale, sale_date).await.map(drop),
                Err(e) => Err(e),
            };
            sales.record(line, outcome, policy)?;
        }
    }
    log_table(&sales);
    report.tables.push(sales);

    Ok(report)
}

fn log_table(report: &TableReport) {
    tracing::info!(
        table = report.table,
        inserted = report.inserted,
        skipped = report.skipped,
        "Seed data loaded."
    );
}

/// Reads a whole seed file. `Ok(None)` when it does not exist.
async fn read_seed_file(path: &Path) -> Result<Option<Vec<u8>>, DbError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "Seed file not found, skipping.");
            Ok(None)
        }
        Err(source) => Err(DbError::SeedFile {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Deserializes every data row, paired with its line number (the header is line 1).
fn parse_rows<T: DeserializeOwned>(bytes: &[u8]) -> Vec<(u64, Result<T, DbError>)> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(bytes);
    reader
        .deserialize::<T>()
        .enumerate()
        .map(|(index, row)| {
            let line = row
                .as_ref()
                .err()
                .and_then(|e| e.position())
                .map_or(index as u64 + 2, |pos| pos.line());
            (line, row.map_err(DbError::from))
        })
        .collect()
}

/// Accepts `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` (optionally with
/// fractional seconds) or a bare `YYYY-MM-DD` (midnight). Empty means "now".
pub fn parse_sale_date(raw: &str) -> Result<Option<NaiveDateTime>, DbError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Some(parsed));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(Some)
        .ok_or_else(|| DbError::InvalidSaleDate(raw.to_string()))
}
