use crate::DbError;
use chrono::NaiveDateTime;
use core_types::{
    Customer, CustomerOption, MonthlySales, NewCustomer, NewProduct, NewSale, Product, Sale,
};
use rust_decimal::Decimal;
use sqlx::FromRow;
use sqlx::postgres::PgPool;

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

// The raw aggregate row behind `MonthlySales`.
#[derive(FromRow)]
struct MonthlyTotalRow {
    month: String,
    month_num: i32,
    total_amount: Decimal,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches every product, oldest first.
    pub async fn list_products(&self) -> Result<Vec<Product>, DbError> {
        let products = sqlx::query_as::<_, Product>("SELECT id, name, price FROM products ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    /// Fetches every product sorted by name, for the sale form.
    pub async fn list_products_by_name(&self) -> Result<Vec<Product>, DbError> {
        let products =
            sqlx::query_as::<_, Product>("SELECT id, name, price FROM products ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(products)
    }

    /// Inserts a product and returns its generated id.
    pub async fn insert_product(&self, product: &NewProduct) -> Result<i32, DbError> {
        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO products (name, price) VALUES ($1, $2) RETURNING id",
        )
        .bind(&product.name)
        .bind(product.price)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Fetches every customer sorted by name.
    pub async fn list_customers(&self) -> Result<Vec<Customer>, DbError> {
        let customers =
            sqlx::query_as::<_, Customer>("SELECT id, name, email FROM customers ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(customers)
    }

    /// Fetches id and name of every customer sorted by name, for the sale form.
    pub async fn list_customer_options(&self) -> Result<Vec<CustomerOption>, DbError> {
        let customers =
            sqlx::query_as::<_, CustomerOption>("SELECT id, name FROM customers ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(customers)
    }

    /// Inserts a customer and returns its generated id.
    ///
    /// A duplicate email comes back as `DbError::UniqueViolation`.
    pub async fn insert_customer(&self, customer: &NewCustomer) -> Result<i32, DbError> {
        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO customers (name, email) VALUES ($1, $2) RETURNING id",
        )
        .bind(&customer.name)
        .bind(&customer.email)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Records a sale and returns the stored row. `sale_date` defaults to the
    /// database's current timestamp when `None`.
    ///
    /// An unknown customer or product comes back as `DbError::ForeignKeyViolation`.
    pub async fn insert_sale(
        &self,
        sale: &NewSale,
        sale_date: Option<NaiveDateTime>,
    ) -> Result<Sale, DbError> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (customer_id, product_id, quantity, sale_date)
            VALUES ($1, $2, $3, COALESCE($4, LOCALTIMESTAMP))
            RETURNING id, customer_id, product_id, quantity, sale_date
            "#,
        )
        .bind(sale.customer_id)
        .bind(sale.product_id)
        .bind(sale.quantity)
        .bind(sale_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(sale)
    }

    /// Revenue per calendar month of `year`, ordered by month. Months without
    /// sales are absent.
    pub async fn monthly_sales(&self, year: i32) -> Result<Vec<MonthlySales>, DbError> {
        let rows = sqlx::query_as::<_, MonthlyTotalRow>(
            r#"
            SELECT
                TO_CHAR(s.sale_date, 'Month') AS month,
                EXTRACT(MONTH FROM s.sale_date)::INT AS month_num,
                SUM(s.quantity * p.price) AS total_amount
            FROM sales s
            JOIN products p ON s.product_id = p.id
            WHERE EXTRACT(YEAR FROM s.sale_date)::INT = $1
            GROUP BY month, month_num
            ORDER BY month_num
            "#,
        )
        .bind(year)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| MonthlySales::new(&row.month, row.month_num, row.total_amount))
            .collect())
    }
}
