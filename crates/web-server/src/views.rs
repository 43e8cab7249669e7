use crate::error::AppError;
use askama::Template;
use axum::response::Html;
use core_types::{Customer, CustomerOption, MonthlySales, Product};
use rust_decimal::Decimal;

#[derive(Template)]
#[template(path = "index.html")]
pub struct DashboardPage {
    pub year: i32,
    pub sales: Vec<MonthlySales>,
    pub grand_total: Decimal,
}

impl DashboardPage {
    pub fn new(year: i32, sales: Vec<MonthlySales>) -> Self {
        let grand_total = sales.iter().map(|month| month.total).sum();
        Self {
            year,
            sales,
            grand_total,
        }
    }
}

#[derive(Template)]
#[template(path = "products.html")]
pub struct ProductsPage {
    pub products: Vec<Product>,
    pub csrf_token: String,
}

#[derive(Template)]
#[template(path = "customers.html")]
pub struct CustomersPage {
    pub customers: Vec<Customer>,
    pub csrf_token: String,
}

#[derive(Template)]
#[template(path = "register_sale.html")]
pub struct RegisterSalePage {
    pub customers: Vec<CustomerOption>,
    pub products: Vec<Product>,
    pub csrf_token: String,
}

/// Renders a page into an HTML response.
pub fn render<T: Template>(page: &T) -> Result<Html<String>, AppError> {
    Ok(Html(page.render()?))
}
