use crate::views::{self, CustomersPage, DashboardPage, ProductsPage, RegisterSalePage};
use crate::{csrf, error::AppError, AppState};
use axum::{
    extract::{rejection::FormRejection, State},
    response::{Html, Redirect},
    Form,
};
use core_types::{CoreError, NewCustomer, NewProduct, NewSale};
use axum_extra::extract::cookie::CookieJar;
use database::DbError;
use serde::Deserialize;
use std::sync::Arc;

/// Body of `POST /products`. Fields are optional so a missing one is a 400, not a rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ProductForm {
    #[serde(rename = "_csrf")]
    pub csrf: Option<String>,
    pub name: Option<String>,
    pub price: Option<String>,
}

/// Body of `POST /customers`.
#[derive(Debug, Default, Deserialize)]
pub struct CustomerForm {
    #[serde(rename = "_csrf")]
    pub csrf: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Body of `POST /register-sale`.
#[derive(Debug, Default, Deserialize)]
pub struct SaleForm {
    #[serde(rename = "_csrf")]
    pub csrf: Option<String>,
    pub customer_id: Option<String>,
    pub product_id: Option<String>,
    pub quantity: Option<String>,
}

/// Unwraps a form body, reporting an unreadable one as the given validation error.
fn read_form<T>(
    form: Result<Form<T>, FormRejection>,
    invalid: CoreError,
) -> Result<T, AppError> {
    match form {
        Ok(Form(body)) => Ok(body),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable form body.");
            Err(invalid.into())
        }
    }
}

/// # GET /
/// Monthly revenue of the configured report year.
pub async fn dashboard(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let sales = state
        .db_repo
        .monthly_sales(state.report_year)
        .await
        .map_err(AppError::database("Server error"))?;
    views::render(&DashboardPage::new(state.report_year, sales))
}

/// # GET /products
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>), AppError> {
    let products = state
        .db_repo
        .list_products()
        .await
        .map_err(AppError::database("Server error"))?;
    let (jar, csrf_token) = csrf::issue(jar);
    let page = views::render(&ProductsPage {
        products,
        csrf_token,
    })?;
    Ok((jar, page))
}

/// # POST /products
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    form: Result<Form<ProductForm>, FormRejection>,
) -> Result<Redirect, AppError> {
    let form = read_form(form, CoreError::InvalidProduct("form"))?;
    csrf::verify(&jar, form.csrf.as_deref())?;
    let product = NewProduct::parse(form.name.as_deref(), form.price.as_deref())?;

    let id = state
        .db_repo
        .insert_product(&product)
        .await
        .map_err(AppError::database("Error inserting product"))?;
    tracing::info!(id, name = %product.name, "Product created.");

    Ok(Redirect::to("/products"))
}

/// # GET /customers
pub async fn list_customers(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>), AppError> {
    let customers = state
        .db_repo
        .list_customers()
        .await
        .map_err(AppError::database("Server error"))?;
    let (jar, csrf_token) = csrf::issue(jar);
    let page = views::render(&CustomersPage {
        customers,
        csrf_token,
    })?;
    Ok((jar, page))
}

/// # POST /customers
/// A duplicate email is answered with 400 "Email already exists".
pub async fn create_customer(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    form: Result<Form<CustomerForm>, FormRejection>,
) -> Result<Redirect, AppError> {
    let form = read_form(form, CoreError::InvalidCustomer("form"))?;
    csrf::verify(&jar, form.csrf.as_deref())?;
    let customer = NewCustomer::parse(form.name.as_deref(), form.email.as_deref())?;

    match state.db_repo.insert_customer(&customer).await {
        Ok(id) => {
            tracing::info!(id, "Customer registered.");
            Ok(Redirect::to("/customers"))
        }
        Err(source @ DbError::UniqueViolation { .. }) => Err(AppError::Conflict {
            message: "Email already exists",
            source,
        }),
        Err(source) => Err(AppError::database("Error inserting customer")(source)),
    }
}

/// # GET /register-sale
/// The form lists every customer and product, both sorted by name.
pub async fn register_sale_form(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>), AppError> {
    let (customers, products) = tokio::try_join!(
        state.db_repo.list_customer_options(),
        state.db_repo.list_products_by_name(),
    )
    .map_err(AppError::database("Server error"))?;

    let (jar, csrf_token) = csrf::issue(jar);
    let page = views::render(&RegisterSalePage {
        customers,
        products,
        csrf_token,
    })?;
    Ok((jar, page))
}

/// # POST /register-sale
pub async fn register_sale(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    form: Result<Form<SaleForm>, FormRejection>,
) -> Result<Redirect, AppError> {
    let form = read_form(form, CoreError::InvalidSale("form"))?;
    csrf::verify(&jar, form.csrf.as_deref())?;
    let sale = NewSale::parse(
        form.customer_id.as_deref(),
        form.product_id.as_deref(),
        form.quantity.as_deref(),
    )?;

    let sale = state
        .db_repo
        .insert_sale(&sale, None)
        .await
        .map_err(AppError::database("Server error while registering sale"))?;
    tracing::info!(
        id = sale.id,
        customer_id = sale.customer_id,
        product_id = sale.product_id,
        sale_date = %sale.sale_date,
        "Sale registered."
    );

    Ok(Redirect::to("/register-sale"))
}
