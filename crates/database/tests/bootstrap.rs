//! Runs against a real PostgreSQL server reachable through `PGHOST`, `PGUSER`,
//! `PGPASSWORD` and `PGPORT`. The tests own the `salesapp_db_tests` database and
//! reset it freely.
//!
//! ```sh
//! cargo test -p database -- --ignored
//! ```

use chrono::{NaiveDate, NaiveDateTime};
use configuration::{BootstrapSettings, DatabaseSettings, SeedErrorPolicy};
use core_types::{NewCustomer, NewProduct, NewSale};
use database::{bootstrap, connect, DbError, DbRepository};
use rust_decimal_macros::dec;
use sqlx::PgPool;
use std::fs;
use std::path::Path;
use tokio::sync::Mutex;

// Every test resets the same tables.
static DB_LOCK: Mutex<()> = Mutex::const_new(());

fn db_settings() -> DatabaseSettings {
    let mut settings = configuration::load_config(None)
        .expect("configuration loads")
        .database;
    settings.name = "salesapp_db_tests".to_string();
    settings
}

fn write_seed_files(dir: &Path) {
    fs::write(
        dir.join("customers.csv"),
        "name,email\nAna,ana@example.com\nBruno,bruno@example.com\n",
    )
    .unwrap();
    fs::write(dir.join("products.csv"), "name,price\nLamp,10.00\nMug,5.00\n").unwrap();
    fs::write(
        dir.join("sales.csv"),
        "customer_id,product_id,quantity,sale_date\n1,1,2,2025-03-03 09:00:00\n2,2,1,2025-03-20\n1,2,4,2024-12-31\n",
    )
    .unwrap();
}

fn reset_settings(seed_dir: Option<&Path>, on_seed_error: SeedErrorPolicy) -> BootstrapSettings {
    BootstrapSettings {
        reset: true,
        seed_dir: seed_dir.map(Path::to_path_buf),
        on_seed_error,
    }
}

async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn fresh_repo() -> (DbRepository, PgPool) {
    let settings = db_settings();
    let pool = connect(&settings);
    bootstrap::run(&settings, &reset_settings(None, SeedErrorPolicy::Skip), &pool)
        .await
        .unwrap();
    (DbRepository::new(pool.clone()), pool)
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL server"]
async fn bootstrapping_twice_leaves_exactly_the_seed_rows() {
    let _guard = DB_LOCK.lock().await;
    let seed_dir = tempfile::tempdir().unwrap();
    write_seed_files(seed_dir.path());

    let settings = db_settings();
    let pool = connect(&settings);
    let bootstrap_settings = reset_settings(Some(seed_dir.path()), SeedErrorPolicy::Skip);

    bootstrap::run(&settings, &bootstrap_settings, &pool).await.unwrap();
    let report = bootstrap::run(&settings, &bootstrap_settings, &pool).await.unwrap();

    assert!(!report.database_created);
    let seed = report.seed.unwrap();
    assert_eq!(seed.inserted("customers"), 2);
    assert_eq!(seed.inserted("products"), 2);
    assert_eq!(seed.inserted("sales"), 3);

    assert_eq!(count(&pool, "customers").await, 2);
    assert_eq!(count(&pool, "products").await, 2);
    assert_eq!(count(&pool, "sales").await, 3);
    pool.close().await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL server"]
async fn without_reset_existing_rows_survive() {
    let _guard = DB_LOCK.lock().await;
    let (repo, pool) = fresh_repo().await;
    repo.insert_product(&NewProduct::parse(Some("Lamp"), Some("10")).unwrap())
        .await
        .unwrap();

    let keep = BootstrapSettings {
        reset: false,
        seed_dir: None,
        on_seed_error: SeedErrorPolicy::Skip,
    };
    bootstrap::run(&db_settings(), &keep, &pool).await.unwrap();

    assert_eq!(count(&pool, "products").await, 1);
    pool.close().await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL server"]
async fn tables_are_created_when_the_admin_database_is_unreachable() {
    let _guard = DB_LOCK.lock().await;
    // Make sure the application database exists, then start from no tables.
    let (_, pool) = fresh_repo().await;
    for table in ["sales", "customers", "products"] {
        sqlx::query(&format!("DROP TABLE {table}"))
            .execute(&pool)
            .await
            .unwrap();
    }

    let mut settings = db_settings();
    settings.admin_database = "no_such_admin_db".to_string();
    let keep = BootstrapSettings {
        reset: false,
        seed_dir: None,
        on_seed_error: SeedErrorPolicy::Skip,
    };
    let result = bootstrap::run(&settings, &keep, &pool).await;

    assert!(matches!(result, Err(DbError::Query(_))));
    let tables: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM information_schema.tables \
         WHERE table_schema = 'public' AND table_name IN ('customers', 'products', 'sales')",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(tables, 3);
    pool.close().await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL server"]
async fn bad_seed_rows_follow_the_policy() {
    let _guard = DB_LOCK.lock().await;
    let seed_dir = tempfile::tempdir().unwrap();
    write_seed_files(seed_dir.path());
    // Duplicate email on line 3, then one more good row.
    fs::write(
        seed_dir.path().join("customers.csv"),
        "name,email\nAna,ana@example.com\nAna again,ana@example.com\nBruno,bruno@example.com\n",
    )
    .unwrap();

    let settings = db_settings();
    let pool = connect(&settings);

    let skip = reset_settings(Some(seed_dir.path()), SeedErrorPolicy::Skip);
    let report = bootstrap::run(&settings, &skip, &pool).await.unwrap();
    let customers = &report.seed.unwrap().tables[0];
    assert_eq!((customers.inserted, customers.skipped), (2, 1));

    let abort = reset_settings(Some(seed_dir.path()), SeedErrorPolicy::Abort);
    let err = bootstrap::run(&settings, &abort, &pool).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::SeedAborted {
            table: "customers",
            line: 3,
            ..
        }
    ));
    assert_eq!(count(&pool, "customers").await, 1);
    assert_eq!(count(&pool, "products").await, 0);
    pool.close().await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL server"]
async fn march_total_sums_quantity_times_price() {
    let _guard = DB_LOCK.lock().await;
    let (repo, pool) = fresh_repo().await;

    let customer = repo
        .insert_customer(&NewCustomer::parse(Some("Ana"), Some("ana@example.com")).unwrap())
        .await
        .unwrap();
    let ten = repo
        .insert_product(&NewProduct::parse(Some("Lamp"), Some("10")).unwrap())
        .await
        .unwrap();
    let five = repo
        .insert_product(&NewProduct::parse(Some("Mug"), Some("5")).unwrap())
        .await
        .unwrap();

    let march = |day| NaiveDate::from_ymd_opt(2025, 3, day).and_then(|d| d.and_hms_opt(12, 0, 0));
    let sale = |product_id, quantity| NewSale {
        customer_id: customer,
        product_id,
        quantity,
    };
    let first = repo.insert_sale(&sale(ten, 2), march(3)).await.unwrap();
    assert_eq!(Some(first.sale_date), march(3));
    repo.insert_sale(&sale(five, 1), march(28)).await.unwrap();
    repo.insert_sale(
        &sale(ten, 7),
        NaiveDate::from_ymd_opt(2024, 3, 1).and_then(|d| d.and_hms_opt(0, 0, 0)),
    )
    .await
    .unwrap();

    let months = repo.monthly_sales(2025).await.unwrap();
    assert_eq!(months.len(), 1);
    assert_eq!(months[0].month, "March");
    assert_eq!(months[0].month_num, 3);
    assert_eq!(months[0].total, dec!(25));
    pool.close().await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL server"]
async fn constraint_violations_are_classified() {
    let _guard = DB_LOCK.lock().await;
    let (repo, pool) = fresh_repo().await;

    let ana = NewCustomer::parse(Some("Ana"), Some("ana@example.com")).unwrap();
    repo.insert_customer(&ana).await.unwrap();
    assert!(matches!(
        repo.insert_customer(&ana).await,
        Err(DbError::UniqueViolation { .. })
    ));

    let orphan = NewSale {
        customer_id: 999,
        product_id: 999,
        quantity: 1,
    };
    assert!(matches!(
        repo.insert_sale(&orphan, None).await,
        Err(DbError::ForeignKeyViolation { .. })
    ));
    assert_eq!(count(&pool, "customers").await, 1);
    assert_eq!(count(&pool, "sales").await, 0);
    pool.close().await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL server"]
async fn sale_date_defaults_to_now() {
    let _guard = DB_LOCK.lock().await;
    let (repo, pool) = fresh_repo().await;

    let customer_id = repo
        .insert_customer(&NewCustomer::parse(Some("Ana"), Some("ana@example.com")).unwrap())
        .await
        .unwrap();
    let product_id = repo
        .insert_product(&NewProduct::parse(Some("Lamp"), Some("10")).unwrap())
        .await
        .unwrap();
    let sale = repo
        .insert_sale(
            &NewSale {
                customer_id,
                product_id,
                quantity: 3,
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(
        (sale.customer_id, sale.product_id, sale.quantity),
        (customer_id, product_id, 3)
    );

    let now: NaiveDateTime = sqlx::query_scalar("SELECT LOCALTIMESTAMP")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!((now - sale.sale_date).num_seconds().abs() < 60);
    pool.close().await;
}
