//! Demo retail schema for trying the retriever against a realistic database.
//!
//! Eleven tables (users, orders, products, order_items, payments, inventory,
//! suppliers, shipments, reviews, employees, departments) with a handful of
//! foreign keys between them, plus a small set of rows.

use crate::error::{Result, RetrievalError};
use sqlx::SqlitePool;
use tracing::info;

/// DDL of the demo tables, in dependency order.
pub const DEMO_TABLES: &[(&str, &str)] = &[
    (
        "users",
        r#"CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT, city TEXT, age INTEGER, email TEXT
        )"#,
    ),
    (
        "orders",
        r#"CREATE TABLE IF NOT EXISTS orders (
            order_id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER,
            order_date TEXT,
            total_amount REAL,
            FOREIGN KEY(user_id) REFERENCES users(id)
        )"#,
    ),
    (
        "products",
        r#"CREATE TABLE IF NOT EXISTS products (
            product_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            category TEXT,
            price REAL
        )"#,
    ),
    (
        "order_items",
        r#"CREATE TABLE IF NOT EXISTS order_items (
            order_item_id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id INTEGER,
            product_id INTEGER,
            quantity INTEGER,
            FOREIGN KEY(order_id) REFERENCES orders(order_id),
            FOREIGN KEY(product_id) REFERENCES products(product_id)
        )"#,
    ),
    (
        "payments",
        r#"CREATE TABLE IF NOT EXISTS payments (
            payment_id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id INTEGER,
            amount REAL,
            payment_method TEXT,
            payment_date TEXT
        )"#,
    ),
    (
        "inventory",
        r#"CREATE TABLE IF NOT EXISTS inventory (
            item_id INTEGER PRIMARY KEY AUTOINCREMENT,
            product_id INTEGER,
            stock_quantity INTEGER,
            last_updated TEXT
        )"#,
    ),
    (
        "suppliers",
        r#"CREATE TABLE IF NOT EXISTS suppliers (
            supplier_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            contact_email TEXT,
            city TEXT
        )"#,
    ),
    (
        "shipments",
        r#"CREATE TABLE IF NOT EXISTS shipments (
            shipment_id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id INTEGER,
            shipped_date TEXT,
            delivery_status TEXT
        )"#,
    ),
    (
        "reviews",
        r#"CREATE TABLE IF NOT EXISTS reviews (
            review_id INTEGER PRIMARY KEY AUTOINCREMENT,
            product_id INTEGER,
            user_id INTEGER,
            rating INTEGER,
            comment TEXT
        )"#,
    ),
    (
        "employees",
        r#"CREATE TABLE IF NOT EXISTS employees (
            employee_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            department TEXT,
            salary REAL,
            hire_date TEXT
        )"#,
    ),
    (
        "departments",
        r#"CREATE TABLE IF NOT EXISTS departments (
            dept_id INTEGER PRIMARY KEY AUTOINCREMENT,
            dept_name TEXT,
            manager_id INTEGER
        )"#,
    ),
];

const USERS: &[(&str, &str, i64, &str)] = &[
    ("Karthikeya", "Hyderabad", 27, "karthikeya@example.com"),
    ("Ravi", "Bangalore", 30, "ravi@example.com"),
    ("Sneha", "Hyderabad", 25, "sneha@example.com"),
    ("John", "Delhi", 28, "john@example.com"),
    ("Aditi", "Hyderabad", 29, "aditi@example.com"),
];

const PRODUCTS: &[(&str, &str, f64)] = &[
    ("iPhone 15", "Phones", 1299.0),
    ("Pixel 9", "Phones", 999.0),
    ("MacBook Air", "Laptops", 1499.0),
    ("ThinkPad X1", "Laptops", 1799.0),
    ("Sony WH-1000XM5", "Audio", 399.0),
];

const SUPPLIERS: &[(&str, &str, &str)] = &[
    ("TechSource", "contact@techsource.com", "Hyderabad"),
    ("GadgetHub", "hello@gadgethub.com", "Bangalore"),
    ("AudioWorld", "support@audioworld.com", "Mumbai"),
];

const ORDERS: &[(i64, &str, f64)] = &[
    (1, "2025-10-01", 1698.0),
    (2, "2025-10-02", 399.0),
    (3, "2025-10-03", 2298.0),
];

/// (order_id, product_id, quantity)
const ORDER_ITEMS: &[(i64, i64, i64)] = &[(1, 1, 1), (1, 5, 1), (2, 5, 1), (3, 3, 1), (3, 2, 1)];

const PAYMENTS: &[(i64, f64, &str, &str)] = &[
    (1, 1698.0, "UPI", "2025-10-01"),
    (2, 399.0, "CARD", "2025-10-02"),
    (3, 2298.0, "UPI", "2025-10-03"),
];

const INVENTORY: &[(i64, i64, &str)] = &[
    (1, 10, "2025-10-01"),
    (2, 15, "2025-10-04"),
    (3, 5, "2025-10-01"),
    (4, 3, "2025-10-02"),
    (5, 20, "2025-10-03"),
];

const SHIPMENTS: &[(i64, &str, &str)] = &[
    (1, "2025-10-02", "Delivered"),
    (2, "2025-10-03", "In Transit"),
    (3, "2025-10-04", "Processing"),
];

/// (product_id, user_id, rating, comment)
const REVIEWS: &[(i64, i64, i64, &str)] = &[
    (1, 1, 5, "Loved it"),
    (5, 2, 4, "Great sound"),
    (3, 3, 5, "Perfect for travel"),
];

const EMPLOYEES: &[(&str, &str, f64, &str)] = &[
    ("Priya", "Sales", 1_200_000.0, "2024-06-01"),
    ("Nikhil", "Ops", 900_000.0, "2025-01-10"),
];

const DEPARTMENTS: &[(&str, i64)] = &[("Sales", 1), ("Ops", 2)];

/// Create any missing demo tables. Existing tables are left alone.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    for &(name, ddl) in DEMO_TABLES {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(RetrievalError::store("demo_init_schema"))?;
        tracing::debug!("Ensured demo table {}", name);
    }
    info!("Demo schema ready ({} tables)", DEMO_TABLES.len());
    Ok(())
}

/// Insert the demo rows in one transaction.
///
/// Returns `false` without writing anything when `users` already has rows.
pub async fn seed(pool: &SqlitePool) -> Result<bool> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .map_err(RetrievalError::store("demo_seed"))?;
    if existing > 0 {
        info!("Demo data already present ({} users), skipping seed", existing);
        return Ok(false);
    }

    let mut tx = pool.begin().await.map_err(RetrievalError::store("demo_seed"))?;
    let result: std::result::Result<(), sqlx::Error> = async {
        for &(name, city, age, email) in USERS {
            sqlx::query("INSERT INTO users (name, city, age, email) VALUES (?1, ?2, ?3, ?4)")
                .bind(name)
                .bind(city)
                .bind(age)
                .bind(email)
                .execute(&mut *tx)
                .await?;
        }
        for &(name, category, price) in PRODUCTS {
            sqlx::query("INSERT INTO products (name, category, price) VALUES (?1, ?2, ?3)")
                .bind(name)
                .bind(category)
                .bind(price)
                .execute(&mut *tx)
                .await?;
        }
        for &(name, email, city) in SUPPLIERS {
            sqlx::query("INSERT INTO suppliers (name, contact_email, city) VALUES (?1, ?2, ?3)")
                .bind(name)
                .bind(email)
                .bind(city)
                .execute(&mut *tx)
                .await?;
        }
        for &(user_id, date, total) in ORDERS {
            sqlx::query("INSERT INTO orders (user_id, order_date, total_amount) VALUES (?1, ?2, ?3)")
                .bind(user_id)
                .bind(date)
                .bind(total)
                .execute(&mut *tx)
                .await?;
        }
        for &(order_id, product_id, quantity) in ORDER_ITEMS {
            sqlx::query("INSERT INTO order_items (order_id, product_id, quantity) VALUES (?1, ?2, ?3)")
                .bind(order_id)
                .bind(product_id)
                .bind(quantity)
                .execute(&mut *tx)
                .await?;
        }
        for &(order_id, amount, method, date) in PAYMENTS {
            sqlx::query(
                "INSERT INTO payments (order_id, amount, payment_method, payment_date) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(order_id)
            .bind(amount)
            .bind(method)
            .bind(date)
            .execute(&mut *tx)
            .await?;
        }
        for &(product_id, stock, updated) in INVENTORY {
            sqlx::query(
                "INSERT INTO inventory (product_id, stock_quantity, last_updated) VALUES (?1, ?2, ?3)",
            )
            .bind(product_id)
            .bind(stock)
            .bind(updated)
            .execute(&mut *tx)
            .await?;
        }
        for &(order_id, shipped, status) in SHIPMENTS {
            sqlx::query(
                "INSERT INTO shipments (order_id, shipped_date, delivery_status) VALUES (?1, ?2, ?3)",
            )
            .bind(order_id)
            .bind(shipped)
            .bind(status)
            .execute(&mut *tx)
            .await?;
        }
        for &(product_id, user_id, rating, comment) in REVIEWS {
            sqlx::query(
                "INSERT INTO reviews (product_id, user_id, rating, comment) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(product_id)
            .bind(user_id)
            .bind(rating)
            .bind(comment)
            .execute(&mut *tx)
            .await?;
        }
        for &(name, department, salary, hired) in EMPLOYEES {
            sqlx::query(
                "INSERT INTO employees (name, department, salary, hire_date) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(name)
            .bind(department)
            .bind(salary)
            .bind(hired)
            .execute(&mut *tx)
            .await?;
        }
        for &(name, manager_id) in DEPARTMENTS {
            sqlx::query("INSERT INTO departments (dept_name, manager_id) VALUES (?1, ?2)")
                .bind(name)
                .bind(manager_id)
                .execute(&mut *tx)
                .await?;
        }
        Ok(())
    }
    .await;

    result.map_err(RetrievalError::store("demo_seed"))?;
    tx.commit().await.map_err(RetrievalError::store("demo_seed"))?;

    info!("Seeded demo data");
    Ok(true)
}
