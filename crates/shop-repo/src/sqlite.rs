use std::collections::BTreeSet;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use shop_types::domain::order::{Order, OrderLine};
use shop_types::domain::product::{Product, ProductUpdate, Reservation};
use shop_types::domain::user::{User, UserUpdate};
use shop_types::ports::order_repository::OrderRepository;
use shop_types::ports::product_repository::ProductRepository;
use shop_types::ports::user_repository::UserRepository;
use shop_types::ports::RepoError;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{FromRow, SqlitePool};

const MIGRATIONS: [&str; 3] = [
    include_str!("../migrations/0001_create_products.sql"),
    include_str!("../migrations/0002_create_users.sql"),
    include_str!("../migrations/0003_create_orders.sql"),
];

const PRODUCT_COLUMNS: &str =
    "id, description, quantity, tags_json, unit_price_cents, created_at, updated_at";
const USER_COLUMNS: &str =
    "id, first_name, last_name, full_name, age, is_married, password, created_at, updated_at";
const ORDER_COLUMNS: &str = "id, user_id, line_items_json, total_cents, timestamp";

pub struct SqliteRepo {
    pool: SqlitePool,
}

fn db_err(e: impl std::fmt::Display) -> RepoError {
    RepoError::DbError(e.to_string())
}

fn insert_err(id: &str, e: sqlx::Error) -> RepoError {
    let unique = e
        .as_database_error()
        .map(|d| d.is_unique_violation())
        .unwrap_or(false);
    if unique {
        RepoError::Conflict(id.to_string())
    } else {
        db_err(e)
    }
}

// Fixed-width timestamps keep ORDER BY on the text column chronological.
fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>, RepoError> {
    Ok(DateTime::parse_from_rfc3339(s)
        .map_err(db_err)?
        .with_timezone(&Utc))
}

fn parse_opt_ts(s: Option<String>) -> Result<Option<DateTime<Utc>>, RepoError> {
    s.as_deref().map(parse_ts).transpose()
}

fn stock_from_db(quantity: i64) -> Result<u32, RepoError> {
    u32::try_from(quantity).map_err(db_err)
}

#[derive(FromRow)]
struct DbProduct {
    id: String,
    description: String,
    quantity: i64,
    tags_json: String,
    unit_price_cents: i64,
    created_at: String,
    updated_at: Option<String>,
}

impl DbProduct {
    fn into_product(self) -> Result<Product, RepoError> {
        let tags: BTreeSet<String> = serde_json::from_str(&self.tags_json).map_err(db_err)?;
        Ok(Product {
            id: self.id,
            description: self.description,
            quantity: stock_from_db(self.quantity)?,
            tags,
            unit_price_cents: self.unit_price_cents,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_opt_ts(self.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbUser {
    id: String,
    first_name: String,
    last_name: String,
    full_name: String,
    age: i64,
    is_married: bool,
    password: String,
    created_at: String,
    updated_at: Option<String>,
}

impl DbUser {
    fn into_user(self) -> Result<User, RepoError> {
        Ok(User {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            full_name: self.full_name,
            age: u32::try_from(self.age).map_err(db_err)?,
            is_married: self.is_married,
            password: self.password,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_opt_ts(self.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbOrder {
    id: String,
    user_id: String,
    line_items_json: String,
    total_cents: i64,
    timestamp: String,
}

impl DbOrder {
    fn into_order(self) -> Result<Order, RepoError> {
        let line_items: Vec<OrderLine> =
            serde_json::from_str(&self.line_items_json).map_err(db_err)?;
        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            line_items,
            total_cents: self.total_cents,
            timestamp: parse_ts(&self.timestamp)?,
        })
    }
}

impl SqliteRepo {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        for ddl in MIGRATIONS {
            sqlx::query(ddl).execute(&pool).await?;
        }
        tracing::debug!(database_url, "sqlite schema ready");

        Ok(Self { pool })
    }
}

#[async_trait]
impl ProductRepository for SqliteRepo {
    async fn create_product(&self, product: Product) -> Result<Product, RepoError> {
        let tags_json = serde_json::to_string(&product.tags).map_err(db_err)?;
        sqlx::query(
            "INSERT INTO products (id, description, quantity, tags_json, unit_price_cents, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&product.id)
        .bind(&product.description)
        .bind(i64::from(product.quantity))
        .bind(tags_json)
        .bind(product.unit_price_cents)
        .bind(fmt_ts(&product.created_at))
        .bind(product.updated_at.as_ref().map(fmt_ts))
        .execute(&self.pool)
        .await
        .map_err(|e| insert_err(&product.id, e))?;
        Ok(product)
    }

    async fn get_product(&self, id: &str) -> Result<Option<Product>, RepoError> {
        let row: Option<DbProduct> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        row.map(|r| r.into_product()).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepoError> {
        let rows: Vec<DbProduct> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter()
            .map(|r| r.into_product())
            .collect::<Result<Vec<_>, _>>()
    }

    async fn update_product(&self, update: ProductUpdate) -> Result<bool, RepoError> {
        let tags_json = serde_json::to_string(&update.tags).map_err(db_err)?;
        let res = sqlx::query(
            "UPDATE products SET description = ?, quantity = ?, tags_json = ?, unit_price_cents = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&update.description)
        .bind(i64::from(update.quantity))
        .bind(tags_json)
        .bind(update.unit_price_cents)
        .bind(fmt_ts(&update.updated_at))
        .bind(&update.id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_product(&self, id: &str) -> Result<bool, RepoError> {
        let res = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }

    async fn reserve_stock(
        &self,
        product_id: &str,
        quantity: u32,
    ) -> Result<Reservation, RepoError> {
        let wanted = i64::from(quantity);
        // Conditional decrement: SQLite serializes writers, so the guard and the
        // subtraction cannot interleave with another reservation.
        let taken: Option<(i64,)> = sqlx::query_as(
            "UPDATE products SET quantity = quantity - ?
             WHERE id = ? AND quantity >= ?
             RETURNING unit_price_cents",
        )
        .bind(wanted)
        .bind(product_id)
        .bind(wanted)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        if let Some((unit_price_cents,)) = taken {
            return Ok(Reservation {
                product_id: product_id.to_string(),
                quantity,
                unit_price_cents,
            });
        }

        // Nothing matched: classify the refusal.
        let current: Option<(i64,)> = sqlx::query_as("SELECT quantity FROM products WHERE id = ?")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        match current {
            None => Err(RepoError::NotFound(format!("product {product_id}"))),
            Some((available,)) => Err(RepoError::InsufficientStock {
                product_id: product_id.to_string(),
                requested: quantity,
                available: stock_from_db(available)?,
            }),
        }
    }

    async fn release_stock(&self, reservation: &Reservation) -> Result<bool, RepoError> {
        let res = sqlx::query("UPDATE products SET quantity = quantity + ? WHERE id = ?")
            .bind(i64::from(reservation.quantity))
            .bind(&reservation.product_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl UserRepository for SqliteRepo {
    async fn create_user(&self, user: User) -> Result<User, RepoError> {
        sqlx::query(
            "INSERT INTO users (id, first_name, last_name, full_name, age, is_married, password, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.full_name)
        .bind(i64::from(user.age))
        .bind(user.is_married)
        .bind(&user.password)
        .bind(fmt_ts(&user.created_at))
        .bind(user.updated_at.as_ref().map(fmt_ts))
        .execute(&self.pool)
        .await
        .map_err(|e| insert_err(&user.id, e))?;
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, RepoError> {
        let row: Option<DbUser> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        row.map(|r| r.into_user()).transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>, RepoError> {
        let rows: Vec<DbUser> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter()
            .map(|r| r.into_user())
            .collect::<Result<Vec<_>, _>>()
    }

    async fn find_users_by_first_name(&self, first_name: &str) -> Result<Vec<User>, RepoError> {
        let rows: Vec<DbUser> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE first_name = ? ORDER BY created_at, id"
        ))
        .bind(first_name)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter()
            .map(|r| r.into_user())
            .collect::<Result<Vec<_>, _>>()
    }

    async fn update_user(&self, update: UserUpdate) -> Result<bool, RepoError> {
        let res = sqlx::query(
            "UPDATE users SET first_name = ?, last_name = ?, full_name = ?, age = ?, is_married = ?, password = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(update.full_name())
        .bind(i64::from(update.age))
        .bind(update.is_married)
        .bind(&update.password)
        .bind(fmt_ts(&update.updated_at))
        .bind(&update.id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_user(&self, id: &str) -> Result<bool, RepoError> {
        let res = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl OrderRepository for SqliteRepo {
    async fn append_order(&self, order: Order) -> Result<Order, RepoError> {
        let line_items_json = serde_json::to_string(&order.line_items).map_err(db_err)?;
        sqlx::query(
            "INSERT INTO orders (id, user_id, line_items_json, total_cents, timestamp)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(line_items_json)
        .bind(order.total_cents)
        .bind(fmt_ts(&order.timestamp))
        .execute(&self.pool)
        .await
        .map_err(|e| insert_err(&order.id, e))?;
        Ok(order)
    }

    async fn get_order(&self, id: &str) -> Result<Option<Order>, RepoError> {
        let row: Option<DbOrder> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        row.map(|r| r.into_order()).transpose()
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepoError> {
        let rows: Vec<DbOrder> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY timestamp, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter()
            .map(|r| r.into_order())
            .collect::<Result<Vec<_>, _>>()
    }

    async fn list_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, RepoError> {
        let rows: Vec<DbOrder> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ? ORDER BY timestamp, id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter()
            .map(|r| r.into_order())
            .collect::<Result<Vec<_>, _>>()
    }
}
