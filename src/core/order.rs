//! Order validation, commit, and the durable order log
//!
//! `validate` reports the specific missing fields so the dialogue engine can
//! route the customer back to the right collection phase. `commit` is the
//! single point where session state becomes durable: validate, stamp, snapshot
//! the cart, one append to the SQLite log.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use uuid::Uuid;

use crate::config::MenuCatalog;
use crate::core::extract;
use crate::core::session::{LineItem, Session};

/// A reason the order cannot be committed yet. Indices are 1-based, matching
/// the summary the customer hears.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingField {
    Items,
    ItemName { index: usize },
    ItemSize { index: usize },
    Address,
    Phone,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingField::Items => write!(f, "items"),
            MissingField::ItemName { index } => write!(f, "name for item {index}"),
            MissingField::ItemSize { index } => write!(f, "size for item {index}"),
            MissingField::Address => write!(f, "valid address"),
            MissingField::Phone => write!(f, "valid phone number"),
        }
    }
}

fn missing_list(fields: &[MissingField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Missing details: {}", missing_list(.0))]
    Incomplete(Vec<MissingField>),

    #[error("order log error: {0}")]
    Store(#[from] sqlx::Error),
}

impl OrderError {
    pub fn missing_fields(&self) -> &[MissingField] {
        match self {
            OrderError::Incomplete(fields) => fields,
            OrderError::Store(_) => &[],
        }
    }
}

/// The persisted record, created exactly once per successful commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmedOrder {
    pub order_id: String,
    pub timestamp: DateTime<Utc>,
    pub items: Vec<LineItem>,
    pub address: String,
    pub phone: String,
    pub total_items: u32,
    pub status: String,
}

/// Check cart, per-item slots, address, and phone. Size is required only for
/// categories that need one.
pub fn validate(session: &Session, catalog: &MenuCatalog) -> Result<(), Vec<MissingField>> {
    let mut missing = Vec::new();

    if session.cart.is_empty() {
        missing.push(MissingField::Items);
    } else {
        for (i, item) in session.cart.iter().enumerate() {
            let index = i + 1;
            if item.name.trim().is_empty() || item.name.contains("...") {
                missing.push(MissingField::ItemName { index });
            }
            if catalog.requires_size(&item.category) {
                let size_ok = item
                    .size
                    .as_deref()
                    .is_some_and(|s| !s.trim().is_empty() && !s.contains("..."));
                if !size_ok {
                    missing.push(MissingField::ItemSize { index });
                }
            }
        }
    }

    if !extract::is_valid_address(session.address.as_deref().unwrap_or("")) {
        missing.push(MissingField::Address);
    }
    if !extract::is_valid_phone(session.phone.as_deref().unwrap_or("")) {
        missing.push(MissingField::Phone);
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(missing)
    }
}

/// Validate, then persist. Validation failure has no side effects; a store
/// failure surfaces as retryable and writes nothing the caller must undo.
pub async fn commit(
    session: &Session,
    catalog: &MenuCatalog,
    log: &OrderLog,
) -> Result<ConfirmedOrder, OrderError> {
    validate(session, catalog).map_err(OrderError::Incomplete)?;

    let order = ConfirmedOrder {
        order_id: new_order_id(),
        timestamp: Utc::now(),
        items: session.cart.clone(),
        address: session.address.clone().unwrap_or_default(),
        phone: session.phone.clone().unwrap_or_default(),
        total_items: session.cart.len() as u32,
        status: "confirmed".to_string(),
    };

    log.append(&order).await?;
    tracing::info!(order_id = %order.order_id, items = order.total_items, "order committed");
    Ok(order)
}

fn new_order_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("ORD-{}", id[..8].to_uppercase())
}

/// Append-only order store backed by SQLite.
pub struct OrderLog {
    pool: SqlitePool,
}

impl OrderLog {
    /// Open (or create) the order log at the given path.
    pub async fn new(db_path: &Path) -> Result<Self, sqlx::Error> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let log = Self { pool };
        log.init_schema().await?;
        Ok(log)
    }

    /// In-memory log for tests.
    pub async fn new_in_memory_async() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let log = Self { pool };
        log.init_schema().await?;
        Ok(log)
    }

    async fn init_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                order_id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                items TEXT NOT NULL,
                address TEXT NOT NULL,
                phone TEXT NOT NULL,
                total_items INTEGER NOT NULL,
                status TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// One insert per commit.
    pub async fn append(&self, order: &ConfirmedOrder) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO orders (order_id, created_at, items, address, phone, total_items, status)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&order.order_id)
        .bind(order.timestamp.to_rfc3339())
        .bind(serde_json::to_string(&order.items).unwrap_or_default())
        .bind(&order.address)
        .bind(&order.phone)
        .bind(order.total_items as i64)
        .bind(&order.status)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::Session;

    fn session_with_cart() -> Session {
        let mut session = Session::new("prompt", 10);
        session.cart.push(LineItem {
            category: "Pizza".to_string(),
            name: "Chicken Surprise".to_string(),
            size: Some("Large".to_string()),
            quantity: 2,
            special_request: None,
        });
        session
    }

    #[test]
    fn empty_cart_fails_validation() {
        let session = Session::new("prompt", 10);
        let missing = validate(&session, &MenuCatalog::sample()).unwrap_err();
        assert!(missing.contains(&MissingField::Items));
        assert!(missing.contains(&MissingField::Address));
        assert!(missing.contains(&MissingField::Phone));
    }

    #[test]
    fn pizza_without_size_fails_per_item() {
        let mut session = session_with_cart();
        session.cart[0].size = None;
        session.address = Some("12 Baker Street".into());
        session.phone = Some("03001234567".into());

        let missing = validate(&session, &MenuCatalog::sample()).unwrap_err();
        assert_eq!(missing, vec![MissingField::ItemSize { index: 1 }]);
        assert_eq!(missing[0].to_string(), "size for item 1");
    }

    #[test]
    fn sizeless_category_passes_without_size() {
        let mut session = Session::new("prompt", 10);
        session.cart.push(LineItem {
            category: "Drinks".to_string(),
            name: "Cola".to_string(),
            size: None,
            quantity: 1,
            special_request: None,
        });
        session.address = Some("12 Baker Street".into());
        session.phone = Some("03001234567".into());

        assert!(validate(&session, &MenuCatalog::sample()).is_ok());
    }

    #[tokio::test]
    async fn commit_missing_address_writes_nothing() {
        let log = OrderLog::new_in_memory_async().await.unwrap();
        let mut session = session_with_cart();
        session.phone = Some("03001234567".into());

        let err = commit(&session, &MenuCatalog::sample(), &log)
            .await
            .unwrap_err();
        assert_eq!(err.missing_fields(), &[MissingField::Address]);
        assert_eq!(err.to_string(), "Missing details: valid address");
        assert_eq!(log.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn commit_appends_exactly_one_record() {
        let log = OrderLog::new_in_memory_async().await.unwrap();
        let mut session = session_with_cart();
        session.address = Some("12 Baker Street".into());
        session.phone = Some("03001234567".into());

        let order = commit(&session, &MenuCatalog::sample(), &log)
            .await
            .unwrap();
        assert!(order.order_id.starts_with("ORD-"));
        assert_eq!(order.total_items, 1);
        assert_eq!(order.status, "confirmed");
        assert_eq!(order.items[0].name, "Chicken Surprise");
        assert_eq!(log.count().await.unwrap(), 1);
    }
}
