use std::sync::Arc;

use crate::config::DatabaseConfig;
use crate::store::EntityStore;

#[cfg(feature = "database")]
use async_trait::async_trait;
#[cfg(feature = "database")]
use chrono::Utc;
#[cfg(feature = "database")]
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Row, SqlitePool};
#[cfg(feature = "database")]
use tracing::{debug, info};

#[cfg(feature = "database")]
use crate::entities::{EntityId, EntityKind};
#[cfg(feature = "database")]
use crate::store::{Field, FieldValue, Filter, Patch, Record, StoreError};

#[cfg(feature = "database")]
impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Backend {
            message: e.to_string(),
        }
    }
}

#[cfg(feature = "database")]
/// SQLite-backed entity store.
///
/// One table per entity kind holding the record as JSON, with the customer
/// reference copied into an indexed column so per-customer queries stay cheap.
/// Remaining predicates are evaluated on the decoded records.
pub struct SqliteStore {
    pool: SqlitePool,
}

#[cfg(feature = "database")]
impl SqliteStore {
    /// Open the database, creating it and running migrations as configured
    pub async fn new(config: &DatabaseConfig) -> Result<Self, StoreError> {
        if !sqlx::Sqlite::database_exists(&config.url).await? {
            info!("Creating database at {}", config.url);
            sqlx::Sqlite::create_database(&config.url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;

        if config.auto_migrate {
            info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| StoreError::Backend {
                    message: e.to_string(),
                })?;
            info!("Database migrations completed");
        }

        Ok(Self { pool })
    }

    fn decode(body: &str) -> Result<Record, StoreError> {
        Ok(serde_json::from_str(body)?)
    }

    fn customer_column(record: &Record) -> Option<String> {
        match record.field(Field::CustomerId) {
            Some(FieldValue::Id(id)) => Some(id.as_str().to_string()),
            _ => None,
        }
    }
}

#[cfg(feature = "database")]
#[async_trait]
impl EntityStore for SqliteStore {
    async fn read(&self, kind: EntityKind, id: &EntityId) -> Result<Record, StoreError> {
        let sql = format!("SELECT body FROM {} WHERE id = ?1", kind.table_name());
        let row = sqlx::query(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Self::decode(row.get::<&str, _>("body")),
            None => Err(StoreError::NotFound {
                kind,
                id: id.clone(),
            }),
        }
    }

    async fn query(&self, kind: EntityKind, filter: &Filter) -> Result<Vec<Record>, StoreError> {
        let rows = match filter.equality_on(Field::CustomerId) {
            Some(FieldValue::Id(customer)) => {
                let sql = format!(
                    "SELECT body FROM {} WHERE customer_id = ?1 ORDER BY id",
                    kind.table_name()
                );
                sqlx::query(&sql)
                    .bind(customer.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            Some(FieldValue::Null) => {
                let sql = format!(
                    "SELECT body FROM {} WHERE customer_id IS NULL ORDER BY id",
                    kind.table_name()
                );
                sqlx::query(&sql).fetch_all(&self.pool).await?
            }
            _ => {
                let sql = format!("SELECT body FROM {} ORDER BY id", kind.table_name());
                sqlx::query(&sql).fetch_all(&self.pool).await?
            }
        };

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let record = Self::decode(row.get::<&str, _>("body"))?;
            if filter.matches(&record) {
                records.push(record);
            }
        }
        Ok(records)
    }

    async fn write(&self, kind: EntityKind, id: &EntityId, patch: &Patch) -> Result<(), StoreError> {
        if patch.kind() != kind {
            return Err(StoreError::KindMismatch {
                expected: kind,
                found: patch.kind(),
            });
        }

        // Read, patch and write back in one transaction so the revision check cannot race
        let mut tx = self.pool.begin().await?;
        let select = format!("SELECT body FROM {} WHERE id = ?1", kind.table_name());
        let row = sqlx::query(&select)
            .bind(id.as_str())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                kind,
                id: id.clone(),
            })?;

        let mut record = Self::decode(row.get::<&str, _>("body"))?;
        record.apply(patch, Utc::now())?;

        let update = format!(
            "UPDATE {} SET customer_id = ?1, body = ?2 WHERE id = ?3",
            kind.table_name()
        );
        sqlx::query(&update)
            .bind(Self::customer_column(&record))
            .bind(serde_json::to_string(&record)?)
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(kind = %kind, id = %id, "Record updated");
        Ok(())
    }

    async fn insert(&self, record: Record) -> Result<EntityId, StoreError> {
        let kind = record.kind();
        let id = record.id().clone();
        let sql = format!(
            "INSERT INTO {} (id, customer_id, body) VALUES (?1, ?2, ?3)",
            kind.table_name()
        );

        let result = sqlx::query(&sql)
            .bind(id.as_str())
            .bind(Self::customer_column(&record))
            .bind(serde_json::to_string(&record)?)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => {
                debug!(kind = %kind, id = %id, "Record inserted");
                Ok(id)
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::AlreadyExists { kind, id })
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(feature = "database")]
/// Open the configured SQLite store
pub async fn open_database(config: &DatabaseConfig) -> anyhow::Result<Arc<dyn EntityStore>> {
    info!("Initializing database at {}", config.url);
    let store = SqliteStore::new(config).await?;
    Ok(Arc::new(store))
}

// Stub implementation for when database feature is not enabled
#[cfg(not(feature = "database"))]
pub async fn open_database(config: &DatabaseConfig) -> anyhow::Result<Arc<dyn EntityStore>> {
    tracing::warn!(url = %config.url, "Database configured but the database feature is not enabled");
    anyhow::bail!(
        "store.database is configured ({}) but fireops was built without the `database` feature",
        config.url
    )
}

#[cfg(all(test, feature = "database"))]
mod tests {
    use super::*;
    use crate::entities::{Customer, Order, OrderStatus};

    async fn store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("fireops.db").display());
        let store = SqliteStore::new(&DatabaseConfig {
            url,
            max_connections: 1,
            auto_migrate: true,
        })
        .await
        .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_insert_query_and_revision_checked_write() {
        let (_dir, store) = store().await;
        store
            .insert(Record::Customer(Customer::new("Nordbygg AS").with_id("c-1")))
            .await
            .unwrap();
        store
            .insert(Record::Order(
                Order::new("c-1".into(), "f-1".into(), "Service").with_id("o-1"),
            ))
            .await
            .unwrap();

        let orders = store
            .query(
                EntityKind::Order,
                &Filter::all().where_eq(Field::CustomerId, &EntityId::new("c-1")),
            )
            .await
            .unwrap();
        assert_eq!(orders.len(), 1);

        store
            .write(
                EntityKind::Order,
                &"o-1".into(),
                &Patch::order_status(OrderStatus::Completed, 0),
            )
            .await
            .unwrap();
        let stale = store
            .write(
                EntityKind::Order,
                &"o-1".into(),
                &Patch::order_status(OrderStatus::Completed, 0),
            )
            .await;
        assert!(matches!(stale, Err(StoreError::RevisionConflict { .. })));
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_rejected() {
        let (_dir, store) = store().await;
        let customer = Customer::new("Lia").with_id("c-1");
        store.insert(Record::Customer(customer.clone())).await.unwrap();
        let err = store.insert(Record::Customer(customer)).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }
}
