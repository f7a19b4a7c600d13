//! Schema bootstrap for the procurement table.
//!
//! The table name is configuration, so statements are rendered per collection
//! instead of being embedded as static migration files. Every statement is
//! idempotent and `run_pending` may be called on every start.

use penny_core::config::is_valid_collection_name;

use crate::repositories::RepositoryError;
use crate::DbPool;

pub fn schema_statements(collection: &str) -> Result<Vec<String>, RepositoryError> {
    if !is_valid_collection_name(collection) {
        return Err(RepositoryError::InvalidCollection(collection.to_string()));
    }

    Ok(vec![
        format!(
            "CREATE TABLE IF NOT EXISTS {collection} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                creation_date TEXT NOT NULL,
                total_price_cents INTEGER NOT NULL,
                item_name TEXT NOT NULL,
                supplier_code INTEGER NOT NULL,
                supplier_name TEXT NOT NULL,
                department_name TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                acquisition_type TEXT NOT NULL,
                location TEXT NOT NULL
            )"
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_{collection}_creation_date
             ON {collection} (creation_date)"
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_{collection}_supplier_code
             ON {collection} (supplier_code)"
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_{collection}_department_name
             ON {collection} (department_name)"
        ),
    ])
}

pub async fn run_pending(pool: &DbPool, collection: &str) -> Result<(), RepositoryError> {
    let statements = schema_statements(collection)?;
    let mut tx = pool.begin().await?;
    for statement in &statements {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    Ok(())
}

pub async fn table_exists(pool: &DbPool, collection: &str) -> Result<bool, RepositoryError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(collection)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}
