use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::Row;

use penny_core::config::is_valid_collection_name;
use penny_core::domain::procurement::{ProcurementRecord, SupplierCode};
use penny_core::domain::query::{
    DepartmentMatch, DepartmentSpend, ItemFrequency, ItemQuantity, PeriodSpend, SupplierSpend,
};
use penny_core::domain::window::TimeWindow;

use super::{ProcurementRepository, RepositoryError};
use crate::DbPool;

/// Stored timestamp format. Fixed width so text comparison matches time order
/// and the first seven characters are the `YYYY-MM` period.
pub const CREATION_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub struct SqlProcurementRepository {
    pool: DbPool,
    collection: String,
}

impl SqlProcurementRepository {
    pub fn new(pool: DbPool, collection: impl Into<String>) -> Result<Self, RepositoryError> {
        let collection = collection.into();
        if !is_valid_collection_name(&collection) {
            return Err(RepositoryError::InvalidCollection(collection));
        }
        Ok(Self { pool, collection })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn window_clause(window: &TimeWindow) -> &'static str {
        if window.to_inclusive {
            "creation_date >= ? AND creation_date <= ?"
        } else {
            "creation_date >= ? AND creation_date < ?"
        }
    }
}

pub fn format_creation_date(at: DateTime<Utc>) -> String {
    at.format(CREATION_DATE_FORMAT).to_string()
}

fn parse_creation_date(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    NaiveDateTime::parse_from_str(raw, CREATION_DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| RepositoryError::Decode(format!("creation_date `{raw}`: {e}")))
}

pub fn price_to_cents(price: Decimal) -> Result<i64, RepositoryError> {
    (price * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .ok_or_else(|| RepositoryError::Encode(format!("total price {price} is out of range")))
}

pub fn cents_to_price(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<ProcurementRecord, RepositoryError> {
    let creation_date: String =
        row.try_get("creation_date").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let total_price_cents: i64 =
        row.try_get("total_price_cents").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let item_name: String =
        row.try_get("item_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let supplier_code: i64 =
        row.try_get("supplier_code").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let supplier_name: String =
        row.try_get("supplier_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let department_name: String =
        row.try_get("department_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let quantity: i64 =
        row.try_get("quantity").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let acquisition_type: String =
        row.try_get("acquisition_type").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let location: String =
        row.try_get("location").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(ProcurementRecord {
        creation_date: parse_creation_date(&creation_date)?,
        total_price: cents_to_price(total_price_cents),
        item_name,
        supplier_code: SupplierCode(supplier_code),
        supplier_name,
        department_name,
        quantity,
        acquisition_type,
        location,
    })
}

#[async_trait::async_trait]
impl ProcurementRepository for SqlProcurementRepository {
    async fn count_created_between(&self, window: &TimeWindow) -> Result<i64, RepositoryError> {
        let sql = format!(
            "SELECT COUNT(1) FROM {} WHERE {}",
            self.collection,
            Self::window_clause(window)
        );
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(format_creation_date(window.from))
            .bind(format_creation_date(window.to))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn highest_spending_period(&self) -> Result<Option<PeriodSpend>, RepositoryError> {
        let sql = format!(
            "SELECT substr(creation_date, 1, 7) AS period, SUM(total_price_cents) AS total_cents
             FROM {}
             GROUP BY period
             ORDER BY total_cents DESC, period ASC
             LIMIT 1",
            self.collection
        );
        let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;

        match row {
            Some(ref r) => {
                let period: String =
                    r.try_get("period").map_err(|e| RepositoryError::Decode(e.to_string()))?;
                let total_cents: i64 =
                    r.try_get("total_cents").map_err(|e| RepositoryError::Decode(e.to_string()))?;
                Ok(Some(PeriodSpend { period, total: cents_to_price(total_cents) }))
            }
            None => Ok(None),
        }
    }

    async fn most_ordered_items(
        &self,
        limit: u32,
    ) -> Result<Vec<ItemFrequency>, RepositoryError> {
        let sql = format!(
            "SELECT item_name, COUNT(1) AS order_count
             FROM {}
             GROUP BY item_name
             ORDER BY order_count DESC, item_name ASC
             LIMIT ?",
            self.collection
        );
        let rows = sqlx::query(&sql).bind(i64::from(limit)).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| -> Result<ItemFrequency, RepositoryError> {
                Ok(ItemFrequency {
                    item_name: row
                        .try_get("item_name")
                        .map_err(|e| RepositoryError::Decode(e.to_string()))?,
                    count: row
                        .try_get("order_count")
                        .map_err(|e| RepositoryError::Decode(e.to_string()))?,
                })
            })
            .collect()
    }

    async fn find_by_supplier_code(
        &self,
        code: SupplierCode,
    ) -> Result<Option<ProcurementRecord>, RepositoryError> {
        let sql = format!(
            "SELECT creation_date, total_price_cents, item_name, supplier_code, supplier_name,
                    department_name, quantity, acquisition_type, location
             FROM {}
             WHERE supplier_code = ?
             ORDER BY id ASC
             LIMIT 1",
            self.collection
        );
        let row = sqlx::query(&sql).bind(code.0).fetch_optional(&self.pool).await?;

        match row {
            Some(ref r) => Ok(Some(row_to_record(r)?)),
            None => Ok(None),
        }
    }

    async fn supplier_spend(
        &self,
        code: SupplierCode,
    ) -> Result<Option<SupplierSpend>, RepositoryError> {
        let sql = format!(
            "SELECT supplier_name, SUM(total_price_cents) AS total_cents
             FROM {}
             WHERE supplier_code = ?
             GROUP BY supplier_name
             ORDER BY supplier_name ASC
             LIMIT 1",
            self.collection
        );
        let row = sqlx::query(&sql).bind(code.0).fetch_optional(&self.pool).await?;

        match row {
            Some(ref r) => {
                let supplier_name: String = r
                    .try_get("supplier_name")
                    .map_err(|e| RepositoryError::Decode(e.to_string()))?;
                let total_cents: i64 =
                    r.try_get("total_cents").map_err(|e| RepositoryError::Decode(e.to_string()))?;
                Ok(Some(SupplierSpend { supplier_name, total: cents_to_price(total_cents) }))
            }
            None => Ok(None),
        }
    }

    async fn items_by_department(
        &self,
        department: &str,
        mode: DepartmentMatch,
    ) -> Result<Vec<ItemQuantity>, RepositoryError> {
        // SQLite `lower()` folds ASCII only, so substring matching runs in Rust.
        let rows = match mode {
            DepartmentMatch::Exact => {
                let sql = format!(
                    "SELECT department_name, item_name, quantity FROM {}
                     WHERE department_name = ? ORDER BY id ASC",
                    self.collection
                );
                sqlx::query(&sql).bind(department).fetch_all(&self.pool).await?
            }
            DepartmentMatch::Substring => {
                let sql = format!(
                    "SELECT department_name, item_name, quantity FROM {} ORDER BY id ASC",
                    self.collection
                );
                sqlx::query(&sql).fetch_all(&self.pool).await?
            }
        };

        let mut items = Vec::new();
        for row in &rows {
            let stored: String = row
                .try_get("department_name")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?;
            if !mode.matches(&stored, department) {
                continue;
            }
            items.push(ItemQuantity {
                item_name: row
                    .try_get("item_name")
                    .map_err(|e| RepositoryError::Decode(e.to_string()))?,
                quantity: row
                    .try_get("quantity")
                    .map_err(|e| RepositoryError::Decode(e.to_string()))?,
            });
        }
        Ok(items)
    }

    async fn total_cost_between(
        &self,
        window: &TimeWindow,
    ) -> Result<Option<Decimal>, RepositoryError> {
        let sql = format!(
            "SELECT SUM(total_price_cents) FROM {} WHERE {}",
            self.collection,
            Self::window_clause(window)
        );
        let total_cents: Option<i64> = sqlx::query_scalar(&sql)
            .bind(format_creation_date(window.from))
            .bind(format_creation_date(window.to))
            .fetch_one(&self.pool)
            .await?;
        Ok(total_cents.map(cents_to_price))
    }

    async fn department_spending(&self) -> Result<Vec<DepartmentSpend>, RepositoryError> {
        let sql = format!(
            "SELECT department_name, SUM(total_price_cents) AS total_cents
             FROM {}
             GROUP BY department_name
             ORDER BY total_cents DESC, department_name ASC",
            self.collection
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| -> Result<DepartmentSpend, RepositoryError> {
                let total_cents: i64 = row
                    .try_get("total_cents")
                    .map_err(|e| RepositoryError::Decode(e.to_string()))?;
                Ok(DepartmentSpend {
                    department_name: row
                        .try_get("department_name")
                        .map_err(|e| RepositoryError::Decode(e.to_string()))?,
                    total: cents_to_price(total_cents),
                })
            })
            .collect()
    }

    async fn count_by_supplier_code(&self, code: SupplierCode) -> Result<i64, RepositoryError> {
        let sql = format!("SELECT COUNT(1) FROM {} WHERE supplier_code = ?", self.collection);
        let count: i64 = sqlx::query_scalar(&sql).bind(code.0).fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn insert_many(&self, records: &[ProcurementRecord]) -> Result<u64, RepositoryError> {
        let sql = format!(
            "INSERT INTO {} (creation_date, total_price_cents, item_name, supplier_code,
                             supplier_name, department_name, quantity, acquisition_type, location)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            self.collection
        );

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0_u64;
        for record in records {
            let result = sqlx::query(&sql)
                .bind(format_creation_date(record.creation_date))
                .bind(price_to_cents(record.total_price)?)
                .bind(&record.item_name)
                .bind(record.supplier_code.0)
                .bind(&record.supplier_name)
                .bind(&record.department_name)
                .bind(record.quantity)
                .bind(&record.acquisition_type)
                .bind(&record.location)
                .execute(&mut *tx)
                .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;

        Ok(inserted)
    }

    async fn count_all(&self) -> Result<i64, RepositoryError> {
        let sql = format!("SELECT COUNT(1) FROM {}", self.collection);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }
}
