use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use penny_core::domain::procurement::{ProcurementRecord, SupplierCode};
use penny_core::domain::query::{
    DepartmentMatch, DepartmentSpend, ItemFrequency, ItemQuantity, PeriodSpend, SupplierSpend,
};
use penny_core::domain::window::TimeWindow;
use penny_core::errors::ApplicationError;

pub mod memory;
pub mod procurement;

pub use memory::InMemoryProcurementRepository;
pub use procurement::SqlProcurementRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("record cannot be stored: {0}")]
    Encode(String),
    #[error("invalid collection name `{0}`")]
    InvalidCollection(String),
    #[error("invalid import payload: {0}")]
    InvalidImport(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::InvalidCollection(_) => Self::Configuration(error.to_string()),
            other => Self::Persistence(other.to_string()),
        }
    }
}

/// Read-side aggregations over the procurement collection plus the bulk
/// insert used by the operator seed/import commands.
///
/// Orderings are fixed so that both implementations return identical results:
/// insertion order for "first record" lookups, name ascending on ties.
#[async_trait]
pub trait ProcurementRepository: Send + Sync {
    async fn count_created_between(&self, window: &TimeWindow) -> Result<i64, RepositoryError>;

    /// Spend grouped by `YYYY-MM`; the largest total wins.
    async fn highest_spending_period(&self) -> Result<Option<PeriodSpend>, RepositoryError>;

    async fn most_ordered_items(&self, limit: u32)
        -> Result<Vec<ItemFrequency>, RepositoryError>;

    async fn find_by_supplier_code(
        &self,
        code: SupplierCode,
    ) -> Result<Option<ProcurementRecord>, RepositoryError>;

    async fn supplier_spend(
        &self,
        code: SupplierCode,
    ) -> Result<Option<SupplierSpend>, RepositoryError>;

    async fn items_by_department(
        &self,
        department: &str,
        mode: DepartmentMatch,
    ) -> Result<Vec<ItemQuantity>, RepositoryError>;

    /// `None` when no record falls inside the window.
    async fn total_cost_between(
        &self,
        window: &TimeWindow,
    ) -> Result<Option<Decimal>, RepositoryError>;

    async fn department_spending(&self) -> Result<Vec<DepartmentSpend>, RepositoryError>;

    async fn count_by_supplier_code(&self, code: SupplierCode) -> Result<i64, RepositoryError>;

    async fn insert_many(&self, records: &[ProcurementRecord]) -> Result<u64, RepositoryError>;

    async fn count_all(&self) -> Result<i64, RepositoryError>;
}
