use std::cmp::Reverse;
use std::collections::BTreeMap;

use chrono::Timelike;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use penny_core::domain::procurement::{ProcurementRecord, SupplierCode};
use penny_core::domain::query::{
    DepartmentMatch, DepartmentSpend, ItemFrequency, ItemQuantity, PeriodSpend, SupplierSpend,
};
use penny_core::domain::window::TimeWindow;

use super::procurement::{cents_to_price, price_to_cents};
use super::{ProcurementRepository, RepositoryError};

/// Insertion-ordered store with the same precision and ordering rules as the
/// SQL repository: prices are kept in whole cents and timestamps in seconds.
#[derive(Default)]
pub struct InMemoryProcurementRepository {
    records: RwLock<Vec<ProcurementRecord>>,
}

impl InMemoryProcurementRepository {
    pub fn with_records(records: Vec<ProcurementRecord>) -> Result<Self, RepositoryError> {
        let normalized =
            records.into_iter().map(normalize).collect::<Result<Vec<_>, RepositoryError>>()?;
        Ok(Self { records: RwLock::new(normalized) })
    }
}

fn normalize(mut record: ProcurementRecord) -> Result<ProcurementRecord, RepositoryError> {
    record.total_price = cents_to_price(price_to_cents(record.total_price)?);
    record.creation_date = record.creation_date.with_nanosecond(0).unwrap_or(record.creation_date);
    Ok(record)
}

fn period_of(record: &ProcurementRecord) -> String {
    record.creation_date.format("%Y-%m").to_string()
}

#[async_trait::async_trait]
impl ProcurementRepository for InMemoryProcurementRepository {
    async fn count_created_between(&self, window: &TimeWindow) -> Result<i64, RepositoryError> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|record| window.contains(record.creation_date)).count() as i64)
    }

    async fn highest_spending_period(&self) -> Result<Option<PeriodSpend>, RepositoryError> {
        let records = self.records.read().await;
        let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
        for record in records.iter() {
            *totals.entry(period_of(record)).or_default() += record.total_price;
        }

        // Ties go to the earlier period.
        Ok(totals
            .into_iter()
            .max_by(|(left_period, left), (right_period, right)| {
                left.cmp(right).then_with(|| right_period.cmp(left_period))
            })
            .map(|(period, total)| PeriodSpend { period, total }))
    }

    async fn most_ordered_items(
        &self,
        limit: u32,
    ) -> Result<Vec<ItemFrequency>, RepositoryError> {
        let records = self.records.read().await;
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for record in records.iter() {
            *counts.entry(record.item_name.clone()).or_default() += 1;
        }

        let mut items = counts
            .into_iter()
            .map(|(item_name, count)| ItemFrequency { item_name, count })
            .collect::<Vec<_>>();
        items.sort_by(|left, right| {
            right.count.cmp(&left.count).then_with(|| left.item_name.cmp(&right.item_name))
        });
        items.truncate(limit as usize);
        Ok(items)
    }

    async fn find_by_supplier_code(
        &self,
        code: SupplierCode,
    ) -> Result<Option<ProcurementRecord>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|record| record.supplier_code == code).cloned())
    }

    async fn supplier_spend(
        &self,
        code: SupplierCode,
    ) -> Result<Option<SupplierSpend>, RepositoryError> {
        let records = self.records.read().await;
        let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
        for record in records.iter().filter(|record| record.supplier_code == code) {
            *totals.entry(record.supplier_name.clone()).or_default() += record.total_price;
        }

        Ok(totals
            .into_iter()
            .next()
            .map(|(supplier_name, total)| SupplierSpend { supplier_name, total }))
    }

    async fn items_by_department(
        &self,
        department: &str,
        mode: DepartmentMatch,
    ) -> Result<Vec<ItemQuantity>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|record| mode.matches(&record.department_name, department))
            .map(|record| ItemQuantity {
                item_name: record.item_name.clone(),
                quantity: record.quantity,
            })
            .collect())
    }

    async fn total_cost_between(
        &self,
        window: &TimeWindow,
    ) -> Result<Option<Decimal>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|record| window.contains(record.creation_date))
            .map(|record| record.total_price)
            .reduce(|sum, price| sum + price))
    }

    async fn department_spending(&self) -> Result<Vec<DepartmentSpend>, RepositoryError> {
        let records = self.records.read().await;
        let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
        for record in records.iter() {
            *totals.entry(record.department_name.clone()).or_default() += record.total_price;
        }

        let mut departments = totals
            .into_iter()
            .map(|(department_name, total)| DepartmentSpend { department_name, total })
            .collect::<Vec<_>>();
        departments.sort_by_key(|dept| Reverse(dept.total));
        Ok(departments)
    }

    async fn count_by_supplier_code(&self, code: SupplierCode) -> Result<i64, RepositoryError> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|record| record.supplier_code == code).count() as i64)
    }

    async fn insert_many(&self, records: &[ProcurementRecord]) -> Result<u64, RepositoryError> {
        let normalized = records
            .iter()
            .cloned()
            .map(normalize)
            .collect::<Result<Vec<_>, RepositoryError>>()?;
        let inserted = normalized.len() as u64;

        let mut stored = self.records.write().await;
        stored.extend(normalized);
        Ok(inserted)
    }

    async fn count_all(&self) -> Result<i64, RepositoryError> {
        let records = self.records.read().await;
        Ok(records.len() as i64)
    }
}
