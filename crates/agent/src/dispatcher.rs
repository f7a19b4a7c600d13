use std::sync::Arc;

use tracing::debug;

use penny_core::config::DispatchConfig;
use penny_core::domain::intent::{Intent, QueryKind, RequiredInput};
use penny_core::domain::procurement::SupplierCode;
use penny_core::domain::query::{DepartmentMatch, DispatchOutcome, QueryResult};
use penny_core::domain::window::{DateRange, EndBound};
use penny_core::errors::ApplicationError;
use penny_core::input::extract_numeric_token;
use penny_db::ProcurementRepository;

pub const FREQUENT_ITEMS_LIMIT: u32 = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchSettings {
    pub department_match: DepartmentMatch,
    pub end_bound: EndBound,
}

impl From<&DispatchConfig> for DispatchSettings {
    fn from(config: &DispatchConfig) -> Self {
        Self { department_match: config.department_match, end_bound: config.end_bound() }
    }
}

/// Extra inputs collected outside the utterance itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchInputs {
    pub date_range: Option<DateRange>,
    pub department: Option<String>,
}

impl DispatchInputs {
    fn department(&self) -> Option<&str> {
        self.department.as_deref().map(str::trim).filter(|name| !name.is_empty())
    }
}

enum SupplierLookup {
    Missing,
    Unparseable(String),
    Code(String, SupplierCode),
}

fn supplier_lookup(text: &str) -> SupplierLookup {
    match extract_numeric_token(text) {
        None => SupplierLookup::Missing,
        Some(token) => match SupplierCode::from_token(&token) {
            Some(code) => SupplierLookup::Code(token, code),
            None => SupplierLookup::Unparseable(token),
        },
    }
}

#[derive(Clone)]
pub struct QueryDispatcher {
    repository: Arc<dyn ProcurementRepository>,
    settings: DispatchSettings,
}

impl QueryDispatcher {
    pub fn new(repository: Arc<dyn ProcurementRepository>, settings: DispatchSettings) -> Self {
        Self { repository, settings }
    }

    pub fn settings(&self) -> DispatchSettings {
        self.settings
    }

    /// Runs the fixed operation for `intent`. Gated inputs that are absent yield
    /// [`DispatchOutcome::NeedsInput`] without touching the repository.
    pub async fn dispatch(
        &self,
        intent: Intent,
        text: &str,
        inputs: &DispatchInputs,
    ) -> Result<DispatchOutcome, ApplicationError> {
        let kind = intent.query_kind();
        debug!(event_name = "dispatch.start", intent = intent.label(), kind = ?kind, "dispatching");

        let result = match kind {
            QueryKind::CountOrdersInRange => {
                let Some(range) = inputs.date_range else {
                    return Ok(needs(RequiredInput::DateRange));
                };
                let window = range.window(self.settings.end_bound);
                let count = self.repository.count_created_between(&window).await?;
                QueryResult::OrderCount { range, count }
            }
            QueryKind::HighestSpendingPeriod => QueryResult::HighestSpendingPeriod {
                period: self.repository.highest_spending_period().await?,
            },
            QueryKind::TopOrderedItems => QueryResult::FrequentItems {
                items: self.repository.most_ordered_items(FREQUENT_ITEMS_LIMIT).await?,
            },
            QueryKind::SupplierDetails => match supplier_lookup(text) {
                SupplierLookup::Missing => return Ok(DispatchOutcome::MissingSupplierCode),
                SupplierLookup::Unparseable(_) => QueryResult::SupplierDetails { record: None },
                SupplierLookup::Code(_, code) => QueryResult::SupplierDetails {
                    record: self.repository.find_by_supplier_code(code).await?,
                },
            },
            QueryKind::SupplierSpend => match supplier_lookup(text) {
                SupplierLookup::Missing => return Ok(DispatchOutcome::MissingSupplierCode),
                SupplierLookup::Unparseable(_) => QueryResult::SupplierSpend { spend: None },
                SupplierLookup::Code(_, code) => QueryResult::SupplierSpend {
                    spend: self.repository.supplier_spend(code).await?,
                },
            },
            QueryKind::DepartmentItems => {
                let Some(department) = inputs.department() else {
                    return Ok(needs(RequiredInput::DepartmentName));
                };
                let items = self
                    .repository
                    .items_by_department(department, self.settings.department_match)
                    .await?;
                QueryResult::DepartmentItems { department: department.to_string(), items }
            }
            QueryKind::ProcurementCostInRange => {
                let Some(range) = inputs.date_range else {
                    return Ok(needs(RequiredInput::DateRange));
                };
                let window = range.window(self.settings.end_bound);
                let total = self.repository.total_cost_between(&window).await?;
                QueryResult::ProcurementCost { range, total }
            }
            QueryKind::DepartmentSpending => QueryResult::DepartmentSpending {
                departments: self.repository.department_spending().await?,
            },
            QueryKind::SupplierOrderCount => match supplier_lookup(text) {
                SupplierLookup::Missing => return Ok(DispatchOutcome::MissingSupplierCode),
                SupplierLookup::Unparseable(token) => {
                    QueryResult::SupplierOrderCount { supplier_code: token, count: 0 }
                }
                SupplierLookup::Code(token, code) => QueryResult::SupplierOrderCount {
                    supplier_code: token,
                    count: self.repository.count_by_supplier_code(code).await?,
                },
            },
        };

        debug!(
            event_name = "dispatch.complete",
            intent = intent.label(),
            has_data = result.has_data(),
            "dispatch complete"
        );
        Ok(DispatchOutcome::Answered { result })
    }
}

fn needs(input: RequiredInput) -> DispatchOutcome {
    DispatchOutcome::NeedsInput { input }
}
