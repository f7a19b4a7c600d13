use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::intent::RequiredInput;
use crate::domain::procurement::ProcurementRecord;
use crate::domain::window::DateRange;

/// How a department name from the user is matched against stored records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepartmentMatch {
    /// Case-insensitive substring match.
    #[default]
    Substring,
    Exact,
}

impl DepartmentMatch {
    pub fn matches(self, stored: &str, requested: &str) -> bool {
        match self {
            Self::Substring => stored.to_lowercase().contains(&requested.to_lowercase()),
            Self::Exact => stored == requested,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSpend {
    /// `YYYY-MM` prefix of the creation date.
    pub period: String,
    pub total: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFrequency {
    pub item_name: String,
    pub count: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierSpend {
    pub supplier_name: String,
    pub total: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemQuantity {
    pub item_name: String,
    pub quantity: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentSpend {
    pub department_name: String,
    pub total: Decimal,
}

/// Per-intent result of a dispatched query. `None`/empty payloads are the no-data marker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryResult {
    OrderCount { range: DateRange, count: i64 },
    HighestSpendingPeriod { period: Option<PeriodSpend> },
    FrequentItems { items: Vec<ItemFrequency> },
    SupplierDetails { record: Option<ProcurementRecord> },
    SupplierSpend { spend: Option<SupplierSpend> },
    DepartmentItems { department: String, items: Vec<ItemQuantity> },
    ProcurementCost { range: DateRange, total: Option<Decimal> },
    DepartmentSpending { departments: Vec<DepartmentSpend> },
    SupplierOrderCount { supplier_code: String, count: i64 },
}

impl QueryResult {
    pub fn has_data(&self) -> bool {
        match self {
            Self::OrderCount { .. } | Self::SupplierOrderCount { .. } => true,
            Self::HighestSpendingPeriod { period } => period.is_some(),
            Self::FrequentItems { items } => !items.is_empty(),
            Self::SupplierDetails { record } => record.is_some(),
            Self::SupplierSpend { spend } => spend.is_some(),
            Self::DepartmentItems { items, .. } => !items.is_empty(),
            Self::ProcurementCost { total, .. } => total.is_some(),
            Self::DepartmentSpending { departments } => !departments.is_empty(),
        }
    }

    pub fn render_lines(&self) -> Vec<String> {
        match self {
            Self::OrderCount { range, count } => {
                vec![format!("Total orders from {} to {}: {count}", range.start, range.end)]
            }
            Self::HighestSpendingPeriod { period: Some(period) } => vec![format!(
                "The quarter with highest spending is {} with a total spend of ${}",
                period.period, period.total
            )],
            Self::HighestSpendingPeriod { period: None } => {
                vec!["No spending data available.".to_string()]
            }
            Self::FrequentItems { items } if items.is_empty() => {
                vec!["No order data available.".to_string()]
            }
            Self::FrequentItems { items } => {
                std::iter::once("Frequently ordered items:".to_string())
                    .chain(
                        items.iter().map(|item| format!("{}: {} times", item.item_name, item.count)),
                    )
                    .collect()
            }
            Self::SupplierDetails { record: Some(record) } => vec![
                format!("Supplier Name: {}", record.supplier_name),
                format!("Item Name: {}", record.item_name),
                format!("Total Price: {}", record.total_price),
                format!("Acquisition Type: {}", record.acquisition_type),
                format!("Location: {}", record.location),
            ],
            Self::SupplierDetails { record: None } => {
                vec!["No supplier found with the provided code.".to_string()]
            }
            Self::SupplierSpend { spend: Some(spend) } => vec![format!(
                "Total spend by supplier {} is ${}",
                spend.supplier_name, spend.total
            )],
            Self::SupplierSpend { spend: None } => {
                vec!["No data available for the supplier.".to_string()]
            }
            Self::DepartmentItems { department, items } if items.is_empty() => {
                vec![format!("No items found for department {department}.")]
            }
            Self::DepartmentItems { department, items } => {
                std::iter::once(format!("Items ordered by {department}:"))
                    .chain(items.iter().map(|item| {
                        format!("Item Name: {} - Quantity: {}", item.item_name, item.quantity)
                    }))
                    .collect()
            }
            Self::ProcurementCost { range, total: Some(total) } => vec![format!(
                "Total procurement cost from {} to {}: ${total}",
                range.start, range.end
            )],
            Self::ProcurementCost { total: None, .. } => {
                vec!["No procurement cost data available for the selected range.".to_string()]
            }
            Self::DepartmentSpending { departments } if departments.is_empty() => {
                vec!["No department spending data available.".to_string()]
            }
            Self::DepartmentSpending { departments } => {
                std::iter::once("Spending comparison by department:".to_string())
                    .chain(
                        departments
                            .iter()
                            .map(|dept| format!("{}: ${}", dept.department_name, dept.total)),
                    )
                    .collect()
            }
            Self::SupplierOrderCount { supplier_code, count } => {
                vec![format!("Total orders placed by supplier {supplier_code}: {count}")]
            }
        }
    }
}

/// What the dispatcher produced for one request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Answered { result: QueryResult },
    /// The intent is gated on input the request did not carry; nothing was queried.
    NeedsInput { input: RequiredInput },
    /// A supplier-scoped intent whose text carried no numeric token.
    MissingSupplierCode,
}

impl DispatchOutcome {
    pub fn render_lines(&self) -> Vec<String> {
        match self {
            Self::Answered { result } => result.render_lines(),
            Self::NeedsInput { input } => vec![needs_input_prompt(*input).to_string()],
            Self::MissingSupplierCode => {
                vec!["Please include the supplier code in your question.".to_string()]
            }
        }
    }
}

fn needs_input_prompt(input: RequiredInput) -> &'static str {
    match input {
        RequiredInput::DateRange => "Select a start date and an end date to run this query.",
        RequiredInput::DepartmentName => "Enter a department name to list its items.",
        RequiredInput::SupplierCode => "Please include the supplier code in your question.",
        RequiredInput::None => "No additional input is required.",
    }
}
