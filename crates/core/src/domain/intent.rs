//! The fixed intent catalog used as the zero-shot label space.
//!
//! Each [`Intent`] variant owns exactly one catalog label and one
//! [`QueryKind`]. Catalog order is the order of [`Intent::ALL`] and is what the
//! classifier receives as candidate labels.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    OrdersDuringPeriod,
    HighestSpendingQuarter,
    FrequentlyOrderedItems,
    SupplierDetails,
    SpendBySupplier,
    ItemsByDepartment,
    ProcurementCostInRange,
    DepartmentSpendingComparison,
    OrdersPerSupplier,
    OrdersInDateRange,
}

/// The predefined data operation an intent dispatches to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    CountOrdersInRange,
    HighestSpendingPeriod,
    TopOrderedItems,
    SupplierDetails,
    SupplierSpend,
    DepartmentItems,
    ProcurementCostInRange,
    DepartmentSpending,
    SupplierOrderCount,
}

/// Extra input a query needs beyond the utterance itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredInput {
    None,
    DateRange,
    SupplierCode,
    DepartmentName,
}

impl Intent {
    pub const ALL: [Intent; 10] = [
        Intent::OrdersDuringPeriod,
        Intent::HighestSpendingQuarter,
        Intent::FrequentlyOrderedItems,
        Intent::SupplierDetails,
        Intent::SpendBySupplier,
        Intent::ItemsByDepartment,
        Intent::ProcurementCostInRange,
        Intent::DepartmentSpendingComparison,
        Intent::OrdersPerSupplier,
        Intent::OrdersInDateRange,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::OrdersDuringPeriod => {
                "Total number of orders created during a specific time period"
            }
            Self::HighestSpendingQuarter => "Identify the quarter with the highest spending",
            Self::FrequentlyOrderedItems => "Frequently ordered line items",
            Self::SupplierDetails => "Details of suppliers for specific items or orders",
            Self::SpendBySupplier => "Total spend by each supplier",
            Self::ItemsByDepartment => "List of items ordered by each department",
            Self::ProcurementCostInRange => "Total procurement cost within a specified time frame",
            Self::DepartmentSpendingComparison => "Comparison of spending between departments",
            Self::OrdersPerSupplier => "Number of orders per supplier",
            Self::OrdersInDateRange => "Total number of orders created within a date range",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|intent| intent.label() == label)
    }

    pub fn query_kind(self) -> QueryKind {
        match self {
            Self::OrdersDuringPeriod | Self::OrdersInDateRange => QueryKind::CountOrdersInRange,
            Self::HighestSpendingQuarter => QueryKind::HighestSpendingPeriod,
            Self::FrequentlyOrderedItems => QueryKind::TopOrderedItems,
            Self::SupplierDetails => QueryKind::SupplierDetails,
            Self::SpendBySupplier => QueryKind::SupplierSpend,
            Self::ItemsByDepartment => QueryKind::DepartmentItems,
            Self::ProcurementCostInRange => QueryKind::ProcurementCostInRange,
            Self::DepartmentSpendingComparison => QueryKind::DepartmentSpending,
            Self::OrdersPerSupplier => QueryKind::SupplierOrderCount,
        }
    }

    pub fn required_input(self) -> RequiredInput {
        self.query_kind().required_input()
    }
}

impl QueryKind {
    pub fn required_input(self) -> RequiredInput {
        match self {
            Self::CountOrdersInRange | Self::ProcurementCostInRange => RequiredInput::DateRange,
            Self::SupplierDetails | Self::SupplierSpend | Self::SupplierOrderCount => {
                RequiredInput::SupplierCode
            }
            Self::DepartmentItems => RequiredInput::DepartmentName,
            Self::HighestSpendingPeriod | Self::TopOrderedItems | Self::DepartmentSpending => {
                RequiredInput::None
            }
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Candidate labels in catalog order.
pub fn catalog_labels() -> Vec<&'static str> {
    Intent::ALL.iter().map(|intent| intent.label()).collect()
}
