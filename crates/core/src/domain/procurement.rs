use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SupplierCode(pub i64);

impl SupplierCode {
    /// Parses a bare digit token. Tokens that overflow the code range yield `None`.
    pub fn from_token(token: &str) -> Option<Self> {
        token.trim().parse::<i64>().ok().map(Self)
    }
}

impl std::fmt::Display for SupplierCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One purchase-order line item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcurementRecord {
    pub creation_date: DateTime<Utc>,
    pub total_price: Decimal,
    pub item_name: String,
    pub supplier_code: SupplierCode,
    pub supplier_name: String,
    pub department_name: String,
    pub quantity: i64,
    pub acquisition_type: String,
    pub location: String,
}
