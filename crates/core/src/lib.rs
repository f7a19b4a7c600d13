pub mod config;
pub mod domain;
pub mod errors;
pub mod faq;
pub mod input;

pub use domain::intent::{catalog_labels, Intent, QueryKind, RequiredInput};
pub use domain::procurement::{ProcurementRecord, SupplierCode};
pub use domain::query::{
    DepartmentMatch, DepartmentSpend, DispatchOutcome, ItemFrequency, ItemQuantity, PeriodSpend,
    QueryResult, SupplierSpend,
};
pub use domain::window::{DateRange, EndBound, TimeWindow};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use faq::{FaqEntry, FAQ};
pub use input::{extract_numeric_token, transcription_failure_text, UNINTELLIGIBLE_AUDIO};
