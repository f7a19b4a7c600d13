pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_settings, DbPool};
pub use fixtures::{load_records, parse_import, DemoDataset, SeedResult};
pub use repositories::{
    InMemoryProcurementRepository, ProcurementRepository, RepositoryError,
    SqlProcurementRepository,
};
