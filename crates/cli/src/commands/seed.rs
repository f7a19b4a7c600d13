use penny_db::{DemoDataset, ProcurementRepository};

use crate::commands::{block_on, load_config, open_collection, CommandResult};

/// Loads the demo dataset into an empty collection. A non-empty collection is left
/// untouched unless `force` is set, since inserting twice doubles every aggregate.
pub fn run(force: bool) -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let collection = config.database.collection.clone();

    let result = block_on("seed", async {
        let (pool, repository) = open_collection(&config).await?;

        let existing = repository
            .count_all()
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 6u8))?;
        let outcome = if existing > 0 && !force {
            SeedOutcome::Skipped { existing }
        } else {
            let seeded = DemoDataset::load(&repository)
                .await
                .map_err(|error| ("seed_execution", error.to_string(), 6u8))?;
            SeedOutcome::Loaded { inserted: seeded.records_inserted, total: seeded.total_records }
        };

        pool.close().await;
        Ok(outcome)
    });

    match result {
        Ok(outcome) => CommandResult::success("seed", outcome.message(&collection)),
        Err(failure) => failure,
    }
}

#[derive(Debug, PartialEq, Eq)]
enum SeedOutcome {
    Loaded { inserted: u64, total: i64 },
    Skipped { existing: i64 },
}

impl SeedOutcome {
    fn message(&self, collection: &str) -> String {
        match self {
            Self::Loaded { inserted, total } => format!(
                "loaded {inserted} demo records into `{collection}` ({total} records total)"
            ),
            Self::Skipped { existing } => format!(
                "collection `{collection}` already holds {existing} records; \
                 demo data not loaded (use --force to append)"
            ),
        }
    }
}
