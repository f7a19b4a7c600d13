use std::fs;
use std::path::Path;

use penny_db::{load_records, parse_import};

use crate::commands::{block_on, load_config, open_collection, CommandResult};

pub fn run(path: &Path) -> CommandResult {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) => {
            return CommandResult::failure(
                "import",
                "input",
                format!("failed to read `{}`: {error}", path.display()),
                8,
            );
        }
    };
    let records = match parse_import(&raw) {
        Ok(records) => records,
        Err(error) => return CommandResult::failure("import", "input", error.to_string(), 8),
    };

    let config = match load_config("import") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let result = block_on("import", async {
        let (pool, repository) = open_collection(&config).await?;
        let loaded = load_records(&repository, &records)
            .await
            .map_err(|error| ("import_execution", error.to_string(), 6u8))?;
        pool.close().await;
        Ok(loaded)
    });

    match result {
        Ok(loaded) => CommandResult::success(
            "import",
            format!(
                "imported {} records from `{}` into `{}` ({} records total)",
                loaded.records_inserted,
                path.display(),
                config.database.collection,
                loaded.total_records
            ),
        ),
        Err(failure) => failure,
    }
}
