use crate::commands::{block_on, load_config, open_collection, CommandResult};

pub fn run() -> CommandResult {
    let config = match load_config("migrate") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let result = block_on("migrate", async {
        let (pool, _) = open_collection(&config).await?;
        pool.close().await;
        Ok(())
    });

    match result {
        Ok(()) => CommandResult::success(
            "migrate",
            format!("collection `{}` is ready", config.database.collection),
        ),
        Err(failure) => failure,
    }
}
