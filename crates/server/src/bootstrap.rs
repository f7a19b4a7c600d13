use std::sync::Arc;

use penny_agent::{
    AssistantRuntime, ClassifierError, DispatchSettings, HuggingFaceClassifier,
    HuggingFaceTranscriber, Transcriber, TranscriptionError,
};
use penny_core::config::{AppConfig, ConfigError};
use penny_db::{
    connect_with_settings, migrations, DbPool, RepositoryError, SqlProcurementRepository,
};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub runtime: AssistantRuntime,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("schema setup failed: {0}")]
    Schema(#[source] RepositoryError),
    #[error("classifier client setup failed: {0}")]
    Classifier(#[source] ClassifierError),
    #[error("transcription client setup failed: {0}")]
    Transcription(#[source] TranscriptionError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        collection = %config.database.collection,
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool, &config.database.collection)
        .await
        .map_err(BootstrapError::Schema)?;
    info!(
        event_name = "system.bootstrap.schema_ready",
        correlation_id = "bootstrap",
        collection = %config.database.collection,
        "procurement collection ready"
    );

    let repository =
        SqlProcurementRepository::new(db_pool.clone(), config.database.collection.clone())
            .map_err(BootstrapError::Schema)?;
    let classifier = HuggingFaceClassifier::from_config(&config.classifier)
        .map_err(BootstrapError::Classifier)?;
    let transcriber: Option<Arc<dyn Transcriber>> = if config.transcription.enabled {
        let transcriber = HuggingFaceTranscriber::from_config(&config.transcription)
            .map_err(BootstrapError::Transcription)?;
        Some(Arc::new(transcriber))
    } else {
        None
    };

    info!(
        event_name = "system.bootstrap.adapters_ready",
        correlation_id = "bootstrap",
        classifier_endpoint = %classifier.endpoint(),
        speech_enabled = transcriber.is_some(),
        "classification adapters initialized"
    );

    let runtime = AssistantRuntime::from_ports(
        Arc::new(classifier),
        transcriber,
        Arc::new(repository),
        DispatchSettings::from(&config.dispatch),
    );

    Ok(Application { config, db_pool, runtime })
}
