use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::query::DepartmentMatch;
use crate::domain::window::EndBound;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub classifier: ClassifierConfig,
    pub transcription: TranscriptionConfig,
    pub dispatch: DispatchConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub collection: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ClassifierConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct TranscriptionConfig {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct DispatchConfig {
    pub department_match: DepartmentMatch,
    pub end_of_day_inclusive: bool,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl DispatchConfig {
    pub fn end_bound(&self) -> EndBound {
        if self.end_of_day_inclusive {
            EndBound::EndOfDay
        } else {
            EndBound::Midnight
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub database_collection: Option<String>,
    pub database_max_connections: Option<u32>,
    pub log_level: Option<String>,
    pub classifier_base_url: Option<String>,
    pub classifier_model: Option<String>,
    pub classifier_api_key: Option<String>,
    pub transcription_enabled: Option<bool>,
    pub transcription_base_url: Option<String>,
    pub department_match: Option<DepartmentMatch>,
    pub end_of_day_inclusive: Option<bool>,
    pub server_port: Option<u16>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

pub const DEFAULT_HF_INFERENCE_URL: &str = "https://api-inference.huggingface.co/models";

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://penny.db?mode=rwc".to_string(),
                collection: "purchase_orders".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            classifier: ClassifierConfig {
                base_url: DEFAULT_HF_INFERENCE_URL.to_string(),
                model: "facebook/bart-large-mnli".to_string(),
                api_key: None,
                timeout_secs: 60,
            },
            transcription: TranscriptionConfig {
                enabled: false,
                base_url: DEFAULT_HF_INFERENCE_URL.to_string(),
                model: "openai/whisper-small".to_string(),
                api_key: None,
                timeout_secs: 60,
            },
            dispatch: DispatchConfig {
                department_match: DepartmentMatch::Substring,
                end_of_day_inclusive: false,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl std::str::FromStr for DepartmentMatch {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "substring" => Ok(Self::Substring),
            "exact" => Ok(Self::Exact),
            other => Err(ConfigError::Validation(format!(
                "unsupported department match mode `{other}` (expected substring|exact)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("penny.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(collection) = database.collection {
                self.database.collection = collection;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(classifier) = patch.classifier {
            if let Some(base_url) = classifier.base_url {
                self.classifier.base_url = base_url;
            }
            if let Some(model) = classifier.model {
                self.classifier.model = model;
            }
            if let Some(classifier_api_key_value) = classifier.api_key {
                self.classifier.api_key = Some(secret_value(classifier_api_key_value));
            }
            if let Some(timeout_secs) = classifier.timeout_secs {
                self.classifier.timeout_secs = timeout_secs;
            }
        }

        if let Some(transcription) = patch.transcription {
            if let Some(enabled) = transcription.enabled {
                self.transcription.enabled = enabled;
            }
            if let Some(base_url) = transcription.base_url {
                self.transcription.base_url = base_url;
            }
            if let Some(model) = transcription.model {
                self.transcription.model = model;
            }
            if let Some(transcription_api_key_value) = transcription.api_key {
                self.transcription.api_key = Some(secret_value(transcription_api_key_value));
            }
            if let Some(timeout_secs) = transcription.timeout_secs {
                self.transcription.timeout_secs = timeout_secs;
            }
        }

        if let Some(dispatch) = patch.dispatch {
            if let Some(department_match) = dispatch.department_match {
                self.dispatch.department_match = department_match;
            }
            if let Some(end_of_day_inclusive) = dispatch.end_of_day_inclusive {
                self.dispatch.end_of_day_inclusive = end_of_day_inclusive;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("PENNY_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("PENNY_DATABASE_COLLECTION") {
            self.database.collection = value;
        }
        if let Some(value) = read_env("PENNY_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("PENNY_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("PENNY_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("PENNY_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("PENNY_CLASSIFIER_BASE_URL") {
            self.classifier.base_url = value;
        }
        if let Some(value) = read_env("PENNY_CLASSIFIER_MODEL") {
            self.classifier.model = value;
        }
        if let Some(value) = read_env("PENNY_CLASSIFIER_API_KEY") {
            self.classifier.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("PENNY_CLASSIFIER_TIMEOUT_SECS") {
            self.classifier.timeout_secs = parse_u64("PENNY_CLASSIFIER_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("PENNY_TRANSCRIPTION_ENABLED") {
            self.transcription.enabled = parse_bool("PENNY_TRANSCRIPTION_ENABLED", &value)?;
        }
        if let Some(value) = read_env("PENNY_TRANSCRIPTION_BASE_URL") {
            self.transcription.base_url = value;
        }
        if let Some(value) = read_env("PENNY_TRANSCRIPTION_MODEL") {
            self.transcription.model = value;
        }
        if let Some(value) = read_env("PENNY_TRANSCRIPTION_API_KEY") {
            self.transcription.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("PENNY_TRANSCRIPTION_TIMEOUT_SECS") {
            self.transcription.timeout_secs =
                parse_u64("PENNY_TRANSCRIPTION_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("PENNY_DISPATCH_DEPARTMENT_MATCH") {
            self.dispatch.department_match = value.parse()?;
        }
        if let Some(value) = read_env("PENNY_DISPATCH_END_OF_DAY_INCLUSIVE") {
            self.dispatch.end_of_day_inclusive =
                parse_bool("PENNY_DISPATCH_END_OF_DAY_INCLUSIVE", &value)?;
        }

        if let Some(value) = read_env("PENNY_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("PENNY_SERVER_PORT") {
            self.server.port = parse_u16("PENNY_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("PENNY_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("PENNY_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level = read_env("PENNY_LOGGING_LEVEL").or_else(|| read_env("PENNY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("PENNY_LOGGING_FORMAT").or_else(|| read_env("PENNY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(collection) = overrides.database_collection {
            self.database.collection = collection;
        }
        if let Some(max_connections) = overrides.database_max_connections {
            self.database.max_connections = max_connections;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(base_url) = overrides.classifier_base_url {
            self.classifier.base_url = base_url;
        }
        if let Some(model) = overrides.classifier_model {
            self.classifier.model = model;
        }
        if let Some(classifier_api_key) = overrides.classifier_api_key {
            self.classifier.api_key = Some(secret_value(classifier_api_key));
        }
        if let Some(enabled) = overrides.transcription_enabled {
            self.transcription.enabled = enabled;
        }
        if let Some(base_url) = overrides.transcription_base_url {
            self.transcription.base_url = base_url;
        }
        if let Some(department_match) = overrides.department_match {
            self.dispatch.department_match = department_match;
        }
        if let Some(end_of_day_inclusive) = overrides.end_of_day_inclusive {
            self.dispatch.end_of_day_inclusive = end_of_day_inclusive;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_classifier(&self.classifier)?;
        validate_transcription(&self.transcription)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// Collection names are interpolated into SQL, so only plain identifiers are accepted.
pub fn is_valid_collection_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        && name.len() <= 64
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("penny.toml"), PathBuf::from("config/penny.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if !is_valid_collection_name(&database.collection) {
        return Err(ConfigError::Validation(format!(
            "database.collection `{}` must be a plain identifier (letters, digits, underscore)",
            database.collection
        )));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_classifier(classifier: &ClassifierConfig) -> Result<(), ConfigError> {
    if !is_http_url(&classifier.base_url) {
        return Err(ConfigError::Validation(
            "classifier.base_url must start with http:// or https://".to_string(),
        ));
    }
    if classifier.model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "classifier.model is required (e.g. `facebook/bart-large-mnli`)".to_string(),
        ));
    }
    if classifier.timeout_secs == 0 || classifier.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "classifier.timeout_secs must be in range 1..=300".to_string(),
        ));
    }
    if let Some(api_key) = &classifier.api_key {
        if api_key.expose_secret().trim().is_empty() {
            return Err(ConfigError::Validation(
                "classifier.api_key is set but empty; remove it or provide a token".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_transcription(transcription: &TranscriptionConfig) -> Result<(), ConfigError> {
    if !transcription.enabled {
        return Ok(());
    }
    if !is_http_url(&transcription.base_url) {
        return Err(ConfigError::Validation(
            "transcription.base_url must start with http:// or https:// when transcription is enabled"
                .to_string(),
        ));
    }
    if transcription.model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "transcription.model is required when transcription is enabled".to_string(),
        ));
    }
    if transcription.timeout_secs == 0 || transcription.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "transcription.timeout_secs must be in range 1..=300".to_string(),
        ));
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn is_http_url(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("http://") || value.starts_with("https://")
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    classifier: Option<ClassifierPatch>,
    transcription: Option<TranscriptionPatch>,
    dispatch: Option<DispatchPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    collection: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ClassifierPatch {
    base_url: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct TranscriptionPatch {
    enabled: Option<bool>,
    base_url: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct DispatchPatch {
    department_match: Option<DepartmentMatch>,
    end_of_day_inclusive: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
