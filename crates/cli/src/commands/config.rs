use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use penny_core::config::{AppConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let sources = SourceLookup { doc: config_file_doc.as_ref(), path: config_file_path.as_deref() };

    let fields = vec![
        field("database.url", config.database.url.clone(), &["PENNY_DATABASE_URL"]),
        field(
            "database.collection",
            config.database.collection.clone(),
            &["PENNY_DATABASE_COLLECTION"],
        ),
        field(
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["PENNY_DATABASE_MAX_CONNECTIONS"],
        ),
        field(
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["PENNY_DATABASE_TIMEOUT_SECS"],
        ),
        field(
            "classifier.base_url",
            config.classifier.base_url.clone(),
            &["PENNY_CLASSIFIER_BASE_URL"],
        ),
        field("classifier.model", config.classifier.model.clone(), &["PENNY_CLASSIFIER_MODEL"]),
        field(
            "classifier.api_key",
            redact_secret(config.classifier.api_key.as_ref()),
            &["PENNY_CLASSIFIER_API_KEY"],
        ),
        field(
            "classifier.timeout_secs",
            config.classifier.timeout_secs.to_string(),
            &["PENNY_CLASSIFIER_TIMEOUT_SECS"],
        ),
        field(
            "transcription.enabled",
            config.transcription.enabled.to_string(),
            &["PENNY_TRANSCRIPTION_ENABLED"],
        ),
        field(
            "transcription.base_url",
            config.transcription.base_url.clone(),
            &["PENNY_TRANSCRIPTION_BASE_URL"],
        ),
        field(
            "transcription.model",
            config.transcription.model.clone(),
            &["PENNY_TRANSCRIPTION_MODEL"],
        ),
        field(
            "transcription.api_key",
            redact_secret(config.transcription.api_key.as_ref()),
            &["PENNY_TRANSCRIPTION_API_KEY"],
        ),
        field(
            "transcription.timeout_secs",
            config.transcription.timeout_secs.to_string(),
            &["PENNY_TRANSCRIPTION_TIMEOUT_SECS"],
        ),
        field(
            "dispatch.department_match",
            format!("{:?}", config.dispatch.department_match).to_ascii_lowercase(),
            &["PENNY_DISPATCH_DEPARTMENT_MATCH"],
        ),
        field(
            "dispatch.end_of_day_inclusive",
            config.dispatch.end_of_day_inclusive.to_string(),
            &["PENNY_DISPATCH_END_OF_DAY_INCLUSIVE"],
        ),
        field(
            "server.bind_address",
            config.server.bind_address.clone(),
            &["PENNY_SERVER_BIND_ADDRESS"],
        ),
        field("server.port", config.server.port.to_string(), &["PENNY_SERVER_PORT"]),
        field(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["PENNY_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        field(
            "logging.level",
            config.logging.level.clone(),
            &["PENNY_LOGGING_LEVEL", "PENNY_LOG_LEVEL"],
        ),
        field(
            "logging.format",
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
            &["PENNY_LOGGING_FORMAT", "PENNY_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(
        fields
            .into_iter()
            .map(|f| render_line(f.key, &f.value, sources.source(f.key, f.env_keys))),
    );
    lines.join("\n")
}

struct Field {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

fn field(key: &'static str, value: String, env_keys: &'static [&'static str]) -> Field {
    Field { key, value, env_keys }
}

struct SourceLookup<'a> {
    doc: Option<&'a Value>,
    path: Option<&'a Path>,
}

impl SourceLookup<'_> {
    fn source(&self, key_path: &str, env_keys: &[&str]) -> String {
        if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
            return format!("env ({env_key})");
        }

        if let Some(doc) = self.doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .path
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

fn detect_config_path() -> Option<PathBuf> {
    ["penny.toml", "config/penny.toml"].into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(secret: Option<&SecretString>) -> String {
    match secret.map(|value| value.expose_secret().trim().to_string()) {
        None => "<unset>".to_string(),
        Some(value) if value.is_empty() => "<empty>".to_string(),
        Some(value) => match value.split_once('_') {
            Some((prefix, _)) if prefix.len() <= 4 => format!("{prefix}_***"),
            _ => "<redacted>".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use toml::Value;

    use super::{contains_path, redact_secret};

    #[test]
    fn secrets_never_render_in_clear() {
        let token = SecretString::from("hf_abcdefghijklmnop".to_string());
        assert_eq!(redact_secret(Some(&token)), "hf_***");

        let opaque = SecretString::from("abcdefghijklmnop".to_string());
        assert_eq!(redact_secret(Some(&opaque)), "<redacted>");
        assert_eq!(redact_secret(None), "<unset>");
    }

    #[test]
    fn nested_keys_are_found_in_toml_document() {
        let doc: Value = "[database]\ncollection = \"po\"\n".parse().expect("toml");
        assert!(contains_path(&doc, "database.collection"));
        assert!(!contains_path(&doc, "database.url"));
        assert!(!contains_path(&doc, "server.port"));
    }
}
