//! Zero-shot classification port and its Hugging Face Inference API adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use penny_core::config::ClassifierConfig;
use penny_core::errors::ApplicationError;

#[derive(Clone, Debug, PartialEq)]
pub struct RankedLabel {
    pub label: String,
    pub score: f64,
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier request failed: {0}")]
    Request(String),
    #[error("classifier returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("classifier response was malformed: {0}")]
    Malformed(String),
}

impl From<ClassifierError> for ApplicationError {
    fn from(error: ClassifierError) -> Self {
        Self::Integration(error.to_string())
    }
}

/// Ranks candidate labels against a text. Implementations return labels sorted
/// by descending score; an empty vector means the service produced no ranking.
#[async_trait]
pub trait ZeroShotClassifier: Send + Sync {
    async fn rank(
        &self,
        text: &str,
        candidate_labels: &[&str],
    ) -> Result<Vec<RankedLabel>, ClassifierError>;
}

#[derive(Debug, Serialize)]
struct ZeroShotRequest<'a> {
    inputs: &'a str,
    parameters: ZeroShotParameters<'a>,
}

#[derive(Debug, Serialize)]
struct ZeroShotParameters<'a> {
    candidate_labels: &'a [&'a str],
    multi_label: bool,
}

#[derive(Debug, Deserialize)]
struct ZeroShotResponse {
    labels: Vec<String>,
    scores: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

pub struct HuggingFaceClassifier {
    client: Client,
    endpoint: String,
    api_key: Option<SecretString>,
}

impl HuggingFaceClassifier {
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        Self::new(&config.base_url, &config.model, config.api_key.clone(), config.timeout_secs)
    }

    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Option<SecretString>,
        timeout_secs: u64,
    ) -> Result<Self, ClassifierError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ClassifierError::Request(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/{}", base_url.trim_end_matches('/'), model.trim_matches('/')),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ZeroShotClassifier for HuggingFaceClassifier {
    async fn rank(
        &self,
        text: &str,
        candidate_labels: &[&str],
    ) -> Result<Vec<RankedLabel>, ClassifierError> {
        let request = ZeroShotRequest {
            inputs: text,
            parameters: ZeroShotParameters { candidate_labels, multi_label: false },
        };

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ClassifierError::Request("request timed out".to_string())
            } else if e.is_connect() {
                ClassifierError::Request(format!("connection failed: {e}"))
            } else {
                ClassifierError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|parsed| parsed.error)
                .unwrap_or(body);
            return Err(ClassifierError::Status { status: status.as_u16(), message });
        }

        let parsed: ZeroShotResponse =
            response.json().await.map_err(|e| ClassifierError::Malformed(e.to_string()))?;

        ranked_labels(parsed)
    }
}

fn ranked_labels(response: ZeroShotResponse) -> Result<Vec<RankedLabel>, ClassifierError> {
    if response.labels.len() != response.scores.len() {
        return Err(ClassifierError::Malformed(format!(
            "{} labels but {} scores",
            response.labels.len(),
            response.scores.len()
        )));
    }

    let mut ranked = response
        .labels
        .into_iter()
        .zip(response.scores)
        .map(|(label, score)| RankedLabel { label, score })
        .collect::<Vec<_>>();
    ranked.sort_by(|left, right| right.score.total_cmp(&left.score));
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use secrecy::SecretString;
    use serde_json::json;

    use super::{ClassifierError, HuggingFaceClassifier, ZeroShotClassifier};

    const LABELS: &[&str] = &["Frequently ordered line items", "Total spend by each supplier"];

    #[tokio::test]
    async fn sends_candidate_labels_and_returns_sorted_ranking() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/facebook/bart-large-mnli")
            .match_header("authorization", "Bearer hf_test_token")
            .match_body(Matcher::PartialJson(json!({
                "inputs": "what do we order most?",
                "parameters": { "candidate_labels": LABELS, "multi_label": false }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "sequence": "what do we order most?",
                    "labels": ["Total spend by each supplier", "Frequently ordered line items"],
                    "scores": [0.12, 0.88]
                }"#,
            )
            .create_async()
            .await;

        let classifier = HuggingFaceClassifier::new(
            &server.url(),
            "facebook/bart-large-mnli",
            Some(SecretString::from("hf_test_token".to_string())),
            5,
        )
        .expect("classifier");

        let ranked = classifier.rank("what do we order most?", LABELS).await.expect("rank");
        mock.assert_async().await;

        assert_eq!(ranked[0].label, "Frequently ordered line items");
        assert!(ranked[0].score > ranked[1].score);
    }

    #[tokio::test]
    async fn service_errors_surface_status_and_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/facebook/bart-large-mnli")
            .with_status(503)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "Model facebook/bart-large-mnli is currently loading"}"#)
            .create_async()
            .await;

        let classifier =
            HuggingFaceClassifier::new(&server.url(), "facebook/bart-large-mnli", None, 5)
                .expect("classifier");

        let error = classifier.rank("anything", LABELS).await.expect_err("503");
        assert!(matches!(
            error,
            ClassifierError::Status { status: 503, ref message } if message.contains("loading")
        ));
    }

    #[tokio::test]
    async fn mismatched_labels_and_scores_are_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/facebook/bart-large-mnli")
            .with_status(200)
            .with_body(r#"{"labels": ["Frequently ordered line items"], "scores": []}"#)
            .create_async()
            .await;

        let classifier =
            HuggingFaceClassifier::new(&server.url(), "facebook/bart-large-mnli", None, 5)
                .expect("classifier");

        let error = classifier.rank("anything", LABELS).await.expect_err("malformed");
        assert!(matches!(error, ClassifierError::Malformed(_)));
    }

    #[test]
    fn endpoint_joins_base_url_and_model() {
        let classifier = HuggingFaceClassifier::new(
            "https://api-inference.huggingface.co/models/",
            "facebook/bart-large-mnli",
            None,
            5,
        )
        .expect("classifier");
        assert_eq!(
            classifier.endpoint(),
            "https://api-inference.huggingface.co/models/facebook/bart-large-mnli"
        );
    }
}
