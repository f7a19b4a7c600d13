//! JSON API over the assistant runtime.
//!
//! - `POST /api/v1/ask`         text query, optional `start_date`/`end_date`/`department`
//! - `POST /api/v1/ask/speech`  raw audio body, the same optional inputs as query parameters
//! - `GET  /api/v1/intents`     the intent catalog in classifier order
//! - `GET  /api/v1/faq`         static FAQ entries

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use penny_agent::{
    AskRequest, AssistantReply, AssistantRuntime, AudioSample, DispatchInputs, QuerySource,
};
use penny_core::{
    ApplicationError, DateRange, DomainError, FaqEntry, Intent, InterfaceError, QueryKind,
    RequiredInput, FAQ,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// Upper bound for a raw audio upload.
pub const SPEECH_BODY_LIMIT_BYTES: usize = 25 * 1024 * 1024;

#[derive(Clone)]
pub struct ApiState {
    runtime: AssistantRuntime,
}

#[derive(Debug, Default, Deserialize)]
pub struct AskBody {
    pub text: String,
    #[serde(flatten)]
    pub inputs: InputParams,
}

#[derive(Debug, Default, Deserialize)]
pub struct InputParams {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub department: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub correlation_id: String,
    #[serde(flatten)]
    pub reply: AssistantReply,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: &'static str,
    pub detail: String,
    pub correlation_id: String,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct IntentEntry {
    pub label: &'static str,
    pub intent: Intent,
    pub query_kind: QueryKind,
    pub required_input: RequiredInput,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

pub fn router(runtime: AssistantRuntime) -> Router {
    Router::new()
        .route("/api/v1/ask", post(ask))
        .route(
            "/api/v1/ask/speech",
            post(ask_speech).layer(DefaultBodyLimit::max(SPEECH_BODY_LIMIT_BYTES)),
        )
        .route("/api/v1/intents", get(list_intents))
        .route("/api/v1/faq", get(list_faq))
        .with_state(ApiState { runtime })
}

async fn ask(State(state): State<ApiState>, Json(body): Json<AskBody>) -> ApiResult<AskResponse> {
    let correlation_id = new_correlation_id();
    let inputs = dispatch_inputs(body.inputs).map_err(|e| failure(e, &correlation_id))?;
    run(&state, AskRequest::text(body.text).with_inputs(inputs), correlation_id).await
}

async fn ask_speech(
    State(state): State<ApiState>,
    Query(params): Query<InputParams>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<AskResponse> {
    let correlation_id = new_correlation_id();
    let inputs = dispatch_inputs(params).map_err(|e| failure(e, &correlation_id))?;
    let content_type =
        headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok()).map(str::to_string);

    info!(
        event_name = "api.ask.speech_received",
        correlation_id = %correlation_id,
        bytes = body.len(),
        "speech query received"
    );

    let request = AskRequest {
        source: QuerySource::Speech(AudioSample::new(body.to_vec(), content_type)),
        inputs,
    };
    run(&state, request, correlation_id).await
}

async fn list_intents() -> Json<Vec<IntentEntry>> {
    Json(
        Intent::ALL
            .iter()
            .map(|intent| IntentEntry {
                label: intent.label(),
                intent: *intent,
                query_kind: intent.query_kind(),
                required_input: intent.required_input(),
            })
            .collect(),
    )
}

async fn list_faq() -> Json<&'static [FaqEntry]> {
    Json(FAQ)
}

async fn run(
    state: &ApiState,
    request: AskRequest,
    correlation_id: String,
) -> ApiResult<AskResponse> {
    match state.runtime.ask(request).await {
        Ok(reply) => {
            info!(
                event_name = "api.ask.completed",
                correlation_id = %correlation_id,
                intent = reply.intent.unwrap_or("none"),
                "query completed"
            );
            Ok(Json(AskResponse { correlation_id, reply }))
        }
        Err(error) => Err(failure(error, &correlation_id)),
    }
}

fn dispatch_inputs(params: InputParams) -> Result<DispatchInputs, ApplicationError> {
    let date_range = match (params.start_date, params.end_date) {
        (Some(start), Some(end)) => Some(DateRange::new(start, end)?),
        (None, None) => None,
        _ => {
            return Err(ApplicationError::Domain(DomainError::InvariantViolation(
                "start_date and end_date must be supplied together".to_string(),
            )))
        }
    };
    Ok(DispatchInputs { date_range, department: params.department })
}

fn failure(error: ApplicationError, correlation_id: &str) -> (StatusCode, Json<ApiError>) {
    let interface = error.into_interface(correlation_id);
    let status = match &interface {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    warn!(
        event_name = "api.ask.failed",
        correlation_id = %correlation_id,
        status = status.as_u16(),
        error = %interface,
        "query failed"
    );

    (
        status,
        Json(ApiError {
            error: interface.user_message(),
            detail: interface.to_string(),
            correlation_id: interface.correlation_id().to_string(),
        }),
    )
}

fn new_correlation_id() -> String {
    format!("req-{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use penny_agent::{
        AssistantRuntime, AudioSample, ClassifierError, DispatchSettings, RankedLabel,
        Transcriber, TranscriptionError, ZeroShotClassifier,
    };
    use penny_core::Intent;
    use penny_db::{DemoDataset, InMemoryProcurementRepository};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::router;

    struct FixedIntent(Intent);

    #[async_trait]
    impl ZeroShotClassifier for FixedIntent {
        async fn rank(
            &self,
            _text: &str,
            _candidate_labels: &[&str],
        ) -> Result<Vec<RankedLabel>, ClassifierError> {
            Ok(vec![RankedLabel { label: self.0.label().to_string(), score: 0.87 }])
        }
    }

    struct Unavailable;

    #[async_trait]
    impl ZeroShotClassifier for Unavailable {
        async fn rank(
            &self,
            _text: &str,
            _candidate_labels: &[&str],
        ) -> Result<Vec<RankedLabel>, ClassifierError> {
            Err(ClassifierError::Status { status: 503, message: "model loading".to_string() })
        }
    }

    struct EchoTranscriber;

    #[async_trait]
    impl Transcriber for EchoTranscriber {
        async fn transcribe(&self, sample: &AudioSample) -> Result<String, TranscriptionError> {
            String::from_utf8(sample.bytes.clone())
                .map_err(|_| TranscriptionError::Unintelligible)
        }
    }

    fn app(classifier: Arc<dyn ZeroShotClassifier>) -> axum::Router {
        let repo = InMemoryProcurementRepository::with_records(
            DemoDataset::records().expect("demo records"),
        )
        .expect("repo");
        router(AssistantRuntime::from_ports(
            classifier,
            Some(Arc::new(EchoTranscriber)),
            Arc::new(repo),
            DispatchSettings::default(),
        ))
    }

    async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn ask_returns_rendered_lines_and_correlation_id() {
        let (status, body) = send(
            app(Arc::new(FixedIntent(Intent::FrequentlyOrderedItems))),
            post_json("/api/v1/ask", r#"{"text": "what do we order most?"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["intent"], "Frequently ordered line items");
        assert_eq!(body["lines"][1], "Copy Paper: 5 times");
        assert!(body["correlation_id"].as_str().is_some_and(|id| id.starts_with("req-")));
    }

    #[tokio::test]
    async fn ask_with_date_range_counts_orders() {
        let (status, body) = send(
            app(Arc::new(FixedIntent(Intent::OrdersInDateRange))),
            post_json(
                "/api/v1/ask",
                r#"{"text": "orders between", "start_date": "2000-01-01", "end_date": "2030-01-01"}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"]["status"], "answered");
        assert_eq!(body["lines"][0], "Total orders from 2000-01-01 to 2030-01-01: 23");
    }

    #[tokio::test]
    async fn reversed_date_range_is_a_bad_request() {
        let (status, body) = send(
            app(Arc::new(FixedIntent(Intent::OrdersInDateRange))),
            post_json(
                "/api/v1/ask",
                r#"{"text": "orders", "start_date": "2014-02-01", "end_date": "2014-01-01"}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "The request could not be processed. Check inputs and try again.");
        assert!(body["detail"].as_str().is_some_and(|detail| detail.contains("2014-02-01")));
    }

    #[tokio::test]
    async fn half_open_date_range_is_a_bad_request() {
        let (status, _) = send(
            app(Arc::new(FixedIntent(Intent::OrdersInDateRange))),
            post_json("/api/v1/ask", r#"{"text": "orders", "start_date": "2014-02-01"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn classifier_outage_is_service_unavailable() {
        let (status, body) =
            send(app(Arc::new(Unavailable)), post_json("/api/v1/ask", r#"{"text": "hi"}"#)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["correlation_id"].as_str().is_some_and(|id| id.starts_with("req-")));
    }

    #[tokio::test]
    async fn speech_query_is_transcribed_then_answered() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/ask/speech")
            .header("content-type", "audio/wav")
            .body(Body::from("total spend for supplier 500"))
            .expect("request");

        let (status, body) =
            send(app(Arc::new(FixedIntent(Intent::SpendBySupplier))), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["query"], "total spend for supplier 500");
        assert_eq!(body["notices"][0], "Please say your query:");
        assert_eq!(body["notices"][1], "Recognized query: total spend for supplier 500");
        assert_eq!(body["outcome"]["status"], "answered");
    }

    #[tokio::test]
    async fn speech_upload_above_default_body_limit_is_accepted() {
        let clip = vec![b'a'; 3 * 1024 * 1024];
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/ask/speech")
            .header("content-type", "audio/wav")
            .body(Body::from(clip))
            .expect("request");

        let (status, body) =
            send(app(Arc::new(FixedIntent(Intent::FrequentlyOrderedItems))), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["lines"][0], "Frequently ordered items:");
    }

    #[tokio::test]
    async fn intents_lists_catalog_in_order() {
        let request =
            Request::builder().uri("/api/v1/intents").body(Body::empty()).expect("request");
        let (status, body) =
            send(app(Arc::new(FixedIntent(Intent::OrdersDuringPeriod))), request).await;

        assert_eq!(status, StatusCode::OK);
        let entries = body.as_array().expect("array");
        assert_eq!(entries.len(), Intent::ALL.len());
        assert_eq!(entries[0]["label"], Intent::ALL[0].label());
        assert_eq!(entries[3]["required_input"], "supplier_code");
    }

    #[tokio::test]
    async fn faq_lists_static_entries() {
        let request = Request::builder().uri("/api/v1/faq").body(Body::empty()).expect("request");
        let (status, body) =
            send(app(Arc::new(FixedIntent(Intent::OrdersDuringPeriod))), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(4));
    }
}
