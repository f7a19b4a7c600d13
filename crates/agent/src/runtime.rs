use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use penny_core::domain::query::DispatchOutcome;
use penny_core::errors::ApplicationError;
use penny_db::ProcurementRepository;

use crate::classifier::ZeroShotClassifier;
use crate::dispatcher::{DispatchInputs, DispatchSettings, QueryDispatcher};
use crate::normalizer::{InputNormalizer, QuerySource};
use crate::router::IntentRouter;
use crate::transcription::Transcriber;

pub const EMPTY_QUERY_PROMPT: &str = "Please enter a query.";

#[derive(Clone, Debug)]
pub struct AskRequest {
    pub source: QuerySource,
    pub inputs: DispatchInputs,
}

impl AskRequest {
    pub fn text(text: impl Into<String>) -> Self {
        Self { source: QuerySource::Text(text.into()), inputs: DispatchInputs::default() }
    }

    pub fn with_inputs(mut self, inputs: DispatchInputs) -> Self {
        self.inputs = inputs;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssistantReply {
    pub query: String,
    pub notices: Vec<String>,
    pub intent: Option<&'static str>,
    pub score: Option<f64>,
    pub outcome: Option<DispatchOutcome>,
    pub lines: Vec<String>,
}

/// One normalize → classify → dispatch → render pass per request.
#[derive(Clone)]
pub struct AssistantRuntime {
    normalizer: InputNormalizer,
    router: IntentRouter,
    dispatcher: QueryDispatcher,
}

impl AssistantRuntime {
    pub fn new(
        normalizer: InputNormalizer,
        router: IntentRouter,
        dispatcher: QueryDispatcher,
    ) -> Self {
        Self { normalizer, router, dispatcher }
    }

    pub fn from_ports(
        classifier: Arc<dyn ZeroShotClassifier>,
        transcriber: Option<Arc<dyn Transcriber>>,
        repository: Arc<dyn ProcurementRepository>,
        settings: DispatchSettings,
    ) -> Self {
        Self::new(
            InputNormalizer::new(transcriber),
            IntentRouter::new(classifier),
            QueryDispatcher::new(repository, settings),
        )
    }

    pub fn speech_enabled(&self) -> bool {
        self.normalizer.speech_enabled()
    }

    pub async fn ask(&self, request: AskRequest) -> Result<AssistantReply, ApplicationError> {
        let normalized = self.normalizer.obtain_query(request.source).await;

        if normalized.text.is_empty() {
            return Ok(AssistantReply {
                query: normalized.text,
                notices: normalized.notices,
                intent: None,
                score: None,
                outcome: None,
                lines: vec![EMPTY_QUERY_PROMPT.to_string()],
            });
        }

        let classification = self.router.classify(&normalized.text).await?;
        let outcome = self
            .dispatcher
            .dispatch(classification.intent, &normalized.text, &request.inputs)
            .await?;

        info!(
            event_name = "assistant.ask.answered",
            intent = classification.intent.label(),
            score = classification.score,
            "query answered"
        );

        Ok(AssistantReply {
            lines: outcome.render_lines(),
            query: normalized.text,
            notices: normalized.notices,
            intent: Some(classification.intent.label()),
            score: Some(classification.score),
            outcome: Some(outcome),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use penny_core::domain::intent::Intent;
    use penny_core::domain::query::DispatchOutcome;
    use penny_db::{DemoDataset, InMemoryProcurementRepository};

    use super::{AskRequest, AssistantRuntime, EMPTY_QUERY_PROMPT};
    use crate::classifier::{ClassifierError, RankedLabel, ZeroShotClassifier};
    use crate::dispatcher::DispatchSettings;

    struct CountingClassifier {
        intent: Intent,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ZeroShotClassifier for CountingClassifier {
        async fn rank(
            &self,
            _text: &str,
            _candidate_labels: &[&str],
        ) -> Result<Vec<RankedLabel>, ClassifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![RankedLabel { label: self.intent.label().to_string(), score: 0.9 }])
        }
    }

    fn runtime(intent: Intent) -> (AssistantRuntime, Arc<CountingClassifier>) {
        let classifier = Arc::new(CountingClassifier { intent, calls: AtomicUsize::new(0) });
        let repo =
            InMemoryProcurementRepository::with_records(DemoDataset::records().expect("records"))
                .expect("repo");
        let runtime = AssistantRuntime::from_ports(
            classifier.clone(),
            None,
            Arc::new(repo),
            DispatchSettings::default(),
        );
        (runtime, classifier)
    }

    #[tokio::test]
    async fn empty_text_skips_classification() {
        let (runtime, classifier) = runtime(Intent::FrequentlyOrderedItems);
        let reply = runtime.ask(AskRequest::text("")).await.expect("ask");

        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
        assert_eq!(reply.intent, None);
        assert_eq!(reply.lines, vec![EMPTY_QUERY_PROMPT.to_string()]);
    }

    #[tokio::test]
    async fn whitespace_text_is_still_classified() {
        let (runtime, classifier) = runtime(Intent::FrequentlyOrderedItems);
        let reply = runtime.ask(AskRequest::text("   ")).await.expect("ask");

        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(reply.query, "   ");
        assert_eq!(reply.intent, Some(Intent::FrequentlyOrderedItems.label()));
    }

    #[tokio::test]
    async fn classified_text_is_dispatched_and_rendered() {
        let (runtime, classifier) = runtime(Intent::FrequentlyOrderedItems);
        let reply = runtime.ask(AskRequest::text("what do we buy most")).await.expect("ask");

        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(reply.intent, Some(Intent::FrequentlyOrderedItems.label()));
        assert_eq!(reply.lines[0], "Frequently ordered items:");
        assert_eq!(reply.lines[1], "Copy Paper: 5 times");
    }

    #[tokio::test]
    async fn supplier_query_without_code_asks_for_it() {
        let (runtime, _) = runtime(Intent::SupplierDetails);
        let reply = runtime.ask(AskRequest::text("who supplies our chairs?")).await.expect("ask");

        assert_eq!(reply.outcome, Some(DispatchOutcome::MissingSupplierCode));
        assert_eq!(reply.lines, vec!["Please include the supplier code in your question."]);
    }
}
