use std::sync::Arc;

use tracing::{debug, warn};

use penny_core::domain::intent::{catalog_labels, Intent};
use penny_core::errors::ApplicationError;

use crate::classifier::ZeroShotClassifier;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Classification {
    pub intent: Intent,
    pub score: f64,
}

/// Picks the single top-ranked catalog intent. There is no confidence floor and
/// no local fallback.
#[derive(Clone)]
pub struct IntentRouter {
    classifier: Arc<dyn ZeroShotClassifier>,
}

impl IntentRouter {
    pub fn new(classifier: Arc<dyn ZeroShotClassifier>) -> Self {
        Self { classifier }
    }

    pub async fn classify(&self, text: &str) -> Result<Classification, ApplicationError> {
        let labels = catalog_labels();
        let ranked = self.classifier.rank(text, &labels).await?;

        let Some(top) = ranked.first() else {
            warn!(event_name = "router.classify.empty", "classifier returned no ranking");
            return Err(ApplicationError::Integration(
                "classifier returned an empty ranking".to_string(),
            ));
        };

        let intent = Intent::from_label(&top.label).ok_or_else(|| {
            warn!(
                event_name = "router.classify.unknown_label",
                label = %top.label,
                "classifier returned a label outside the catalog"
            );
            ApplicationError::Integration(format!(
                "classifier returned a label outside the catalog: `{}`",
                top.label
            ))
        })?;

        debug!(
            event_name = "router.classify.selected",
            intent = intent.label(),
            score = top.score,
            "intent selected"
        );
        Ok(Classification { intent, score: top.score })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use penny_core::domain::intent::Intent;
    use penny_core::errors::ApplicationError;

    use super::IntentRouter;
    use crate::classifier::{ClassifierError, RankedLabel, ZeroShotClassifier};

    struct FixedRanking(Vec<(&'static str, f64)>);

    #[async_trait]
    impl ZeroShotClassifier for FixedRanking {
        async fn rank(
            &self,
            _text: &str,
            candidate_labels: &[&str],
        ) -> Result<Vec<RankedLabel>, ClassifierError> {
            assert_eq!(candidate_labels.len(), Intent::ALL.len());
            Ok(self
                .0
                .iter()
                .map(|(label, score)| RankedLabel { label: label.to_string(), score: *score })
                .collect())
        }
    }

    fn router(ranking: Vec<(&'static str, f64)>) -> IntentRouter {
        IntentRouter::new(Arc::new(FixedRanking(ranking)))
    }

    #[tokio::test]
    async fn top_ranked_label_wins_regardless_of_score() {
        let classification = router(vec![
            ("Comparison of spending between departments", 0.11),
            ("Frequently ordered line items", 0.10),
        ])
        .classify("hello")
        .await
        .expect("classify");

        assert_eq!(classification.intent, Intent::DepartmentSpendingComparison);
    }

    #[tokio::test]
    async fn empty_ranking_is_an_integration_error() {
        let error = router(Vec::new()).classify("hello").await.expect_err("empty");
        assert!(matches!(error, ApplicationError::Integration(_)));
    }

    #[tokio::test]
    async fn label_outside_catalog_is_an_integration_error() {
        let error = router(vec![("Weather tomorrow", 0.99)])
            .classify("hello")
            .await
            .expect_err("unknown label");
        assert!(
            matches!(error, ApplicationError::Integration(ref message) if message.contains("Weather"))
        );
    }
}
