use std::sync::Arc;

use tracing::{info, warn};

use penny_core::input::{transcription_failure_text, UNINTELLIGIBLE_AUDIO};

use crate::transcription::{AudioSample, Transcriber, TranscriptionError};

pub const SPEECH_PROMPT: &str = "Please say your query:";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuerySource {
    Text(String),
    Speech(AudioSample),
}

/// Raw query text plus the notices a console front-end would have printed
/// while capturing it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizedQuery {
    pub text: String,
    pub notices: Vec<String>,
}

#[derive(Clone, Default)]
pub struct InputNormalizer {
    transcriber: Option<Arc<dyn Transcriber>>,
}

impl InputNormalizer {
    pub fn new(transcriber: Option<Arc<dyn Transcriber>>) -> Self {
        Self { transcriber }
    }

    pub fn speech_enabled(&self) -> bool {
        self.transcriber.is_some()
    }

    /// Never fails: transcription problems become substitute text that still
    /// flows through classification.
    pub async fn obtain_query(&self, source: QuerySource) -> NormalizedQuery {
        match source {
            QuerySource::Text(text) => NormalizedQuery { text, notices: Vec::new() },
            QuerySource::Speech(sample) => self.transcribe(&sample).await,
        }
    }

    async fn transcribe(&self, sample: &AudioSample) -> NormalizedQuery {
        let mut notices = vec![SPEECH_PROMPT.to_string()];

        let Some(transcriber) = &self.transcriber else {
            warn!(
                event_name = "input.speech.unconfigured",
                "speech input received without a transcriber"
            );
            return NormalizedQuery {
                text: transcription_failure_text("speech transcription is not configured"),
                notices,
            };
        };

        let text = match transcriber.transcribe(sample).await {
            Ok(text) => {
                info!(
                    event_name = "input.speech.recognized",
                    chars = text.len(),
                    "speech recognized"
                );
                notices.push(format!("Recognized query: {text}"));
                text
            }
            Err(TranscriptionError::Unintelligible) => {
                info!(event_name = "input.speech.unintelligible", "speech was not understood");
                UNINTELLIGIBLE_AUDIO.to_string()
            }
            Err(TranscriptionError::Service(description)) => {
                warn!(
                    event_name = "input.speech.failed",
                    error = %description,
                    "transcription service failed"
                );
                transcription_failure_text(&description)
            }
        };

        NormalizedQuery { text, notices }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use penny_core::input::UNINTELLIGIBLE_AUDIO;

    use super::{InputNormalizer, QuerySource, SPEECH_PROMPT};
    use crate::transcription::{AudioSample, Transcriber, TranscriptionError};

    struct ScriptedTranscriber(Result<String, TranscriptionError>);

    #[async_trait]
    impl Transcriber for ScriptedTranscriber {
        async fn transcribe(&self, _sample: &AudioSample) -> Result<String, TranscriptionError> {
            self.0.clone()
        }
    }

    fn speech() -> QuerySource {
        QuerySource::Speech(AudioSample::new(vec![1, 2, 3], None))
    }

    fn normalizer(result: Result<String, TranscriptionError>) -> InputNormalizer {
        InputNormalizer::new(Some(Arc::new(ScriptedTranscriber(result))))
    }

    #[tokio::test]
    async fn text_is_returned_verbatim_even_when_empty() {
        let normalizer = InputNormalizer::default();
        let query = normalizer.obtain_query(QuerySource::Text(String::new())).await;
        assert_eq!(query.text, "");
        assert!(query.notices.is_empty());
    }

    #[tokio::test]
    async fn recognized_speech_reports_prompt_and_transcript() {
        let query =
            normalizer(Ok("frequently ordered items".to_string())).obtain_query(speech()).await;

        assert_eq!(query.text, "frequently ordered items");
        assert_eq!(
            query.notices,
            vec![SPEECH_PROMPT.to_string(), "Recognized query: frequently ordered items".to_string()]
        );
    }

    #[tokio::test]
    async fn unintelligible_speech_uses_sentinel_text() {
        let query = normalizer(Err(TranscriptionError::Unintelligible)).obtain_query(speech()).await;
        assert_eq!(query.text, UNINTELLIGIBLE_AUDIO);
        assert_eq!(query.notices, vec![SPEECH_PROMPT.to_string()]);
    }

    #[tokio::test]
    async fn service_failure_becomes_error_text() {
        let query = normalizer(Err(TranscriptionError::Service("quota exceeded".to_string())))
            .obtain_query(speech())
            .await;
        assert_eq!(query.text, "Error: quota exceeded");
    }

    #[tokio::test]
    async fn speech_without_transcriber_is_a_service_failure() {
        let normalizer = InputNormalizer::default();
        assert!(!normalizer.speech_enabled());

        let query = normalizer.obtain_query(speech()).await;
        assert!(query.text.starts_with("Error: "));
    }
}
