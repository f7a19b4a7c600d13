//! Assistant runtime: turns an utterance into a procurement answer.
//!
//! Each request runs a fixed pipeline:
//! 1. **Normalization** (`normalizer`) - text as-is, or speech through a [`Transcriber`]
//! 2. **Routing** (`router`) - zero-shot ranking of the intent catalog, top label wins
//! 3. **Dispatch** (`dispatcher`) - the intent's fixed aggregation against the repository
//! 4. **Rendering** - result lines from `penny_core::domain::query`
//!
//! The classifier never chooses what query runs beyond picking a catalog label;
//! the label-to-query mapping is the closed `Intent` enum.

pub mod classifier;
pub mod dispatcher;
pub mod normalizer;
pub mod router;
pub mod runtime;
pub mod transcription;

pub use classifier::{ClassifierError, HuggingFaceClassifier, RankedLabel, ZeroShotClassifier};
pub use dispatcher::{DispatchInputs, DispatchSettings, QueryDispatcher, FREQUENT_ITEMS_LIMIT};
pub use normalizer::{InputNormalizer, NormalizedQuery, QuerySource};
pub use router::{Classification, IntentRouter};
pub use runtime::{AskRequest, AssistantReply, AssistantRuntime};
pub use transcription::{AudioSample, HuggingFaceTranscriber, Transcriber, TranscriptionError};
