use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use penny_agent::{
    AskRequest, AssistantRuntime, AudioSample, DispatchInputs, DispatchSettings,
    HuggingFaceClassifier, HuggingFaceTranscriber, QuerySource, Transcriber,
};
use penny_core::{ApplicationError, DateRange};

use crate::commands::{block_on, load_config, open_collection, CommandResult, StepFailure};

#[derive(Debug, Clone, Default)]
pub struct AskArgs {
    pub text: Option<String>,
    pub audio: Option<PathBuf>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub department: Option<String>,
}

pub fn run(args: AskArgs) -> CommandResult {
    let request = match build_request(args) {
        Ok(request) => request,
        Err(message) => return CommandResult::failure("ask", "input", message, 8),
    };

    let config = match load_config("ask") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let result = block_on("ask", async {
        let (pool, repository) = open_collection(&config).await?;

        let classifier = HuggingFaceClassifier::from_config(&config.classifier)
            .map_err(|error| ("integration", error.to_string(), 7u8))?;
        let transcriber: Option<Arc<dyn Transcriber>> = if config.transcription.enabled {
            let transcriber = HuggingFaceTranscriber::from_config(&config.transcription)
                .map_err(|error| ("integration", error.to_string(), 7u8))?;
            Some(Arc::new(transcriber))
        } else {
            None
        };

        let runtime = AssistantRuntime::from_ports(
            Arc::new(classifier),
            transcriber,
            Arc::new(repository),
            DispatchSettings::from(&config.dispatch),
        );
        let reply = runtime.ask(request).await;
        pool.close().await;
        reply.map_err(step_failure)
    });

    match result {
        Ok(reply) => CommandResult::success_with_data(
            "ask",
            reply.lines.join("\n"),
            serde_json::to_value(&reply).ok(),
        ),
        Err(failure) => failure,
    }
}

fn build_request(args: AskArgs) -> Result<AskRequest, String> {
    let date_range = match (args.start_date, args.end_date) {
        (Some(start), Some(end)) => Some(DateRange::new(start, end).map_err(|e| e.to_string())?),
        (None, None) => None,
        _ => return Err("--start-date and --end-date must be supplied together".to_string()),
    };
    let inputs = DispatchInputs { date_range, department: args.department };

    let source = match (args.text, args.audio) {
        (Some(text), None) => QuerySource::Text(text),
        (None, Some(path)) => {
            let bytes = fs::read(&path)
                .map_err(|error| format!("failed to read `{}`: {error}", path.display()))?;
            QuerySource::Speech(AudioSample::new(bytes, audio_content_type(&path)))
        }
        (Some(_), Some(_)) => return Err("pass either query text or --audio, not both".to_string()),
        (None, None) => return Err("a query text or --audio file is required".to_string()),
    };

    Ok(AskRequest { source, inputs })
}

fn audio_content_type(path: &Path) -> Option<String> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let content_type = match extension.as_str() {
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "webm" => "audio/webm",
        _ => return None,
    };
    Some(content_type.to_string())
}

fn step_failure(error: ApplicationError) -> StepFailure {
    let (error_class, exit_code) = match &error {
        ApplicationError::Domain(_) => ("input", 8),
        ApplicationError::Persistence(_) => ("persistence", 5),
        ApplicationError::Integration(_) => ("integration", 7),
        ApplicationError::Configuration(_) => ("config_validation", 2),
    };
    (error_class, error.to_string(), exit_code)
}
