use penny_core::Intent;
use serde_json::json;

use crate::commands::CommandResult;

pub fn run() -> CommandResult {
    let message = Intent::ALL
        .iter()
        .enumerate()
        .map(|(index, intent)| format!("{}. {}", index + 1, intent.label()))
        .collect::<Vec<_>>()
        .join("\n");

    let data = Intent::ALL
        .iter()
        .map(|intent| {
            json!({
                "label": intent.label(),
                "intent": intent,
                "query_kind": intent.query_kind(),
                "required_input": intent.required_input(),
            })
        })
        .collect::<Vec<_>>();

    CommandResult::success_with_data("intents", message, Some(data.into()))
}
