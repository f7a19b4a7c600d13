use penny_core::FAQ;

use crate::commands::CommandResult;

pub fn run() -> CommandResult {
    let message = FAQ
        .iter()
        .map(|entry| format!("Q: {}\nA: {}", entry.question, entry.answer))
        .collect::<Vec<_>>()
        .join("\n\n");

    CommandResult::success_with_data("faq", message, serde_json::to_value(FAQ).ok())
}
