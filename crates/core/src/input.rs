use std::sync::OnceLock;

use regex::Regex;

/// Substituted for the query when speech could not be understood.
pub const UNINTELLIGIBLE_AUDIO: &str = "Could not understand audio";

static STANDALONE_DIGITS: OnceLock<Regex> = OnceLock::new();

fn standalone_digits() -> &'static Regex {
    STANDALONE_DIGITS.get_or_init(|| Regex::new(r"\b\d+\b").expect("digit pattern is valid"))
}

/// Returns the first run of digits bounded by word boundaries.
///
/// Only the first match is used; digits glued to letters (`abc123`) do not count.
pub fn extract_numeric_token(text: &str) -> Option<String> {
    standalone_digits().find(text).map(|found| found.as_str().to_string())
}

/// Text substituted for the query when the transcription service fails.
pub fn transcription_failure_text(description: &str) -> String {
    format!("Error: {description}")
}

#[cfg(test)]
mod tests {
    use super::{extract_numeric_token, transcription_failure_text};

    #[test]
    fn text_without_digits_has_no_token() {
        assert_eq!(extract_numeric_token("total spend by each supplier"), None);
        assert_eq!(extract_numeric_token(""), None);
    }

    #[test]
    fn digits_inside_a_word_are_ignored() {
        assert_eq!(extract_numeric_token("abc123"), None);
        assert_eq!(extract_numeric_token("supplier X500Y please"), None);
    }

    #[test]
    fn standalone_digits_are_extracted() {
        assert_eq!(extract_numeric_token("order 123 now"), Some("123".to_string()));
        assert_eq!(extract_numeric_token("500"), Some("500".to_string()));
    }

    #[test]
    fn only_the_first_standalone_run_is_used() {
        assert_eq!(
            extract_numeric_token("supplier 1200 and supplier 1300"),
            Some("1200".to_string())
        );
        assert_eq!(extract_numeric_token("code-77, qty 3"), Some("77".to_string()));
    }

    #[test]
    fn failure_text_carries_the_description() {
        assert_eq!(transcription_failure_text("timeout"), "Error: timeout");
    }
}
