//! Prompt construction for the AI advisor.

use serde_json::Value;
use switchyard_core::{Engine, WorkMetadata};

/// System prompt sent with every advisor request.
pub const SYSTEM_PROMPT: &str = "You are a test-automation architect. \
You choose the browser automation engine that will run a test most reliably. \
Answer with a single JSON object and nothing else.";

/// Build the user prompt for `metadata`.
///
/// Only the stable metadata attributes are included, so identical work
/// produces an identical prompt (and therefore the same cache key).
pub fn build_prompt(metadata: &WorkMetadata, historical: Option<&Value>) -> String {
    let mut prompt = String::from("Select the engine for this test.\n\nTest metadata:\n");
    prompt.push_str(&metadata.canonical_json());
    prompt.push_str("\n\nAvailable engines:\n");
    for engine in Engine::ALL {
        prompt.push_str(&format!("- {}: {}\n", engine, engine.strengths()));
    }

    if let Some(history) = historical {
        prompt.push_str("\nHistorical results:\n");
        prompt.push_str(&history.to_string());
        prompt.push('\n');
    }

    prompt.push_str(
        "\nRespond with JSON: \
         {\"engine\": \"playwright\" | \"selenium\", \
         \"confidence\": <integer 0-100>, \
         \"reasoning\": \"<one sentence>\"}",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prompt_lists_both_engines_and_metadata() {
        let m = WorkMetadata::new().with("id", "test_checkout_flow");
        let p = build_prompt(&m, None);
        assert!(p.contains("test_checkout_flow"));
        assert!(p.contains("- playwright:"));
        assert!(p.contains("- selenium:"));
        assert!(!p.contains("Historical"));
    }

    #[test]
    fn prompt_ignores_volatile_fields() {
        let a = WorkMetadata::new().with("id", "t").with("run_id", "1");
        let b = WorkMetadata::new().with("id", "t").with("run_id", "2");
        assert_eq!(build_prompt(&a, None), build_prompt(&b, None));
    }

    #[test]
    fn prompt_includes_history() {
        let m = WorkMetadata::new().with("id", "t");
        let p = build_prompt(&m, Some(&json!({"selenium_pass_rate": 0.42})));
        assert!(p.contains("Historical results"));
        assert!(p.contains("0.42"));
    }
}
