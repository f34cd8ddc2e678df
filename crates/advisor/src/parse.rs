//! Extracting a recommendation from free-form advisor text.
//!
//! Models wrap their JSON in prose or code fences, so the parser looks for
//! the first balanced `{...}` object (brace counting skips string literals)
//! and decodes that.

use serde::Deserialize;
use serde_json::Value;
use switchyard_core::{AdvisorError, Engine};

/// A parsed advisor recommendation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    pub engine: Engine,
    pub confidence: u8,
    pub reasoning: String,
}

#[derive(Deserialize)]
struct RawReply {
    engine: String,
    confidence: Value,
    #[serde(default)]
    reasoning: String,
}

/// Return the first balanced JSON object in `text`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse `text` into a [`Recommendation`].
pub fn parse_recommendation(text: &str) -> Result<Recommendation, AdvisorError> {
    let object = extract_json_object(text)
        .ok_or_else(|| AdvisorError::MalformedResponse("no JSON object in response".into()))?;

    let raw: RawReply = serde_json::from_str(object)
        .map_err(|e| AdvisorError::MalformedResponse(format!("invalid JSON: {e}")))?;

    let engine: Engine = raw
        .engine
        .parse()
        .map_err(AdvisorError::MalformedResponse)?;

    let confidence = match &raw.confidence {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| {
        AdvisorError::MalformedResponse(format!("confidence is not an integer: {}", raw.confidence))
    })?;

    Ok(Recommendation {
        engine,
        confidence: confidence.clamp(0, 100) as u8,
        reasoning: raw.reasoning.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_object_from_prose() {
        let text = "Sure! Here you go:\n```json\n{\"engine\": \"selenium\", \"confidence\": 80}\n```";
        assert_eq!(
            extract_json_object(text),
            Some("{\"engine\": \"selenium\", \"confidence\": 80}")
        );
    }

    #[test]
    fn braces_inside_strings_are_ignored() {
        let text = r#"{"engine": "playwright", "reasoning": "uses {curly} braces }"} trailing }"#;
        let obj = extract_json_object(text).unwrap();
        assert!(obj.ends_with("braces }\"}"));
    }

    #[test]
    fn nested_objects() {
        let text = r#"x {"a": {"b": 1}, "c": 2} y"#;
        assert_eq!(extract_json_object(text), Some(r#"{"a": {"b": 1}, "c": 2}"#));
    }

    #[test]
    fn unbalanced_is_none() {
        assert_eq!(extract_json_object("{\"engine\": \"selenium\""), None);
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object(""), None);
    }

    #[test]
    fn parses_recommendation() {
        let r = parse_recommendation(
            r#"I recommend {"engine": "Playwright", "confidence": 88, "reasoning": " SPA "}"#,
        )
        .unwrap();
        assert_eq!(r.engine, Engine::Playwright);
        assert_eq!(r.confidence, 88);
        assert_eq!(r.reasoning, "SPA");
    }

    #[test]
    fn confidence_is_clamped_and_coerced() {
        let r = parse_recommendation(r#"{"engine": "selenium", "confidence": 140}"#).unwrap();
        assert_eq!(r.confidence, 100);
        let r = parse_recommendation(r#"{"engine": "selenium", "confidence": "75"}"#).unwrap();
        assert_eq!(r.confidence, 75);
        let r = parse_recommendation(r#"{"engine": "selenium", "confidence": 74.6}"#).unwrap();
        assert_eq!(r.confidence, 75);
    }

    #[test]
    fn rejects_bad_replies() {
        for text in [
            "",
            "no object",
            r#"{"engine": "cypress", "confidence": 90}"#,
            r#"{"engine": "selenium", "confidence": "high"}"#,
            r#"{"confidence": 90}"#,
            r#"{"engine": "selenium", "confidence": 90,}"#,
        ] {
            assert!(
                matches!(
                    parse_recommendation(text),
                    Err(AdvisorError::MalformedResponse(_))
                ),
                "expected malformed for {text:?}"
            );
        }
    }
}
