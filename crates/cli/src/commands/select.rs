//! `switchyard select`: Engine selection from the rule engine.

use anyhow::Context;
use std::path::Path;
use switchyard_core::WorkMetadata;
use switchyard_selector::RuleEngine;

pub async fn run(config_path: Option<&Path>, metadata_json: &str) -> anyhow::Result<()> {
    let config = super::load_config(config_path).context("Failed to load config")?;
    let metadata = parse_metadata(metadata_json)?;

    let engine = RuleEngine::from_config(&config);
    let decision = engine.select(&metadata);
    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}

fn parse_metadata(json: &str) -> anyhow::Result<WorkMetadata> {
    let value: serde_json::Value =
        serde_json::from_str(json).context("--metadata is not valid JSON")?;
    Ok(WorkMetadata::try_from(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_object_metadata() {
        let m = parse_metadata(r#"{"id": "test_login", "modern_spa": true}"#).unwrap();
        assert_eq!(m.id(), Some("test_login"));
    }

    #[test]
    fn rejects_non_object_metadata() {
        assert!(parse_metadata("[1, 2]").is_err());
        assert!(parse_metadata("not json").is_err());
    }
}
