//! `switchyard classify`: Failure classification and fallback eligibility.

use anyhow::Context;
use std::path::Path;
use switchyard_orchestrator::{FallbackPolicy, classify};

pub async fn run(config_path: Option<&Path>, message: &str) -> anyhow::Result<()> {
    let config = super::load_config(config_path).context("Failed to load config")?;
    let policy = FallbackPolicy::from_config(&config.fallback);

    let error_type = classify(message);
    println!("Error type: {error_type}");
    println!("Class:      {}", error_type.class());
    println!(
        "Fallback:   {}",
        if policy.is_eligible(error_type) {
            "yes"
        } else {
            "no"
        }
    );
    Ok(())
}
