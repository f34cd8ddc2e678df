//! `switchyard rules`: List the rule matrix in evaluation order.

use anyhow::Context;
use std::path::Path;
use switchyard_selector::RuleEngine;

pub async fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = super::load_config(config_path).context("Failed to load config")?;

    if !config.overrides.is_empty() {
        println!("Overrides ({}):", config.overrides.len());
        for o in &config.overrides {
            println!("  {} -> {}", o.pattern, o.engine);
        }
        println!();
    }

    if !config.profiles.is_empty() {
        println!("Profiles ({}):", config.profiles.len());
        for (module, profile) in &config.profiles {
            println!("  {module} -> {}", profile.engine);
        }
        println!();
    }

    let engine = RuleEngine::from_config(&config);
    let rules = engine.rules();
    println!("Rules ({}, highest priority first):\n", rules.len());
    for (i, rule) in rules.iter().enumerate() {
        println!(
            "  {}. {} (priority: {}, engine: {}, confidence: {})",
            i + 1,
            rule.name,
            rule.priority,
            rule.engine,
            rule.confidence
        );
        println!("     when: {}", rule.condition());
        if !rule.reason.is_empty() {
            println!("     reason: {}", rule.reason);
        }
    }
    Ok(())
}
