//! `switchyard config`: Configuration management commands.

use anyhow::Context;
use std::path::Path;
use switchyard_config::AppConfig;

pub async fn validate(config_path: Option<&Path>) -> anyhow::Result<()> {
    println!("Validating {}", super::config_path(config_path).display());

    let config = match super::load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    };
    println!("   ✅ Config parsed successfully");

    let warnings = warnings(&config);
    if warnings.is_empty() {
        println!("   ✅ All checks passed");
    } else {
        println!();
        for w in &warnings {
            println!("   ⚠️  {w}");
        }
    }

    println!();
    println!("   Default engine: {}", config.default_engine);
    println!("   Rules:          {}", config.rules.len());
    println!("   Profiles:       {}", config.profiles.len());
    println!("   Overrides:      {}", config.overrides.len());
    println!(
        "   Advisor:        {}",
        if config.advisor.enabled { "enabled" } else { "disabled" }
    );
    println!(
        "   Fallback:       {}",
        if config.fallback.enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

/// Valid but probably unintended settings.
fn warnings(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !config.rules.iter().any(|r| r.condition.contains_key("default")) {
        warnings.push("No catch-all rule (default = true); unmatched work uses the built-in default".to_string());
    }

    let both: Vec<String> = config
        .fallback
        .trigger_conditions
        .iter()
        .filter(|t| config.fallback.non_trigger_conditions.contains(t))
        .map(ToString::to_string)
        .collect();
    if !both.is_empty() {
        warnings.push(format!(
            "Listed as both trigger and non-trigger (never falls back): {}",
            both.join(", ")
        ));
    }

    if config.fallback.enabled && config.fallback.trigger_conditions.is_empty() {
        warnings.push("Fallback is enabled but has no trigger conditions".to_string());
    }

    warnings
}

pub async fn show(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = super::load_config(config_path).context("Failed to load config")?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path(config_path: Option<&Path>) -> anyhow::Result<()> {
    println!("{}", super::config_path(config_path).display());
    Ok(())
}
