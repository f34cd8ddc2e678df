//! `switchyard init`: Write the default configuration.

use std::path::Path;
use switchyard_config::AppConfig;

pub async fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    let path = super::config_path(config_path);

    if path.exists() {
        println!("⚠️  Config already exists at: {}", path.display());
        println!("   Edit it manually or delete it and re-run init.");
        return Ok(());
    }

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&path, AppConfig::default_toml())?;
    println!("✅ Created config at: {}", path.display());
    println!("\nNext steps:");
    println!("   1. Edit the [[rules]] in {} to match your suite", path.display());
    println!("   2. Run: switchyard rules");
    println!("   3. Try: switchyard select --metadata '{{\"id\": \"test_login\", \"modern_spa\": true}}'");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_default_config_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        run(Some(&path)).await.unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: AppConfig = toml::from_str(&written).unwrap();
        assert_eq!(parsed.rules.len(), AppConfig::default().rules.len());

        std::fs::write(&path, "# mine\n").unwrap();
        run(Some(&path)).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine\n");
    }
}
