//! Test-identifier patterns for overrides.
//!
//! ```text
//! test_checkout_flow     exact
//! test_legacy_*          prefix
//! *_smoke                suffix
//! test_*_smoke           prefix + suffix
//! test_*_admin_*         anchored glob (regex)
//! ```

use regex_lite::Regex;
use tracing::warn;

/// A compiled identifier pattern.
#[derive(Debug, Clone)]
pub enum NamePattern {
    Exact(String),
    /// Exactly one `*`: the identifier must start with `prefix` and end with
    /// `suffix`, without the two overlapping.
    Affix { prefix: String, suffix: String },
    /// Two or more `*`.
    Glob(Regex),
    /// A glob that failed to compile; never matches.
    Invalid,
}

impl NamePattern {
    pub fn compile(pattern: &str) -> Self {
        match pattern.matches('*').count() {
            0 => NamePattern::Exact(pattern.to_string()),
            1 => {
                let (prefix, suffix) = pattern.split_once('*').unwrap_or((pattern, ""));
                NamePattern::Affix {
                    prefix: prefix.to_string(),
                    suffix: suffix.to_string(),
                }
            }
            _ => {
                let body = pattern
                    .split('*')
                    .map(regex_lite::escape)
                    .collect::<Vec<_>>()
                    .join(".*");
                match Regex::new(&format!("^{body}$")) {
                    Ok(re) => NamePattern::Glob(re),
                    Err(e) => {
                        warn!(pattern, error = %e, "Invalid override pattern; it will never match");
                        NamePattern::Invalid
                    }
                }
            }
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, NamePattern::Exact(_))
    }

    pub fn matches(&self, id: &str) -> bool {
        match self {
            NamePattern::Exact(s) => s == id,
            NamePattern::Affix { prefix, suffix } => {
                id.len() >= prefix.len() + suffix.len()
                    && id.starts_with(prefix.as_str())
                    && id.ends_with(suffix.as_str())
            }
            NamePattern::Glob(re) => re.is_match(id),
            NamePattern::Invalid => false,
        }
    }
}
