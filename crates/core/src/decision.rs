//! The result of engine selection.

use crate::engine::Engine;
use serde::{Deserialize, Serialize};

/// Which stage of selection produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    /// An identifier override (exact or wildcard).
    Override,
    /// A per-module profile.
    Profile,
    /// A rule from the priority-ordered matrix.
    Rule,
    /// Nothing matched.
    Default,
    /// The AI advisor.
    Advisor,
}

/// Which engine should run a unit of work, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// The engine to run on.
    pub engine: Engine,

    /// Confidence in `[0, 100]`.
    pub confidence: u8,

    /// Human-readable justification.
    pub reason: String,

    /// Name of the rule (or pseudo-rule) that produced this decision.
    pub rule_name: String,

    /// Engine to use if the first attempt fails with an infra error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_engine: Option<Engine>,

    /// Priority of the producing rule, in `[0, 100]`.
    pub priority: u8,

    /// Whether this decision was served from cache.
    #[serde(default)]
    pub cache_hit: bool,

    pub source: DecisionSource,
}

impl Decision {
    pub fn new(
        engine: Engine,
        confidence: u8,
        reason: impl Into<String>,
        rule_name: impl Into<String>,
        source: DecisionSource,
    ) -> Self {
        Self {
            engine,
            confidence: confidence.min(100),
            reason: reason.into(),
            rule_name: rule_name.into(),
            fallback_engine: None,
            priority: 50,
            cache_hit: false,
            source,
        }
    }

    pub fn with_fallback(mut self, fallback: Option<Engine>) -> Self {
        self.fallback_engine = fallback;
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority.min(100);
        self
    }

    pub fn with_cache_hit(mut self, cache_hit: bool) -> Self {
        self.cache_hit = cache_hit;
        self
    }

    /// The engine a fallback attempt runs on: the configured fallback, or
    /// the alternate when none is set or it names the primary engine.
    pub fn fallback_target(&self) -> Engine {
        match self.fallback_engine {
            Some(e) if e != self.engine => e,
            _ => self.engine.alternate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_and_priority_are_clamped() {
        let d = Decision::new(Engine::Playwright, 250, "r", "n", DecisionSource::Rule)
            .with_priority(200);
        assert_eq!(d.confidence, 100);
        assert_eq!(d.priority, 100);
    }

    #[test]
    fn fallback_target_never_equals_engine() {
        let d = Decision::new(Engine::Selenium, 80, "r", "n", DecisionSource::Rule)
            .with_fallback(Some(Engine::Selenium));
        assert_eq!(d.fallback_target(), Engine::Playwright);

        let d = d.with_fallback(None);
        assert_eq!(d.fallback_target(), Engine::Playwright);
    }

    #[test]
    fn serialization_skips_missing_fallback() {
        let d = Decision::new(Engine::Playwright, 90, "spa", "modern_spa", DecisionSource::Rule);
        let json = serde_json::to_string(&d).unwrap();
        assert!(!json.contains("fallback_engine"));
        assert!(json.contains("\"source\":\"rule\""));
    }
}
