//! The rule engine.
//!
//! Selection runs in three stages, first hit wins:
//!
//! 1. identifier overrides (exact before wildcard), confidence 100
//! 2. the module's profile, confidence 85
//! 3. the rule matrix, highest priority first
//!
//! If nothing matches, a low-confidence default decision is returned.
//! Results are cached by the metadata's stable key.

use crate::cache::{CacheStats, DecisionCache};
use crate::condition::Condition;
use crate::pattern::NamePattern;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use switchyard_config::{AppConfig, RuleConfig};
use switchyard_core::{Decision, DecisionSource, Engine, WorkMetadata};
use tracing::{debug, info};

pub const OVERRIDE_CONFIDENCE: u8 = 100;
pub const PROFILE_CONFIDENCE: u8 = 85;
pub const DEFAULT_CONFIDENCE: u8 = 50;

const OVERRIDE_PRIORITY: u8 = 100;
const PROFILE_PRIORITY: u8 = 90;

/// One compiled entry of the decision matrix.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub engine: Engine,
    pub confidence: u8,
    pub reason: String,
    pub fallback_engine: Option<Engine>,
    pub priority: u8,
    condition: Condition,
    /// Position in the configuration; breaks priority ties.
    order: usize,
}

impl Rule {
    pub fn from_config(config: &RuleConfig, order: usize) -> Self {
        Self {
            name: config.name.clone(),
            engine: config.engine,
            confidence: config.confidence.min(100),
            reason: config.reason.clone(),
            fallback_engine: config.fallback_engine,
            priority: config.priority.min(100),
            condition: Condition::compile(&config.condition),
            order,
        }
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    pub fn matches(&self, metadata: &WorkMetadata) -> bool {
        self.condition.matches(metadata)
    }

    fn decision(&self) -> Decision {
        let reason = if self.reason.is_empty() {
            format!("Matched rule '{}'", self.name)
        } else {
            self.reason.clone()
        };
        Decision::new(
            self.engine,
            self.confidence,
            reason,
            &self.name,
            DecisionSource::Rule,
        )
        .with_fallback(self.fallback_engine)
        .with_priority(self.priority)
    }
}

#[derive(Debug, Clone)]
struct Override {
    raw: String,
    pattern: NamePattern,
    engine: Engine,
    reason: Option<String>,
}

#[derive(Debug, Clone)]
struct Profile {
    engine: Engine,
    reason: Option<String>,
    fallback_engine: Option<Engine>,
}

/// Deterministic, cached engine selection.
///
/// Thread-safe. `update_priority` takes the rule list's write lock, so it
/// never interleaves with an in-flight `select`.
pub struct RuleEngine {
    default_engine: Engine,
    overrides: Vec<Override>,
    profiles: HashMap<String, Profile>,
    rules: RwLock<Vec<Rule>>,
    cache: DecisionCache<Decision>,
}

impl RuleEngine {
    pub fn from_config(config: &AppConfig) -> Self {
        let mut overrides: Vec<Override> = config
            .overrides
            .iter()
            .map(|o| Override {
                raw: o.pattern.clone(),
                pattern: NamePattern::compile(&o.pattern),
                engine: o.engine,
                reason: o.reason.clone(),
            })
            .collect();
        // Exact identifiers win over wildcards; config order otherwise.
        overrides.sort_by_key(|o| !o.pattern.is_exact());

        let profiles = config
            .profiles
            .iter()
            .map(|(module, p)| {
                (
                    module.clone(),
                    Profile {
                        engine: p.engine,
                        reason: p.reason.clone(),
                        fallback_engine: p.fallback_engine,
                    },
                )
            })
            .collect();

        let mut rules: Vec<Rule> = config
            .rules
            .iter()
            .enumerate()
            .map(|(i, r)| Rule::from_config(r, i))
            .collect();
        sort_rules(&mut rules);

        info!(
            rules = rules.len(),
            overrides = overrides.len(),
            profiles = config.profiles.len(),
            "Rule engine initialised"
        );

        Self {
            default_engine: config.default_engine,
            overrides,
            profiles,
            rules: RwLock::new(rules),
            cache: DecisionCache::new(
                config.cache.capacity,
                Duration::from_secs(config.cache.ttl_secs),
            ),
        }
    }

    /// Pick an engine for `metadata`. Never fails.
    pub fn select(&self, metadata: &WorkMetadata) -> Decision {
        let key = metadata.cache_key();
        let rules = self.rules.read().unwrap_or_else(PoisonError::into_inner);

        let decision = match self.cache.get(&key) {
            Some(cached) => {
                debug!(rule = %cached.rule_name, engine = %cached.engine, "Decision cache hit");
                cached.with_cache_hit(true)
            }
            None => {
                let fresh = self.evaluate(metadata, &rules);
                self.cache.put(key, fresh.clone());
                fresh
            }
        };
        drop(rules);

        match metadata.priority_override() {
            Some(p) => decision.with_priority(p.clamp(0, 100) as u8),
            None => decision,
        }
    }

    fn evaluate(&self, metadata: &WorkMetadata, rules: &[Rule]) -> Decision {
        if let Some(id) = metadata.id() {
            if let Some(o) = self.overrides.iter().find(|o| o.pattern.matches(id)) {
                debug!(test = id, pattern = %o.raw, engine = %o.engine, "Override matched");
                let reason = o
                    .reason
                    .clone()
                    .unwrap_or_else(|| format!("Test '{id}' pinned by override '{}'", o.raw));
                return Decision::new(
                    o.engine,
                    OVERRIDE_CONFIDENCE,
                    reason,
                    format!("override:{}", o.raw),
                    DecisionSource::Override,
                )
                .with_fallback(Some(o.engine.alternate()))
                .with_priority(OVERRIDE_PRIORITY);
            }
        }

        if let Some(module) = metadata.module() {
            if let Some(p) = self.profiles.get(module) {
                debug!(module, engine = %p.engine, "Profile matched");
                let reason = p
                    .reason
                    .clone()
                    .unwrap_or_else(|| format!("Module '{module}' profile prefers {}", p.engine));
                return Decision::new(
                    p.engine,
                    PROFILE_CONFIDENCE,
                    reason,
                    format!("profile:{module}"),
                    DecisionSource::Profile,
                )
                .with_fallback(p.fallback_engine.or(Some(p.engine.alternate())))
                .with_priority(PROFILE_PRIORITY);
            }
        }

        if let Some(rule) = rules.iter().find(|r| r.matches(metadata)) {
            debug!(rule = %rule.name, engine = %rule.engine, "Rule matched");
            return rule.decision();
        }

        debug!(engine = %self.default_engine, "No rule matched; using default");
        self.default_decision()
    }

    fn default_decision(&self) -> Decision {
        Decision::new(
            self.default_engine,
            DEFAULT_CONFIDENCE,
            format!("No matching rule; defaulting to {}", self.default_engine),
            "default",
            DecisionSource::Default,
        )
        .with_fallback(Some(self.default_engine.alternate()))
        .with_priority(0)
    }

    /// Change a rule's priority, re-sort, and drop every cached decision.
    ///
    /// Returns `false` (and changes nothing) if no rule is named `name`.
    pub fn update_priority(&self, name: &str, new_priority: u8) -> bool {
        let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);
        let Some(rule) = rules.iter_mut().find(|r| r.name == name) else {
            debug!(rule = name, "update_priority: unknown rule");
            return false;
        };

        let old = rule.priority;
        rule.priority = new_priority.min(100);
        sort_rules(&mut rules);
        self.cache.clear();

        info!(rule = name, old, new = new_priority.min(100), "Rule priority updated");
        true
    }

    /// The rules in evaluation order.
    pub fn rules(&self) -> Vec<Rule> {
        self.rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

/// Descending priority; configuration order among equals.
fn sort_rules(rules: &mut [Rule]) {
    rules.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.order.cmp(&b.order)));
}
