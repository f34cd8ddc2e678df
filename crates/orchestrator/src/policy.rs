//! Fallback eligibility.

use std::collections::HashSet;
use switchyard_config::FallbackConfig;
use switchyard_core::ErrorType;

/// Decides whether a failed primary attempt is retried on the other engine.
#[derive(Debug, Clone)]
pub struct FallbackPolicy {
    enabled: bool,
    triggers: HashSet<ErrorType>,
    non_triggers: HashSet<ErrorType>,
}

impl FallbackPolicy {
    pub fn new(
        enabled: bool,
        triggers: impl IntoIterator<Item = ErrorType>,
        non_triggers: impl IntoIterator<Item = ErrorType>,
    ) -> Self {
        Self {
            enabled,
            triggers: triggers.into_iter().collect(),
            non_triggers: non_triggers.into_iter().collect(),
        }
    }

    pub fn from_config(config: &FallbackConfig) -> Self {
        Self::new(
            config.enabled,
            config.trigger_conditions.iter().copied(),
            config.non_trigger_conditions.iter().copied(),
        )
    }

    pub fn disabled() -> Self {
        Self::new(false, [], [])
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enabled, listed as a trigger, and not listed as a non-trigger.
    /// A type in both sets never triggers.
    pub fn is_eligible(&self, error_type: ErrorType) -> bool {
        self.enabled
            && self.triggers.contains(&error_type)
            && !self.non_triggers.contains(&error_type)
    }
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self::from_config(&FallbackConfig::default())
    }
}
