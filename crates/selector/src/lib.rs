//! Rule-based engine selection for Switchyard.
//!
//! [`RuleEngine`] turns work metadata into a [`Decision`](switchyard_core::Decision)
//! by walking identifier overrides, module profiles, and a priority-ordered
//! rule matrix. [`DecisionCache`] is the bounded TTL cache it (and the AI
//! advisor) uses to avoid recomputing decisions.

pub mod cache;
pub mod condition;
pub mod pattern;
pub mod rules;

pub use cache::{CacheEntry, CacheStats, DecisionCache};
pub use condition::{Condition, Predicate};
pub use pattern::NamePattern;
pub use rules::{Rule, RuleEngine};
