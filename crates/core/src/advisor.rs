//! Advisor trait: the abstraction over AI recommenders.
//!
//! An Advisor turns a natural-language prompt into free-form text. Concrete
//! implementations (hosted APIs, local model servers) live outside Switchyard;
//! the selection layer only relies on this contract.

use crate::error::AdvisorError;
use async_trait::async_trait;
use std::time::Duration;

/// The core Advisor trait.
#[async_trait]
pub trait Advisor: Send + Sync {
    /// A human-readable name for this advisor (e.g., "ollama", "openai").
    fn name(&self) -> &str;

    /// Generate a completion for `prompt`.
    ///
    /// `timeout` is the budget for this single call. Callers also enforce it
    /// externally, so implementations may treat it as a hint.
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        timeout: Duration,
    ) -> std::result::Result<String, AdvisorError>;

    /// Whether the advisor can be reached right now.
    async fn is_available(&self) -> bool {
        true
    }
}
