//! AI advisor layer for Switchyard.
//!
//! Wraps any [`Advisor`](switchyard_core::Advisor) with prompt building,
//! retry with exponential backoff, a prompt-keyed reply cache, and a
//! confidence gate. Concrete model clients live outside this crate.

pub mod advisory;
pub mod parse;
pub mod prompt;

pub use advisory::{ADVISOR_RULE_NAME, AdvisorSettings, AdvisoryAi};
pub use parse::{Recommendation, parse_recommendation};
pub use prompt::{SYSTEM_PROMPT, build_prompt};
