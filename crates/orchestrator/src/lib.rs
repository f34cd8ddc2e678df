//! Run orchestration for Switchyard.
//!
//! [`Orchestrator`] picks an engine (advisor first, then rules), runs the
//! caller's work on it, classifies failures with [`classify`], and consults
//! the [`FallbackPolicy`] before retrying once on the other engine.

pub mod classify;
pub mod orchestrator;
pub mod policy;

pub use classify::{CLASSIFICATION_TABLE, ClassificationRule, classify, classify_class};
pub use orchestrator::{Orchestrator, RunFailure, RunStats};
pub use policy::FallbackPolicy;
