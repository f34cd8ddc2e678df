//! # Switchyard Core
//!
//! Domain types, capability traits, and error definitions for Switchyard,
//! the engine selector that decides whether a test runs on Playwright or
//! Selenium and falls back to the other engine on infrastructure failures.
//!
//! This crate has **no runtime dependencies** on the selection machinery.
//! It defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! External collaborators (AI advisors, browser backends) are defined as
//! traits here. Concrete implementations live outside the core. This enables:
//! - Swapping advisors and backends without touching selection logic
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod advisor;
pub mod backend;
pub mod decision;
pub mod engine;
pub mod error;
pub mod execution;
pub mod metadata;

// Re-export key types at crate root for ergonomics
pub use advisor::Advisor;
pub use backend::{Backend, BackendFactory};
pub use decision::{Decision, DecisionSource};
pub use engine::Engine;
pub use error::{AdvisorError, BackendError, ErrorClass, ErrorType, MetadataError};
pub use execution::{AttemptRecord, AttemptStatus, ExecutionResult, FinalStatus};
pub use metadata::WorkMetadata;
