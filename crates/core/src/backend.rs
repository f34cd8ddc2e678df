//! Backend trait: a running browser-automation engine.
//!
//! Switchyard never drives a browser itself. It instantiates a backend via a
//! [`BackendFactory`], starts it, hands it to the caller's work procedure,
//! and stops it again on every exit path.

use crate::engine::Engine;
use crate::error::BackendError;
use async_trait::async_trait;
use std::sync::Arc;

/// A started-or-stoppable execution engine instance.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Which engine this instance runs.
    fn engine(&self) -> Engine;

    /// Launch the engine (browser process, driver session, ...).
    async fn start(&self) -> std::result::Result<(), BackendError>;

    /// Release everything `start` acquired. Must be safe to call after a
    /// failed or partial start.
    async fn stop(&self) -> std::result::Result<(), BackendError>;
}

/// Creates fresh backend instances. One instance per attempt; instances are
/// never shared between runs.
pub trait BackendFactory: Send + Sync {
    fn create(&self, engine: Engine) -> Arc<dyn Backend>;
}
