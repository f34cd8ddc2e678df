//! The run orchestrator.
//!
//! Chooses an engine for a unit of work, runs it, and on an infra-class
//! failure re-runs it once on the other engine. Every backend it creates is
//! stopped before `run` returns.
//!
//! ```text
//! NotStarted -> PrimaryRunning -> Completed(passed)
//!                              -> PrimaryFailed -> Completed(failed)
//!                                               -> FallbackRunning -> Completed(passed_with_fallback | failed)
//! ```

use crate::classify::classify;
use crate::policy::FallbackPolicy;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use switchyard_advisor::AdvisoryAi;
use switchyard_config::AppConfig;
use switchyard_core::{
    Advisor, AttemptRecord, Backend, BackendFactory, Decision, Engine, ExecutionResult,
    FinalStatus, WorkMetadata,
};
use switchyard_selector::RuleEngine;
use thiserror::Error;
use tracing::{debug, info, warn};

/// A run that ended in `failed`.
///
/// Carries the full execution record and the error from the primary
/// attempt, which is the one callers usually want to report.
#[derive(Debug, Error)]
#[error("run {} failed on {}: {primary_error:#}", .result.run_id, .result.decision.engine)]
pub struct RunFailure {
    result: Box<ExecutionResult>,
    primary_error: anyhow::Error,
}

impl RunFailure {
    pub fn result(&self) -> &ExecutionResult {
        &self.result
    }

    pub fn primary_error(&self) -> &anyhow::Error {
        &self.primary_error
    }

    pub fn into_parts(self) -> (ExecutionResult, anyhow::Error) {
        (*self.result, self.primary_error)
    }
}

/// Snapshot of the orchestrator's run counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub runs: u64,
    pub passed: u64,
    pub passed_with_fallback: u64,
    pub failed: u64,
    pub fallbacks_triggered: u64,
}

#[derive(Default)]
struct Counters {
    runs: AtomicU64,
    passed: AtomicU64,
    passed_with_fallback: AtomicU64,
    failed: AtomicU64,
    fallbacks_triggered: AtomicU64,
}

impl Counters {
    fn record(&self, result: &ExecutionResult) {
        self.runs.fetch_add(1, Ordering::Relaxed);
        let counter = match result.final_status {
            FinalStatus::Passed => &self.passed,
            FinalStatus::PassedWithFallback => &self.passed_with_fallback,
            FinalStatus::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        if result.fallback_triggered {
            self.fallbacks_triggered.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn snapshot(&self) -> RunStats {
        RunStats {
            runs: self.runs.load(Ordering::Relaxed),
            passed: self.passed.load(Ordering::Relaxed),
            passed_with_fallback: self.passed_with_fallback.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            fallbacks_triggered: self.fallbacks_triggered.load(Ordering::Relaxed),
        }
    }
}

/// Owns one selection session: rule engine, optional advisor, fallback
/// policy and the backend factory.
pub struct Orchestrator {
    rules: RuleEngine,
    advisor: Option<AdvisoryAi>,
    policy: FallbackPolicy,
    backends: Arc<dyn BackendFactory>,
    counters: Counters,
}

impl Orchestrator {
    pub fn new(
        rules: RuleEngine,
        advisor: Option<AdvisoryAi>,
        policy: FallbackPolicy,
        backends: Arc<dyn BackendFactory>,
    ) -> Self {
        Self {
            rules,
            advisor,
            policy,
            backends,
            counters: Counters::default(),
        }
    }

    /// Build everything from one configuration. The advisor layer is only
    /// created when an advisor is supplied.
    pub fn from_config(
        config: &AppConfig,
        backends: Arc<dyn BackendFactory>,
        advisor: Option<Arc<dyn Advisor>>,
    ) -> Self {
        Self::new(
            RuleEngine::from_config(config),
            advisor.map(|a| AdvisoryAi::from_config(a, &config.advisor)),
            FallbackPolicy::from_config(&config.fallback),
            backends,
        )
    }

    pub fn rule_engine(&self) -> &RuleEngine {
        &self.rules
    }

    pub fn advisor(&self) -> Option<&AdvisoryAi> {
        self.advisor.as_ref()
    }

    pub fn policy(&self) -> &FallbackPolicy {
        &self.policy
    }

    pub fn stats(&self) -> RunStats {
        self.counters.snapshot()
    }

    /// The advisor's decision when it has one, otherwise the rule engine's.
    pub async fn choose_decision(&self, metadata: &WorkMetadata) -> Decision {
        if let Some(advisor) = self.advisor.as_ref().filter(|a| a.is_enabled()) {
            if let Some(decision) = advisor.select(metadata, None).await {
                return decision;
            }
            debug!("Advisor had no recommendation; using rules");
        }
        self.rules.select(metadata)
    }

    /// Run `work` on the chosen engine, falling back once if the failure is
    /// eligible. `work` may be called twice.
    pub async fn run<F, Fut>(&self, metadata: &WorkMetadata, work: F) -> Result<ExecutionResult, RunFailure>
    where
        F: Fn(Arc<dyn Backend>) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let decision = self.choose_decision(metadata).await;
        let primary = decision.engine;
        let fallback = decision.fallback_target();
        let mut result = ExecutionResult::new(decision);

        info!(
            run_id = %result.run_id,
            work = metadata.id().unwrap_or("<unnamed>"),
            engine = %primary,
            rule = %result.decision.rule_name,
            confidence = result.decision.confidence,
            "Starting run"
        );

        let (record, primary_error) = self.attempt(primary, &work).await;
        let error_type = record.error_type;
        result.attempts.push(record);

        let Some(primary_error) = primary_error else {
            result.final_status = FinalStatus::Passed;
            return Ok(self.finish(result));
        };

        let error_type = error_type.unwrap_or_else(|| classify(&format!("{primary_error:#}")));
        if !self.policy.is_eligible(error_type) {
            info!(
                run_id = %result.run_id,
                error_type = %error_type,
                class = %error_type.class(),
                "Failure not eligible for fallback"
            );
            result.final_status = FinalStatus::Failed;
            return Err(self.fail(result, primary_error));
        }

        info!(
            run_id = %result.run_id,
            from = %primary,
            to = %fallback,
            error_type = %error_type,
            "Falling back to alternate engine"
        );
        result.fallback_triggered = true;

        let (record, fallback_error) = self.attempt(fallback, &work).await;
        result.attempts.push(record);

        match fallback_error {
            None => {
                result.final_status = FinalStatus::PassedWithFallback;
                Ok(self.finish(result))
            }
            Some(e) => {
                warn!(run_id = %result.run_id, engine = %fallback, error = %e, "Fallback attempt failed");
                result.final_status = FinalStatus::Failed;
                Err(self.fail(result, primary_error))
            }
        }
    }

    /// Create, start, run and stop one backend.
    async fn attempt<F, Fut>(&self, engine: Engine, work: &F) -> (AttemptRecord, Option<anyhow::Error>)
    where
        F: Fn(Arc<dyn Backend>) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let backend = self.backends.create(engine);
        let started_at = Utc::now();
        let clock = tokio::time::Instant::now();

        let outcome = match backend.start().await {
            Ok(()) => work(Arc::clone(&backend)).await,
            Err(e) => Err(anyhow::Error::new(e)),
        };

        if let Err(e) = backend.stop().await {
            warn!(engine = %engine, error = %e, "Failed to stop backend");
        }

        let duration_ms = u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX);
        match outcome {
            Ok(()) => {
                debug!(engine = %engine, duration_ms, "Attempt passed");
                (AttemptRecord::passed(engine, started_at, duration_ms), None)
            }
            Err(e) => {
                let message = format!("{e:#}");
                let error_type = classify(&message);
                warn!(
                    engine = %engine,
                    error_type = %error_type,
                    error = %message,
                    "Attempt failed"
                );
                (
                    AttemptRecord::failed(engine, message, error_type, started_at, duration_ms),
                    Some(e),
                )
            }
        }
    }

    fn finish(&self, result: ExecutionResult) -> ExecutionResult {
        self.counters.record(&result);
        info!(
            run_id = %result.run_id,
            status = ?result.final_status,
            attempts = result.attempts.len(),
            "Run finished"
        );
        result
    }

    fn fail(&self, result: ExecutionResult, primary_error: anyhow::Error) -> RunFailure {
        let result = self.finish(result);
        RunFailure {
            result: Box::new(result),
            primary_error,
        }
    }
}
