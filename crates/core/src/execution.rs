//! Per-run execution records.

use crate::decision::Decision;
use crate::engine::Engine;
use crate::error::ErrorType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Passed,
    Failed,
}

/// One execution of the work on one engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub engine: Engine,
    pub status: AttemptStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ErrorType>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl AttemptRecord {
    pub fn passed(engine: Engine, started_at: DateTime<Utc>, duration_ms: u64) -> Self {
        Self {
            engine,
            status: AttemptStatus::Passed,
            error: None,
            error_type: None,
            started_at,
            duration_ms,
        }
    }

    pub fn failed(
        engine: Engine,
        error: impl Into<String>,
        error_type: ErrorType,
        started_at: DateTime<Utc>,
        duration_ms: u64,
    ) -> Self {
        Self {
            engine,
            status: AttemptStatus::Failed,
            error: Some(error.into()),
            error_type: Some(error_type),
            started_at,
            duration_ms,
        }
    }

    pub fn is_passed(&self) -> bool {
        self.status == AttemptStatus::Passed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalStatus {
    Passed,
    PassedWithFallback,
    Failed,
}

/// The outcome of one orchestrated run. Built fresh per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub run_id: String,
    /// The decision the primary attempt ran under.
    pub decision: Decision,
    /// One record per attempt; never more than two.
    pub attempts: Vec<AttemptRecord>,
    pub final_status: FinalStatus,
    pub fallback_triggered: bool,
}

impl ExecutionResult {
    pub fn new(decision: Decision) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            decision,
            attempts: Vec::with_capacity(2),
            final_status: FinalStatus::Failed,
            fallback_triggered: false,
        }
    }

    pub fn passed(&self) -> bool {
        matches!(
            self.final_status,
            FinalStatus::Passed | FinalStatus::PassedWithFallback
        )
    }

    /// The engine of the last attempt, if any ran.
    pub fn final_engine(&self) -> Option<Engine> {
        self.attempts.last().map(|a| a.engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::DecisionSource;

    #[test]
    fn new_result_is_empty_and_failed() {
        let d = Decision::new(Engine::Playwright, 90, "r", "n", DecisionSource::Rule);
        let r = ExecutionResult::new(d);
        assert!(r.attempts.is_empty());
        assert!(!r.passed());
        assert!(!r.fallback_triggered);
        assert_eq!(r.final_engine(), None);
        assert_eq!(r.run_id.len(), 36);
    }

    #[test]
    fn attempt_record_serialization() {
        let a = AttemptRecord::failed(
            Engine::Selenium,
            "browser crashed",
            ErrorType::BrowserCrash,
            Utc::now(),
            12,
        );
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error_type"], "browser_crash");
        assert_eq!(json["engine"], "selenium");

        let p = AttemptRecord::passed(Engine::Playwright, Utc::now(), 3);
        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("error").is_none());
    }
}
