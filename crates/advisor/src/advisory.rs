//! AI-assisted engine selection.
//!
//! Asks an [`Advisor`] which engine to use, retrying transient failures with
//! exponential backoff and caching raw replies by prompt hash. Every failure
//! mode (unreachable, timeout, malformed reply, low confidence) turns into
//! `None`, so callers fall back to the rule engine.

use crate::parse::{Recommendation, parse_recommendation};
use crate::prompt::{SYSTEM_PROMPT, build_prompt};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use switchyard_config::AdvisorConfig;
use switchyard_core::metadata::hash_hex;
use switchyard_core::{Advisor, AdvisorError, Decision, DecisionSource, WorkMetadata};
use switchyard_selector::{CacheStats, DecisionCache};
use tracing::{debug, info, warn};

/// Rule name recorded on advisor decisions.
pub const ADVISOR_RULE_NAME: &str = "ai_advisor";

const ADVISOR_PRIORITY: u8 = 100;

/// Retry and gating knobs, resolved from [`AdvisorConfig`].
#[derive(Debug, Clone)]
pub struct AdvisorSettings {
    pub enabled: bool,
    /// Total attempts per query.
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub timeout: Duration,
    pub confidence_threshold: u8,
}

impl From<&AdvisorConfig> for AdvisorSettings {
    fn from(config: &AdvisorConfig) -> Self {
        Self {
            enabled: config.enabled,
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            timeout: Duration::from_secs(config.timeout_secs),
            confidence_threshold: config.confidence_threshold,
        }
    }
}

/// The advisory layer in front of an [`Advisor`].
pub struct AdvisoryAi {
    advisor: Arc<dyn Advisor>,
    settings: AdvisorSettings,
    /// Raw reply text keyed by SHA-256 of the prompt.
    cache: DecisionCache<String>,
}

impl AdvisoryAi {
    pub fn new(advisor: Arc<dyn Advisor>, settings: AdvisorSettings, cache: DecisionCache<String>) -> Self {
        Self {
            advisor,
            settings,
            cache,
        }
    }

    pub fn from_config(advisor: Arc<dyn Advisor>, config: &AdvisorConfig) -> Self {
        Self::new(
            advisor,
            AdvisorSettings::from(config),
            DecisionCache::new(
                config.cache_capacity,
                Duration::from_secs(config.cache_ttl_secs),
            ),
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    pub fn settings(&self) -> &AdvisorSettings {
        &self.settings
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Ask the advisor for a decision. `None` means "no usable recommendation".
    pub async fn select(&self, metadata: &WorkMetadata, historical: Option<&Value>) -> Option<Decision> {
        if !self.settings.enabled {
            return None;
        }

        let prompt = build_prompt(metadata, historical);
        let key = hash_hex(&prompt);

        let (text, cached) = match self.cache.get(&key) {
            Some(text) => (text, true),
            None => {
                if !self.check_available().await {
                    return None;
                }
                match self.query_with_retry(&prompt).await {
                    Ok(text) => (text, false),
                    Err(e) => {
                        warn!(advisor = self.advisor.name(), error = %e, "Advisor gave no answer");
                        return None;
                    }
                }
            }
        };

        let recommendation = match parse_recommendation(&text) {
            Ok(r) => r,
            Err(e) => {
                warn!(advisor = self.advisor.name(), error = %e, "Unusable advisor reply");
                return None;
            }
        };

        if !cached {
            self.cache.put(key, text);
        }

        if recommendation.confidence < self.settings.confidence_threshold {
            info!(
                engine = %recommendation.engine,
                confidence = recommendation.confidence,
                threshold = self.settings.confidence_threshold,
                "Advisor recommendation below confidence threshold"
            );
            return None;
        }

        Some(self.decision(recommendation, cached))
    }

    /// `is_available`, bounded by the per-call timeout. A hung check counts
    /// as unavailable.
    async fn check_available(&self) -> bool {
        match tokio::time::timeout(self.settings.timeout, self.advisor.is_available()).await {
            Ok(true) => true,
            Ok(false) => {
                debug!(advisor = self.advisor.name(), "Advisor unavailable; skipping");
                false
            }
            Err(_) => {
                warn!(
                    advisor = self.advisor.name(),
                    timeout_ms = self.settings.timeout.as_millis() as u64,
                    "Advisor availability check timed out; skipping"
                );
                false
            }
        }
    }

    fn decision(&self, rec: Recommendation, cached: bool) -> Decision {
        let mut reason = if rec.reasoning.is_empty() {
            format!("AI advisor recommends {}", rec.engine)
        } else {
            format!("AI: {}", rec.reasoning)
        };
        if cached {
            reason.push_str(" (cached)");
        }

        Decision::new(
            rec.engine,
            rec.confidence,
            reason,
            ADVISOR_RULE_NAME,
            DecisionSource::Advisor,
        )
        .with_fallback(Some(rec.engine.alternate()))
        .with_priority(ADVISOR_PRIORITY)
        .with_cache_hit(cached)
    }

    /// Query the advisor, retrying transient failures with exponential backoff.
    ///
    /// Makes at most `max_retries` attempts. Before attempt `n + 1` it waits
    /// `retry_delay * 2^n`. The last error is returned when all attempts fail.
    pub async fn query_with_retry(&self, prompt: &str) -> Result<String, AdvisorError> {
        let attempts = self.settings.max_retries.max(1);
        let mut last_error = AdvisorError::NotConfigured("no attempt made".into());

        for attempt in 0..attempts {
            let call = self
                .advisor
                .generate(prompt, Some(SYSTEM_PROMPT), self.settings.timeout);

            let result = match tokio::time::timeout(self.settings.timeout, call).await {
                Ok(result) => result,
                Err(_) => Err(AdvisorError::Timeout(format!(
                    "advisor '{}' timed out after {}ms",
                    self.advisor.name(),
                    self.settings.timeout.as_millis()
                ))),
            };

            match result {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!(
                        advisor = self.advisor.name(),
                        attempt = attempt + 1,
                        total = attempts,
                        error = %e,
                        "Advisor query failed"
                    );
                    let transient = e.is_transient();
                    last_error = e;
                    if !transient {
                        break;
                    }
                    if attempt + 1 < attempts {
                        tokio::time::sleep(self.backoff_delay(attempt)).await;
                    }
                }
            }
        }

        Err(last_error)
    }

    /// `retry_delay * 2^attempt`, saturating.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.settings
            .retry_delay
            .saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Replays scripted replies; the last one repeats forever.
    struct ScriptedAdvisor {
        replies: Mutex<VecDeque<Result<String, AdvisorError>>>,
        calls: Mutex<Vec<Instant>>,
        available: bool,
    }

    impl ScriptedAdvisor {
        fn new(replies: Vec<Result<String, AdvisorError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
                available: true,
            }
        }

        fn replying(text: &str) -> Self {
            Self::new(vec![Ok(text.to_string())])
        }

        fn failing(error: AdvisorError) -> Self {
            Self::new(vec![Err(error)])
        }

        fn calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Advisor for ScriptedAdvisor {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(
            &self,
            _prompt: &str,
            _system_prompt: Option<&str>,
            _timeout: Duration,
        ) -> Result<String, AdvisorError> {
            self.calls.lock().unwrap().push(Instant::now());
            let mut replies = self.replies.lock().unwrap();
            if replies.len() > 1 {
                replies.pop_front().unwrap()
            } else {
                replies.front().cloned().unwrap()
            }
        }

        async fn is_available(&self) -> bool {
            self.available
        }
    }

    /// Never answers.
    struct HangingAdvisor;

    #[async_trait]
    impl Advisor for HangingAdvisor {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn generate(
            &self,
            _prompt: &str,
            _system_prompt: Option<&str>,
            _timeout: Duration,
        ) -> Result<String, AdvisorError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!()
        }
    }

    /// The paused clock rounds timers to whole milliseconds.
    fn assert_close(actual: Duration, expected: Duration) {
        let diff = actual.abs_diff(expected);
        assert!(
            diff <= Duration::from_millis(2),
            "expected ~{expected:?}, got {actual:?}"
        );
    }

    /// Availability check never resolves; `generate` would answer.
    struct StuckCheckAdvisor {
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl Advisor for StuckCheckAdvisor {
        fn name(&self) -> &str {
            "stuck"
        }

        async fn generate(
            &self,
            _prompt: &str,
            _system_prompt: Option<&str>,
            _timeout: Duration,
        ) -> Result<String, AdvisorError> {
            *self.calls.lock().unwrap() += 1;
            Ok(GOOD_REPLY.to_string())
        }

        async fn is_available(&self) -> bool {
            std::future::pending::<bool>().await
        }
    }

    fn settings() -> AdvisorSettings {
        AdvisorSettings {
            enabled: true,
            max_retries: 3,
            retry_delay: Duration::from_millis(100),
            timeout: Duration::from_secs(5),
            confidence_threshold: 70,
        }
    }

    fn advisory(advisor: Arc<dyn Advisor>) -> AdvisoryAi {
        AdvisoryAi::new(advisor, settings(), DecisionCache::new(16, Duration::from_secs(600)))
    }

    fn metadata() -> WorkMetadata {
        WorkMetadata::new()
            .with("id", "test_checkout_flow")
            .with("module", "checkout")
    }

    const GOOD_REPLY: &str =
        r#"Based on the metadata: {"engine": "selenium", "confidence": 85, "reasoning": "legacy iframe payment widget"}"#;

    #[tokio::test]
    async fn confident_reply_becomes_decision() {
        let advisor = Arc::new(ScriptedAdvisor::replying(GOOD_REPLY));
        let ai = advisory(advisor.clone());

        let d = ai.select(&metadata(), None).await.unwrap();
        assert_eq!(d.engine, switchyard_core::Engine::Selenium);
        assert_eq!(d.confidence, 85);
        assert_eq!(d.rule_name, ADVISOR_RULE_NAME);
        assert_eq!(d.source, DecisionSource::Advisor);
        assert_eq!(d.fallback_engine, Some(switchyard_core::Engine::Playwright));
        assert!(d.reason.contains("legacy iframe"));
        assert!(!d.cache_hit);
        assert_eq!(advisor.calls(), 1);
    }

    #[tokio::test]
    async fn second_select_reuses_cached_text() {
        let advisor = Arc::new(ScriptedAdvisor::replying(GOOD_REPLY));
        let ai = advisory(advisor.clone());

        ai.select(&metadata(), None).await.unwrap();
        let d = ai.select(&metadata(), None).await.unwrap();
        assert!(d.reason.ends_with(" (cached)"));
        assert!(d.cache_hit);
        assert_eq!(advisor.calls(), 1);
        assert_eq!(ai.cache_stats().hits, 1);
    }

    #[tokio::test]
    async fn low_confidence_is_no_recommendation() {
        let advisor = Arc::new(ScriptedAdvisor::replying(
            r#"{"engine": "playwright", "confidence": 40, "reasoning": "unsure"}"#,
        ));
        assert!(advisory(advisor).select(&metadata(), None).await.is_none());
    }

    #[tokio::test]
    async fn malformed_and_empty_replies_are_none() {
        for reply in ["", "I think selenium", r#"{"engine": "selenium", "confidence": }"#] {
            let advisor = Arc::new(ScriptedAdvisor::replying(reply));
            let ai = advisory(advisor);
            assert!(ai.select(&metadata(), None).await.is_none(), "reply {reply:?}");
            assert_eq!(ai.cache_stats().size, 0, "malformed replies are not cached");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn provider_failure_is_none_after_all_retries() {
        let advisor = Arc::new(ScriptedAdvisor::failing(AdvisorError::Network(
            "connection reset".into(),
        )));
        let ai = advisory(advisor.clone());
        assert!(ai.select(&metadata(), None).await.is_none());
        assert_eq!(advisor.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_none() {
        let ai = advisory(Arc::new(HangingAdvisor));
        let start = Instant::now();
        assert!(ai.select(&metadata(), None).await.is_none());
        // 3 timeouts of 5s plus backoffs of 100ms and 200ms.
        assert_close(start.elapsed(), Duration::from_millis(15_300));
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_doubles_between_attempts() {
        let advisor = Arc::new(ScriptedAdvisor::failing(AdvisorError::Timeout("slow".into())));
        let mut s = settings();
        s.max_retries = 4;
        let ai = AdvisoryAi::new(advisor.clone(), s, DecisionCache::new(4, Duration::from_secs(60)));

        let err = ai.query_with_retry("prompt").await.unwrap_err();
        assert!(matches!(err, AdvisorError::Timeout(_)));

        let times = advisor.call_times();
        assert_eq!(times.len(), 4);
        let gaps: Vec<Duration> = times.windows(2).map(|w| w[1] - w[0]).collect();
        let expected = [100, 200, 400].map(Duration::from_millis);
        assert_eq!(gaps.len(), expected.len());
        for (gap, want) in gaps.into_iter().zip(expected) {
            assert_close(gap, want);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retry_recovers_after_transient_failure() {
        let advisor = Arc::new(ScriptedAdvisor::new(vec![
            Err(AdvisorError::RateLimited { retry_after_secs: 1 }),
            Ok(GOOD_REPLY.to_string()),
        ]));
        let ai = advisory(advisor.clone());
        assert!(ai.select(&metadata(), None).await.is_some());
        assert_eq!(advisor.calls(), 2);
    }

    #[tokio::test]
    async fn non_transient_error_stops_immediately() {
        let advisor = Arc::new(ScriptedAdvisor::failing(AdvisorError::AuthenticationFailed(
            "bad key".into(),
        )));
        let ai = advisory(advisor.clone());
        assert!(ai.select(&metadata(), None).await.is_none());
        assert_eq!(advisor.calls(), 1);
    }

    #[tokio::test]
    async fn unavailable_advisor_is_not_called() {
        let mut scripted = ScriptedAdvisor::replying(GOOD_REPLY);
        scripted.available = false;
        let advisor = Arc::new(scripted);
        let ai = advisory(advisor.clone());
        assert!(ai.select(&metadata(), None).await.is_none());
        assert_eq!(advisor.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_availability_check_is_bounded() {
        let advisor = Arc::new(StuckCheckAdvisor {
            calls: Mutex::new(0),
        });
        let ai = advisory(advisor.clone());
        let start = Instant::now();

        let outcome =
            tokio::time::timeout(Duration::from_secs(3600), ai.select(&metadata(), None)).await;
        assert!(matches!(outcome, Ok(None)));
        assert_close(start.elapsed(), Duration::from_secs(5));
        assert_eq!(*advisor.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn disabled_advisor_returns_none() {
        let advisor = Arc::new(ScriptedAdvisor::replying(GOOD_REPLY));
        let mut s = settings();
        s.enabled = false;
        let ai = AdvisoryAi::new(advisor.clone(), s, DecisionCache::new(4, Duration::from_secs(60)));
        assert!(!ai.is_enabled());
        assert!(ai.select(&metadata(), None).await.is_none());
        assert_eq!(advisor.calls(), 0);
    }

    #[tokio::test]
    async fn history_changes_the_cache_key() {
        let advisor = Arc::new(ScriptedAdvisor::replying(GOOD_REPLY));
        let ai = advisory(advisor.clone());
        let history = serde_json::json!({"selenium_pass_rate": 0.97});

        ai.select(&metadata(), None).await.unwrap();
        let d = ai.select(&metadata(), Some(&history)).await.unwrap();
        assert!(!d.cache_hit);
        assert_eq!(advisor.calls(), 2);
    }

    #[test]
    fn backoff_delay_saturates() {
        let ai = advisory(Arc::new(HangingAdvisor));
        assert_eq!(ai.backoff_delay(0), Duration::from_millis(100));
        assert_eq!(ai.backoff_delay(3), Duration::from_millis(800));
        assert!(ai.backoff_delay(64) >= ai.backoff_delay(31));
    }
}
