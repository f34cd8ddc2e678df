//! Error types for the Switchyard domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Work metadata that could not be accepted.
#[derive(Debug, Clone, Error)]
pub enum MetadataError {
    #[error("work metadata must be a JSON object, got {0}")]
    NotAnObject(String),
}

// --- Bounded context errors ---

/// Failures talking to an AI advisor.
#[derive(Debug, Clone, Error)]
pub enum AdvisorError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by advisor, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Advisor not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl AdvisorError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            AdvisorError::ApiError { status_code, .. } => *status_code >= 500,
            AdvisorError::RateLimited { .. }
            | AdvisorError::Timeout(_)
            | AdvisorError::Network(_)
            | AdvisorError::MalformedResponse(_) => true,
            AdvisorError::AuthenticationFailed(_) | AdvisorError::NotConfigured(_) => false,
        }
    }
}

/// Failures starting or stopping an execution backend.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("Failed to start {engine}: {reason}")]
    StartFailed { engine: String, reason: String },

    #[error("Failed to stop {engine}: {reason}")]
    StopFailed { engine: String, reason: String },

    #[error("Backend not running: {0}")]
    NotRunning(String),
}

/// Coarse failure class that decides whether a failure is the engine's
/// fault or the test's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// The backend itself broke: crash, protocol error, navigation timeout.
    Infra,
    /// The work failed on its own terms: assertion, missing element.
    Application,
    /// Anything unclassified.
    Unknown,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorClass::Infra => "infra",
            ErrorClass::Application => "application",
            ErrorClass::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Fine-grained failure tag recorded on an attempt and matched against the
/// fallback policy's trigger sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    BrowserCrash,
    TargetClosed,
    ProtocolError,
    ConnectionRefused,
    SessionNotCreated,
    NavigationTimeoutExceeded,
    PageLoadTimeout,
    ElementNotFound,
    NoSuchElement,
    AssertionFailed,
    Unknown,
}

impl ErrorType {
    pub fn class(self) -> ErrorClass {
        match self {
            ErrorType::BrowserCrash
            | ErrorType::TargetClosed
            | ErrorType::ProtocolError
            | ErrorType::ConnectionRefused
            | ErrorType::SessionNotCreated
            | ErrorType::NavigationTimeoutExceeded
            | ErrorType::PageLoadTimeout => ErrorClass::Infra,
            ErrorType::ElementNotFound | ErrorType::NoSuchElement | ErrorType::AssertionFailed => {
                ErrorClass::Application
            }
            ErrorType::Unknown => ErrorClass::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorType::BrowserCrash => "browser_crash",
            ErrorType::TargetClosed => "target_closed",
            ErrorType::ProtocolError => "protocol_error",
            ErrorType::ConnectionRefused => "connection_refused",
            ErrorType::SessionNotCreated => "session_not_created",
            ErrorType::NavigationTimeoutExceeded => "navigation_timeout_exceeded",
            ErrorType::PageLoadTimeout => "page_load_timeout",
            ErrorType::ElementNotFound => "element_not_found",
            ErrorType::NoSuchElement => "no_such_element",
            ErrorType::AssertionFailed => "assertion_failed",
            ErrorType::Unknown => "unknown",
        }
    }

    /// Every tag of the given class.
    pub fn of_class(class: ErrorClass) -> Vec<ErrorType> {
        ALL_ERROR_TYPES
            .iter()
            .copied()
            .filter(|t| t.class() == class)
            .collect()
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const ALL_ERROR_TYPES: [ErrorType; 11] = [
    ErrorType::BrowserCrash,
    ErrorType::TargetClosed,
    ErrorType::ProtocolError,
    ErrorType::ConnectionRefused,
    ErrorType::SessionNotCreated,
    ErrorType::NavigationTimeoutExceeded,
    ErrorType::PageLoadTimeout,
    ErrorType::ElementNotFound,
    ErrorType::NoSuchElement,
    ErrorType::AssertionFailed,
    ErrorType::Unknown,
];
