//! Failure classification.
//!
//! Backend libraries only give us free text, so classification is a table of
//! `(ErrorType, required substrings)` rows matched case-insensitively in
//! order. The first row whose substrings all occur wins.

use switchyard_core::{ErrorClass, ErrorType};

/// One classification row.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    pub error_type: ErrorType,
    /// Lowercase substrings that must all be present.
    pub needles: &'static [&'static str],
}

/// Missing-element rows come first: a missing element is the test's fault
/// even when the message also mentions a closed target or a protocol error.
pub const CLASSIFICATION_TABLE: &[ClassificationRule] = &[
    ClassificationRule {
        error_type: ErrorType::ElementNotFound,
        needles: &["element", "not found"],
    },
    ClassificationRule {
        error_type: ErrorType::NoSuchElement,
        needles: &["no such element"],
    },
    ClassificationRule {
        error_type: ErrorType::BrowserCrash,
        needles: &["browser", "crash"],
    },
    ClassificationRule {
        error_type: ErrorType::TargetClosed,
        needles: &["target", "closed"],
    },
    ClassificationRule {
        error_type: ErrorType::ProtocolError,
        needles: &["protocol", "error"],
    },
    ClassificationRule {
        error_type: ErrorType::ConnectionRefused,
        needles: &["connection", "refused"],
    },
    ClassificationRule {
        error_type: ErrorType::SessionNotCreated,
        needles: &["session not created"],
    },
    ClassificationRule {
        error_type: ErrorType::NavigationTimeoutExceeded,
        needles: &["navigation", "timeout"],
    },
    ClassificationRule {
        error_type: ErrorType::PageLoadTimeout,
        needles: &["page", "load", "timeout"],
    },
    ClassificationRule {
        error_type: ErrorType::AssertionFailed,
        needles: &["assert"],
    },
];

/// Tag a failure message. Unmatched messages are [`ErrorType::Unknown`].
pub fn classify(message: &str) -> ErrorType {
    let lowered = message.to_lowercase();
    CLASSIFICATION_TABLE
        .iter()
        .find(|row| row.needles.iter().all(|n| lowered.contains(n)))
        .map(|row| row.error_type)
        .unwrap_or(ErrorType::Unknown)
}

/// Shorthand for `classify(message).class()`.
pub fn classify_class(message: &str) -> ErrorClass {
    classify(message).class()
}
