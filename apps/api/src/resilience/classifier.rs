//! Error classification: maps the text of a failed LLM call to a retry decision.
//!
//! Remote-service failures only surface as textual diagnostics, so classification is
//! an ordered table of substring cues matched against the lowercased error text.
//! The first matching rule wins; a message carrying both "503" and "timeout" is a
//! capacity problem, not a timeout.

use serde::Serialize;
use thiserror::Error;

/// Rate-limit windows are on the order of a minute, independent of the base delay.
pub const RATE_LIMIT_DELAY_SECS: u64 = 60;

/// Failure kinds recognised by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    ServiceUnavailable,
    Timeout,
    RateLimited,
    AuthenticationFailed,
    Unknown,
}

/// Ordered cue table. Evaluated top to bottom, first hit wins.
const RULES: &[(ErrorKind, &[&str])] = &[
    (
        ErrorKind::ServiceUnavailable,
        &["overloaded", "503", "unavailable"],
    ),
    (ErrorKind::Timeout, &["timeout", "timed out"]),
    (ErrorKind::RateLimited, &["rate limit", "429"]),
    (
        ErrorKind::AuthenticationFailed,
        &["unauthorized", "401", "invalid api key"],
    ),
];

impl ErrorKind {
    /// Matches lowercased error text against the cue table.
    pub fn from_error_text(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        RULES
            .iter()
            .find(|(_, cues)| cues.iter().any(|cue| lowered.contains(cue)))
            .map(|(kind, _)| *kind)
            .unwrap_or(ErrorKind::Unknown)
    }

    /// Authentication failures never recover by waiting.
    ///
    /// `Unknown` reports `true` here: it is retried while the attempt budget lasts,
    /// the executor alone decides when that budget is spent.
    pub fn is_retryable(self) -> bool {
        !matches!(self, ErrorKind::AuthenticationFailed)
    }

    /// Whether the failure is a recognised transient condition, as opposed to an
    /// unrecognised one retried only because attempts remain.
    pub fn is_known_transient(self) -> bool {
        matches!(
            self,
            ErrorKind::ServiceUnavailable | ErrorKind::Timeout | ErrorKind::RateLimited
        )
    }

    /// Backoff before the next attempt, in seconds.
    ///
    /// `attempt` is the 1-based index of the attempt that just failed.
    pub fn suggested_delay_secs(self, attempt: u32, base_delay_secs: u64) -> Option<u64> {
        match self {
            ErrorKind::ServiceUnavailable => {
                Some(base_delay_secs.saturating_mul(u64::from(attempt.max(1))))
            }
            ErrorKind::Timeout | ErrorKind::Unknown => Some(base_delay_secs),
            ErrorKind::RateLimited => Some(RATE_LIMIT_DELAY_SECS),
            ErrorKind::AuthenticationFailed => None,
        }
    }

    /// Stable machine-readable code used in HTTP error bodies.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::ServiceUnavailable => "AI_SERVICE_UNAVAILABLE",
            ErrorKind::Timeout => "AI_SERVICE_TIMEOUT",
            ErrorKind::RateLimited => "AI_RATE_LIMITED",
            ErrorKind::AuthenticationFailed => "AI_AUTHENTICATION_FAILED",
            ErrorKind::Unknown => "AI_SERVICE_ERROR",
        }
    }

    fn user_message(self, delay_secs: Option<u64>) -> String {
        match self {
            ErrorKind::ServiceUnavailable => match delay_secs {
                Some(secs) => format!(
                    "The AI service is temporarily overloaded. Please try again in {secs} seconds."
                ),
                None => "The AI service is temporarily overloaded. Please try again shortly."
                    .to_string(),
            },
            ErrorKind::Timeout => {
                "The AI service took too long to respond. Please try again.".to_string()
            }
            ErrorKind::RateLimited => {
                "The AI service rate limit was reached. Please wait a minute before trying again."
                    .to_string()
            }
            ErrorKind::AuthenticationFailed => {
                "The AI service rejected the configured credentials. \
                 An administrator needs to check the API key."
                    .to_string()
            }
            ErrorKind::Unknown => "The AI service failed unexpectedly. Please try again.".to_string(),
        }
    }
}

/// The result of classifying one failed attempt.
///
/// `message` is safe to show to end users; `raw_detail` is the original diagnostic
/// and only goes to logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message}")]
pub struct ErrorClassification {
    pub kind: ErrorKind,
    pub retryable: bool,
    pub suggested_delay_seconds: Option<u64>,
    pub message: String,
    #[serde(skip)]
    pub raw_detail: String,
}

impl ErrorClassification {
    /// Terminal classification for a retry loop that ran out without an answer.
    pub fn retries_exhausted(raw_detail: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Unknown,
            retryable: false,
            suggested_delay_seconds: None,
            message: "maximum retries exceeded".to_string(),
            raw_detail: raw_detail.into(),
        }
    }
}

/// Pure classifier parameterised by the policy's base delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorClassifier {
    base_delay_secs: u64,
}

impl ErrorClassifier {
    pub fn new(base_delay_secs: u64) -> Self {
        Self { base_delay_secs }
    }

    /// Classifies the failure of the `attempt`-th call (1-based).
    pub fn classify(&self, raw_error: &str, attempt: u32) -> ErrorClassification {
        let kind = ErrorKind::from_error_text(raw_error);
        let suggested_delay_seconds = kind.suggested_delay_secs(attempt, self.base_delay_secs);

        ErrorClassification {
            kind,
            retryable: kind.is_retryable(),
            suggested_delay_seconds,
            message: kind.user_message(suggested_delay_seconds),
            raw_detail: raw_error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(raw: &str) -> ErrorClassification {
        ErrorClassifier::new(5).classify(raw, 1)
    }

    #[test]
    fn test_service_unavailable_cues_any_case() {
        for raw in [
            "API error (status 503): backend down",
            "The model is OVERLOADED. Please try again later.",
            "Service Unavailable",
            "uNaVaIlAbLe",
        ] {
            let c = classify(raw);
            assert_eq!(c.kind, ErrorKind::ServiceUnavailable, "{raw}");
            assert!(c.retryable);
        }
    }

    #[test]
    fn test_timeout_cues() {
        assert_eq!(classify("request Timeout").kind, ErrorKind::Timeout);
        assert_eq!(
            classify("error sending request: operation timed out").kind,
            ErrorKind::Timeout
        );
        assert_eq!(classify("deadline TIMED OUT").suggested_delay_seconds, Some(5));
    }

    #[test]
    fn test_rate_limit_delay_ignores_base_delay() {
        let c = ErrorClassifier::new(2).classify("HTTP 429 Too Many Requests", 3);
        assert_eq!(c.kind, ErrorKind::RateLimited);
        assert!(c.retryable);
        assert_eq!(c.suggested_delay_seconds, Some(RATE_LIMIT_DELAY_SECS));

        let c = classify("Rate Limit exceeded for project");
        assert_eq!(c.kind, ErrorKind::RateLimited);
    }

    #[test]
    fn test_authentication_is_not_retryable() {
        for raw in [
            "401 Unauthorized",
            "request was UNAUTHORIZED",
            "API key not valid: Invalid API Key supplied",
        ] {
            let c = classify(raw);
            assert_eq!(c.kind, ErrorKind::AuthenticationFailed, "{raw}");
            assert!(!c.retryable);
            assert_eq!(c.suggested_delay_seconds, None);
        }
    }

    #[test]
    fn test_unknown_falls_through_with_base_delay() {
        let c = classify("connection reset by peer");
        assert_eq!(c.kind, ErrorKind::Unknown);
        assert!(c.retryable);
        assert!(!c.kind.is_known_transient());
        assert_eq!(c.suggested_delay_seconds, Some(5));
    }

    #[test]
    fn test_precedence_capacity_before_timeout() {
        let c = classify("upstream 503 after gateway timeout");
        assert_eq!(c.kind, ErrorKind::ServiceUnavailable);
    }

    #[test]
    fn test_precedence_timeout_before_auth() {
        // "401" appears, but the timeout cue ranks higher
        let c = classify("timed out waiting for auth server (401 cached)");
        assert_eq!(c.kind, ErrorKind::Timeout);
    }

    #[test]
    fn test_service_unavailable_delay_escalates_with_attempt() {
        let classifier = ErrorClassifier::new(5);
        for k in 1..=4u32 {
            let c = classifier.classify("model overloaded", k);
            assert_eq!(c.suggested_delay_seconds, Some(5 * u64::from(k)));
        }
    }

    #[test]
    fn test_classify_is_idempotent() {
        let classifier = ErrorClassifier::new(7);
        let raw = "API error (status 503): The model is overloaded.";
        assert_eq!(classifier.classify(raw, 2), classifier.classify(raw, 2));
    }

    #[test]
    fn test_message_hides_raw_detail() {
        let raw = "API error (status 503): internal shard 17 overloaded";
        let c = classify(raw);
        assert_eq!(c.raw_detail, raw);
        assert!(!c.message.contains("shard"));
        assert!(c.message.contains("5 seconds"));
    }

    #[test]
    fn test_classification_serializes_without_raw_detail() {
        let c = classify("401 Unauthorized: key sk-secret");
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["kind"], "AuthenticationFailed");
        assert!(json.get("raw_detail").is_none());
    }
}
