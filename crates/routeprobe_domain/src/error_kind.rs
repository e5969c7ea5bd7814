use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Classification of a failed probe call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum ErrorKind {
    #[strum(to_string = "ThrottlingException")]
    Throttled,
    #[strum(to_string = "Validation Error")]
    Validation,
    #[strum(to_string = "Access Denied")]
    AccessDenied,
    #[strum(to_string = "Resource Not Found")]
    NotFound,
    #[strum(to_string = "Error")]
    Other,
}

const THROTTLE_MARKERS: [&str; 5] = [
    "throttl",
    "servicequota",
    "ratelimit",
    "rate limit",
    "too many requests",
];
const VALIDATION_MARKERS: [&str; 1] = ["validation"];
const ACCESS_MARKERS: [&str; 3] = ["accessdenied", "access denied", "unauthorized"];
const NOT_FOUND_MARKERS: [&str; 2] = ["notfound", "not found"];

impl ErrorKind {
    /// Classifies an error by inspecting its message for known markers.
    ///
    /// Throttling wins over every other marker because a throttled call is
    /// the expected outcome of quota exhaustion.
    pub fn classify(message: &str) -> Self {
        let message = message.to_lowercase();
        let has = |markers: &[&str]| markers.iter().any(|marker| message.contains(marker));

        if has(&THROTTLE_MARKERS) {
            ErrorKind::Throttled
        } else if has(&VALIDATION_MARKERS) {
            ErrorKind::Validation
        } else if has(&ACCESS_MARKERS) {
            ErrorKind::AccessDenied
        } else if has(&NOT_FOUND_MARKERS) {
            ErrorKind::NotFound
        } else {
            ErrorKind::Other
        }
    }

    /// Maps an HTTP status code to a kind, if the status carries one.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            429 => Some(ErrorKind::Throttled),
            400 | 422 => Some(ErrorKind::Validation),
            401 | 403 => Some(ErrorKind::AccessDenied),
            404 => Some(ErrorKind::NotFound),
            _ => None,
        }
    }

    pub fn is_throttled(&self) -> bool {
        matches!(self, ErrorKind::Throttled)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_classify_throttling_exception() {
        let actual = ErrorKind::classify(
            "An error occurred (ThrottlingException) when calling the InvokeModel operation",
        );
        assert_eq!(actual, ErrorKind::Throttled);
    }

    #[test]
    fn test_classify_access_denied() {
        let actual = ErrorKind::classify("AccessDeniedException: not authorized to invoke model");
        assert_eq!(actual, ErrorKind::AccessDenied);
    }

    #[test]
    fn test_classify_unrecognized_is_generic() {
        let actual = ErrorKind::classify("connection reset by peer");
        assert_eq!(actual, ErrorKind::Other);
    }

    #[test]
    fn test_classify_other_markers() {
        let fixture = [
            ("ServiceQuotaExceededException", ErrorKind::Throttled),
            ("litellm.RateLimitError: limit hit", ErrorKind::Throttled),
            ("ValidationException: bad body", ErrorKind::Validation),
            ("ResourceNotFoundException", ErrorKind::NotFound),
        ];

        for (message, expected) in fixture {
            assert_eq!(ErrorKind::classify(message), expected, "{message}");
        }
    }

    #[test]
    fn test_throttling_wins_over_validation() {
        let actual = ErrorKind::classify("ValidationException wrapped ThrottlingException");
        assert_eq!(actual, ErrorKind::Throttled);
    }

    #[test]
    fn test_from_status() {
        assert_eq!(ErrorKind::from_status(429), Some(ErrorKind::Throttled));
        assert_eq!(ErrorKind::from_status(403), Some(ErrorKind::AccessDenied));
        assert_eq!(ErrorKind::from_status(404), Some(ErrorKind::NotFound));
        assert_eq!(ErrorKind::from_status(500), None);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(ErrorKind::Throttled.to_string(), "ThrottlingException");
        assert_eq!(ErrorKind::Other.to_string(), "Error");
    }
}
