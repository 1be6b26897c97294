//! Shared provider error kinds and error value helpers.
//!
//! ```rust
//! use tprovider::{ErrorClass, ProviderError, ProviderErrorKind};
//!
//! let missing = ProviderError::configuration("no api key configured");
//! assert!(!missing.retryable);
//! assert_eq!(missing.kind.class(), ErrorClass::Configuration);
//!
//! let limited = ProviderError::from_status(429, "slow down", &[]);
//! assert_eq!(limited.kind, ProviderErrorKind::RateLimited);
//! assert!(limited.retryable);
//! assert_eq!(limited.kind.to_string(), "rate_limited");
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Coarse grouping of failure kinds. Configuration and validation failures
/// end a request chain immediately; everything else may be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    Configuration,
    Validation,
    Transport,
    HttpStatus,
    ResponseShape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
    Configuration,
    Validation,
    TransportFailure,
    InvalidRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    PayloadTooLarge,
    RateLimited,
    ServerError,
    Overloaded,
    InsufficientCredit,
    ModerationFlagged,
    UpstreamModelDown,
    UpstreamTimeout,
    UnknownHttp(u16),
    EmptyBody,
    MalformedBody,
    EmbeddedError,
    NoAnswer,
    EmptyAnswer,
}

impl ProviderErrorKind {
    /// Status codes every provider family shares.
    pub const COMMON_STATUS_TABLE: [(u16, ProviderErrorKind); 8] = [
        (400, Self::InvalidRequest),
        (401, Self::Unauthorized),
        (403, Self::Forbidden),
        (404, Self::NotFound),
        (413, Self::PayloadTooLarge),
        (429, Self::RateLimited),
        (500, Self::ServerError),
        (529, Self::Overloaded),
    ];

    /// Maps a non-success status code. `overrides` is consulted first so a
    /// vendor can reinterpret shared codes (403 as moderation, for instance).
    pub fn from_status(status: u16, overrides: &[(u16, ProviderErrorKind)]) -> Self {
        overrides
            .iter()
            .chain(Self::COMMON_STATUS_TABLE.iter())
            .find(|(code, _)| *code == status)
            .map(|(_, kind)| *kind)
            .unwrap_or(Self::UnknownHttp(status))
    }

    pub fn class(self) -> ErrorClass {
        match self {
            Self::Configuration => ErrorClass::Configuration,
            Self::Validation => ErrorClass::Validation,
            Self::TransportFailure => ErrorClass::Transport,
            Self::EmptyBody
            | Self::MalformedBody
            | Self::EmbeddedError
            | Self::NoAnswer
            | Self::EmptyAnswer => ErrorClass::ResponseShape,
            _ => ErrorClass::HttpStatus,
        }
    }

    pub fn is_retryable(self) -> bool {
        !matches!(
            self.class(),
            ErrorClass::Configuration | ErrorClass::Validation
        )
    }

    pub fn is_authentication(self) -> bool {
        matches!(self, Self::Unauthorized | Self::Forbidden)
    }
}

impl Display for ProviderErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::Validation => "validation",
            Self::TransportFailure => "transport_failure",
            Self::InvalidRequest => "invalid_request",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::PayloadTooLarge => "payload_too_large",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::Overloaded => "overloaded",
            Self::InsufficientCredit => "insufficient_credit",
            Self::ModerationFlagged => "moderation_flagged",
            Self::UpstreamModelDown => "upstream_model_down",
            Self::UpstreamTimeout => "upstream_timeout",
            Self::UnknownHttp(code) => return write!(f, "unknown_http_{code}"),
            Self::EmptyBody => "empty_body",
            Self::MalformedBody => "malformed_body",
            Self::EmbeddedError => "embedded_error",
            Self::NoAnswer => "no_answer",
            Self::EmptyAnswer => "empty_answer",
        };

        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }

    /// Builds an error whose retryability follows the kind's class.
    pub fn of_kind(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, message, kind.is_retryable())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::of_kind(ProviderErrorKind::Configuration, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::of_kind(ProviderErrorKind::Validation, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::of_kind(ProviderErrorKind::TransportFailure, message)
    }

    pub fn from_status(
        status: u16,
        message: impl Into<String>,
        overrides: &[(u16, ProviderErrorKind)],
    ) -> Self {
        Self::of_kind(ProviderErrorKind::from_status(status, overrides), message)
    }

    pub fn empty_body(message: impl Into<String>) -> Self {
        Self::of_kind(ProviderErrorKind::EmptyBody, message)
    }

    pub fn malformed_body(message: impl Into<String>) -> Self {
        Self::of_kind(ProviderErrorKind::MalformedBody, message)
    }

    pub fn embedded_error(message: impl Into<String>) -> Self {
        Self::of_kind(ProviderErrorKind::EmbeddedError, message)
    }

    pub fn no_answer(message: impl Into<String>) -> Self {
        Self::of_kind(ProviderErrorKind::NoAnswer, message)
    }

    pub fn empty_answer(message: impl Into<String>) -> Self {
        Self::of_kind(ProviderErrorKind::EmptyAnswer, message)
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl Error for ProviderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_status_table_maps_known_codes() {
        let cases = [
            (400, "invalid_request"),
            (401, "unauthorized"),
            (403, "forbidden"),
            (404, "not_found"),
            (413, "payload_too_large"),
            (429, "rate_limited"),
            (500, "server_error"),
            (529, "overloaded"),
            (418, "unknown_http_418"),
        ];

        for (status, expected) in cases {
            assert_eq!(ProviderErrorKind::from_status(status, &[]).to_string(), expected);
        }
    }

    #[test]
    fn overrides_take_precedence_over_common_codes() {
        let overrides = [(403, ProviderErrorKind::ModerationFlagged)];
        assert_eq!(
            ProviderErrorKind::from_status(403, &overrides),
            ProviderErrorKind::ModerationFlagged
        );
        assert_eq!(
            ProviderErrorKind::from_status(401, &overrides),
            ProviderErrorKind::Unauthorized
        );
    }

    #[test]
    fn only_configuration_and_validation_are_terminal() {
        assert!(!ProviderError::configuration("x").retryable);
        assert!(!ProviderError::validation("x").retryable);
        assert!(ProviderError::transport("x").retryable);
        assert!(ProviderError::no_answer("x").retryable);
        assert!(ProviderError::from_status(401, "x", &[]).retryable);
        assert_eq!(
            ProviderError::empty_answer("x").kind.class(),
            ErrorClass::ResponseShape
        );
    }

    #[test]
    fn display_uses_stable_kind_names() {
        let error = ProviderError::from_status(502, "bad gateway", &[]);
        assert_eq!(error.to_string(), "unknown_http_502: bad gateway");
    }
}
