use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors returned by the upstream API clients.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// API error from the upstream service.
    #[error("API error: {message}")]
    Api { message: String },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded. Resets at {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    /// Authentication required or failed.
    #[error("Authentication required")]
    AuthRequired,

    /// Resource not found. Callers use this to drive fallbacks and skips.
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// Network or connection error.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Payload could not be decoded.
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Unexpected/internal error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PlatformError {
    #[inline]
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    #[inline]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    #[inline]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    #[inline]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    #[inline]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this error is a rate limit error (retryable).
    #[inline]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Classify a non-success HTTP response.
    ///
    /// `exhausted_until` is set by the caller when the response headers say the
    /// quota is spent; a 403 is only treated as a rate limit in that case.
    pub fn from_status(
        status: reqwest::StatusCode,
        resource: &str,
        exhausted_until: Option<DateTime<Utc>>,
        body: &str,
    ) -> Self {
        match status.as_u16() {
            404 => Self::not_found(resource),
            429 => Self::RateLimited {
                reset_at: exhausted_until.unwrap_or_else(Utc::now),
            },
            403 if exhausted_until.is_some() => Self::RateLimited {
                reset_at: exhausted_until.unwrap_or_else(Utc::now),
            },
            401 | 403 => Self::AuthRequired,
            _ => Self::api(format!("{resource}: HTTP {status}: {}", body.trim())),
        }
    }
}

impl From<reqwest::Error> for PlatformError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::decode(err.to_string())
        } else {
            Self::network(err.to_string())
        }
    }
}

/// First line of an error message, for log lines and progress events.
#[inline]
pub fn short_error_message(e: &impl std::error::Error) -> String {
    let full = e.to_string();
    full.lines().next().unwrap_or(&full).to_string()
}

/// Result type for platform operations.
pub type Result<T> = std::result::Result<T, PlatformError>;
