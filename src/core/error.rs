//! Error taxonomy shared by every rate backend.
//!
//! Upstream-specific failures (REST `error-type` codes, SOAP faults, transport
//! errors) are mapped into [`UpstreamError`] so callers can handle both
//! backends uniformly.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by [`CurrencyService`](crate::core::CurrencyService) operations.
#[derive(Error, Debug)]
pub enum CurrencyError {
    /// The currency code is not in the backend's registry.
    #[error("Currency {0} is not supported by the selected backend")]
    UnsupportedCurrency(String),

    /// The code is registered but has no quote in the latest snapshot.
    #[error("No rate for currency {0} in the latest published data")]
    RateUnavailable(String),

    /// Transport failure, malformed payload or a mapped upstream error code.
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// The backend could not be constructed (registry unreachable or unparseable).
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The request was rejected before reaching any backend.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl CurrencyError {
    /// Only upstream failures may be retried by callers. Validation errors
    /// will fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream(_))
    }
}

impl From<reqwest::Error> for CurrencyError {
    fn from(err: reqwest::Error) -> Self {
        Self::Upstream(err.into())
    }
}

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("{0}")]
    Api(ApiErrorType),

    #[error("{kind}: {message}")]
    SoapFault {
        kind: SoapFaultKind,
        message: String,
    },

    #[error("request timed out")]
    Timeout,

    #[error("HTTP error: {0}")]
    Http(StatusCode),

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Error categories reported by the REST API in its `error-type` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorType {
    UnsupportedCode,
    MalformedRequest,
    InvalidKey,
    InactiveAccount,
    QuotaReached,
    Unknown(String),
}

impl ApiErrorType {
    pub fn from_error_type(error_type: &str) -> Self {
        match error_type {
            "unsupported-code" => Self::UnsupportedCode,
            "malformed-request" => Self::MalformedRequest,
            "invalid-key" => Self::InvalidKey,
            "inactive-account" => Self::InactiveAccount,
            "quota-reached" => Self::QuotaReached,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for ApiErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedCode => write!(f, "unsupported currency code"),
            Self::MalformedRequest => write!(f, "malformed request"),
            Self::InvalidKey => write!(f, "invalid API key"),
            Self::InactiveAccount => write!(f, "account is not activated"),
            Self::QuotaReached => write!(f, "request quota reached"),
            Self::Unknown(raw) => write!(f, "unknown error while fetching rates ({raw})"),
        }
    }
}

/// Fault categories of a SOAP 1.1 `faultcode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoapFaultKind {
    Client,
    Server,
    Other,
}

impl SoapFaultKind {
    /// Maps a fault code such as `soap:Client` or `SOAP-ENV:Server`. The
    /// namespace prefix varies between servers so only the local part counts.
    pub fn from_fault_code(code: &str) -> Self {
        let local = code.trim().rsplit(':').next().unwrap_or_default();
        match local {
            "Client" => Self::Client,
            "Server" => Self::Server,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for SoapFaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client => write!(f, "invalid request parameters for central bank"),
            Self::Server => write!(f, "central bank server error"),
            Self::Other => write!(f, "unknown central bank service error"),
        }
    }
}
