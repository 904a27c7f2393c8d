//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod currency;
pub mod error;
pub mod log;
pub mod request;

// Re-export main types for cleaner imports
pub use currency::{
    BackendKind, CurrencyRegistry, CurrencyService, RateSnapshot, SupportedCurrency,
};
pub use error::{ApiErrorType, CurrencyError, SoapFaultKind, UpstreamError};
