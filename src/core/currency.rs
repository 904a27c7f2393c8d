//! Currency rate abstractions and core types

use crate::core::error::CurrencyError;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

/// One immutable, timestamped set of rates against `base`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub rates: BTreeMap<String, f64>,
    pub base: String,
    pub fetched_at: NaiveDateTime,
    pub next_update: NaiveDateTime,
}

impl RateSnapshot {
    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    pub fn is_stale_at(&self, now: NaiveDateTime) -> bool {
        now >= self.next_update
    }
}

/// A registry entry of a backend that enumerates its currencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedCurrency {
    pub code: String,
    pub name: String,
    /// Lot size a quoted rate applies to, e.g. 100 for a rate per 100 units.
    pub nominal: u32,
}

pub type CurrencyRegistry = BTreeMap<String, SupportedCurrency>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// JSON REST exchange-rate API
    #[default]
    Rest,
    /// Central bank SOAP service
    Soap,
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                BackendKind::Rest => "rest",
                BackendKind::Soap => "soap",
            }
        )
    }
}

impl FromStr for BackendKind {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(BackendKind::Rest),
            "soap" => Ok(BackendKind::Soap),
            other => Err(CurrencyError::InvalidRequest(format!(
                "unknown api method '{other}', expected 'rest' or 'soap'"
            ))),
        }
    }
}

#[async_trait]
pub trait CurrencyService: Send + Sync {
    fn backend(&self) -> BackendKind;

    async fn latest_rates(&self) -> Result<RateSnapshot, CurrencyError>;

    async fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64, CurrencyError>;

    /// Currencies this backend knows about. Empty means any code is accepted.
    fn supported_currencies(&self) -> Vec<SupportedCurrency> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn snapshot() -> RateSnapshot {
        let day = NaiveDate::from_ymd_opt(2024, 5, 18).unwrap();
        RateSnapshot {
            rates: BTreeMap::from([("RUB".to_string(), 1.0), ("USD".to_string(), 90.5)]),
            base: "RUB".to_string(),
            fetched_at: day.and_hms_opt(0, 0, 0).unwrap(),
            next_update: day.succ_opt().unwrap().and_hms_opt(0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_snapshot_rate_lookup() {
        let snapshot = snapshot();
        assert_eq!(snapshot.rate("USD"), Some(90.5));
        assert_eq!(snapshot.rate("EUR"), None);
    }

    #[test]
    fn test_snapshot_staleness() {
        let snapshot = snapshot();
        let same_day = NaiveDate::from_ymd_opt(2024, 5, 18)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        assert!(!snapshot.is_stale_at(same_day));
        assert!(snapshot.is_stale_at(snapshot.next_update));
    }

    #[test]
    fn test_backend_kind_from_str() {
        assert_eq!("rest".parse::<BackendKind>().unwrap(), BackendKind::Rest);
        assert_eq!("SOAP".parse::<BackendKind>().unwrap(), BackendKind::Soap);
        assert!(matches!(
            "grpc".parse::<BackendKind>(),
            Err(CurrencyError::InvalidRequest(_))
        ));
        assert_eq!(BackendKind::default(), BackendKind::Rest);
        assert_eq!(BackendKind::Soap.to_string(), "soap");
    }
}
