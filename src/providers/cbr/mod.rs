//! Central Bank of Russia backend.
//!
//! The bank only quotes currencies against RUB, so conversions between two
//! foreign currencies are computed through RUB from one cached snapshot.

pub mod client;
pub mod parse;

use crate::core::cache::SnapshotCell;
use crate::core::{
    BackendKind, CurrencyError, CurrencyRegistry, CurrencyService, RateSnapshot,
    SupportedCurrency, UpstreamError,
};
use async_trait::async_trait;
use chrono::{NaiveDateTime, NaiveTime};
use client::DailyInfoClient;
use parse::QuotedRate;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub use client::SoapDailyInfoClient;

pub const BASE_CURRENCY: &str = "RUB";
const BASE_CURRENCY_NAME: &str = "Российский рубль";

pub struct CbrBackend {
    client: Arc<dyn DailyInfoClient>,
    registry: CurrencyRegistry,
    snapshot: SnapshotCell<RateSnapshot>,
}

impl CbrBackend {
    /// Loads the supported-currency registry. Fails with
    /// [`CurrencyError::BackendUnavailable`] if the service cannot be reached
    /// or its answer cannot be parsed.
    pub async fn connect(client: Arc<dyn DailyInfoClient>) -> Result<Self, CurrencyError> {
        let registry = load_registry(client.as_ref()).await.map_err(|e| {
            CurrencyError::BackendUnavailable(format!(
                "failed to load central bank currency list: {e}"
            ))
        })?;
        info!(count = registry.len(), "Loaded central bank currency registry");

        Ok(CbrBackend {
            client,
            registry,
            snapshot: SnapshotCell::new(),
        })
    }

    pub fn registry(&self) -> &CurrencyRegistry {
        &self.registry
    }

    fn ensure_supported(&self, code: &str) -> Result<(), CurrencyError> {
        if self.registry.contains_key(code) {
            Ok(())
        } else {
            Err(CurrencyError::UnsupportedCurrency(code.to_string()))
        }
    }

    async fn fetch_snapshot(&self) -> Result<RateSnapshot, CurrencyError> {
        let published = parse::parse_latest_date_time(&self.client.latest_date_time().await?)?;
        debug!(%published, "Latest central bank publication");
        let quotes = parse::parse_curs_on_date(&self.client.curs_on_date(published).await?)?;
        Ok(build_snapshot(&self.registry, quotes, published)?)
    }
}

async fn load_registry(client: &dyn DailyInfoClient) -> Result<CurrencyRegistry, UpstreamError> {
    let body = client.enum_valutes(false).await?;
    let mut registry: CurrencyRegistry = parse::parse_enum_valutes(&body)?
        .into_iter()
        .map(|currency| (currency.code.clone(), currency))
        .collect();
    registry.insert(
        BASE_CURRENCY.to_string(),
        SupportedCurrency {
            code: BASE_CURRENCY.to_string(),
            name: BASE_CURRENCY_NAME.to_string(),
            nominal: 1,
        },
    );
    Ok(registry)
}

/// Normalises quotes to RUB per one unit and stamps the snapshot with its
/// publication time. The snapshot expires at the start of the next day.
pub fn build_snapshot(
    registry: &CurrencyRegistry,
    quotes: Vec<QuotedRate>,
    published: NaiveDateTime,
) -> Result<RateSnapshot, UpstreamError> {
    let mut rates = BTreeMap::new();
    for quote in quotes {
        if !registry.contains_key(&quote.code) {
            warn!(code = %quote.code, "Ignoring quote for a currency outside the registry");
            continue;
        }
        let rate = quote.per_unit();
        if !rate.is_finite() || rate <= 0.0 {
            let message = format!("non-positive rate {rate} for {}", quote.code);
            return Err(UpstreamError::Malformed(message));
        }
        rates.insert(quote.code, rate);
    }
    rates.insert(BASE_CURRENCY.to_string(), 1.0);

    let next_day = published.date().succ_opt().ok_or_else(|| {
        UpstreamError::Malformed(format!("publication date {published} out of range"))
    })?;

    Ok(RateSnapshot {
        rates,
        base: BASE_CURRENCY.to_string(),
        fetched_at: published,
        next_update: next_day.and_time(NaiveTime::MIN),
    })
}

/// Converts through the base currency. Both codes must be quoted in
/// `snapshot`, `from` checked first.
pub fn convert_via_base(
    snapshot: &RateSnapshot,
    amount: f64,
    from: &str,
    to: &str,
) -> Result<f64, CurrencyError> {
    let from_rate = snapshot
        .rate(from)
        .ok_or_else(|| CurrencyError::RateUnavailable(from.to_string()))?;
    let to_rate = snapshot
        .rate(to)
        .ok_or_else(|| CurrencyError::RateUnavailable(to.to_string()))?;

    let base = snapshot.base.as_str();
    let result = if from == base {
        amount / to_rate
    } else if to == base {
        amount * from_rate
    } else {
        (amount * from_rate) / to_rate
    };
    Ok(result)
}

#[async_trait]
impl CurrencyService for CbrBackend {
    fn backend(&self) -> BackendKind {
        BackendKind::Soap
    }

    #[instrument(name = "CbrLatestRates", skip(self))]
    async fn latest_rates(&self) -> Result<RateSnapshot, CurrencyError> {
        let fetch = || self.fetch_snapshot();
        self.snapshot.get_or_try_init(fetch).await
    }

    #[instrument(name = "CbrConvert", skip(self))]
    async fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64, CurrencyError> {
        self.ensure_supported(from)?;
        self.ensure_supported(to)?;

        let snapshot = self.latest_rates().await?;
        convert_via_base(&snapshot, amount, from, to)
    }

    fn supported_currencies(&self) -> Vec<SupportedCurrency> {
        self.registry.values().cloned().collect()
    }
}
