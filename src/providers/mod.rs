pub mod cbr;
pub mod exchange_rate_api;

use crate::core::config::AppConfig;
use crate::core::{BackendKind, CurrencyError, CurrencyService};
use std::sync::Arc;
use tracing::info;

/// Builds the backend for `requested`, falling back to the configured driver.
pub async fn create_service(
    config: &AppConfig,
    requested: Option<BackendKind>,
) -> Result<Box<dyn CurrencyService>, CurrencyError> {
    let kind = requested.unwrap_or(config.driver);
    info!(backend = %kind, "Creating currency service");

    match kind {
        BackendKind::Rest => {
            let rest = &config.providers.exchange_rate_api;
            let api_key = rest
                .api_key
                .as_deref()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| {
                    CurrencyError::BackendUnavailable(
                        "providers.exchange_rate_api.api_key is not configured".to_string(),
                    )
                })?;
            let backend = exchange_rate_api::ExchangeRateApiBackend::new(
                &rest.base_url,
                api_key,
                config.timeout(),
            )?;
            Ok(Box::new(backend))
        }
        BackendKind::Soap => {
            let url = &config.providers.cbr.url;
            let client = cbr::SoapDailyInfoClient::new(url, config.timeout())?;
            let backend = cbr::CbrBackend::connect(Arc::new(client)).await?;
            Ok(Box::new(backend))
        }
    }
}
