//! REST backend for the ExchangeRate-API v6 JSON endpoints.
//!
//! Rates are fetched fresh on every call and conversions are computed by the
//! upstream, so this backend keeps no state besides its HTTP client.

use crate::core::{
    ApiErrorType, BackendKind, CurrencyError, CurrencyService, RateSnapshot, UpstreamError,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, instrument};

const LATEST_BASE: &str = "USD";

pub struct ExchangeRateApiBackend {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl ExchangeRateApiBackend {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, CurrencyError> {
        let client = reqwest::Client::builder()
            .user_agent("fxconv/1.0")
            .timeout(timeout)
            .build()?;
        Ok(ExchangeRateApiBackend {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, CurrencyError> {
        let url = format!("{}/{}/{}", self.base_url, self.api_key, endpoint);
        debug!("Requesting {}/***/{}", self.base_url, endpoint);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let text = response.text().await?;

        let outcome: ApiOutcome = serde_json::from_str(&text).unwrap_or_default();
        if !status.is_success() || outcome.result.as_deref() == Some("error") {
            return Err(map_api_error(status, outcome.error_type.as_deref()));
        }

        serde_json::from_str(&text).map_err(|e| {
            UpstreamError::Malformed(format!("failed to parse response for {endpoint}: {e}"))
                .into()
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct ApiOutcome {
    result: Option<String>,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    conversion_rates: BTreeMap<String, f64>,
    base_code: String,
    time_last_update_utc: String,
    time_next_update_utc: String,
}

#[derive(Debug, Deserialize)]
struct PairResponse {
    conversion_result: f64,
}

fn map_api_error(status: StatusCode, error_type: Option<&str>) -> CurrencyError {
    let kind = match error_type {
        Some(error_type) => ApiErrorType::from_error_type(error_type),
        None => ApiErrorType::Unknown(format!("HTTP {status}")),
    };
    debug!(%status, ?kind, "Exchange rate API returned an error");
    UpstreamError::Api(kind).into()
}

fn parse_utc(field: &str, value: &str) -> Result<NaiveDateTime, CurrencyError> {
    DateTime::parse_from_rfc2822(value)
        .map(|dt| dt.naive_utc())
        .map_err(|e| UpstreamError::Malformed(format!("invalid {field} '{value}': {e}")).into())
}

impl TryFrom<LatestResponse> for RateSnapshot {
    type Error = CurrencyError;

    fn try_from(data: LatestResponse) -> Result<Self, Self::Error> {
        if let Some((code, rate)) = data
            .conversion_rates
            .iter()
            .find(|(_, rate)| !rate.is_finite() || **rate <= 0.0)
        {
            let message = format!("non-positive rate {rate} for {code}");
            return Err(UpstreamError::Malformed(message).into());
        }
        Ok(RateSnapshot {
            fetched_at: parse_utc("time_last_update_utc", &data.time_last_update_utc)?,
            next_update: parse_utc("time_next_update_utc", &data.time_next_update_utc)?,
            rates: data.conversion_rates,
            base: data.base_code,
        })
    }
}

#[async_trait]
impl CurrencyService for ExchangeRateApiBackend {
    fn backend(&self) -> BackendKind {
        BackendKind::Rest
    }

    #[instrument(name = "RestLatestRates", skip(self))]
    async fn latest_rates(&self) -> Result<RateSnapshot, CurrencyError> {
        let data: LatestResponse = self.get_json(&format!("latest/{LATEST_BASE}")).await?;
        let snapshot = RateSnapshot::try_from(data)?;
        debug!(base = %snapshot.base, count = snapshot.rates.len(), "Fetched latest rates");
        Ok(snapshot)
    }

    #[instrument(name = "RestConvert", skip(self))]
    async fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64, CurrencyError> {
        let endpoint = format!("pair/{from}/{to}/{amount}");
        let data: PairResponse = self.get_json(&endpoint).await?;
        let result = data.conversion_result;
        if !result.is_finite() || result <= 0.0 {
            let message = format!("non-positive conversion result {result} for {endpoint}");
            return Err(UpstreamError::Malformed(message).into());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const API_KEY: &str = "test-key";

    const LATEST_RESPONSE: &str = r#"{
        "result": "success",
        "time_last_update_unix": 1585267200,
        "time_last_update_utc": "Fri, 27 Mar 2020 00:00:00 +0000",
        "time_next_update_unix": 1585353700,
        "time_next_update_utc": "Sat, 28 Mar 2020 00:00:00 +0000",
        "base_code": "USD",
        "conversion_rates": {
            "USD": 1,
            "EUR": 0.9013,
            "RUB": 78.4512
        }
    }"#;

    async fn mock_endpoint(endpoint: &str, status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/{API_KEY}/{endpoint}")))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn backend(server: &MockServer) -> ExchangeRateApiBackend {
        ExchangeRateApiBackend::new(&server.uri(), API_KEY, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_successful_latest_rates() {
        let mock_server = mock_endpoint("latest/USD", 200, LATEST_RESPONSE).await;

        let snapshot = backend(&mock_server).latest_rates().await.unwrap();
        assert_eq!(snapshot.base, "USD");
        assert_eq!(snapshot.rates.len(), 3);
        assert_eq!(snapshot.rate("EUR"), Some(0.9013));
        assert_eq!(snapshot.rate("USD"), Some(1.0));
        assert_eq!(snapshot.fetched_at.to_string(), "2020-03-27 00:00:00");
        assert_eq!(snapshot.next_update.to_string(), "2020-03-28 00:00:00");
    }

    #[tokio::test]
    async fn test_successful_pair_conversion() {
        let mock_server = mock_endpoint(
            "pair/EUR/GBP/100",
            200,
            r#"{"result": "success", "base_code": "EUR", "target_code": "GBP",
                "conversion_rate": 0.8412, "conversion_result": 84.12}"#,
        )
        .await;

        let backend = backend(&mock_server);
        let result = backend.convert(100.0, "EUR", "GBP").await.unwrap();
        assert_eq!(result, 84.12);
    }

    #[tokio::test]
    async fn test_non_positive_conversion_result_rejected() {
        for result in ["0", "-1"] {
            let body = format!(r#"{{"conversion_result": {result}}}"#);
            let mock_server = mock_endpoint("pair/USD/EUR/5", 200, &body).await;

            let backend = backend(&mock_server);
            let err = backend.convert(5.0, "USD", "EUR").await.unwrap_err();
            let expected = "non-positive conversion result";
            assert!(err.to_string().contains(expected));
            assert!(matches!(
                err,
                CurrencyError::Upstream(UpstreamError::Malformed(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_every_conversion_hits_upstream() {
        let body = r#"{"conversion_result": 9.0}"#;
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/{API_KEY}/pair/USD/EUR/10")))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(2)
            .mount(&mock_server)
            .await;

        let backend = backend(&mock_server);
        backend.convert(10.0, "USD", "EUR").await.unwrap();
        backend.convert(10.0, "USD", "EUR").await.unwrap();
    }

    #[tokio::test]
    async fn test_quota_reached_distinct_from_invalid_key() {
        let quota = mock_endpoint(
            "latest/USD",
            429,
            r#"{"result": "error", "error-type": "quota-reached"}"#,
        )
        .await;
        let invalid = mock_endpoint(
            "latest/USD",
            403,
            r#"{"result": "error", "error-type": "invalid-key"}"#,
        )
        .await;

        let quota_err = backend(&quota).latest_rates().await.unwrap_err();
        let invalid_err = backend(&invalid).latest_rates().await.unwrap_err();

        assert!(matches!(
            quota_err,
            CurrencyError::Upstream(UpstreamError::Api(ApiErrorType::QuotaReached))
        ));
        assert!(matches!(
            invalid_err,
            CurrencyError::Upstream(UpstreamError::Api(ApiErrorType::InvalidKey))
        ));
        assert_ne!(quota_err.to_string(), invalid_err.to_string());
    }

    #[tokio::test]
    async fn test_error_result_with_success_status() {
        let mock_server = mock_endpoint(
            "pair/ZZZ/EUR/1",
            200,
            r#"{"result": "error", "error-type": "unsupported-code"}"#,
        )
        .await;

        let backend = backend(&mock_server);
        let err = backend.convert(1.0, "ZZZ", "EUR").await.unwrap_err();
        assert!(matches!(
            err,
            CurrencyError::Upstream(UpstreamError::Api(ApiErrorType::UnsupportedCode))
        ));
    }

    #[tokio::test]
    async fn test_error_without_body_is_unknown() {
        let mock_server = mock_endpoint("latest/USD", 500, "").await;

        let err = backend(&mock_server).latest_rates().await.unwrap_err();
        match err {
            CurrencyError::Upstream(UpstreamError::Api(ApiErrorType::Unknown(raw))) => {
                assert!(raw.contains("500"));
            }
            other => panic!("Expected unknown API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let body = r#"{"result": "success", "rates": {}}"#;
        let mock_server = mock_endpoint("latest/USD", 200, body).await;

        let err = backend(&mock_server).latest_rates().await.unwrap_err();
        assert!(matches!(
            err,
            CurrencyError::Upstream(UpstreamError::Malformed(_))
        ));
        let expected = "failed to parse response for latest/USD";
        assert!(err.to_string().contains(expected));
    }

    #[tokio::test]
    async fn test_non_positive_rate_rejected() {
        let body = LATEST_RESPONSE.replace("0.9013", "0");
        let mock_server = mock_endpoint("latest/USD", 200, &body).await;

        let err = backend(&mock_server).latest_rates().await.unwrap_err();
        assert!(err.to_string().contains("non-positive rate 0 for EUR"));
    }

    #[tokio::test]
    async fn test_timeout_maps_to_upstream_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(LATEST_RESPONSE)
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let backend =
            ExchangeRateApiBackend::new(&mock_server.uri(), API_KEY, Duration::from_millis(50))
                .unwrap();
        let err = backend.latest_rates().await.unwrap_err();
        assert!(matches!(
            err,
            CurrencyError::Upstream(UpstreamError::Timeout)
        ));
    }

    #[test]
    fn test_no_enumerable_currencies() {
        let backend =
            ExchangeRateApiBackend::new("http://localhost", API_KEY, Duration::from_secs(1))
                .unwrap();
        assert!(backend.supported_currencies().is_empty());
        assert_eq!(backend.backend(), BackendKind::Rest);
    }
}
