//! Transport for the central bank `DailyInfo` SOAP service.

use super::parse::parse_fault;
use crate::core::{CurrencyError, UpstreamError};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, instrument};

const SERVICE_NAMESPACE: &str = "http://web.cbr.ru/";

/// The three `DailyInfo` operations used by the backend. Each returns the raw
/// SOAP response body; SOAP faults are already mapped to errors.
#[async_trait]
pub trait DailyInfoClient: Send + Sync {
    async fn enum_valutes(&self, seld: bool) -> Result<String, UpstreamError>;

    async fn latest_date_time(&self) -> Result<String, UpstreamError>;

    async fn curs_on_date(&self, on_date: NaiveDateTime) -> Result<String, UpstreamError>;
}

pub struct SoapDailyInfoClient {
    url: String,
    client: reqwest::Client,
}

impl SoapDailyInfoClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, CurrencyError> {
        let client = reqwest::Client::builder()
            .user_agent("fxconv/1.0")
            .timeout(timeout)
            .build()?;
        Ok(SoapDailyInfoClient {
            url: url.to_string(),
            client,
        })
    }

    #[instrument(name = "DailyInfoCall", skip(self, params))]
    async fn call(&self, operation: &str, params: &str) -> Result<String, UpstreamError> {
        debug!("Posting {} to {}", operation, self.url);
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", format!("\"{SERVICE_NAMESPACE}{operation}\""))
            .body(envelope(operation, params))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if let Some(fault) = parse_fault(&text) {
            debug!(%status, "SOAP fault returned by {}", operation);
            return Err(fault);
        }
        if !status.is_success() {
            return Err(UpstreamError::Http(status));
        }
        Ok(text)
    }
}

fn envelope(operation: &str, params: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<soap:Envelope xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" "#,
            r#"xmlns:xsd="http://www.w3.org/2001/XMLSchema" "#,
            r#"xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">"#,
            r#"<soap:Body><{op} xmlns="{ns}">{params}</{op}></soap:Body>"#,
            r#"</soap:Envelope>"#
        ),
        op = operation,
        ns = SERVICE_NAMESPACE,
        params = params
    )
}

#[async_trait]
impl DailyInfoClient for SoapDailyInfoClient {
    async fn enum_valutes(&self, seld: bool) -> Result<String, UpstreamError> {
        self.call("EnumValutes", &format!("<Seld>{seld}</Seld>")).await
    }

    async fn latest_date_time(&self) -> Result<String, UpstreamError> {
        self.call("GetLatestDateTime", "").await
    }

    async fn curs_on_date(&self, on_date: NaiveDateTime) -> Result<String, UpstreamError> {
        let on_date = on_date.format("%Y-%m-%dT%H:%M:%S");
        self.call("GetCursOnDate", &format!("<On_date>{on_date}</On_date>")).await
    }
}
