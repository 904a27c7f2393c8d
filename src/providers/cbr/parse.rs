//! Parsers for `DailyInfo` SOAP response bodies.
//!
//! The service wraps its data in a .NET `DataSet` diffgram:
//! `Envelope/Body/{Op}Response/{Op}Result/diffgram/ValuteData/{Row}*`.
//! Element prefixes are ignored by the deserializer, as are the inline
//! `xs:schema` and any column we do not read.

use crate::core::{SoapFaultKind, SupportedCurrency, UpstreamError};
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct Envelope<B> {
    #[serde(rename = "Body")]
    body: B,
}

#[derive(Debug, Deserialize)]
struct DataSetResult<T> {
    diffgram: Diffgram<T>,
}

#[derive(Debug, Deserialize)]
struct Diffgram<T> {
    #[serde(rename = "ValuteData")]
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct FaultBody {
    #[serde(rename = "Fault")]
    fault: Option<Fault>,
}

#[derive(Debug, Deserialize)]
struct Fault {
    faultcode: String,
    #[serde(default)]
    faultstring: String,
}

#[derive(Debug, Deserialize)]
struct EnumValutesBody {
    #[serde(rename = "EnumValutesResponse")]
    response: EnumValutesResponse,
}

#[derive(Debug, Deserialize)]
struct EnumValutesResponse {
    #[serde(rename = "EnumValutesResult")]
    result: DataSetResult<EnumValutesData>,
}

#[derive(Debug, Deserialize)]
struct EnumValutesData {
    #[serde(rename = "EnumValutes", default)]
    rows: Vec<EnumValuteRow>,
}

#[derive(Debug, Deserialize)]
struct EnumValuteRow {
    #[serde(rename = "VcharCode")]
    char_code: Option<String>,
    #[serde(rename = "Vname", default)]
    name: String,
    #[serde(rename = "Vnom")]
    nominal: String,
}

#[derive(Debug, Deserialize)]
struct LatestDateTimeBody {
    #[serde(rename = "GetLatestDateTimeResponse")]
    response: LatestDateTimeResponse,
}

#[derive(Debug, Deserialize)]
struct LatestDateTimeResponse {
    #[serde(rename = "GetLatestDateTimeResult")]
    result: String,
}

#[derive(Debug, Deserialize)]
struct CursOnDateBody {
    #[serde(rename = "GetCursOnDateResponse")]
    response: CursOnDateResponse,
}

#[derive(Debug, Deserialize)]
struct CursOnDateResponse {
    #[serde(rename = "GetCursOnDateResult")]
    result: DataSetResult<CursOnDateData>,
}

#[derive(Debug, Deserialize)]
struct CursOnDateData {
    #[serde(rename = "ValuteCursOnDate", default)]
    rows: Vec<CursRow>,
}

#[derive(Debug, Deserialize)]
struct CursRow {
    #[serde(rename = "VchCode")]
    char_code: Option<String>,
    #[serde(rename = "Vcurs")]
    quoted: String,
    #[serde(rename = "Vnom")]
    nominal: String,
}

/// One row of `GetCursOnDate`: the RUB price of `nominal` units of `code`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotedRate {
    pub code: String,
    pub quoted: f64,
    pub nominal: u32,
}

impl QuotedRate {
    pub fn per_unit(&self) -> f64 {
        self.quoted / f64::from(self.nominal)
    }
}

fn malformed(what: &str, err: impl std::fmt::Display) -> UpstreamError {
    UpstreamError::Malformed(format!("{what}: {err}"))
}

fn parse_number(field: &str, value: &str) -> Result<f64, UpstreamError> {
    let value = value.trim().replace(',', ".");
    value
        .parse::<f64>()
        .map_err(|e| malformed(&format!("invalid {field} '{value}'"), e))
}

fn parse_nominal(value: &str) -> Result<u32, UpstreamError> {
    let nominal = parse_number("Vnom", value)?;
    if nominal < 1.0 || nominal.fract() != 0.0 || nominal > f64::from(u32::MAX) {
        let message = format!("invalid Vnom '{}'", value.trim());
        return Err(UpstreamError::Malformed(message));
    }
    Ok(nominal as u32)
}

fn non_empty_code(code: Option<String>) -> Option<String> {
    code.map(|c| c.trim().to_string()).filter(|c| !c.is_empty())
}

/// Extracts a SOAP fault from a response body, if it carries one.
pub fn parse_fault(xml: &str) -> Option<UpstreamError> {
    let envelope: Envelope<FaultBody> = serde_xml_rs::from_str(xml).ok()?;
    envelope.body.fault.map(|fault| UpstreamError::SoapFault {
        kind: SoapFaultKind::from_fault_code(&fault.faultcode),
        message: fault.faultstring.trim().to_string(),
    })
}

/// Parses an `EnumValutes` response into registry entries. Rows without a
/// letter code (retired currencies) are skipped.
pub fn parse_enum_valutes(xml: &str) -> Result<Vec<SupportedCurrency>, UpstreamError> {
    let envelope: Envelope<EnumValutesBody> =
        serde_xml_rs::from_str(xml).map_err(|e| malformed("invalid EnumValutes response", e))?;
    let rows = envelope
        .body
        .response
        .result
        .diffgram
        .data
        .map(|data| data.rows)
        .unwrap_or_default();

    let mut currencies = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(code) = non_empty_code(row.char_code) else {
            debug!(name = row.name.trim(), "Skipping currency without a letter code");
            continue;
        };
        currencies.push(SupportedCurrency {
            nominal: parse_nominal(&row.nominal)?,
            name: row.name.trim().to_string(),
            code,
        });
    }
    Ok(currencies)
}

/// Parses a `GetLatestDateTime` response. The service answers either with a
/// bare `xs:dateTime` or one carrying an offset; the local wall-clock time is
/// kept in both cases.
pub fn parse_latest_date_time(xml: &str) -> Result<NaiveDateTime, UpstreamError> {
    let envelope: Envelope<LatestDateTimeBody> = serde_xml_rs::from_str(xml)
        .map_err(|e| malformed("invalid GetLatestDateTime response", e))?;
    parse_date_time(&envelope.body.response.result)
}

pub fn parse_date_time(value: &str) -> Result<NaiveDateTime, UpstreamError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_local());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|e| malformed(&format!("invalid publication date '{value}'"), e))
}

/// Parses a `GetCursOnDate` response into the quoted rows.
pub fn parse_curs_on_date(xml: &str) -> Result<Vec<QuotedRate>, UpstreamError> {
    let envelope: Envelope<CursOnDateBody> =
        serde_xml_rs::from_str(xml).map_err(|e| malformed("invalid GetCursOnDate response", e))?;
    let rows = envelope
        .body
        .response
        .result
        .diffgram
        .data
        .map(|data| data.rows)
        .unwrap_or_default();

    let mut quotes = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(code) = non_empty_code(row.char_code) else {
            continue;
        };
        quotes.push(QuotedRate {
            quoted: parse_number("Vcurs", &row.quoted)?,
            nominal: parse_nominal(&row.nominal)?,
            code,
        });
    }
    Ok(quotes)
}
