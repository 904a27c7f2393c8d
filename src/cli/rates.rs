use super::ui;
use crate::core::{CurrencyError, CurrencyService, RateSnapshot};
use chrono::{Duration, NaiveDateTime};
use comfy_table::Cell;
use std::collections::BTreeMap;
use tracing::warn;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What the `rates` command renders; a failed fetch still produces a view.
#[derive(Debug, Clone, PartialEq)]
pub struct RatesView {
    pub rates: BTreeMap<String, f64>,
    pub base: String,
    pub date: String,
    pub next_update: String,
    pub error: Option<String>,
}

impl From<RateSnapshot> for RatesView {
    fn from(snapshot: RateSnapshot) -> Self {
        RatesView {
            rates: snapshot.rates,
            base: snapshot.base,
            date: snapshot.fetched_at.format(DATE_FORMAT).to_string(),
            next_update: snapshot.next_update.format(DATE_FORMAT).to_string(),
            error: None,
        }
    }
}

impl RatesView {
    /// Empty rates with the error message, dated `now`.
    pub fn degraded(message: String, now: NaiveDateTime) -> Self {
        RatesView {
            rates: BTreeMap::new(),
            base: "USD".to_string(),
            date: now.format(DATE_FORMAT).to_string(),
            next_update: (now + Duration::days(1)).format(DATE_FORMAT).to_string(),
            error: Some(message),
        }
    }

    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Currency"),
            ui::header_cell(&format!("Rate ({})", self.base)),
        ]);
        for (code, rate) in &self.rates {
            table.add_row(vec![Cell::new(code), ui::number_cell(*rate, 4)]);
        }

        let mut output = format!(
            "Exchange rates: {}\n\n",
            ui::style_text(&self.base, ui::StyleType::Title)
        );
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\n{} {}\n{} {}",
            ui::style_text("Published:", ui::StyleType::TotalLabel),
            self.date,
            ui::style_text("Next update:", ui::StyleType::TotalLabel),
            ui::style_text(&self.next_update, ui::StyleType::Subtle),
        ));
        if let Some(error) = &self.error {
            output.push_str(&format!(
                "\n\n{}",
                ui::style_text(&format!("Error: {error}"), ui::StyleType::Error)
            ));
        }
        output
    }
}

pub async fn fetch_view(
    service: Result<Box<dyn CurrencyService>, CurrencyError>,
    now: NaiveDateTime,
) -> RatesView {
    let result = match service {
        Ok(service) => {
            let spinner = ui::new_spinner("Fetching latest rates...");
            let result = service.latest_rates().await;
            spinner.finish_and_clear();
            result
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(snapshot) => snapshot.into(),
        Err(e) => {
            warn!(error = %e, "Showing degraded rates view");
            RatesView::degraded(e.to_string(), now)
        }
    }
}

pub async fn run(
    service: Result<Box<dyn CurrencyService>, CurrencyError>,
    now: NaiveDateTime,
) -> anyhow::Result<()> {
    let view = fetch_view(service, now).await;
    println!("{}", view.display_as_table());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BackendKind, UpstreamError};
    use async_trait::async_trait;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 18)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap()
    }

    struct FixedService(Result<RateSnapshot, ()>);

    #[async_trait]
    impl CurrencyService for FixedService {
        fn backend(&self) -> BackendKind {
            BackendKind::Rest
        }

        async fn latest_rates(&self) -> Result<RateSnapshot, CurrencyError> {
            self.0.clone().map_err(|_| UpstreamError::Timeout.into())
        }

        async fn convert(&self, _: f64, _: &str, _: &str) -> Result<f64, CurrencyError> {
            unimplemented!()
        }
    }

    fn snapshot() -> RateSnapshot {
        RateSnapshot {
            rates: BTreeMap::from([("EUR".to_string(), 0.9013), ("USD".to_string(), 1.0)]),
            base: "USD".to_string(),
            fetched_at: now(),
            next_update: now() + Duration::days(1),
        }
    }

    #[test]
    fn test_degraded_view() {
        let view = RatesView::degraded("quota reached".to_string(), now());
        assert!(view.rates.is_empty());
        assert_eq!(view.base, "USD");
        assert_eq!(view.date, "2024-05-18 12:30:00");
        assert_eq!(view.next_update, "2024-05-19 12:30:00");
        assert!(view.display_as_table().contains("Error: quota reached"));
    }

    #[test]
    fn test_table_lists_rates() {
        let view = RatesView::from(snapshot());
        let output = view.display_as_table();
        assert!(output.contains("EUR"));
        assert!(output.contains("0.9013"));
        assert!(output.contains("Rate (USD)"));
        assert!(!output.contains("Error:"));
    }

    #[tokio::test]
    async fn test_fetch_view_success() {
        let service: Box<dyn CurrencyService> = Box::new(FixedService(Ok(snapshot())));
        let view = fetch_view(Ok(service), now()).await;
        assert_eq!(view.rates.len(), 2);
        assert!(view.error.is_none());
    }

    #[tokio::test]
    async fn test_fetch_view_degrades_on_errors() {
        let service: Box<dyn CurrencyService> = Box::new(FixedService(Err(())));
        let view = fetch_view(Ok(service), now()).await;
        assert_eq!(
            view.error.as_deref(),
            Some("Upstream error: request timed out")
        );

        let view = fetch_view(
            Err(CurrencyError::BackendUnavailable("unreachable".to_string())),
            now(),
        )
        .await;
        assert!(view.rates.is_empty());
        assert_eq!(
            view.error.as_deref(),
            Some("Backend unavailable: unreachable")
        );
    }
}
