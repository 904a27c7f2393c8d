use super::ui;
use crate::core::CurrencyService;
use crate::core::request::ConvertRequest;
use anyhow::Result;

pub fn format_conversion(request: &ConvertRequest, result: f64) -> String {
    format!(
        "{:.2} {} = {} {}",
        request.amount,
        request.from,
        ui::style_text(&format!("{result:.4}"), ui::StyleType::TotalValue),
        request.to
    )
}

pub async fn run(service: &dyn CurrencyService, request: ConvertRequest) -> Result<()> {
    let spinner = ui::new_spinner("Converting...");
    let result = service
        .convert(request.amount, &request.from, &request.to)
        .await;
    spinner.finish_and_clear();

    println!("{}", format_conversion(&request, result?));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_conversion() {
        let request = ConvertRequest::new(100.0, "usd", "eur").unwrap();
        let output = format_conversion(&request, 92.12346);
        assert!(output.starts_with("100.00 USD = "));
        assert!(output.contains("92.1235"));
        assert!(output.ends_with(" EUR"));
    }
}
