use super::ui;
use crate::core::{BackendKind, SupportedCurrency};
use comfy_table::{Cell, CellAlignment};

pub fn display_as_table(backend: BackendKind, currencies: &[SupportedCurrency]) -> String {
    if currencies.is_empty() {
        return ui::style_text(
            &format!("The {backend} backend accepts any currency code."),
            ui::StyleType::Subtle,
        );
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Name"),
        ui::header_cell("Nominal"),
    ]);
    for currency in currencies {
        table.add_row(vec![
            Cell::new(&currency.code),
            Cell::new(&currency.name),
            Cell::new(currency.nominal).set_alignment(CellAlignment::Right),
        ]);
    }

    format!(
        "Supported currencies ({}): {}\n\n{}",
        backend,
        ui::style_text(&currencies.len().to_string(), ui::StyleType::TotalLabel),
        table
    )
}
