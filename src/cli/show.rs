use super::ui;
use crate::core::market::{Category, MarketItem, MarketSnapshot};
use crate::manager::MarketManager;
use anyhow::Result;
use chrono::Utc;
use comfy_table::{Cell, CellAlignment, Table};
use std::collections::BTreeMap;

/// Number of rate columns per table row.
const RATE_COLUMNS: usize = 4;

pub async fn run(manager: &MarketManager) -> Result<()> {
    manager.bootstrap();

    let spinner = ui::new_spinner("Fetching market data...");
    manager.refresh().await;
    spinner.finish_and_clear();

    let state = manager.state();
    match &state.snapshot {
        Some(snapshot) => print_snapshot(snapshot),
        None => println!("No market data available."),
    }
    println!("\n{}", ui::status_line(&state, Utc::now()));
    Ok(())
}

fn print_snapshot(snapshot: &MarketSnapshot) {
    let mut first = true;
    for category in Category::ALL {
        let items = snapshot.items(category);
        if items.is_empty() {
            continue;
        }
        if !first {
            ui::print_separator();
        }
        first = false;

        println!(
            "\n{}",
            ui::style_text(&category.to_string(), ui::StyleType::Title)
        );
        println!("{}", category_table(items));
    }

    if !snapshot.rates.is_empty() {
        ui::print_separator();
        println!(
            "\n{} {}",
            ui::style_text("rates", ui::StyleType::Title),
            ui::style_text("(per 1 USD)", ui::StyleType::Subtle)
        );
        println!("{}", rates_table(&snapshot.rates));
    }
}

pub fn category_table(items: &[MarketItem]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Ticker"),
        ui::header_cell("Name"),
        ui::header_cell("Price"),
        ui::header_cell("Trend"),
        ui::header_cell("Unit"),
    ]);

    for item in items {
        let unit = item.unit.as_deref().or(item.currency.as_deref());
        table.add_row(vec![
            Cell::new(&item.ticker),
            Cell::new(&item.name),
            ui::price_cell(item.price),
            ui::trend_cell(item.trend),
            ui::format_optional_cell(unit, str::to_string),
        ]);
    }
    table
}

pub fn rates_table(rates: &BTreeMap<String, f64>) -> Table {
    let mut table = ui::new_styled_table();
    let header: Vec<Cell> = (0..RATE_COLUMNS)
        .flat_map(|_| [ui::header_cell("Code"), ui::header_cell("Rate")])
        .collect();
    table.set_header(header);

    let entries: Vec<(&String, &f64)> = rates.iter().collect();
    for chunk in entries.chunks(RATE_COLUMNS) {
        let row: Vec<Cell> = chunk
            .iter()
            .flat_map(|(code, rate)| {
                [
                    Cell::new(code),
                    Cell::new(format!("{rate:.4}")).set_alignment(CellAlignment::Right),
                ]
            })
            .collect();
        table.add_row(row);
    }
    table
}
