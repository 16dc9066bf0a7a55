use crate::manager::ManagerState;
use chrono::{DateTime, Utc};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Label,
    Good,
    Warning,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Label => style(text).bold(),
        StyleType::Good => style(text).green().bold(),
        StyleType::Warning => style(text).yellow().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Formats an `Option<T>` into a `Cell`. `None` is displayed as "-".
pub fn format_optional_cell<T>(value: Option<T>, format_fn: impl Fn(T) -> String) -> Cell {
    value.map_or(Cell::new("-").fg(Color::DarkGrey), |v| Cell::new(format_fn(v)))
}

pub fn price_cell(price: f64) -> Cell {
    Cell::new(format!("{price:.4}")).set_alignment(CellAlignment::Right)
}

/// Creates a cell for a percentage trend with color coding.
pub fn trend_cell(trend: f64) -> Cell {
    let text = format!("{trend:+.2}%");
    let color = if trend > 0.0 {
        Color::Green
    } else if trend < 0.0 {
        Color::Red
    } else {
        Color::DarkGrey
    };
    Cell::new(text)
        .fg(color)
        .set_alignment(CellAlignment::Right)
}

/// Creates a spinner shown while a refresh is in flight.
pub fn new_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(spinner_style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// One-line summary: status, stale marker and age of the data.
pub fn status_line(state: &ManagerState, now: DateTime<Utc>) -> String {
    let mut parts = Vec::with_capacity(4);

    let status_style = if state.snapshot.is_none() {
        StyleType::Error
    } else if state.is_stale {
        StyleType::Warning
    } else {
        StyleType::Good
    };
    parts.push(style_text(&state.status, status_style));

    if state.is_stale {
        parts.push(style_text("[stale]", StyleType::Warning));
    }
    if let Some(source) = state.source {
        parts.push(style_text(&source.to_string(), StyleType::Subtle));
    }
    if let Some(age) = state.time_since_update(now) {
        parts.push(style_text(&format!("updated {age}"), StyleType::Subtle));
    }

    parts.join(" · ")
}

/// Prints a separator line matching the terminal width.
pub fn print_separator() {
    let term_width = console::Term::stdout()
        .size_checked()
        .map(|(_, w)| w as usize)
        .unwrap_or(80);
    println!("\n{}", "─".repeat(term_width));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SnapshotSource;
    use crate::test_support::snapshot_at;
    use chrono::{TimeDelta, TimeZone};

    fn plain(text: &str) -> String {
        console::strip_ansi_codes(text).to_string()
    }

    #[test]
    fn test_status_line_for_stale_cache() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap();
        let state = ManagerState {
            snapshot: Some(snapshot_at(now - TimeDelta::hours(30))),
            source: Some(SnapshotSource::Cache),
            is_loading: false,
            last_fetch: Some(now - TimeDelta::hours(30)),
            status: "stale (not from today)".to_string(),
            is_stale: true,
        };

        assert_eq!(
            plain(&status_line(&state, now)),
            "stale (not from today) · [stale] · cached data · updated 1 d ago"
        );
    }

    #[test]
    fn test_status_line_without_data() {
        let state = ManagerState {
            status: "waiting for data".to_string(),
            ..ManagerState::default()
        };
        assert_eq!(plain(&status_line(&state, Utc::now())), "waiting for data");
    }

    #[test]
    fn test_trend_cell_sign() {
        assert_eq!(trend_cell(1.5).content(), "+1.50%");
        assert_eq!(trend_cell(-0.25).content(), "-0.25%");
        assert_eq!(trend_cell(0.0).content(), "+0.00%");
    }
}
