use anyhow::{Context, Result, anyhow};
use chrono::{Duration, NaiveDate};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, Width, object::Columns},
};

use kcal_core::error::StoreError;
use kcal_core::models::{CalorieEntry, Month, today, validate_date};

const DESCRIPTION_WIDTH: usize = 40;

/// Resolve a `--date` value. Only four-digit years are accepted.
pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    let today = today();
    let date = match date_str.as_deref() {
        None | Some("today") => today,
        Some("yesterday") => today - Duration::days(1),
        Some("tomorrow") => today + Duration::days(1),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| {
            format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
        })?,
    };
    validate_date(date)?;
    Ok(date)
}

/// Parse `YYYY-MM` (or `this`/`last`), defaulting to the current local month.
pub(crate) fn parse_month(month_str: Option<&str>) -> Result<Month> {
    match month_str {
        None | Some("this") => Ok(Month::current()),
        Some("last") => {
            let first = Month::current().first_day();
            Ok(Month::containing(first - Duration::days(1)))
        }
        Some(s) => s.parse(),
    }
}

/// Log the full error chain and reduce a store failure to its user-facing message.
pub(crate) fn store_failure(err: StoreError) -> anyhow::Error {
    tracing::error!(error = ?err, "{err}");
    anyhow!(err.user_message())
}

pub(crate) fn print_entry_table(entries: &[CalorieEntry]) {
    #[derive(Tabled)]
    struct EntryRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Description")]
        description: String,
        #[tabled(rename = "Calories")]
        calories: String,
    }

    let rows: Vec<EntryRow> = entries
        .iter()
        .map(|e| EntryRow {
            id: e.id,
            date: e.date.format("%Y-%m-%d").to_string(),
            category: e.category.to_string(),
            description: e.description.clone(),
            calories: format_calories(e.calories),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(
            Modify::new(Columns::single(3))
                .with(Width::truncate(DESCRIPTION_WIDTH).suffix("...")),
        )
        .with(Modify::new(Columns::new(4..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn format_calories(calories: f64) -> String {
    if calories.fract() == 0.0 {
        format!("{calories:.0}")
    } else {
        format!("{calories:.1}")
    }
}

/// A bar of `width` cells scaled so that `max` fills it completely.
pub(crate) fn render_bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    #[allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]
    let cells = ((value / max) * width as f64).round() as usize;
    "█".repeat(cells.clamp(1, width))
}

pub(crate) fn json_error(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_none() {
        let today = today();
        assert_eq!(parse_date(None).unwrap(), today);
    }

    #[test]
    fn test_parse_date_keywords() {
        let today = today();
        assert_eq!(parse_date(Some("today".to_string())).unwrap(), today);
        assert_eq!(
            parse_date(Some("yesterday".to_string())).unwrap(),
            today - Duration::days(1)
        );
        assert_eq!(
            parse_date(Some("tomorrow".to_string())).unwrap(),
            today + Duration::days(1)
        );
    }

    #[test]
    fn test_parse_date_iso() {
        let date = parse_date(Some("2024-01-15".to_string())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date(Some("nope".to_string())).is_err());
    }

    #[test]
    fn test_parse_date_rejects_five_digit_year() {
        assert!(parse_date(Some("+10000-01-05".to_string())).is_err());
        let last = parse_date(Some("9999-12-31".to_string())).unwrap();
        assert_eq!(last, NaiveDate::from_ymd_opt(9999, 12, 31).unwrap());
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month(None).unwrap(), Month::current());
        let month = parse_month(Some("2024-03")).unwrap();
        assert_eq!((month.year(), month.month0()), (2024, 2));
        assert!(parse_month(Some("2024-3-1")).is_err());
    }

    #[test]
    fn test_parse_month_last() {
        let last = parse_month(Some("last")).unwrap();
        assert_eq!(last.next(), Month::current());
    }

    #[test]
    fn test_format_calories() {
        assert_eq!(format_calories(500.0), "500");
        assert_eq!(format_calories(120.75), "120.8");
    }

    #[test]
    fn test_render_bar() {
        assert_eq!(render_bar(1000.0, 1000.0, 10).chars().count(), 10);
        assert_eq!(render_bar(500.0, 1000.0, 10).chars().count(), 5);
        // Small values still get one cell
        assert_eq!(render_bar(1.0, 1000.0, 10).chars().count(), 1);
        assert_eq!(render_bar(0.0, 1000.0, 10), "");
        assert_eq!(render_bar(10.0, 0.0, 10), "");
    }

    #[test]
    fn test_json_error() {
        assert_eq!(json_error("Entry 3 not found"), r#"{"error":"Entry 3 not found"}"#);
    }
}
