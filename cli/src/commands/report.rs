use anyhow::Result;
use std::process;

use kcal_core::models::Category;
use kcal_core::store::EntryStore;
use kcal_core::summary::{build_month_summary, total_calories};

use super::helpers::{format_calories, parse_month, print_entry_table, render_bar, store_failure};

const BAR_WIDTH: usize = 40;

pub(crate) async fn cmd_list(store: &EntryStore, month: Option<&str>, json: bool) -> Result<()> {
    let month = parse_month(month)?;
    let entries = store.query_by_month(month).await.map_err(store_failure)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        eprintln!("No entries for {month}");
        process::exit(2);
    }

    println!("=== {month} ===\n");
    print_entry_table(&entries);
    let total = format_calories(total_calories(&entries));
    println!("\n  TOTAL: {total} kcal");
    Ok(())
}

pub(crate) async fn cmd_chart(store: &EntryStore, month: Option<&str>, json: bool) -> Result<()> {
    let month = parse_month(month)?;
    let entries = store.query_by_month(month).await.map_err(store_failure)?;
    let summary = build_month_summary(month, &entries);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.days.is_empty() {
        eprintln!("No entries for {month}");
        process::exit(2);
    }

    println!("=== {month} ===\n");
    let max = summary
        .days
        .iter()
        .map(|d| d.calories)
        .fold(0.0_f64, f64::max);
    for day in &summary.days {
        let date = day.date.format("%m-%d");
        let bar = render_bar(day.calories, max, BAR_WIDTH);
        let cal = format_calories(day.calories);
        println!("  {date} {bar:<BAR_WIDTH$} {cal:>7} kcal");
    }
    println!();

    for c in &summary.categories {
        let label = c.category.as_str();
        let cal = format_calories(c.calories);
        let count = c.entries;
        println!("  {label:<10} {cal:>7} kcal ({count} entries)");
    }

    let total = format_calories(summary.total_calories);
    #[allow(clippy::cast_precision_loss)]
    let average = summary.total_calories / summary.days.len() as f64;
    let average = format_calories(average.round());
    println!("\n  TOTAL: {total} kcal | AVG/DAY LOGGED: {average} kcal");
    Ok(())
}

pub(crate) async fn cmd_category(store: &EntryStore, category: &str, json: bool) -> Result<()> {
    let category: Category = category.parse()?;
    let entries = store
        .query_by_category(category)
        .await
        .map_err(store_failure)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        eprintln!("No {category} entries");
        process::exit(2);
    }

    print_entry_table(&entries);
    Ok(())
}
