use std::collections::BTreeMap;

use crate::models::{CATEGORIES, CalorieEntry, CategoryTotal, DailyTotal, Month, MonthSummary};

/// Sums calories per date, ordered by date. Days without entries are omitted.
#[must_use]
pub fn daily_totals(entries: &[CalorieEntry]) -> Vec<DailyTotal> {
    let mut by_date: BTreeMap<_, DailyTotal> = BTreeMap::new();
    for e in entries {
        let total = by_date.entry(e.date).or_insert_with(|| DailyTotal {
            date: e.date,
            calories: 0.0,
            entries: 0,
        });
        total.calories += e.calories;
        total.entries += 1;
    }
    by_date.into_values().collect()
}

/// Sums calories per category in the fixed category order, skipping empty ones.
#[must_use]
pub fn category_totals(entries: &[CalorieEntry]) -> Vec<CategoryTotal> {
    CATEGORIES
        .iter()
        .filter_map(|&category| {
            let matching: Vec<&CalorieEntry> =
                entries.iter().filter(|e| e.category == category).collect();
            if matching.is_empty() {
                return None;
            }
            Some(CategoryTotal {
                category,
                calories: matching.iter().map(|e| e.calories).sum(),
                entries: matching.len(),
            })
        })
        .collect()
}

#[must_use]
pub fn total_calories(entries: &[CalorieEntry]) -> f64 {
    entries.iter().map(|e| e.calories).sum()
}

#[must_use]
pub fn build_month_summary(month: Month, entries: &[CalorieEntry]) -> MonthSummary {
    MonthSummary {
        month: month.to_string(),
        days: daily_totals(entries),
        categories: category_totals(entries),
        total_calories: total_calories(entries),
    }
}
