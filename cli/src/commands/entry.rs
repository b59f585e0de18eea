use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use std::process;

use kcal_core::models::{
    CalorieEntry, Category, EntryInput, today, validate_calories, validate_date, validate_entry,
};
use kcal_core::store::EntryStore;

use super::helpers::{format_calories, json_error, parse_date, store_failure};

/// Fields given to `kcal edit`; `None` keeps the stored value.
#[derive(Debug, Default)]
pub(crate) struct EntryEdit {
    pub calories: Option<f64>,
    pub category: Option<Category>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
}

impl EntryEdit {
    fn is_empty(&self) -> bool {
        self.calories.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.date.is_none()
    }

    /// Merge into the stored record, producing the full replacement record.
    fn apply(self, mut entry: CalorieEntry) -> Result<CalorieEntry> {
        if let Some(calories) = self.calories {
            validate_calories(calories)?;
            entry.calories = calories;
        }
        if let Some(category) = self.category {
            entry.category = category;
        }
        if let Some(description) = self.description {
            if description.trim().is_empty() {
                bail!("Description must not be empty.");
            }
            entry.description = description;
        }
        if let Some(date) = self.date {
            validate_date(date)?;
            entry.date = date;
        }
        Ok(entry)
    }
}

fn print_saved(verb: &str, entry: &CalorieEntry, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(entry)?);
    } else {
        let id = entry.id;
        let description = &entry.description;
        let cal = format_calories(entry.calories);
        let category = entry.category;
        let date = entry.date;
        println!("{verb} entry {id}: {description} — {cal} kcal ({category}, {date})");
    }
    Ok(())
}

pub(crate) async fn cmd_add(
    store: &EntryStore,
    calories: f64,
    description: &str,
    category: Option<&str>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let category = match category {
        Some(name) => name.parse()?,
        None => Category::Breakfast,
    };
    let input = EntryInput {
        calories,
        category,
        description: description.to_string(),
        date: Some(parse_date(date)?),
    };
    add_validated(store, input, json).await
}

/// Add an entry described as a JSON object (`amount` is accepted for `calories`).
pub(crate) async fn cmd_add_json(store: &EntryStore, raw: &str, json: bool) -> Result<()> {
    let input: EntryInput = serde_json::from_str(raw).context("Invalid entry JSON")?;
    add_validated(store, input, json).await
}

async fn add_validated(store: &EntryStore, input: EntryInput, json: bool) -> Result<()> {
    validate_entry(&input)?;
    // Pin the date so the printed record matches the stored one.
    let input = EntryInput {
        date: Some(input.date.unwrap_or_else(today)),
        ..input
    };
    let id = store.add(input.clone()).await.map_err(store_failure)?;
    print_saved("Added", &CalorieEntry::from_input(id, input), json)
}

pub(crate) async fn cmd_edit(
    store: &EntryStore,
    entry_id: i64,
    edit: EntryEdit,
    json: bool,
) -> Result<()> {
    if edit.is_empty() {
        bail!(
            "Nothing to update. Provide at least one of --calories, --category, --description, or --date"
        );
    }

    let Some(existing) = store.get(entry_id).await.map_err(store_failure)? else {
        if json {
            println!("{}", json_error(&format!("Entry {entry_id} not found")));
        } else {
            eprintln!("Entry {entry_id} not found");
        }
        process::exit(2);
    };

    let updated = edit.apply(existing)?;
    store.update(updated.clone()).await.map_err(store_failure)?;
    print_saved("Updated", &updated, json)
}

pub(crate) async fn cmd_delete(store: &EntryStore, entry_id: i64, json: bool) -> Result<()> {
    store.delete(entry_id).await.map_err(store_failure)?;
    if json {
        println!("{}", serde_json::json!({ "deleted": entry_id }));
    } else {
        println!("Deleted entry {entry_id}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kcal_core::db::SCHEMA_VERSION;
    use kcal_core::models::Month;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stored() -> CalorieEntry {
        CalorieEntry {
            id: 3,
            calories: 500.0,
            category: Category::Breakfast,
            description: "Oatmeal".to_string(),
            date: ymd(2024, 3, 5),
        }
    }

    #[test]
    fn test_edit_apply_merges_fields() {
        let edit = EntryEdit {
            calories: Some(420.0),
            description: Some("Porridge".to_string()),
            ..EntryEdit::default()
        };
        let updated = edit.apply(stored()).unwrap();
        assert_eq!(updated.id, 3);
        assert_eq!(updated.calories, 420.0);
        assert_eq!(updated.description, "Porridge");
        assert_eq!(updated.category, Category::Breakfast);
        assert_eq!(updated.date, ymd(2024, 3, 5));
    }

    #[test]
    fn test_edit_apply_rejects_invalid_values() {
        let edit = EntryEdit {
            calories: Some(0.0),
            ..EntryEdit::default()
        };
        assert!(edit.apply(stored()).is_err());

        let edit = EntryEdit {
            description: Some(String::new()),
            ..EntryEdit::default()
        };
        assert!(edit.apply(stored()).is_err());

        let edit = EntryEdit {
            date: NaiveDate::from_ymd_opt(10000, 1, 5),
            ..EntryEdit::default()
        };
        assert!(edit.apply(stored()).is_err());
    }

    #[test]
    fn test_edit_is_empty() {
        assert!(EntryEdit::default().is_empty());
        let edit = EntryEdit {
            date: Some(ymd(2024, 3, 6)),
            ..EntryEdit::default()
        };
        assert!(!edit.is_empty());
    }

    #[tokio::test]
    async fn test_add_rejects_zero_calories_before_store() {
        let store = EntryStore::open_in_memory(SCHEMA_VERSION).await.unwrap();
        let err = cmd_add(
            &store,
            0.0,
            "Nothing",
            Some("breakfast"),
            Some("2024-03-05".to_string()),
            false,
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Calories must be greater than zero.");

        let month = Month::new(2024, 2).unwrap();
        assert!(store.query_by_month(month).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_json_with_legacy_amount() {
        let store = EntryStore::open_in_memory(SCHEMA_VERSION).await.unwrap();
        cmd_add_json(
            &store,
            r#"{"amount": 250, "category": "LUNCH", "description": "Soup", "date": "2024-03-07"}"#,
            true,
        )
        .await
        .unwrap();

        let entries = store
            .query_by_month(Month::new(2024, 2).unwrap())
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].calories, 250.0);
        assert_eq!(entries[0].category, Category::Lunch);
    }

    #[tokio::test]
    async fn test_add_defaults_to_breakfast() {
        let store = EntryStore::open_in_memory(SCHEMA_VERSION).await.unwrap();
        cmd_add(&store, 300.0, "Toast", None, None, true)
            .await
            .unwrap();
        let stored = store.get(1).await.unwrap().unwrap();
        assert_eq!(stored.category, Category::Breakfast);
        assert_eq!(stored.date, today());
    }

    #[tokio::test]
    async fn test_add_json_without_date_stores_today() {
        let store = EntryStore::open_in_memory(SCHEMA_VERSION).await.unwrap();
        cmd_add_json(
            &store,
            r#"{"calories": 90, "category": "OTHER", "description": "Apple"}"#,
            true,
        )
        .await
        .unwrap();
        assert_eq!(store.get(1).await.unwrap().unwrap().date, today());
    }

    #[tokio::test]
    async fn test_add_json_rejects_five_digit_year() {
        let store = EntryStore::open_in_memory(SCHEMA_VERSION).await.unwrap();
        let result = cmd_add_json(
            &store,
            r#"{"calories": 90, "category": "OTHER", "description": "Apple", "date": "+10000-01-05"}"#,
            true,
        )
        .await;
        assert!(result.is_err());
        assert!(store.get(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_rejects_unknown_category() {
        let store = EntryStore::open_in_memory(SCHEMA_VERSION).await.unwrap();
        let result = cmd_add(&store, 100.0, "Chips", Some("snack"), None, false).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_edit_and_delete_roundtrip() {
        let store = EntryStore::open_in_memory(SCHEMA_VERSION).await.unwrap();
        cmd_add(
            &store,
            500.0,
            "Oatmeal",
            Some("breakfast"),
            Some("2024-03-05".to_string()),
            false,
        )
        .await
        .unwrap();

        let edit = EntryEdit {
            category: Some(Category::Other),
            ..EntryEdit::default()
        };
        cmd_edit(&store, 1, edit, false).await.unwrap();
        assert_eq!(
            store.get(1).await.unwrap().unwrap().category,
            Category::Other
        );

        cmd_delete(&store, 1, false).await.unwrap();
        assert!(store.get(1).await.unwrap().is_none());
        // Deleting again is still a success
        cmd_delete(&store, 1, true).await.unwrap();
    }
}
