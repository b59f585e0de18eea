use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Meal category. Persisted and serialized as the uppercase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Breakfast,
    Lunch,
    Dinner,
    Other,
}

pub const CATEGORIES: &[Category] = &[
    Category::Breakfast,
    Category::Lunch,
    Category::Dinner,
    Category::Other,
];

impl Category {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "BREAKFAST",
            Self::Lunch => "LUNCH",
            Self::Dinner => "DINNER",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_uppercase();
        CATEGORIES
            .iter()
            .copied()
            .find(|c| c.as_str() == upper)
            .with_context(|| {
                let names: Vec<&str> = CATEGORIES.iter().map(|c| c.as_str()).collect();
                format!(
                    "Invalid category '{s}'. Must be one of: {}",
                    names.join(", ")
                )
            })
    }
}

/// A stored calorie entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalorieEntry {
    pub id: i64,
    pub calories: f64,
    pub category: Category,
    pub description: String,
    pub date: NaiveDate,
}

impl CalorieEntry {
    #[must_use]
    pub fn from_input(id: i64, input: EntryInput) -> Self {
        Self {
            id,
            calories: input.calories,
            category: input.category,
            description: input.description,
            date: input.date.unwrap_or_else(today),
        }
    }
}

/// A calorie entry before the store has assigned an id.
///
/// `amount` is accepted as an older name for `calories`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryInput {
    #[serde(alias = "amount")]
    pub calories: f64,
    pub category: Category,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl From<CalorieEntry> for EntryInput {
    fn from(entry: CalorieEntry) -> Self {
        Self {
            calories: entry.calories,
            category: entry.category,
            description: entry.description,
            date: Some(entry.date),
        }
    }
}

/// Earliest and latest years whose dates format as four-digit `YYYY-MM-DD`.
pub const MIN_YEAR: i32 = 0;
pub const MAX_YEAR: i32 = 9999;

/// Current calendar date in local time.
#[must_use]
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Checks done by callers before handing an entry to the store.
pub fn validate_entry(input: &EntryInput) -> Result<()> {
    validate_calories(input.calories)?;
    if input.description.trim().is_empty() {
        bail!("Description must not be empty.");
    }
    if let Some(date) = input.date {
        validate_date(date)?;
    }
    Ok(())
}

pub fn validate_date(date: NaiveDate) -> Result<()> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
        bail!("Date {date} is out of range. Years must be between {MIN_YEAR} and {MAX_YEAR}.");
    }
    Ok(())
}

pub fn validate_calories(calories: f64) -> Result<()> {
    if !calories.is_finite() || calories <= 0.0 {
        bail!("Calories must be greater than zero.");
    }
    Ok(())
}

/// A calendar month with a zero-based month index (0 = January).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month0: u32,
}

impl Month {
    pub fn new(year: i32, month0: u32) -> Result<Self> {
        if month0 > 11 {
            bail!("Invalid month index {month0}. Must be between 0 and 11");
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            bail!("Year {year} is out of range. Must be between {MIN_YEAR} and {MAX_YEAR}");
        }
        Ok(Self { year, month0 })
    }

    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month0: date.month0(),
        }
    }

    #[must_use]
    pub fn current() -> Self {
        Self::containing(today())
    }

    #[must_use]
    pub fn year(self) -> i32 {
        self.year
    }

    #[must_use]
    pub fn month0(self) -> u32 {
        self.month0
    }

    #[must_use]
    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month0 + 1, 1)
            .unwrap_or(NaiveDate::MAX)
    }

    #[must_use]
    pub fn next(self) -> Self {
        if self.month0 == 11 {
            Self {
                year: self.year + 1,
                month0: 0,
            }
        } else {
            Self {
                year: self.year,
                month0: self.month0 + 1,
            }
        }
    }

    /// Last day of the month. The first day of the next month is never part
    /// of this one, including December 9999.
    #[must_use]
    pub fn last_day(self) -> NaiveDate {
        self.next()
            .first_day()
            .pred_opt()
            .unwrap_or(NaiveDate::MAX)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month0 + 1)
    }
}

impl FromStr for Month {
    type Err = anyhow::Error;

    /// Parses `YYYY-MM` with a one-based month.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || format!("Invalid month '{s}'. Use YYYY-MM");
        let (year, month) = s.trim().split_once('-').with_context(invalid)?;
        let year: i32 = year.parse().with_context(invalid)?;
        let month: u32 = month.parse().with_context(invalid)?;
        if !(1..=12).contains(&month) {
            bail!("{}", invalid());
        }
        Self::new(year, month - 1)
    }
}

/// Calories summed over one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub calories: f64,
    pub entries: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub calories: f64,
    pub entries: usize,
}

/// Per-day and per-category totals for one month of entries.
#[derive(Debug, Clone, Serialize)]
pub struct MonthSummary {
    pub month: String,
    pub days: Vec<DailyTotal>,
    pub categories: Vec<CategoryTotal>,
    pub total_calories: f64,
}
