//! Parameters typed inline after a slash command, e.g.
//! `/report protocol=MK1 last_month`.
//!
//! Two token kinds are understood: `key=value` pairs and date range
//! shortcuts (`this_month`, `last_month`, `this_year`, `last_year`,
//! `q1`..`q4`) which expand to `start_date`/`end_date`. An explicit
//! `start_date=`/`end_date=` always beats a shortcut.

use chrono::{Datelike, Months, NaiveDate};
use indexmap::IndexMap;

use super::validation::{FieldValue, FormValues};
use super::{FieldType, WorkflowFormField};

pub const START_DATE_KEY: &str = "start_date";
pub const END_DATE_KEY: &str = "end_date";

/// Input spellings accepted for dates, tried in order. Month-first wins
/// when a value is ambiguous.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d", "%m-%d-%Y", "%d-%m-%Y"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineArguments {
    /// Lowercased key to value.
    pub values: IndexMap<String, String>,
    /// Tokens that were neither a pair nor a shortcut.
    pub unrecognized: Vec<String>,
}

impl InlineArguments {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.unrecognized.is_empty()
    }
}

/// Split the text after a slash command into arguments. `today` anchors the
/// relative date shortcuts; when several shortcuts appear the last one wins.
pub fn parse_inline_arguments(text: &str, today: NaiveDate) -> InlineArguments {
    let mut range = None;
    let mut explicit = IndexMap::new();
    let mut unrecognized = Vec::new();

    for token in text.split_whitespace() {
        match token.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                explicit.insert(key.trim().to_lowercase(), value.trim().to_string());
            }
            Some(_) => unrecognized.push(token.to_string()),
            None => match date_shortcut(&token.to_lowercase(), today) {
                Some(found) => range = Some(found),
                None => unrecognized.push(token.to_string()),
            },
        }
    }

    let mut values = IndexMap::new();
    if let Some((start, end)) = range {
        values.insert(START_DATE_KEY.to_string(), iso_date(start));
        values.insert(END_DATE_KEY.to_string(), iso_date(end));
    }
    values.extend(explicit);
    InlineArguments { values, unrecognized }
}

/// Rewrite a recognizable date as `YYYY-MM-DD`; anything else comes back
/// trimmed but otherwise untouched.
pub fn normalize_date(text: &str) -> String {
    let trimmed = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .map(iso_date)
        .unwrap_or_else(|| trimmed.to_string())
}

/// Pre-fill form values from inline arguments.
///
/// Keys match field names case-insensitively. Date values are normalized,
/// select values must name one of the options. Returns the keys that were
/// not applied: unknown fields, file fields and invalid options.
pub fn apply_inline_arguments(fields: &[WorkflowFormField], values: &mut FormValues, arguments: &InlineArguments) -> Vec<String> {
    let mut skipped = Vec::new();
    for (key, raw) in &arguments.values {
        let applied = fields
            .iter()
            .find(|field| field.name.eq_ignore_ascii_case(key))
            .and_then(|field| Some((field, inline_value(field, raw)?)));
        match applied {
            Some((field, text)) => {
                values.insert(field.name.clone(), FieldValue::Text(text));
            }
            None => skipped.push(key.clone()),
        }
    }
    skipped
}

fn inline_value(field: &WorkflowFormField, raw: &str) -> Option<String> {
    match field.field_type {
        FieldType::File => None,
        FieldType::Date => Some(normalize_date(raw)),
        FieldType::Select if !field.options.is_empty() => {
            field.options.iter().find(|option| option.eq_ignore_ascii_case(raw.trim())).cloned()
        }
        _ => Some(raw.to_string()),
    }
}

fn date_shortcut(token: &str, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let year = today.year();
    match token {
        "this_month" => month_range(today.with_day(1)?),
        "last_month" => month_range(today.with_day(1)?.checked_sub_months(Months::new(1))?),
        "this_year" => year_range(year),
        "last_year" => year_range(year - 1),
        _ => {
            let quarter = token.strip_prefix('q')?.parse::<u32>().ok().filter(|quarter| (1..=4).contains(quarter))?;
            let start = NaiveDate::from_ymd_opt(year, (quarter - 1) * 3 + 1, 1)?;
            Some((start, start.checked_add_months(Months::new(3))?.pred_opt()?))
        }
    }
}

fn month_range(first: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    Some((first, first.checked_add_months(Months::new(1))?.pred_opt()?))
}

fn year_range(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((NaiveDate::from_ymd_opt(year, 1, 1)?, NaiveDate::from_ymd_opt(year, 12, 31)?))
}

fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
