//! Разбор и форматирование дат по шаблонам strftime.

use crate::error::{Error, Result};
use chrono::format::{self, Item, ParseResult, Parsed, StrftimeItems};
use chrono::NaiveDateTime;
use std::fmt::Write;

/// Год по умолчанию, если шаблон его не задает.
const DEFAULT_YEAR: i64 = 1900;

/// Проверяет, что шаблон не содержит неизвестных спецификаторов.
pub fn is_valid_pattern(pattern: &str) -> bool {
    !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

/// Разбирает строку по шаблону.
///
/// Недостающие части заполняются как у strptime: год 1900, месяц и день 1,
/// время 00:00:00.
pub fn parse_date(s: &str, pattern: &str) -> Option<NaiveDateTime> {
    let mut parsed = Parsed::default();
    format::parse(&mut parsed, s, StrftimeItems::new(pattern)).ok()?;

    if parsed.timestamp.is_some() {
        return parsed.to_naive_datetime_with_offset(0).ok();
    }

    fill_defaults(&mut parsed).ok()?;
    let date = parsed.to_naive_date().ok()?;
    let time = parsed.to_naive_time().ok()?;
    Some(date.and_time(time))
}

fn fill_defaults(parsed: &mut Parsed) -> ParseResult<()> {
    let has_year = parsed.year.is_some()
        || parsed.year_div_100.is_some()
        || parsed.year_mod_100.is_some()
        || parsed.isoyear.is_some()
        || parsed.isoyear_div_100.is_some()
        || parsed.isoyear_mod_100.is_some();
    let has_week = parsed.week_from_sun.is_some()
        || parsed.week_from_mon.is_some()
        || parsed.isoweek.is_some();

    if !has_year {
        parsed.set_year(DEFAULT_YEAR)?;
    }
    if parsed.month.is_none() && parsed.ordinal.is_none() && !has_week {
        parsed.set_month(1)?;
    }
    if parsed.day.is_none() && parsed.ordinal.is_none() && !has_week {
        parsed.set_day(1)?;
    }

    match (parsed.hour_div_12, parsed.hour_mod_12) {
        (None, None) => parsed.set_hour(0)?,
        // %I без %p
        (None, Some(_)) => parsed.set_ampm(false)?,
        // %p без часа
        (Some(_), None) => parsed.set_hour12(12)?,
        (Some(_), Some(_)) => {}
    }
    if parsed.minute.is_none() {
        parsed.set_minute(0)?;
    }

    Ok(())
}

/// Форматирует дату по шаблону.
pub fn format_date(dt: &NaiveDateTime, pattern: &str) -> Result<String> {
    let mut out = String::new();
    write!(out, "{}", dt.format(pattern)).map_err(|_| Error::DateFormat(pattern.to_string()))?;
    Ok(out)
}
