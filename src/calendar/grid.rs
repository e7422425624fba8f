use std::collections::BTreeMap;

use anyhow::Context;
use serde::Serialize;
use time::macros::format_description;
use time::{Date, Duration, Month};

use crate::store::Task;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    /// ISO date string, e.g. "2026-09-01" — the same shape tasks carry in
    /// `due_date`.
    pub date: String,
    pub day: u8,
    /// False for overflow days borrowed from the adjacent months.
    pub in_month: bool,
}

#[derive(Debug, Serialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u8,
    /// Monday-start weeks covering the whole month, including overflow days.
    pub weeks: Vec<Vec<CalendarDay>>,
    /// Every task with a due date, keyed by that literal due-date string.
    pub tasks_by_date: BTreeMap<String, Vec<Task>>,
    pub prev: (i32, u8),
    pub next: (i32, u8),
}

fn iso_date(date: Date) -> anyhow::Result<String> {
    Ok(date.format(format_description!("[year]-[month]-[day]"))?)
}

/// Month arithmetic wrapping December↔January across year boundaries.
pub fn prev_month(year: i32, month: u8) -> (i32, u8) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

pub fn next_month(year: i32, month: u8) -> (i32, u8) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// Builds the calendar grid for one month and buckets the given tasks by
/// their due-date strings. Errors on a month outside 1..=12 or a year the
/// calendar cannot represent.
pub fn month_view(year: i32, month: u8, tasks: &[Task]) -> anyhow::Result<MonthView> {
    let month_enum = Month::try_from(month).context("month must be between 1 and 12")?;
    let first = Date::from_calendar_date(year, month_enum, 1).context("invalid year")?;
    let last = first
        .replace_day(time::util::days_in_year_month(year, month_enum))
        .context("invalid month end")?;

    let grid_start = first
        .checked_sub(Duration::days(first.weekday().number_days_from_monday() as i64))
        .context("calendar range underflow")?;
    let grid_end = last
        .checked_add(Duration::days(6 - last.weekday().number_days_from_monday() as i64))
        .context("calendar range overflow")?;

    let mut weeks = Vec::new();
    let mut week = Vec::with_capacity(7);
    let mut day = grid_start;
    while day <= grid_end {
        week.push(CalendarDay {
            date: iso_date(day)?,
            day: day.day(),
            in_month: day.year() == year && day.month() == month_enum,
        });
        if week.len() == 7 {
            weeks.push(std::mem::take(&mut week));
        }
        day = day.next_day().context("calendar range overflow")?;
    }

    let mut tasks_by_date: BTreeMap<String, Vec<Task>> = BTreeMap::new();
    for task in tasks {
        if let Some(due) = &task.due_date {
            tasks_by_date.entry(due.clone()).or_default().push(task.clone());
        }
    }

    Ok(MonthView {
        year,
        month,
        weeks,
        tasks_by_date,
        prev: prev_month(year, month),
        next: next_month(year, month),
    })
}
