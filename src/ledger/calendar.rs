//! Calendar arithmetic that clamps to the end of shorter months.

use chrono::{Datelike, NaiveDate};

/// Moves `date` by `months` calendar months, clamping the day to the target month's length.
pub fn shift_month(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let index = date.year() * 12 + date.month0() as i32 + months;
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Moves `date` by `years` calendar years; Feb 29 lands on Feb 28 in common years.
pub fn shift_year(date: NaiveDate, years: i32) -> Option<NaiveDate> {
    let year = date.year() + years;
    let day = date.day().min(days_in_month(year, date.month()));
    NaiveDate::from_ymd_opt(year, date.month(), day)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    date.with_day(days_in_month(date.year(), date.month()))
        .unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn shift_month_clamps_to_month_end() {
        assert_eq!(shift_month(ymd(2024, 1, 31), 1), Some(ymd(2024, 2, 29)));
        assert_eq!(shift_month(ymd(2023, 1, 31), 1), Some(ymd(2023, 2, 28)));
        assert_eq!(shift_month(ymd(2024, 3, 31), 1), Some(ymd(2024, 4, 30)));
        assert_eq!(shift_month(ymd(2024, 12, 15), 1), Some(ymd(2025, 1, 15)));
        assert_eq!(shift_month(ymd(2024, 1, 15), -1), Some(ymd(2023, 12, 15)));
    }

    #[test]
    fn shift_year_handles_leap_day() {
        assert_eq!(shift_year(ymd(2024, 2, 29), 1), Some(ymd(2025, 2, 28)));
        assert_eq!(shift_year(ymd(2023, 6, 30), 1), Some(ymd(2024, 6, 30)));
    }

    #[test]
    fn month_bounds() {
        assert_eq!(month_start(ymd(2024, 2, 17)), ymd(2024, 2, 1));
        assert_eq!(month_end(ymd(2024, 2, 17)), ymd(2024, 2, 29));
        assert_eq!(month_end(ymd(2023, 12, 1)), ymd(2023, 12, 31));
        assert_eq!(days_in_month(2100, 2), 28);
    }
}
