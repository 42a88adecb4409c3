// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;

use crate::errors::{LedgerError, Result};

/// Parse a `YYYY-MM` month key.
pub fn parse_month(s: &str) -> Result<(i32, u32)> {
    let parts: Vec<&str> = s.split('-').collect();
    if parts.len() == 2 && parts[0].len() == 4 && parts[1].len() == 2 {
        if let (Ok(y), Ok(m)) = (parts[0].parse::<i32>(), parts[1].parse::<u32>()) {
            if (1..=12).contains(&m) {
                return Ok((y, m));
            }
        }
    }
    Err(LedgerError::validation(format!(
        "invalid month '{}', expected YYYY-MM",
        s
    )))
}

fn month_key(year: i32, month: u32) -> String {
    format!("{:04}-{:02}", year, month)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
                29
            } else {
                28
            }
        }
        _ => unreachable!("month out of range"),
    }
}

/// Scheduled day clamped to the month's actual length. Day 31 over February
/// lands on the last day of February, never the next month.
fn clamped_date(year: i32, month: u32, day: u32) -> NaiveDate {
    let day = day.min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).expect("clamped day is always valid")
}

/// One dated occurrence per month in the inclusive `[start, end]` range.
pub fn expand(start_month: &str, end_month: &str, scheduled_day: u32) -> Result<Vec<NaiveDate>> {
    if !(1..=31).contains(&scheduled_day) {
        return Err(LedgerError::validation(
            "scheduled day must be between 1 and 31",
        ));
    }
    let (start_y, start_m) = parse_month(start_month)?;
    let (end_y, end_m) = parse_month(end_month)?;
    if (start_y, start_m) > (end_y, end_m) {
        return Err(LedgerError::validation(format!(
            "start month {} is after end month {}",
            month_key(start_y, start_m),
            month_key(end_y, end_m)
        )));
    }

    let mut dates = Vec::new();
    let (mut y, mut m) = (start_y, start_m);
    loop {
        dates.push(clamped_date(y, m, scheduled_day));
        if (y, m) == (end_y, end_m) {
            break;
        }
        m += 1;
        if m > 12 {
            m = 1;
            y += 1;
        }
    }
    Ok(dates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_31_clamps_to_short_months() {
        let dates = expand("2025-01", "2025-03", 31).unwrap();
        let expected: Vec<NaiveDate> = ["2025-01-31", "2025-02-28", "2025-03-31"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        assert_eq!(dates, expected);
    }

    #[test]
    fn leap_february_keeps_day_29() {
        let dates = expand("2024-02", "2024-02", 31).unwrap();
        assert_eq!(dates, vec!["2024-02-29".parse::<NaiveDate>().unwrap()]);
    }

    #[test]
    fn range_spans_year_boundary() {
        let dates = expand("2024-11", "2025-02", 15).unwrap();
        let expected: Vec<NaiveDate> =
            ["2024-11-15", "2024-12-15", "2025-01-15", "2025-02-15"]
                .iter()
                .map(|s| s.parse().unwrap())
                .collect();
        assert_eq!(dates, expected);
    }

    #[test]
    fn single_month_range_yields_one_date() {
        let dates = expand("2025-06", "2025-06", 1).unwrap();
        assert_eq!(dates, vec!["2025-06-01".parse::<NaiveDate>().unwrap()]);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = expand("2025-04", "2025-02", 10).unwrap_err();
        assert!(err.to_string().contains("after end month"));
    }

    #[test]
    fn day_zero_and_day_32_are_rejected() {
        assert!(expand("2025-01", "2025-02", 0).is_err());
        assert!(expand("2025-01", "2025-02", 32).is_err());
    }

    #[test]
    fn malformed_month_is_rejected() {
        assert!(expand("2025-13", "2025-12", 1).is_err());
        assert!(expand("2025/01", "2025-02", 1).is_err());
        assert!(expand("2025-1", "2025-02", 1).is_err());
    }
}
