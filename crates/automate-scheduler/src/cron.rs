//! A 5-field cron expression evaluator: `minute hour day-of-month month
//! day-of-week` (`day-of-week`: 0-6, 0 = Sunday).

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};

use crate::error::{Result, SchedulerError};

/// Upper bound on how many minutes `next_after` will step forward before
/// giving up and falling back to `t + 24h` (~527,000 minutes, ~366 days).
const SEARCH_BOUND_MINUTES: i64 = 527_040;

#[derive(Debug, Clone)]
pub struct CronSchedule {
    minutes: BTreeSet<u32>,
    hours: BTreeSet<u32>,
    doms: BTreeSet<u32>,
    months: BTreeSet<u32>,
    dows: BTreeSet<u32>,
}

impl CronSchedule {
    pub fn parse(expression: &str) -> Result<CronSchedule> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(SchedulerError::Validation(format!(
                "cron expression must have exactly 5 fields, got {}: {expression:?}",
                fields.len()
            )));
        }

        Ok(CronSchedule {
            minutes: parse_field(fields[0], 0, 59)?,
            hours: parse_field(fields[1], 0, 23)?,
            doms: parse_field(fields[2], 1, 31)?,
            months: parse_field(fields[3], 1, 12)?,
            dows: parse_field(fields[4], 0, 6)?,
        })
    }

    /// The first instant strictly after `from` matching this schedule.
    /// Falls back to `from + 24h` if nothing matches within the search
    /// bound.
    pub fn next_after(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        let mut cursor = from
            .with_second(0)
            .and_then(|d| d.with_nanosecond(0))
            .unwrap_or(from)
            + Duration::minutes(1);

        for _ in 0..SEARCH_BOUND_MINUTES {
            if self.matches(&cursor) {
                return cursor;
            }
            cursor += Duration::minutes(1);
        }

        from + Duration::hours(24)
    }

    fn matches(&self, instant: &DateTime<Utc>) -> bool {
        let dow = instant.weekday().num_days_from_sunday();
        self.months.contains(&instant.month())
            && self.doms.contains(&instant.day())
            && self.dows.contains(&dow)
            && self.hours.contains(&instant.hour())
            && self.minutes.contains(&instant.minute())
    }
}

fn parse_field(field: &str, min: u32, max: u32) -> Result<BTreeSet<u32>> {
    let mut values = BTreeSet::new();
    for term in field.split(',') {
        values.extend(parse_term(term, min, max)?);
    }
    if values.is_empty() {
        return Err(SchedulerError::Validation(format!("empty cron field: {field:?}")));
    }
    Ok(values)
}

fn parse_term(term: &str, min: u32, max: u32) -> Result<Vec<u32>> {
    let (range_part, step) = match term.split_once('/') {
        Some((range, step)) => {
            let step: u32 = step
                .parse()
                .map_err(|_| SchedulerError::Validation(format!("invalid step in cron field: {term:?}")))?;
            if step == 0 {
                return Err(SchedulerError::Validation(format!("step must be > 0: {term:?}")));
            }
            (range, step)
        }
        None => (term, 1),
    };

    let (lo, hi) = if range_part == "*" {
        (min, max)
    } else if let Some((a, b)) = range_part.split_once('-') {
        let a: u32 = a
            .parse()
            .map_err(|_| SchedulerError::Validation(format!("invalid range start: {term:?}")))?;
        let b: u32 = b
            .parse()
            .map_err(|_| SchedulerError::Validation(format!("invalid range end: {term:?}")))?;
        if a > b {
            return Err(SchedulerError::Validation(format!(
                "invalid cron range (wrap-around not supported): {term:?}"
            )));
        }
        (a, b)
    } else {
        let v: u32 = range_part
            .parse()
            .map_err(|_| SchedulerError::Validation(format!("invalid cron value: {term:?}")))?;
        (v, v)
    };

    if lo < min || hi > max {
        return Err(SchedulerError::Validation(format!(
            "cron field value out of range [{min}, {max}]: {term:?}"
        )));
    }

    Ok((lo..=hi).step_by(step as usize).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn minute_step_computes_next_run() {
        let schedule = CronSchedule::parse("*/30 * * * *").unwrap();
        let next = schedule.next_after(at("2024-01-15T10:05:00Z"));
        assert_eq!(next, at("2024-01-15T10:30:00Z"));

        let after_fire = schedule.next_after(next);
        assert_eq!(after_fire, at("2024-01-15T11:00:00Z"));
    }

    #[test]
    fn every_minute_field_matches_any_minute() {
        let schedule = CronSchedule::parse("* * * * *").unwrap();
        let next = schedule.next_after(at("2024-01-15T10:05:30Z"));
        assert_eq!(next, at("2024-01-15T10:06:00Z"));
    }

    #[test]
    fn next_run_is_always_strictly_after_t_and_in_expanded_sets() {
        let schedule = CronSchedule::parse("0 9 * * 1-5").unwrap();
        let from = at("2024-06-01T09:00:00Z"); // a Saturday
        let next = schedule.next_after(from);
        assert!(next > from);
        let dow = next.weekday().num_days_from_sunday();
        assert!((1..=5).contains(&dow));
        assert_eq!(next.hour(), 9);
        assert_eq!(next.minute(), 0);
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert!(CronSchedule::parse("* * * *").is_err());
    }

    #[test]
    fn rejects_wrap_around_range() {
        assert!(CronSchedule::parse("0 22-2/2 * * *").is_err());
    }

    #[test]
    fn rejects_out_of_range_value() {
        assert!(CronSchedule::parse("60 * * * *").is_err());
    }

    #[test]
    fn day_of_week_filters_correctly() {
        let schedule = CronSchedule::parse("0 9 * * 0").unwrap(); // Sundays only
        let next = schedule.next_after(at("2024-01-01T00:00:00Z")); // a Monday
        assert_eq!(next.weekday().num_days_from_sunday(), 0);
    }

    #[test]
    fn comma_list_accepts_multiple_values() {
        let schedule = CronSchedule::parse("0,15,45 * * * *").unwrap();
        let next = schedule.next_after(at("2024-01-15T10:01:00Z"));
        assert_eq!(next, at("2024-01-15T10:15:00Z"));
    }
}
