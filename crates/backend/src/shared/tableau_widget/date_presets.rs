use chrono::{Datelike, Duration, NaiveDate};
use contracts::shared::tableau_widget::DatePreset;

/// Inclusive day range; a missing bound is open on that side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |f| date >= f) && self.to.map_or(true, |t| date <= t)
    }
}

/// Resolve a preset against the given day; `Custom` has no range of its own
pub fn resolve_date_preset(preset: DatePreset, today: NaiveDate) -> Option<DateRange> {
    match preset {
        DatePreset::Today => Some(DateRange::between(today, today)),
        DatePreset::Yesterday => {
            let date = today - Duration::days(1);
            Some(DateRange::between(date, date))
        }
        DatePreset::ThisWeek => {
            let start = start_of_week(today);
            Some(DateRange::between(start, start + Duration::days(6)))
        }
        DatePreset::LastWeek => {
            let start = start_of_week(today) - Duration::days(7);
            Some(DateRange::between(start, start + Duration::days(6)))
        }
        DatePreset::ThisMonth => month_range(today.year(), today.month()),
        DatePreset::LastMonth => {
            let (year, month) = if today.month() == 1 {
                (today.year() - 1, 12)
            } else {
                (today.year(), today.month() - 1)
            };
            month_range(year, month)
        }
        DatePreset::ThisQuarter => quarter_range(today.year(), quarter_start_month(today)),
        DatePreset::LastQuarter => {
            let current = quarter_start_month(today);
            if current == 1 {
                quarter_range(today.year() - 1, 10)
            } else {
                quarter_range(today.year(), current - 3)
            }
        }
        DatePreset::ThisYear => year_range(today.year()),
        DatePreset::LastYear => year_range(today.year() - 1),
        DatePreset::Last7Days => Some(DateRange::between(today - Duration::days(6), today)),
        DatePreset::Last30Days => Some(DateRange::between(today - Duration::days(29), today)),
        DatePreset::Custom => None,
    }
}

/// Get start of week (Monday) for a given date
fn start_of_week(date: NaiveDate) -> NaiveDate {
    let days_from_monday = date.weekday().num_days_from_monday();
    date - Duration::days(days_from_monday as i64)
}

fn quarter_start_month(date: NaiveDate) -> u32 {
    ((date.month() - 1) / 3) * 3 + 1
}

/// First day of the month after (year, month)
fn next_month_start(year: i32, month: u32) -> Option<NaiveDate> {
    if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
}

fn month_range(year: i32, month: u32) -> Option<DateRange> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let end = next_month_start(year, month)? - Duration::days(1);
    Some(DateRange::between(start, end))
}

fn quarter_range(year: i32, start_month: u32) -> Option<DateRange> {
    let start = NaiveDate::from_ymd_opt(year, start_month, 1)?;
    let end = next_month_start(year, start_month + 2)? - Duration::days(1);
    Some(DateRange::between(start, end))
}

fn year_range(year: i32) -> Option<DateRange> {
    Some(DateRange::between(
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year, 12, 31)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_day_presets() {
        let today = d(2024, 3, 1);
        assert_eq!(
            resolve_date_preset(DatePreset::Today, today),
            Some(DateRange::between(today, today))
        );
        assert_eq!(
            resolve_date_preset(DatePreset::Yesterday, today),
            Some(DateRange::between(d(2024, 2, 29), d(2024, 2, 29)))
        );
        assert_eq!(
            resolve_date_preset(DatePreset::Last7Days, today),
            Some(DateRange::between(d(2024, 2, 24), today))
        );
    }

    #[test]
    fn test_week_starts_on_monday() {
        // 2024-03-14 is a Thursday
        let range = resolve_date_preset(DatePreset::ThisWeek, d(2024, 3, 14)).unwrap();
        assert_eq!(range, DateRange::between(d(2024, 3, 11), d(2024, 3, 17)));
        let last = resolve_date_preset(DatePreset::LastWeek, d(2024, 3, 14)).unwrap();
        assert_eq!(last, DateRange::between(d(2024, 3, 4), d(2024, 3, 10)));
    }

    #[test]
    fn test_month_and_quarter_boundaries() {
        assert_eq!(
            resolve_date_preset(DatePreset::ThisMonth, d(2024, 12, 5)),
            Some(DateRange::between(d(2024, 12, 1), d(2024, 12, 31)))
        );
        assert_eq!(
            resolve_date_preset(DatePreset::LastMonth, d(2024, 1, 15)),
            Some(DateRange::between(d(2023, 12, 1), d(2023, 12, 31)))
        );
        assert_eq!(
            resolve_date_preset(DatePreset::ThisQuarter, d(2024, 11, 2)),
            Some(DateRange::between(d(2024, 10, 1), d(2024, 12, 31)))
        );
        assert_eq!(
            resolve_date_preset(DatePreset::LastQuarter, d(2024, 2, 2)),
            Some(DateRange::between(d(2023, 10, 1), d(2023, 12, 31)))
        );
        assert_eq!(
            resolve_date_preset(DatePreset::LastYear, d(2024, 6, 1)),
            Some(DateRange::between(d(2023, 1, 1), d(2023, 12, 31)))
        );
        assert_eq!(resolve_date_preset(DatePreset::Custom, d(2024, 6, 1)), None);
    }

    #[test]
    fn test_range_is_inclusive() {
        let range = DateRange::between(d(2024, 1, 1), d(2024, 1, 31));
        assert!(range.contains(d(2024, 1, 1)));
        assert!(range.contains(d(2024, 1, 31)));
        assert!(!range.contains(d(2024, 2, 1)));
        let open = DateRange { from: None, to: Some(d(2024, 1, 1)) };
        assert!(open.contains(d(1999, 1, 1)));
    }
}
