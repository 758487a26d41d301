use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const DEFAULT_HOURS_PER_DAY: f64 = 8.0;

/// Work-time model for the scheduler: which weekdays count as working days,
/// which specific dates are holidays, and how many working hours make up one
/// working day. Read-only after construction; customization goes through
/// [`WorkCalendarConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCalendar {
    name: String,
    holidays: HashSet<NaiveDate>,
    non_working_days: HashSet<Weekday>,
    hours_per_day: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCalendarConfig {
    #[serde(default = "default_calendar_name")]
    name: String,
    working_days: Vec<Weekday>,
    #[serde(default)]
    holidays: Vec<NaiveDate>,
    #[serde(default = "default_hours_per_day")]
    hours_per_day: f64,
}

fn default_calendar_name() -> String {
    "Standard".to_string()
}

fn default_hours_per_day() -> f64 {
    DEFAULT_HOURS_PER_DAY
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self {
            name: default_calendar_name(),
            holidays: HashSet::new(),
            non_working_days: HashSet::from([Weekday::Sat, Weekday::Sun]),
            hours_per_day: DEFAULT_HOURS_PER_DAY,
        }
    }
}

impl WorkCalendar {
    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    pub fn custom<I, J>(name: impl Into<String>, working_days: I, holidays: J, hours_per_day: f64) -> Self
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let config = WorkCalendarConfig::new(name, working_days, holidays, hours_per_day);
        Self::from_config(&config)
    }

    pub fn from_config(config: &WorkCalendarConfig) -> Self {
        let working_set: HashSet<Weekday> = config.working_days.iter().copied().collect();
        if working_set.is_empty() {
            panic!("WorkCalendar requires at least one working day");
        }
        if !(config.hours_per_day > 0.0) {
            panic!("WorkCalendar requires a positive hours_per_day");
        }
        let mut non_working_days = HashSet::new();
        for day in Self::ALL_WEEKDAYS {
            if !working_set.contains(&day) {
                non_working_days.insert(day);
            }
        }

        Self {
            name: config.name.clone(),
            holidays: config.holidays.iter().copied().collect(),
            non_working_days,
            hours_per_day: config.hours_per_day,
        }
    }

    /// Standard Mon-Fri business calendar pre-loaded with US federal holidays
    /// for a range of years (inclusive).
    pub fn with_us_holidays(start_year: i32, end_year: i32) -> Self {
        let (start, end) = if start_year <= end_year {
            (start_year, end_year)
        } else {
            (end_year, start_year)
        };

        let mut holidays = HashSet::new();
        for year in start..=end {
            Self::collect_us_holidays(year, &mut holidays);
        }

        Self {
            name: "US Business".to_string(),
            holidays,
            non_working_days: HashSet::from([Weekday::Sat, Weekday::Sun]),
            hours_per_day: DEFAULT_HOURS_PER_DAY,
        }
    }

    pub fn to_config(&self) -> WorkCalendarConfig {
        WorkCalendarConfig::from(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hours_per_day(&self) -> f64 {
        self.hours_per_day
    }

    /// US federal holidays on their actual calendar dates; no observed-day
    /// shifting when one lands on a weekend.
    fn collect_us_holidays(year: i32, holidays: &mut HashSet<NaiveDate>) {
        // New Year's Day, Independence Day, Veterans Day, Christmas
        for (month, day) in [(1, 1), (7, 4), (11, 11), (12, 25)] {
            holidays.insert(NaiveDate::from_ymd_opt(year, month, day).unwrap());
        }

        holidays.insert(Self::nth_weekday(year, 1, Weekday::Mon, 3)); // MLK Day
        holidays.insert(Self::nth_weekday(year, 2, Weekday::Mon, 3)); // Presidents' Day
        holidays.insert(Self::last_weekday(year, 5, Weekday::Mon)); // Memorial Day
        holidays.insert(Self::nth_weekday(year, 9, Weekday::Mon, 1)); // Labor Day
        holidays.insert(Self::nth_weekday(year, 10, Weekday::Mon, 2)); // Columbus Day
        holidays.insert(Self::nth_weekday(year, 11, Weekday::Thu, 4)); // Thanksgiving
    }

    /// The `n`th `weekday` of a month. Only called with n <= 4, which every
    /// month has.
    fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u32) -> NaiveDate {
        let mut date = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
        let mut seen = 0;

        while date.month() == month {
            if date.weekday() == weekday {
                seen += 1;
                if seen == n {
                    return date;
                }
            }
            date = date + Duration::days(1);
        }
        panic!("month {year}-{month:02} has no {n} occurrences of {weekday}");
    }

    /// The last `weekday` of a month, found by scanning back from the
    /// month's final day.
    fn last_weekday(year: i32, month: u32, weekday: Weekday) -> NaiveDate {
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1).unwrap()
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1).unwrap()
        };

        let mut date = next_month - Duration::days(1);
        while date.weekday() != weekday {
            date = date - Duration::days(1);
        }
        date
    }

    /// Check whether a date counts as a working day: its weekday must be a
    /// working day and the date must not be a holiday.
    pub fn is_workday(&self, date: NaiveDate) -> bool {
        !self.holidays.contains(&date) && !self.non_working_days.contains(&date.weekday())
    }

    /// The date itself when it is a working day, otherwise the first working
    /// day after it.
    pub fn next_workday(&self, date: NaiveDate) -> NaiveDate {
        let mut current = date;
        while !self.is_workday(current) {
            current = current + Duration::days(1);
        }
        current
    }

    /// Walk forward from the day after `start`, counting only working days,
    /// until `n` have been counted. `n == 0` returns `start` unchanged.
    pub fn add_workdays(&self, start: NaiveDate, n: i64) -> NaiveDate {
        let mut current = start;
        let mut count = 0;

        while count < n {
            current = current + Duration::days(1);
            if self.is_workday(current) {
                count += 1;
            }
        }
        current
    }

    /// Mirror of [`add_workdays`](Self::add_workdays) walking backward; used
    /// for negative dependency lag.
    pub fn subtract_workdays(&self, start: NaiveDate, n: i64) -> NaiveDate {
        let mut current = start;
        let mut count = 0;

        while count < n {
            current = current - Duration::days(1);
            if self.is_workday(current) {
                count += 1;
            }
        }
        current
    }

    /// Count working days strictly after `start` up to and including `end`.
    /// Returns 0 when `end <= start`.
    pub fn workdays_between(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        if end <= start {
            return 0;
        }
        let mut count = 0;
        let mut current = start + Duration::days(1);
        while current <= end {
            if self.is_workday(current) {
                count += 1;
            }
            current = current + Duration::days(1);
        }
        count
    }

    /// Convert a work estimate in hours into whole working days, rounding up.
    pub fn hours_to_days(&self, hours: f64) -> i64 {
        (hours / self.hours_per_day).ceil() as i64
    }

    pub fn days_to_hours(&self, days: i64) -> f64 {
        days as f64 * self.hours_per_day
    }
}

impl WorkCalendarConfig {
    pub fn new<I, J>(name: impl Into<String>, working_days: I, holidays: J, hours_per_day: f64) -> Self
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let mut working: Vec<Weekday> = working_days.into_iter().collect();
        if working.is_empty() {
            panic!("WorkCalendarConfig requires at least one working day");
        }
        working.sort_by_key(|wd| wd.num_days_from_monday());
        working.dedup_by(|a, b| a.num_days_from_monday() == b.num_days_from_monday());

        let mut holidays: Vec<NaiveDate> = holidays.into_iter().collect();
        holidays.sort();
        holidays.dedup();

        Self {
            name: name.into(),
            working_days: working,
            holidays,
            hours_per_day,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn working_days(&self) -> &[Weekday] {
        &self.working_days
    }

    pub fn holidays(&self) -> &[NaiveDate] {
        &self.holidays
    }

    pub fn hours_per_day(&self) -> f64 {
        self.hours_per_day
    }
}

impl Default for WorkCalendarConfig {
    fn default() -> Self {
        WorkCalendarConfig::from(&WorkCalendar::default())
    }
}

impl From<&WorkCalendar> for WorkCalendarConfig {
    fn from(calendar: &WorkCalendar) -> Self {
        let mut working = Vec::new();
        for day in WorkCalendar::ALL_WEEKDAYS {
            if !calendar.non_working_days.contains(&day) {
                working.push(day);
            }
        }
        working.sort_by_key(|wd| wd.num_days_from_monday());

        let mut holidays: Vec<NaiveDate> = calendar.holidays.iter().copied().collect();
        holidays.sort();

        Self {
            name: calendar.name.clone(),
            working_days: working,
            holidays,
            hours_per_day: calendar.hours_per_day,
        }
    }
}
