use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// Day of week used for provider availability grids and contact-pattern tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const fn label(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Saturday => "saturday",
            DayOfWeek::Sunday => "sunday",
        }
    }

    pub fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

/// Coarse day segments used when bucketing a client's contact timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayPart {
    Morning,
    Afternoon,
    Evening,
}

impl DayPart {
    /// Morning before noon, afternoon until 17:00, evening after.
    pub const fn from_hour(hour: u32) -> Self {
        if hour < 12 {
            DayPart::Morning
        } else if hour < 17 {
            DayPart::Afternoon
        } else {
            DayPart::Evening
        }
    }
}

/// A single bookable window within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub from: NaiveTime,
    pub to: NaiveTime,
}

impl TimeSlot {
    fn minutes(time: NaiveTime) -> i64 {
        i64::from(time.hour()) * 60 + i64::from(time.minute())
    }

    pub fn duration_minutes(&self) -> i64 {
        Self::minutes(self.to) - Self::minutes(self.from)
    }

    /// Half-open interval test: [a, b) and [c, d) overlap iff a < d and b > c.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        Self::minutes(self.from) < Self::minutes(other.to)
            && Self::minutes(self.to) > Self::minutes(other.from)
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        self.from <= time && time <= self.to
    }
}

/// One weekday's worth of availability windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub day: DayOfWeek,
    pub time_slots: Vec<TimeSlot>,
}

/// Monday-aligned start of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - chrono::Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// ISO week number within the year.
pub fn week_number(date: NaiveDate) -> u32 {
    date.iso_week().week()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
    }

    #[test]
    fn week_start_aligns_to_monday() {
        let sunday = NaiveDate::from_ymd_opt(2025, 9, 28).expect("valid date");
        let monday = NaiveDate::from_ymd_opt(2025, 9, 22).expect("valid date");
        assert_eq!(week_start(sunday), monday);
        assert_eq!(week_start(monday), monday);
    }

    #[test]
    fn slots_overlap_on_shared_minutes_only() {
        let morning = TimeSlot {
            from: time(8, 0),
            to: time(12, 0),
        };
        let late_morning = TimeSlot {
            from: time(11, 0),
            to: time(14, 0),
        };
        let afternoon = TimeSlot {
            from: time(12, 0),
            to: time(16, 0),
        };

        assert!(morning.overlaps(&late_morning));
        assert!(!morning.overlaps(&afternoon), "touching edges do not overlap");
    }

    #[test]
    fn day_part_buckets_follow_hour_boundaries() {
        assert_eq!(DayPart::from_hour(9), DayPart::Morning);
        assert_eq!(DayPart::from_hour(12), DayPart::Afternoon);
        assert_eq!(DayPart::from_hour(17), DayPart::Evening);
    }
}
