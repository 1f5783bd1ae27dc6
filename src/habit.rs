use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ReminderError;

/// A habit as the application shell stores it. Unknown fields in stored
/// blobs (category, icon, streak counters) are ignored on decode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub frequency: Vec<WeekdayToken>,
    #[serde(default)]
    pub reminder_enabled: bool,
    /// Wall-clock time of day, `"HH:MM"`, device-local.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WeekdayToken {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl WeekdayToken {
    pub fn to_chrono(self) -> Weekday {
        match self {
            WeekdayToken::Mon => Weekday::Mon,
            WeekdayToken::Tue => Weekday::Tue,
            WeekdayToken::Wed => Weekday::Wed,
            WeekdayToken::Thu => Weekday::Thu,
            WeekdayToken::Fri => Weekday::Fri,
            WeekdayToken::Sat => Weekday::Sat,
            WeekdayToken::Sun => Weekday::Sun,
        }
    }

    pub fn from_chrono(day: Weekday) -> Self {
        match day {
            Weekday::Mon => WeekdayToken::Mon,
            Weekday::Tue => WeekdayToken::Tue,
            Weekday::Wed => WeekdayToken::Wed,
            Weekday::Thu => WeekdayToken::Thu,
            Weekday::Fri => WeekdayToken::Fri,
            Weekday::Sat => WeekdayToken::Sat,
            Weekday::Sun => WeekdayToken::Sun,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WeekdayToken::Mon => "Mon",
            WeekdayToken::Tue => "Tue",
            WeekdayToken::Wed => "Wed",
            WeekdayToken::Thu => "Thu",
            WeekdayToken::Fri => "Fri",
            WeekdayToken::Sat => "Sat",
            WeekdayToken::Sun => "Sun",
        }
    }
}

/// A validated `"HH:MM"` reminder time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderTime(NaiveTime);

impl ReminderTime {
    /// Malformed input aborts scheduling rather than defaulting.
    pub fn parse(input: &str) -> Result<Self, ReminderError> {
        let Some((hour_part, minute_part)) = input.split_once(':') else {
            return Err(ReminderError::invalid_time(input, "expected HH:MM"));
        };
        let hour: u32 = hour_part
            .trim()
            .parse()
            .map_err(|_| ReminderError::invalid_time(input, "hour is not a number"))?;
        let minute: u32 = minute_part
            .trim()
            .parse()
            .map_err(|_| ReminderError::invalid_time(input, "minute is not a number"))?;
        if hour > 23 {
            return Err(ReminderError::invalid_time(input, "hour out of range"));
        }
        if minute > 59 {
            return Err(ReminderError::invalid_time(input, "minute out of range"));
        }
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Self)
            .ok_or_else(|| ReminderError::invalid_time(input, "not a valid time of day"))
    }

    pub fn time(self) -> NaiveTime {
        self.0
    }

    pub fn minutes_from_midnight(self) -> u32 {
        self.0.hour() * 60 + self.0.minute()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_time() {
        let time = ReminderTime::parse("08:05").expect("valid time");
        assert_eq!(time.minutes_from_midnight(), 8 * 60 + 5);
    }

    #[test]
    fn rejects_malformed_times() {
        for input in ["", "8", "ab:cd", "12:xx", "24:00", "12:60", "-1:30"] {
            let err = ReminderTime::parse(input).expect_err("should reject");
            assert!(matches!(err, ReminderError::InvalidTime { .. }), "{input}");
        }
    }

    #[test]
    fn habit_decodes_host_app_blob_with_extra_fields() {
        let raw = r##"
{
  "id": "habit-42",
  "title": "Morning run",
  "description": "Around the park",
  "category": "fitness",
  "icon": "run",
  "color": "#4CAF50",
  "createdAt": "2024-01-01T00:00:00Z",
  "frequency": ["Mon", "Wed", "Fri"],
  "completedDates": [],
  "currentStreak": 4,
  "reminderEnabled": true,
  "reminderTime": "07:30"
}
"##;
        let habit: Habit = serde_json::from_str(raw).expect("valid habit blob");
        assert_eq!(habit.id, "habit-42");
        assert_eq!(
            habit.frequency,
            vec![WeekdayToken::Mon, WeekdayToken::Wed, WeekdayToken::Fri]
        );
        assert!(habit.reminder_enabled);
        assert_eq!(habit.reminder_time.as_deref(), Some("07:30"));
    }

    #[test]
    fn habit_defaults_reminder_fields_when_absent() {
        let habit: Habit =
            serde_json::from_str(r#"{"id": "h1", "title": "Read"}"#).expect("minimal blob");
        assert!(!habit.reminder_enabled);
        assert!(habit.reminder_time.is_none());
        assert!(habit.frequency.is_empty());
    }

    #[test]
    fn weekday_token_round_trips_through_chrono() {
        for token in [
            WeekdayToken::Mon,
            WeekdayToken::Tue,
            WeekdayToken::Wed,
            WeekdayToken::Thu,
            WeekdayToken::Fri,
            WeekdayToken::Sat,
            WeekdayToken::Sun,
        ] {
            assert_eq!(WeekdayToken::from_chrono(token.to_chrono()), token);
        }
    }
}
