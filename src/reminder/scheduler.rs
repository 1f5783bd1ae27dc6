use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Local, Weekday};
use parking_lot::Mutex;
use rand::Rng;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::ReminderError;
use crate::habit::{Habit, ReminderTime, WeekdayToken};
use crate::notification::{
    NotificationContent, NotificationData, NotificationGateway, NotificationKind,
};
use crate::reminder::occurrence;
use crate::reminder::registry::NotificationRegistry;
use crate::store::KeyValueStore;

/// A just-created habit whose first occurrence lands closer than this gets
/// pushed back exactly 24 hours, so saving a habit never rings on the spot.
pub const NEW_HABIT_DEFER_MINUTES: i64 = 5;

/// Streaks shorter than this are not celebrated.
pub const MIN_CELEBRATED_STREAK: u32 = 3;

pub const STREAK_CELEBRATION_DELAY_MINUTES: i64 = 30;

const MOTIVATIONAL_MESSAGES: [&str; 10] = [
    "You're on a roll! Keep it up!",
    "Building this habit will change your life!",
    "Small steps lead to big results!",
    "Consistency is key to success!",
    "You've got this! Stay committed!",
    "Every effort counts towards your goal!",
    "Progress happens one day at a time!",
    "Your future self will thank you for this!",
    "Discipline equals freedom!",
    "The best time to start was yesterday. The next best time is now!",
];

fn random_motivational_message() -> &'static str {
    let index = rand::thread_rng().gen_range(0..MOTIVATIONAL_MESSAGES.len());
    MOTIVATIONAL_MESSAGES[index]
}

/// Result of a schedule request. Only `Scheduled` armed anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Scheduled {
        notification_id: String,
        fire_at: DateTime<Local>,
    },
    RemindersDisabled,
    NoScheduledDays,
}

/// Cancel-then-reschedule on every edit; exactly one armed notification per
/// reminder-enabled habit, its identifier persisted through the registry.
pub struct ReminderScheduler {
    gateway: Arc<dyn NotificationGateway>,
    registry: NotificationRegistry,
    clock: Arc<dyn Clock>,
    // One token per habit: overlapping calls for the same habit would
    // interleave their cancel/arm/persist sequence and orphan an armed
    // notification.
    habit_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ReminderScheduler {
    pub fn new(gateway: Arc<dyn NotificationGateway>, store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(gateway, store, Arc::new(SystemClock))
    }

    pub fn with_clock(
        gateway: Arc<dyn NotificationGateway>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gateway,
            registry: NotificationRegistry::new(store),
            clock,
            habit_locks: Mutex::new(HashMap::new()),
        }
    }

    fn habit_lock(&self, habit_id: &str) -> Arc<Mutex<()>> {
        self.habit_locks
            .lock()
            .entry(habit_id.to_string())
            .or_default()
            .clone()
    }

    /// Arms the single nearest upcoming reminder for a habit, replacing
    /// whatever was armed before. Called on every habit create and edit,
    /// including edits that change nothing.
    pub fn schedule_reminder(
        &self,
        habit: &Habit,
        time_of_day: &str,
        is_new_habit: bool,
    ) -> Result<ScheduleOutcome, ReminderError> {
        let lock = self.habit_lock(&habit.id);
        let _guard = lock.lock();

        self.cancel_locked(&habit.id)?;

        if !habit.reminder_enabled {
            debug!(habit_id = %habit.id, "reminders disabled, nothing scheduled");
            return Ok(ScheduleOutcome::RemindersDisabled);
        }

        let time = ReminderTime::parse(time_of_day)?;
        let now = self.clock.now();
        let frequency: Vec<Weekday> = habit.frequency.iter().map(|day| day.to_chrono()).collect();
        let Some(resolved) = occurrence::next_occurrence(&frequency, time, &now) else {
            debug!(habit_id = %habit.id, "no weekdays in frequency, nothing to arm");
            return Ok(ScheduleOutcome::NoScheduledDays);
        };

        // The day recorded in the payload is the occurrence the user asked
        // for, even when the new-habit guard pushes the instant past it.
        let day = resolved.weekday();
        let mut fire_at = resolved;
        if is_new_habit && fire_at - now < Duration::minutes(NEW_HABIT_DEFER_MINUTES) {
            fire_at += Duration::hours(24);
            debug!(habit_id = %habit.id, %fire_at, "deferred first reminder of a new habit");
        }

        let content = reminder_content(habit, Some(day));
        let identifier = self
            .gateway
            .schedule_one_shot(&content, fire_at)
            .map_err(ReminderError::Gateway)?;

        // The arm already succeeded; losing the registry write only costs
        // the ability to cancel this one notification later.
        if let Err(err) = self
            .registry
            .set(&habit.id, std::slice::from_ref(&identifier))
        {
            warn!(habit_id = %habit.id, error = %err, "failed to persist notification identifier");
        }

        debug!(habit_id = %habit.id, %identifier, %fire_at, "reminder armed");
        Ok(ScheduleOutcome::Scheduled {
            notification_id: identifier,
            fire_at,
        })
    }

    /// Safe to call when nothing is scheduled; identifiers the OS no longer
    /// knows are fine.
    pub fn cancel_habit_reminder(&self, habit_id: &str) -> Result<(), ReminderError> {
        let lock = self.habit_lock(habit_id);
        let _guard = lock.lock();
        self.cancel_locked(habit_id)
    }

    fn cancel_locked(&self, habit_id: &str) -> Result<(), ReminderError> {
        for identifier in self.registry.get(habit_id) {
            if let Err(err) = self.gateway.cancel(&identifier) {
                warn!(habit_id, %identifier, error = %err, "failed to cancel scheduled notification");
            }
        }
        self.registry
            .remove(habit_id)
            .map_err(ReminderError::Storage)
    }

    /// Full reset: drops every OS-scheduled notification and every registry
    /// entry. Habit data under other storage keys is untouched.
    pub fn cancel_all_reminders(&self) -> Result<(), ReminderError> {
        self.gateway.cancel_all().map_err(ReminderError::Gateway)?;
        self.registry.clear_all().map_err(ReminderError::Storage)
    }

    /// One-off nudge at `now + minutes_from_now`. Snoozes are deliberately
    /// not registry-tracked: they die with their fire time instead of
    /// following the habit's lifecycle.
    pub fn schedule_snooze(
        &self,
        habit: &Habit,
        minutes_from_now: i64,
    ) -> Result<String, ReminderError> {
        let fire_at = self.clock.now() + Duration::minutes(minutes_from_now);
        let content = NotificationContent {
            title: format!("Reminder: {}", habit.title),
            body: "Time to get back to your habit!".to_string(),
            data: NotificationData {
                habit_id: habit.id.clone(),
                kind: NotificationKind::Snooze,
                day: None,
            },
            play_sound: true,
        };
        self.gateway
            .schedule_one_shot(&content, fire_at)
            .map_err(ReminderError::Gateway)
    }

    /// Arms a reminder-style notification a fixed number of minutes out; the
    /// identifier is recorded under the habit like a scheduled reminder.
    pub fn schedule_with_delay(
        &self,
        habit: &Habit,
        delay_minutes: i64,
    ) -> Result<String, ReminderError> {
        if delay_minutes <= 0 {
            return Err(ReminderError::InvalidDelay);
        }
        let lock = self.habit_lock(&habit.id);
        let _guard = lock.lock();

        let fire_at = self.clock.now() + Duration::minutes(delay_minutes);
        let content = reminder_content(habit, None);
        let identifier = self
            .gateway
            .schedule_one_shot(&content, fire_at)
            .map_err(ReminderError::Gateway)?;
        if let Err(err) = self
            .registry
            .set(&habit.id, std::slice::from_ref(&identifier))
        {
            warn!(habit_id = %habit.id, error = %err, "failed to persist notification identifier");
        }
        Ok(identifier)
    }

    /// Celebrates a completion streak half an hour after the fact. New
    /// habits and short streaks stay quiet.
    pub fn schedule_streak_celebration(
        &self,
        habit: &Habit,
        streak_days: u32,
        is_new_habit: bool,
    ) -> Result<Option<String>, ReminderError> {
        if streak_days < MIN_CELEBRATED_STREAK || is_new_habit {
            debug!(habit_id = %habit.id, streak_days, "streak not celebrated");
            return Ok(None);
        }
        let fire_at = self.clock.now() + Duration::minutes(STREAK_CELEBRATION_DELAY_MINUTES);
        let content = NotificationContent {
            title: format!("{streak_days} Day Streak! 🔥"),
            body: format!(
                "Amazing! You've kept up your \"{}\" habit for {streak_days} days in a row!",
                habit.title
            ),
            data: NotificationData {
                habit_id: habit.id.clone(),
                kind: NotificationKind::Achievement,
                day: None,
            },
            play_sound: true,
        };
        self.gateway
            .schedule_one_shot(&content, fire_at)
            .map(Some)
            .map_err(ReminderError::Gateway)
    }

    /// Schedules from the habit's own stored reminder time. Presets are
    /// created in bulk, so they always take the new-habit defer path.
    pub fn schedule_preset_reminder(&self, habit: &Habit) -> Result<ScheduleOutcome, ReminderError> {
        let Some(time_of_day) = habit.reminder_time.as_deref() else {
            return Ok(ScheduleOutcome::RemindersDisabled);
        };
        if !habit.reminder_enabled {
            return Ok(ScheduleOutcome::RemindersDisabled);
        }
        self.schedule_reminder(habit, time_of_day, true)
    }

    /// Cancel-everything-then-re-arm, used after restores and data imports.
    /// Per-habit failures are logged and skipped.
    pub fn reschedule_all(&self, habits: &[Habit]) -> Result<usize, ReminderError> {
        self.cancel_all_reminders()?;
        let mut rearmed = 0;
        for habit in habits {
            let Some(time_of_day) = habit.reminder_time.as_deref() else {
                continue;
            };
            if !habit.reminder_enabled {
                continue;
            }
            match self.schedule_reminder(habit, time_of_day, false) {
                Ok(ScheduleOutcome::Scheduled { .. }) => rearmed += 1,
                Ok(_) => {}
                Err(err) => {
                    warn!(habit_id = %habit.id, error = %err, "failed to reschedule reminder");
                }
            }
        }
        debug!(rearmed, total = habits.len(), "rescheduled reminders");
        Ok(rearmed)
    }
}

fn reminder_content(habit: &Habit, day: Option<Weekday>) -> NotificationContent {
    let message = random_motivational_message();
    let body = match habit.description.as_deref() {
        Some(description) if !description.is_empty() => format!("{description}\n\n{message}"),
        _ => message.to_string(),
    };
    NotificationContent {
        title: format!("Time for: {}", habit.title),
        body,
        data: NotificationData {
            habit_id: habit.id.clone(),
            kind: NotificationKind::Reminder,
            day: day.map(WeekdayToken::from_chrono),
        },
        play_sound: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn habit_with_description(description: Option<&str>) -> Habit {
        Habit {
            id: "h1".to_string(),
            title: "Stretch".to_string(),
            description: description.map(str::to_string),
            frequency: vec![WeekdayToken::Mon],
            reminder_enabled: true,
            reminder_time: Some("08:00".to_string()),
        }
    }

    #[test]
    fn content_prefixes_description_when_present() {
        let content = reminder_content(&habit_with_description(Some("Neck and back")), None);
        assert_eq!(content.title, "Time for: Stretch");
        assert!(content.body.starts_with("Neck and back\n\n"));
        assert!(content.body.len() > "Neck and back\n\n".len());
    }

    #[test]
    fn content_is_message_only_without_description() {
        let content = reminder_content(&habit_with_description(None), None);
        assert!(MOTIVATIONAL_MESSAGES.contains(&content.body.as_str()));
    }

    #[test]
    fn blank_description_is_treated_as_absent() {
        let content = reminder_content(&habit_with_description(Some("")), None);
        assert!(MOTIVATIONAL_MESSAGES.contains(&content.body.as_str()));
    }

    #[test]
    fn content_records_the_occurrence_day() {
        let content = reminder_content(&habit_with_description(None), Some(Weekday::Fri));
        assert_eq!(content.data.day, Some(WeekdayToken::Fri));
        assert_eq!(content.data.kind, NotificationKind::Reminder);
        assert_eq!(content.data.habit_id, "h1");
    }
}
