pub mod clock;
pub mod error;
pub mod habit;
pub mod notification;
pub mod reminder;
pub mod store;
pub mod testing;

pub use crate::clock::{Clock, SystemClock};
pub use crate::error::ReminderError;
pub use crate::habit::{Habit, ReminderTime, WeekdayToken};
pub use crate::notification::{
    DeliveryHandler, NotificationContent, NotificationData, NotificationGateway, NotificationKind,
    NotificationSystem,
};
pub use crate::reminder::scheduler::{ReminderScheduler, ScheduleOutcome};
pub use crate::store::{JsonFileStore, KeyValueStore, MemoryStore};
