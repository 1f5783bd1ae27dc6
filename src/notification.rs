use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::ReminderError;
use crate::habit::WeekdayToken;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub data: NotificationData,
    pub play_sound: bool,
}

/// Carried through the OS layer and handed back on delivery or tap, so the
/// shell can route into the habit's detail flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub habit_id: String,
    pub kind: NotificationKind,
    /// Weekday of the armed occurrence; absent for snoozes and celebrations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<WeekdayToken>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Reminder,
    Snooze,
    Achievement,
}

/// Platform-specific notification adapters implement this. Cancelling an
/// identifier the OS no longer knows must be a no-op, not an error.
pub trait NotificationGateway: Send + Sync {
    fn request_permission(&self) -> Result<bool>;

    fn schedule_one_shot(
        &self,
        content: &NotificationContent,
        fire_at: DateTime<Local>,
    ) -> Result<String>;

    fn cancel(&self, identifier: &str) -> Result<()>;

    fn cancel_all(&self) -> Result<()>;

    fn set_delivery_handler(&self, handler: Arc<dyn DeliveryHandler>);

    fn clear_delivery_handler(&self);
}

pub trait DeliveryHandler: Send + Sync {
    fn on_delivered(&self, _data: &NotificationData) {}

    fn on_response(&self, _data: &NotificationData) {}
}

/// Handle over an initialized notification system. Called once at process
/// start; dropping the handle unregisters the delivery handler.
pub struct NotificationSystem {
    gateway: Arc<dyn NotificationGateway>,
}

impl NotificationSystem {
    pub fn start(
        gateway: Arc<dyn NotificationGateway>,
        handler: Arc<dyn DeliveryHandler>,
    ) -> Result<Self, ReminderError> {
        let granted = gateway
            .request_permission()
            .map_err(ReminderError::Gateway)?;
        if !granted {
            return Err(ReminderError::PermissionDenied);
        }
        gateway.set_delivery_handler(handler);
        Ok(Self { gateway })
    }
}

impl std::fmt::Debug for NotificationSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationSystem").finish_non_exhaustive()
    }
}

impl Drop for NotificationSystem {
    fn drop(&mut self) {
        self.gateway.clear_delivery_handler();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_data_serializes_for_routing() {
        let data = NotificationData {
            habit_id: "h1".to_string(),
            kind: NotificationKind::Reminder,
            day: Some(WeekdayToken::Thu),
        };
        let json = serde_json::to_string(&data).expect("serialize");
        assert_eq!(json, r#"{"habitId":"h1","kind":"reminder","day":"Thu"}"#);
    }

    #[test]
    fn snooze_data_omits_day() {
        let data = NotificationData {
            habit_id: "h1".to_string(),
            kind: NotificationKind::Snooze,
            day: None,
        };
        let json = serde_json::to_string(&data).expect("serialize");
        assert_eq!(json, r#"{"habitId":"h1","kind":"snooze"}"#);
    }
}
