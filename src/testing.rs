//! Test doubles for the ports and the clock.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, bail};
use chrono::{DateTime, Local};
use parking_lot::Mutex;

use crate::clock::Clock;
use crate::notification::{
    DeliveryHandler, NotificationContent, NotificationGateway, NotificationKind,
};

#[derive(Debug, Clone)]
pub struct ArmedNotification {
    pub identifier: String,
    pub content: NotificationContent,
    pub fire_at: DateTime<Local>,
}

/// Records every arm and cancel instead of talking to an OS. Cancelling an
/// unknown identifier is a no-op, like the real capability.
#[derive(Default)]
pub struct InMemoryGateway {
    permission_granted: Mutex<bool>,
    fail_next_arm: Mutex<bool>,
    next_identifier: AtomicUsize,
    armed: Mutex<HashMap<String, ArmedNotification>>,
    arm_count: AtomicUsize,
    cancel_count: AtomicUsize,
    handler: Mutex<Option<Arc<dyn DeliveryHandler>>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self {
            permission_granted: Mutex::new(true),
            ..Self::default()
        }
    }

    pub fn deny_permission(&self) {
        *self.permission_granted.lock() = false;
    }

    /// Makes the next `schedule_one_shot` call fail, then recovers.
    pub fn fail_next_arm(&self) {
        *self.fail_next_arm.lock() = true;
    }

    pub fn outstanding(&self) -> Vec<ArmedNotification> {
        let mut armed: Vec<ArmedNotification> = self.armed.lock().values().cloned().collect();
        armed.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        armed
    }

    pub fn outstanding_for_kind(&self, kind: NotificationKind) -> Vec<ArmedNotification> {
        self.outstanding()
            .into_iter()
            .filter(|armed| armed.content.data.kind == kind)
            .collect()
    }

    /// Total arms over the gateway's lifetime, including cancelled ones.
    pub fn arm_count(&self) -> usize {
        self.arm_count.load(Ordering::SeqCst)
    }

    pub fn cancel_count(&self) -> usize {
        self.cancel_count.load(Ordering::SeqCst)
    }

    pub fn has_delivery_handler(&self) -> bool {
        self.handler.lock().is_some()
    }

    /// Simulates the user tapping an armed notification.
    pub fn tap(&self, identifier: &str) {
        let armed = self.armed.lock().remove(identifier);
        if let Some(armed) = armed
            && let Some(handler) = self.handler.lock().clone()
        {
            handler.on_response(&armed.content.data);
        }
    }
}

impl NotificationGateway for InMemoryGateway {
    fn request_permission(&self) -> Result<bool> {
        Ok(*self.permission_granted.lock())
    }

    fn schedule_one_shot(
        &self,
        content: &NotificationContent,
        fire_at: DateTime<Local>,
    ) -> Result<String> {
        if !*self.permission_granted.lock() {
            bail!("notification permission not granted");
        }
        if std::mem::take(&mut *self.fail_next_arm.lock()) {
            bail!("injected gateway failure");
        }
        let identifier = format!("ntf-{}", self.next_identifier.fetch_add(1, Ordering::SeqCst));
        self.arm_count.fetch_add(1, Ordering::SeqCst);
        self.armed.lock().insert(
            identifier.clone(),
            ArmedNotification {
                identifier: identifier.clone(),
                content: content.clone(),
                fire_at,
            },
        );
        Ok(identifier)
    }

    fn cancel(&self, identifier: &str) -> Result<()> {
        self.cancel_count.fetch_add(1, Ordering::SeqCst);
        self.armed.lock().remove(identifier);
        Ok(())
    }

    fn cancel_all(&self) -> Result<()> {
        self.armed.lock().clear();
        Ok(())
    }

    fn set_delivery_handler(&self, handler: Arc<dyn DeliveryHandler>) {
        *self.handler.lock() = Some(handler);
    }

    fn clear_delivery_handler(&self) {
        *self.handler.lock() = None;
    }
}

/// A clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Local>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, delta: chrono::Duration) {
        let mut now = self.now.lock();
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock()
    }
}
