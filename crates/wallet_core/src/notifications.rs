//! Transient banners. Only one is visible at a time: showing a new one
//! replaces the previous, and each dismisses itself after its ttl.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::events::ControllerEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub kind: NotificationKind,
    pub ttl: Duration,
}

pub struct NotificationCenter {
    ttl: Duration,
    current: Arc<Mutex<Option<Notification>>>,
    events: broadcast::Sender<ControllerEvent>,
}

impl NotificationCenter {
    pub fn new(ttl: Duration, events: broadcast::Sender<ControllerEvent>) -> Self {
        Self {
            ttl,
            current: Arc::new(Mutex::new(None)),
            events,
        }
    }

    pub fn success(&self, message: impl Into<String>) -> Notification {
        self.show(message, NotificationKind::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> Notification {
        self.show(message, NotificationKind::Error)
    }

    /// Replaces the visible notification and schedules its dismissal.
    /// Must be called from within a tokio runtime.
    pub fn show(&self, message: impl Into<String>, kind: NotificationKind) -> Notification {
        let notification = Notification {
            id: Uuid::new_v4(),
            message: message.into(),
            kind,
            ttl: self.ttl,
        };

        {
            let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(previous) = current.replace(notification.clone()) {
                debug!(id = %previous.id, "notification replaced");
            }
        }
        let _ = self
            .events
            .send(ControllerEvent::Notification(notification.clone()));

        let current = Arc::clone(&self.current);
        let events = self.events.clone();
        let id = notification.id;
        let ttl = notification.ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let dismissed = {
                let mut current = current.lock().unwrap_or_else(PoisonError::into_inner);
                if current.as_ref().is_some_and(|n| n.id == id) {
                    current.take();
                    true
                } else {
                    false
                }
            };
            if dismissed {
                let _ = events.send(ControllerEvent::NotificationDismissed(id));
            }
        });

        notification
    }

    pub fn visible(&self) -> Option<Notification> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        let cleared = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(notification) = cleared {
            let _ = self
                .events
                .send(ControllerEvent::NotificationDismissed(notification.id));
        }
    }
}

#[cfg(test)]
#[path = "tests/notifications_tests.rs"]
mod tests;
