//! Outward notifications and their subscription registry.

use crate::delegate::{ErrorCode, PlaybackStatus};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Payload of a `time-update` notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeUpdate {
    pub current_time_seconds: f64,
    /// `None` while the duration is unknown.
    pub duration_seconds: Option<f64>,
}

impl From<&PlaybackStatus> for TimeUpdate {
    fn from(status: &PlaybackStatus) -> Self {
        Self {
            current_time_seconds: status.current_time,
            duration_seconds: status.duration,
        }
    }
}

/// Notifications raised towards the embedding host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notification {
    /// Emitted on every timing tick of the primitive.
    TimeUpdate(TimeUpdate),
    /// Emitted once per playback completion.
    Ended,
    /// Emitted once per error occurrence.
    PlaybackError { error_code: ErrorCode },
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::TimeUpdate(_) => NotificationKind::TimeUpdate,
            Notification::Ended => NotificationKind::Ended,
            Notification::PlaybackError { .. } => NotificationKind::PlaybackError,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    TimeUpdate,
    Ended,
    PlaybackError,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::TimeUpdate => "time-update",
            NotificationKind::Ended => "ended",
            NotificationKind::PlaybackError => "playback-error",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Listener = Arc<dyn Fn(&Notification) + Send + Sync>;

/// Handle returned by [`Emitter::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    kind: Option<NotificationKind>,
    listener: Listener,
}

/// Typed observer registry.
///
/// Listeners are called outside the registry lock, so a listener may
/// subscribe, unsubscribe or call back into the widget.
#[derive(Default)]
pub struct Emitter {
    next_id: AtomicU64,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen for one kind of notification.
    pub fn subscribe(&self, kind: NotificationKind, listener: Listener) -> SubscriptionId {
        self.insert(Some(kind), listener)
    }

    /// Listen for every notification.
    pub fn subscribe_all(&self, listener: Listener) -> SubscriptionId {
        self.insert(None, listener)
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions.lock();
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        subscriptions.len() != before
    }

    /// Remove every subscription.
    pub fn clear(&self) {
        self.subscriptions.lock().clear();
    }

    pub fn listener_count(&self) -> usize {
        self.subscriptions.lock().len()
    }

    /// Deliver `notification` to matching listeners. Returns how many were
    /// called.
    pub fn emit(&self, notification: &Notification) -> usize {
        let kind = notification.kind();
        let listeners: Vec<Listener> = self
            .subscriptions
            .lock()
            .iter()
            .filter(|s| s.kind.is_none_or(|k| k == kind))
            .map(|s| Arc::clone(&s.listener))
            .collect();
        log::trace!("{kind} -> {} listeners", listeners.len());
        for listener in &listeners {
            listener(notification);
        }
        listeners.len()
    }

    fn insert(&self, kind: Option<NotificationKind>, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscriptions.lock().push(Subscription { id, kind, listener });
        id
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listeners_filter_by_kind() {
        let emitter = Emitter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        emitter.subscribe(
            NotificationKind::Ended,
            Arc::new(move |n: &Notification| sink.lock().push(n.kind())),
        );
        let sink = Arc::clone(&seen);
        emitter.subscribe_all(Arc::new(move |n: &Notification| sink.lock().push(n.kind())));

        assert_eq!(emitter.emit(&Notification::Ended), 2);
        assert_eq!(
            emitter.emit(&Notification::PlaybackError {
                error_code: ErrorCode::Network
            }),
            1
        );
        assert_eq!(
            *seen.lock(),
            vec![
                NotificationKind::Ended,
                NotificationKind::Ended,
                NotificationKind::PlaybackError
            ]
        );
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let emitter = Emitter::new();
        let id = emitter.subscribe_all(Arc::new(|_: &Notification| {}));
        assert!(emitter.unsubscribe(id));
        assert!(!emitter.unsubscribe(id));
        assert_eq!(emitter.emit(&Notification::Ended), 0);
    }

    #[test]
    fn listener_may_unsubscribe_itself() {
        let emitter = Arc::new(Emitter::new());
        let slot = Arc::new(Mutex::new(None));

        let registry = Arc::clone(&emitter);
        let own = Arc::clone(&slot);
        let id = emitter.subscribe_all(Arc::new(move |_: &Notification| {
            if let Some(id) = own.lock().take() {
                registry.unsubscribe(id);
            }
        }));
        *slot.lock() = Some(id);

        assert_eq!(emitter.emit(&Notification::Ended), 1);
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn kind_names() {
        assert_eq!(NotificationKind::TimeUpdate.to_string(), "time-update");
        assert_eq!(NotificationKind::PlaybackError.as_str(), "playback-error");
    }
}
