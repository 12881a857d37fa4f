//! Bridge between a [`VideoWidget`] and a hosting component framework.

use crate::delegate::{ErrorCode, PlaybackDelegate};
use crate::notify::{Listener, Notification, NotificationKind, SubscriptionId, TimeUpdate};
use crate::widget::VideoWidget;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub type TimeUpdateCallback = Arc<dyn Fn(TimeUpdate) + Send + Sync>;
pub type EndedCallback = Arc<dyn Fn() + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(ErrorCode) + Send + Sync>;

/// Callbacks supplied by the host component.
#[derive(Clone, Default)]
pub struct HostCallbacks {
    on_time_update: Option<TimeUpdateCallback>,
    on_ended: Option<EndedCallback>,
    on_error: Option<ErrorCallback>,
}

impl HostCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_time_update(mut self, f: impl Fn(TimeUpdate) + Send + Sync + 'static) -> Self {
        self.on_time_update = Some(Arc::new(f));
        self
    }

    pub fn on_ended(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_ended = Some(Arc::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(ErrorCode) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Listeners for every callback that is set, each gated on `live`.
    fn listeners(&self, live: &Arc<AtomicBool>) -> Vec<(NotificationKind, Listener)> {
        let mut listeners = Vec::new();

        if let Some(callback) = self.on_time_update.clone() {
            let live = Arc::clone(live);
            let listener: Listener = Arc::new(move |notification: &Notification| {
                if let Notification::TimeUpdate(update) = notification {
                    if live.load(Ordering::Acquire) {
                        callback(*update);
                    }
                }
            });
            listeners.push((NotificationKind::TimeUpdate, listener));
        }
        if let Some(callback) = self.on_ended.clone() {
            let live = Arc::clone(live);
            let listener: Listener = Arc::new(move |_: &Notification| {
                if live.load(Ordering::Acquire) {
                    callback();
                }
            });
            listeners.push((NotificationKind::Ended, listener));
        }
        if let Some(callback) = self.on_error.clone() {
            let live = Arc::clone(live);
            let listener: Listener = Arc::new(move |notification: &Notification| {
                if let Notification::PlaybackError { error_code } = notification {
                    if live.load(Ordering::Acquire) {
                        callback(*error_code);
                    }
                }
            });
            listeners.push((NotificationKind::PlaybackError, listener));
        }
        listeners
    }
}

impl fmt::Debug for HostCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostCallbacks")
            .field("on_time_update", &self.on_time_update.is_some())
            .field("on_ended", &self.on_ended.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

struct Mount<D> {
    widget: VideoWidget<D>,
    subscriptions: Vec<SubscriptionId>,
    live: Arc<AtomicBool>,
}

impl<D> Mount<D> {
    fn release(self) {
        self.live.store(false, Ordering::Release);
        for id in self.subscriptions {
            self.widget.unsubscribe(id);
        }
        log::debug!("adapter unmounted from widget {:?}", self.widget.id());
    }
}

/// Imperative method surface plus callback forwarding for a host component.
///
/// Subscriptions exist only while mounted. Mounting the same widget twice
/// is a no-op; mounting another widget unmounts the first.
pub struct FrameworkAdapter<D> {
    callbacks: HostCallbacks,
    mounted: Option<Mount<D>>,
}

impl<D: PlaybackDelegate> FrameworkAdapter<D> {
    pub fn new(callbacks: HostCallbacks) -> Self {
        Self {
            callbacks,
            mounted: None,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn widget(&self) -> Option<&VideoWidget<D>> {
        self.mounted.as_ref().map(|m| &m.widget)
    }

    /// Attach to `widget` and install the host callbacks.
    pub fn mount(&mut self, widget: &VideoWidget<D>) {
        if self.widget().is_some_and(|w| w.id() == widget.id()) {
            return;
        }
        self.unmount();

        let live = Arc::new(AtomicBool::new(true));
        let subscriptions = self
            .callbacks
            .listeners(&live)
            .into_iter()
            .map(|(kind, listener)| widget.subscribe(kind, listener))
            .collect();
        log::debug!("adapter mounted on widget {:?}", widget.id());
        self.mounted = Some(Mount {
            widget: widget.clone(),
            subscriptions,
            live,
        });
    }

    /// Remove every subscription. No callback fires afterwards, even one
    /// already queued in a dispatch.
    pub fn unmount(&mut self) {
        if let Some(mount) = self.mounted.take() {
            mount.release();
        }
    }

    /// Replace the host callbacks, re-subscribing if mounted.
    pub fn set_callbacks(&mut self, callbacks: HostCallbacks) {
        self.callbacks = callbacks;
        if let Some(widget) = self.widget().cloned() {
            self.unmount();
            self.mount(&widget);
        }
    }

    pub fn play(&self) {
        self.forward(VideoWidget::play);
    }

    pub fn pause(&self) {
        self.forward(VideoWidget::pause);
    }

    pub fn seek_to(&self, seconds: f64) {
        self.forward(|w| w.seek_to(seconds));
    }

    pub fn set_volume(&self, volume: f64) {
        self.forward(|w| w.set_volume(volume));
    }

    pub fn toggle_mute(&self) {
        self.forward(VideoWidget::toggle_mute);
    }

    fn forward(&self, f: impl FnOnce(&VideoWidget<D>)) {
        match self.widget() {
            Some(widget) => f(widget),
            None => log::trace!("adapter call ignored: not mounted"),
        }
    }
}

impl<D> fmt::Debug for FrameworkAdapter<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameworkAdapter")
            .field("callbacks", &self.callbacks)
            .field("mounted", &self.mounted.as_ref().map(|m| m.widget.id()))
            .finish()
    }
}

impl<D> Drop for FrameworkAdapter<D> {
    fn drop(&mut self) {
        if let Some(mount) = self.mounted.take() {
            mount.release();
        }
    }
}
