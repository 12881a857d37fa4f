use crate::config::{ConfigSync, Configuration, PlaybackSession, SyncOutcome};
use crate::delegate::{DelegateBinding, ErrorCode, MediaEvent, PlaybackDelegate, PlaybackStatus};
use crate::input::{
    Command, ControlTarget, DragSession, GlobalPointer, GlobalPointerHandler, InputTranslator, Key,
    KeyDisposition, ScrubSurface, WideScope,
};
use crate::notify::{Emitter, Listener, Notification, NotificationKind, SubscriptionId, TimeUpdate};
use crate::reflector::ControlState;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Identifies one widget instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId(u64);

impl WidgetId {
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug)]
struct WidgetState<D> {
    binding: DelegateBinding<D>,
    sync: ConfigSync,
    controls: ControlState,
    input: InputTranslator,
    ended_reported: bool,
}

impl<D: PlaybackDelegate> WidgetState<D> {
    fn refresh(&mut self) {
        let status = self.binding.status();
        self.controls.reflect(&status);
        self.controls.dragging = self.input.is_scrubbing();
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::TogglePlay => {
                self.binding.toggle_play();
            }
            Command::Seek(seconds) => {
                if self.binding.seek(seconds) {
                    self.ended_reported = false;
                }
            }
            Command::ToggleMute => {
                let muted = self.binding.toggle_mute();
                self.controls.volume_slider = if muted {
                    0.0
                } else {
                    self.binding.status().volume
                };
            }
            Command::SetVolume(volume) => {
                if self.binding.set_volume(volume) {
                    self.controls.volume_slider = volume.clamp(0.0, 1.0);
                }
            }
        }
        self.refresh();
    }

    /// Reflect a primitive event. Returns the notification it produces, if
    /// any, built from the same status snapshot the controls were given.
    fn on_media_event(&mut self, event: MediaEvent) -> Option<Notification> {
        let status = self.binding.status();
        self.controls.reflect(&status);

        match event {
            MediaEvent::TimeUpdate => Some(Notification::TimeUpdate(TimeUpdate::from(&status))),
            MediaEvent::Ended if !self.ended_reported => {
                self.ended_reported = true;
                Some(Notification::Ended)
            }
            MediaEvent::Error => {
                let error_code = status.error.unwrap_or(ErrorCode::Unknown);
                if !self.controls.show_error(status.error) {
                    return None;
                }
                log::error!("Video error: {error_code}");
                Some(Notification::PlaybackError { error_code })
            }
            MediaEvent::Play => {
                self.ended_reported = false;
                None
            }
            _ => None,
        }
    }
}

struct Shared<D> {
    state: Mutex<WidgetState<D>>,
    emitter: Emitter,
}

impl<D: PlaybackDelegate> Shared<D> {
    fn on_global_pointer(&self, event: GlobalPointer) {
        let mut state = self.state.lock();
        match event {
            GlobalPointer::Move { x } => {
                let status = state.binding.status();
                if let Some(command) = state.input.pointer_move(x, &status) {
                    state.execute(command);
                }
            }
            GlobalPointer::Up => {
                state.input.pointer_up();
                state.refresh();
            }
        }
    }
}

/// The media widget: a cheap, clonable handle over one playback primitive.
///
/// All entry points are synchronous. Notifications are delivered after the
/// internal lock is released, so listeners may call back into the widget.
/// Dropping the last handle tears the widget down.
pub struct VideoWidget<D> {
    id: WidgetId,
    shared: Arc<Shared<D>>,
}

impl<D> Clone for VideoWidget<D> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<D> std::fmt::Debug for VideoWidget<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoWidget")
            .field("id", &self.id)
            .field("emitter", &self.shared.emitter)
            .finish_non_exhaustive()
    }
}

impl<D: PlaybackDelegate + Send + 'static> VideoWidget<D> {
    /// Create a widget over `delegate`. Drag tracking registers on `scope`.
    pub fn new(delegate: D, scope: impl WideScope + 'static) -> Self {
        let shared = Arc::new_cyclic(|weak: &Weak<Shared<D>>| {
            let weak = weak.clone();
            let handler: GlobalPointerHandler = Arc::new(move |event: GlobalPointer| {
                if let Some(shared) = weak.upgrade() {
                    shared.on_global_pointer(event);
                }
            });
            let mut controls = ControlState::default();
            controls.reflect(&delegate.status());
            Shared {
                state: Mutex::new(WidgetState {
                    binding: DelegateBinding::new(delegate),
                    sync: ConfigSync::new(),
                    controls,
                    input: InputTranslator::new(Box::new(scope), handler),
                    ended_reported: false,
                }),
                emitter: Emitter::new(),
            }
        });
        Self {
            id: WidgetId::next(),
            shared,
        }
    }
}

impl<D> VideoWidget<D> {
    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn subscribe(&self, kind: NotificationKind, listener: Listener) -> SubscriptionId {
        self.shared.emitter.subscribe(kind, listener)
    }

    pub fn subscribe_all(&self, listener: Listener) -> SubscriptionId {
        self.shared.emitter.subscribe_all(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.emitter.unsubscribe(id)
    }

    pub fn listener_count(&self) -> usize {
        self.shared.emitter.listener_count()
    }
}

impl<D: PlaybackDelegate> VideoWidget<D> {
    /// Apply a configuration record. Equal records are a no-op.
    pub fn apply_configuration(&self, config: &Configuration) -> SyncOutcome {
        let mut guard = self.shared.state.lock();
        let state = &mut *guard;
        let outcome = state
            .sync
            .apply(config, &mut state.binding, &mut state.controls);
        if outcome != SyncOutcome::Unchanged {
            state.ended_reported = false;
            log::debug!("widget {:?}: configuration {outcome:?}", self.id);
        }
        outcome
    }

    /// Last applied configuration.
    pub fn configuration(&self) -> Option<Configuration> {
        self.shared.state.lock().sync.configuration().cloned()
    }

    pub fn session(&self) -> Option<PlaybackSession> {
        self.shared.state.lock().sync.session().cloned()
    }

    /// Live playback status read from the primitive.
    pub fn status(&self) -> PlaybackStatus {
        self.shared.state.lock().binding.status()
    }

    /// Current derived control state.
    pub fn controls(&self) -> ControlState {
        self.shared.state.lock().controls.clone()
    }

    pub fn drag(&self) -> Option<DragSession> {
        self.shared.state.lock().input.drag().copied()
    }

    /// Run `f` against the primitive, e.g. to poll it for events.
    pub fn with_delegate<R>(&self, f: impl FnOnce(&mut D) -> R) -> R {
        f(self.shared.state.lock().binding.delegate_mut())
    }

    pub fn play(&self) {
        let mut state = self.shared.state.lock();
        state.binding.play();
        state.refresh();
    }

    pub fn pause(&self) {
        let mut state = self.shared.state.lock();
        state.binding.pause();
        state.refresh();
    }

    pub fn toggle_play(&self) {
        self.run(Command::TogglePlay);
    }

    /// Seek to `seconds`. Non-finite targets are ignored.
    pub fn seek_to(&self, seconds: f64) {
        self.run(Command::Seek(seconds));
    }

    /// Seek back to the start.
    pub fn reset(&self) {
        self.run(Command::Seek(0.0));
    }

    pub fn set_volume(&self, volume: f64) {
        self.run(Command::SetVolume(volume));
    }

    pub fn toggle_mute(&self) {
        self.run(Command::ToggleMute);
    }

    /// Feed a lifecycle event from the primitive.
    pub fn handle_media_event(&self, event: MediaEvent) {
        let notification = self.shared.state.lock().on_media_event(event);
        if let Some(notification) = notification {
            self.shared.emitter.emit(&notification);
        }
    }

    /// Click or tap on the scrub surface.
    pub fn scrub_click(&self, x: f64, surface: ScrubSurface) {
        let mut state = self.shared.state.lock();
        let status = state.binding.status();
        if let Some(command) = state.input.click(x, surface, &status) {
            state.execute(command);
        }
    }

    /// Pointer pressed on the scrub surface.
    pub fn scrub_pointer_down(&self, x: f64, surface: ScrubSurface) {
        let mut state = self.shared.state.lock();
        let status = state.binding.status();
        let command = state.input.pointer_down(x, surface, &status);
        match command {
            Some(command) => state.execute(command),
            None => state.refresh(),
        }
    }

    /// Pointer pressed on the volume slider. Moves keep adjusting the
    /// volume until the pointer is released.
    pub fn volume_pointer_down(&self, x: f64, surface: ScrubSurface) {
        let mut state = self.shared.state.lock();
        if let Some(command) = state.input.volume_pointer_down(x, surface) {
            state.execute(command);
        }
    }

    /// Pointer moved, wherever it is. Ignored unless a drag is active.
    pub fn pointer_move(&self, x: f64) {
        self.shared.on_global_pointer(GlobalPointer::Move { x });
    }

    /// Pointer released, wherever it is.
    pub fn pointer_up(&self) {
        self.shared.on_global_pointer(GlobalPointer::Up);
    }

    /// Key pressed while `target` has focus.
    pub fn key_down(&self, target: ControlTarget, key: Key) -> KeyDisposition {
        let mut state = self.shared.state.lock();
        let status = state.binding.status();
        match state.input.key_down(target, key, &status) {
            Some(command) => {
                state.execute(command);
                KeyDisposition::Handled
            }
            None => KeyDisposition::PassThrough,
        }
    }

    /// Input from the volume slider.
    pub fn volume_input(&self, value: f64) {
        let mut state = self.shared.state.lock();
        if let Some(command) = state.input.slider_input(value) {
            state.execute(command);
        }
    }

    /// Whether a drag currently holds a wide-scope listener.
    pub fn is_tracking_pointer(&self) -> bool {
        self.shared.state.lock().input.is_listening()
    }

    /// End any drag, release the wide-scope listener and drop every
    /// subscription. Safe to call more than once.
    pub fn teardown(&self) {
        {
            let mut state = self.shared.state.lock();
            state.input.teardown();
            state.controls.dragging = false;
        }
        self.shared.emitter.clear();
        log::debug!("widget {:?} torn down", self.id);
    }

    fn run(&self, command: Command) {
        self.shared.state.lock().execute(command);
    }
}

impl<D> Drop for VideoWidget<D> {
    fn drop(&mut self) {
        // Only cleanup if this is the last handle
        if Arc::strong_count(&self.shared) == 1 {
            if let Some(mut state) = self.shared.state.try_lock() {
                state.input.teardown();
            }
            self.shared.emitter.clear();
        }
    }
}
