//! Pointer and keyboard translation into playback commands.

use crate::delegate::PlaybackStatus;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Small scrub steps cover 1% of the duration.
const SMALL_STEPS: f64 = 100.0;
/// Large scrub steps cover 10% of the duration.
const LARGE_STEPS: f64 = 10.0;

/// A playback command produced by user input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    TogglePlay,
    Seek(f64),
    ToggleMute,
    SetVolume(f64),
}

/// Focusable parts of the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlTarget {
    PlayPause,
    Reset,
    VolumeMute,
    ScrubSurface,
}

/// Keys the control surface understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Enter,
    Space,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    Other,
}

impl Key {
    /// Parse a key name. Accepts DOM `KeyboardEvent.key` values (`" "`,
    /// `"ArrowLeft"`) as well as lowercase toolkit names (`"space"`, `"left"`).
    pub fn from_name(name: &str) -> Self {
        if name == " " {
            return Key::Space;
        }
        match name.to_ascii_lowercase().as_str() {
            "enter" | "return" => Key::Enter,
            "space" | "spacebar" => Key::Space,
            "arrowleft" | "left" => Key::ArrowLeft,
            "arrowright" | "right" => Key::ArrowRight,
            "arrowup" | "up" => Key::ArrowUp,
            "arrowdown" | "down" => Key::ArrowDown,
            "home" => Key::Home,
            "end" => Key::End,
            _ => Key::Other,
        }
    }

    fn is_activation(self) -> bool {
        matches!(self, Key::Enter | Key::Space)
    }
}

/// Whether a key event was consumed by the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Recognised; the host must suppress its default scroll/activation.
    Handled,
    /// Not ours; leave the event untouched.
    PassThrough,
}

impl KeyDisposition {
    pub fn prevents_default(self) -> bool {
        self == KeyDisposition::Handled
    }
}

/// Horizontal geometry of the scrub surface in pointer coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrubSurface {
    pub left: f64,
    pub width: f64,
}

impl ScrubSurface {
    pub fn new(left: f64, width: f64) -> Self {
        Self { left, width }
    }

    /// Pointer position as a ratio of the surface width, clamped to `[0, 1]`.
    /// `None` for a collapsed or non-finite surface.
    pub fn ratio_at(&self, x: f64) -> Option<f64> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return None;
        }
        let ratio = (x - self.left) / self.width;
        ratio.is_finite().then(|| ratio.clamp(0.0, 1.0))
    }
}

/// What a drag is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DragTarget {
    /// The playhead, through the scrub surface.
    Scrub,
    /// The volume, through the volume slider.
    Volume,
}

/// An in-progress pointer drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    target: DragTarget,
    surface: ScrubSurface,
    ratio: f64,
}

impl DragSession {
    pub fn target(&self) -> DragTarget {
        self.target
    }


    /// Latest pointer position as a ratio of the surface.
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn surface(&self) -> ScrubSurface {
        self.surface
    }
}

/// Pointer events observed outside the widget while a drag is active.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GlobalPointer {
    Move { x: f64 },
    Up,
}

pub type GlobalPointerHandler = Arc<dyn Fn(GlobalPointer) + Send + Sync>;

/// Identifies one registration on a [`WideScope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerToken(u64);

impl ListenerToken {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// Event source wider than the widget itself, used to keep tracking a drag
/// after the pointer leaves the scrub surface.
pub trait WideScope: Send {
    fn listen(&mut self, handler: GlobalPointerHandler) -> ListenerToken;
    /// Remove a registration. Unknown tokens are ignored.
    fn unlisten(&mut self, token: ListenerToken);
}

#[derive(Default)]
struct ScopeInner {
    next_id: u64,
    listeners: Vec<(ListenerToken, GlobalPointerHandler)>,
}

/// A shared wide-scope event source the host feeds with window-level
/// pointer events.
#[derive(Clone, Default)]
pub struct PointerScope(Arc<Mutex<ScopeInner>>);

impl PointerScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every current listener.
    ///
    /// Handlers run without the scope locked, so they may unlisten.
    pub fn dispatch(&self, event: GlobalPointer) {
        let handlers: Vec<GlobalPointerHandler> = self
            .0
            .lock()
            .listeners
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in handlers {
            handler(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.0.lock().listeners.len()
    }
}

impl WideScope for PointerScope {
    fn listen(&mut self, handler: GlobalPointerHandler) -> ListenerToken {
        let mut inner = self.0.lock();
        inner.next_id += 1;
        let token = ListenerToken(inner.next_id);
        inner.listeners.push((token, handler));
        token
    }

    fn unlisten(&mut self, token: ListenerToken) {
        self.0.lock().listeners.retain(|(t, _)| *t != token);
    }
}

impl fmt::Debug for PointerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointerScope")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Converts pointer and keyboard input into [`Command`]s.
///
/// Owns the drag session. While a drag is active exactly one listener is
/// registered on the wide scope; it is removed when the drag ends or the
/// translator is torn down.
pub struct InputTranslator {
    scope: Box<dyn WideScope>,
    handler: GlobalPointerHandler,
    drag: Option<DragSession>,
    listener: Option<ListenerToken>,
}

impl InputTranslator {
    /// `handler` is what the wide scope calls while a drag is active.
    pub fn new(scope: Box<dyn WideScope>, handler: GlobalPointerHandler) -> Self {
        Self {
            scope,
            handler,
            drag: None,
            listener: None,
        }
    }

    pub fn drag(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn is_scrubbing(&self) -> bool {
        self.drag.is_some_and(|d| d.target == DragTarget::Scrub)
    }

    /// Whether a wide-scope listener is currently registered.
    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    /// A click or tap on the scrub surface.
    pub fn click(&self, x: f64, surface: ScrubSurface, status: &PlaybackStatus) -> Option<Command> {
        surface
            .ratio_at(x)
            .and_then(|ratio| seek_to_ratio(ratio, status))
    }

    /// Pointer pressed on the scrub surface: start a drag and seek at once.
    pub fn pointer_down(
        &mut self,
        x: f64,
        surface: ScrubSurface,
        status: &PlaybackStatus,
    ) -> Option<Command> {
        let ratio = surface.ratio_at(x)?;
        self.begin_drag(DragTarget::Scrub, surface, ratio);
        seek_to_ratio(ratio, status)
    }

    /// Pointer pressed on the volume slider: start a drag and set the
    /// volume at once.
    pub fn volume_pointer_down(&mut self, x: f64, surface: ScrubSurface) -> Option<Command> {
        let ratio = surface.ratio_at(x)?;
        self.begin_drag(DragTarget::Volume, surface, ratio);
        Some(Command::SetVolume(ratio))
    }

    /// Pointer moved anywhere. Only produces a command while a drag is
    /// active.
    pub fn pointer_move(&mut self, x: f64, status: &PlaybackStatus) -> Option<Command> {
        let drag = self.drag.as_mut()?;
        drag.ratio = drag.surface.ratio_at(x)?;
        match drag.target {
            DragTarget::Scrub => seek_to_ratio(drag.ratio, status),
            DragTarget::Volume => Some(Command::SetVolume(drag.ratio)),
        }
    }

    /// Pointer released anywhere. Returns whether a drag ended.
    pub fn pointer_up(&mut self) -> bool {
        let ended = self.drag.take().is_some();
        self.release_listener();
        if ended {
            log::trace!("drag ended");
        }
        ended
    }

    /// Input on the volume slider.
    pub fn slider_input(&self, value: f64) -> Option<Command> {
        (!value.is_nan()).then_some(Command::SetVolume(value))
    }

    /// A key pressed while `target` has focus. `None` means the key is not
    /// handled and must pass through.
    pub fn key_down(&self, target: ControlTarget, key: Key, status: &PlaybackStatus) -> Option<Command> {
        match target {
            ControlTarget::PlayPause if key.is_activation() => Some(Command::TogglePlay),
            ControlTarget::Reset if key.is_activation() => Some(Command::Seek(0.0)),
            ControlTarget::VolumeMute if key.is_activation() => Some(Command::ToggleMute),
            ControlTarget::ScrubSurface => scrub_key(key, status),
            _ => None,
        }
    }

    /// Drop any drag and unregister from the wide scope.
    pub fn teardown(&mut self) {
        self.drag = None;
        self.release_listener();
    }

    fn begin_drag(&mut self, target: DragTarget, surface: ScrubSurface, ratio: f64) {
        self.drag = Some(DragSession {
            target,
            surface,
            ratio,
        });
        if self.listener.is_none() {
            self.listener = Some(self.scope.listen(Arc::clone(&self.handler)));
        }
        log::trace!("{target:?} drag started at {ratio:.3}");
    }

    fn release_listener(&mut self) {
        if let Some(token) = self.listener.take() {
            self.scope.unlisten(token);
        }
    }
}

impl fmt::Debug for InputTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputTranslator")
            .field("drag", &self.drag)
            .field("listener", &self.listener)
            .finish_non_exhaustive()
    }
}

impl Drop for InputTranslator {
    fn drop(&mut self) {
        self.release_listener();
    }
}

fn seek_to_ratio(ratio: f64, status: &PlaybackStatus) -> Option<Command> {
    let target = ratio * status.duration?;
    target.is_finite().then_some(Command::Seek(target))
}

fn scrub_key(key: Key, status: &PlaybackStatus) -> Option<Command> {
    let duration = status.known_duration()?;
    let current = status.current_time;
    let target = match key {
        Key::ArrowRight => (current + duration / SMALL_STEPS).min(duration),
        Key::ArrowLeft => (current - duration / SMALL_STEPS).max(0.0),
        Key::ArrowUp => (current + duration / LARGE_STEPS).min(duration),
        Key::ArrowDown => (current - duration / LARGE_STEPS).max(0.0),
        Key::Home => 0.0,
        Key::End => duration,
        Key::Enter | Key::Space => return Some(Command::TogglePlay),
        Key::Other => return None,
    };
    Some(Command::Seek(target))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(current_time: f64, duration: Option<f64>) -> PlaybackStatus {
        PlaybackStatus {
            current_time,
            duration,
            ..PlaybackStatus::default()
        }
    }

    fn translator(scope: &PointerScope) -> InputTranslator {
        InputTranslator::new(Box::new(scope.clone()), Arc::new(|_: GlobalPointer| {}))
    }

    #[test]
    fn key_names() {
        assert_eq!(Key::from_name(" "), Key::Space);
        assert_eq!(Key::from_name("space"), Key::Space);
        assert_eq!(Key::from_name("ArrowRight"), Key::ArrowRight);
        assert_eq!(Key::from_name("left"), Key::ArrowLeft);
        assert_eq!(Key::from_name("Tab"), Key::Other);
    }

    #[test]
    fn ratio_is_clamped() {
        let surface = ScrubSurface::new(100.0, 200.0);
        assert_eq!(surface.ratio_at(200.0), Some(0.5));
        assert_eq!(surface.ratio_at(0.0), Some(0.0));
        assert_eq!(surface.ratio_at(900.0), Some(1.0));
        assert_eq!(ScrubSurface::new(0.0, 0.0).ratio_at(10.0), None);
    }

    #[test]
    fn click_needs_duration() {
        let scope = PointerScope::new();
        let input = translator(&scope);
        let surface = ScrubSurface::new(0.0, 100.0);
        assert_eq!(
            input.click(25.0, surface, &status(0.0, Some(40.0))),
            Some(Command::Seek(10.0))
        );
        assert_eq!(input.click(25.0, surface, &status(0.0, None)), None);
        assert_eq!(input.click(25.0, surface, &status(0.0, Some(f64::INFINITY))), None);
    }

    #[test]
    fn scrub_steps() {
        let scope = PointerScope::new();
        let input = translator(&scope);
        let at = status(10.0, Some(100.0));
        let key = |k| input.key_down(ControlTarget::ScrubSurface, k, &at);
        assert_eq!(key(Key::ArrowRight), Some(Command::Seek(11.0)));
        assert_eq!(key(Key::ArrowLeft), Some(Command::Seek(9.0)));
        assert_eq!(key(Key::ArrowUp), Some(Command::Seek(20.0)));
        assert_eq!(key(Key::ArrowDown), Some(Command::Seek(0.0)));
        assert_eq!(key(Key::Home), Some(Command::Seek(0.0)));
        assert_eq!(key(Key::End), Some(Command::Seek(100.0)));
        assert_eq!(key(Key::Space), Some(Command::TogglePlay));
        assert_eq!(key(Key::Other), None);
    }

    #[test]
    fn scrub_keys_pass_without_duration() {
        let scope = PointerScope::new();
        let input = translator(&scope);
        let unknown = status(0.0, None);
        assert_eq!(input.key_down(ControlTarget::ScrubSurface, Key::Enter, &unknown), None);
        assert_eq!(input.key_down(ControlTarget::ScrubSurface, Key::Home, &unknown), None);
    }

    #[test]
    fn buttons_only_take_activation_keys() {
        let scope = PointerScope::new();
        let input = translator(&scope);
        let at = status(0.0, None);
        assert_eq!(
            input.key_down(ControlTarget::PlayPause, Key::Enter, &at),
            Some(Command::TogglePlay)
        );
        assert_eq!(
            input.key_down(ControlTarget::Reset, Key::Space, &at),
            Some(Command::Seek(0.0))
        );
        assert_eq!(
            input.key_down(ControlTarget::VolumeMute, Key::Space, &at),
            Some(Command::ToggleMute)
        );
        assert_eq!(input.key_down(ControlTarget::PlayPause, Key::ArrowUp, &at), None);
    }

    #[test]
    fn drag_registers_one_listener() {
        let scope = PointerScope::new();
        let mut input = translator(&scope);
        let surface = ScrubSurface::new(0.0, 100.0);
        let at = status(0.0, Some(200.0));

        assert_eq!(input.pointer_down(50.0, surface, &at), Some(Command::Seek(100.0)));
        assert_eq!(input.pointer_down(50.0, surface, &at), Some(Command::Seek(100.0)));
        assert_eq!(scope.listener_count(), 1);

        assert_eq!(input.pointer_move(75.0, &at), Some(Command::Seek(150.0)));
        assert_eq!(input.drag().map(DragSession::ratio), Some(0.75));

        assert!(input.pointer_up());
        assert!(!input.pointer_up());
        assert_eq!(scope.listener_count(), 0);
        assert_eq!(input.pointer_move(10.0, &at), None);
    }

    #[test]
    fn volume_drag_follows_pointer() {
        let scope = PointerScope::new();
        let mut input = translator(&scope);
        let slider = ScrubSurface::new(10.0, 80.0);
        let at = status(0.0, None);

        assert_eq!(input.volume_pointer_down(50.0, slider), Some(Command::SetVolume(0.5)));
        assert!(input.is_dragging());
        assert!(!input.is_scrubbing());
        assert_eq!(scope.listener_count(), 1);

        assert_eq!(input.pointer_move(200.0, &at), Some(Command::SetVolume(1.0)));
        assert_eq!(input.drag().map(DragSession::target), Some(DragTarget::Volume));

        assert!(input.pointer_up());
        assert_eq!(input.pointer_move(10.0, &at), None);
        assert_eq!(scope.listener_count(), 0);
    }

    #[test]
    fn drop_releases_listener() {
        let scope = PointerScope::new();
        {
            let mut input = translator(&scope);
            input.pointer_down(5.0, ScrubSurface::new(0.0, 10.0), &status(0.0, Some(1.0)));
            assert_eq!(scope.listener_count(), 1);
        }
        assert_eq!(scope.listener_count(), 0);
    }
}
