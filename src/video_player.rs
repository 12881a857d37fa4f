use crate::delegate::{ErrorCode, PlaybackDelegate};
use crate::input::{ControlTarget, GlobalPointer, Key, PointerScope, ScrubSurface};
use crate::notify::{Notification, SubscriptionId, TimeUpdate};
use crate::reflector::{ControlState, format_clock};
use crate::widget::VideoWidget;
use gpui::{
    Bounds, Canvas, ClickEvent, Context, DispatchPhase, Div, EventEmitter, FocusHandle,
    ImageSource, KeyDownEvent, MouseButton, MouseDownEvent, MouseMoveEvent, MouseUpEvent, Pixels,
    Render, SharedString, Stateful, Window, canvas, div, img, prelude::*, px, relative, rgb, rgba,
};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Events emitted by [`VideoPlayerView`], mirroring the widget's notifications.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VideoPlayerEvent {
    TimeUpdate(TimeUpdate),
    Ended,
    Error(ErrorCode),
}

impl From<Notification> for VideoPlayerEvent {
    fn from(notification: Notification) -> Self {
        match notification {
            Notification::TimeUpdate(update) => VideoPlayerEvent::TimeUpdate(update),
            Notification::Ended => VideoPlayerEvent::Ended,
            Notification::PlaybackError { error_code } => VideoPlayerEvent::Error(error_code),
        }
    }
}

/// GPUI view drawing the custom controls of a [`VideoWidget`].
///
/// The view owns the window's [`PointerScope`]: while a drag is active,
/// every mouse move and left-button release the window sees is dispatched
/// there, whichever element is under the pointer.
pub struct VideoPlayerView<D> {
    widget: VideoWidget<D>,
    scope: PointerScope,
    inbox: Arc<Mutex<Vec<Notification>>>,
    subscription: SubscriptionId,
    scrub_bounds: Option<Bounds<Pixels>>,
    volume_bounds: Option<Bounds<Pixels>>,
    play_focus: FocusHandle,
    reset_focus: FocusHandle,
    mute_focus: FocusHandle,
    scrub_focus: FocusHandle,
}

impl<D: PlaybackDelegate + 'static> VideoPlayerView<D> {
    /// Wrap `widget`. `scope` must be the scope the widget was created with.
    pub fn new(widget: VideoWidget<D>, scope: PointerScope, cx: &mut Context<Self>) -> Self {
        let inbox: Arc<Mutex<Vec<Notification>>> = Arc::default();
        let queue = Arc::clone(&inbox);
        let subscription = widget.subscribe_all(Arc::new(move |notification: &Notification| {
            queue.lock().push(*notification);
        }));

        Self {
            widget,
            scope,
            inbox,
            subscription,
            scrub_bounds: None,
            volume_bounds: None,
            play_focus: cx.focus_handle(),
            reset_focus: cx.focus_handle(),
            mute_focus: cx.focus_handle(),
            scrub_focus: cx.focus_handle(),
        }
    }

    /// Get a reference to the widget.
    pub fn widget(&self) -> &VideoWidget<D> {
        &self.widget
    }

    /// Poll the primitive and re-emit whatever the widget raised.
    fn pump(&mut self, cx: &mut Context<Self>) {
        let events = self.widget.with_delegate(|delegate| delegate.poll_events());
        for event in events {
            self.widget.handle_media_event(event);
        }

        let notifications = std::mem::take(&mut *self.inbox.lock());
        for notification in notifications {
            cx.emit(VideoPlayerEvent::from(notification));
        }
    }

    fn scrub_surface(&self) -> Option<ScrubSurface> {
        self.scrub_bounds.map(surface)
    }

    fn on_key(&self, target: ControlTarget, event: &KeyDownEvent, cx: &mut Context<Self>) {
        let key = Key::from_name(&event.keystroke.key);
        if self.widget.key_down(target, key).prevents_default() {
            cx.stop_propagation();
            cx.notify();
        }
    }

    fn button(
        &self,
        id: &'static str,
        label: &'static str,
        target: ControlTarget,
        focus: &FocusHandle,
        cx: &mut Context<Self>,
    ) -> Stateful<Div> {
        div()
            .id(id)
            .track_focus(focus)
            .px_3()
            .py_1()
            .border_1()
            .border_color(rgb(0x666666))
            .cursor_pointer()
            .child(label)
            .on_click(cx.listener(move |this: &mut Self, _: &ClickEvent, _window, cx| {
                match target {
                    ControlTarget::PlayPause => this.widget.toggle_play(),
                    ControlTarget::Reset => this.widget.reset(),
                    ControlTarget::VolumeMute => this.widget.toggle_mute(),
                    ControlTarget::ScrubSurface => {}
                }
                cx.notify();
            }))
            .on_key_down(cx.listener(move |this: &mut Self, event: &KeyDownEvent, _window, cx| {
                this.on_key(target, event, cx);
            }))
    }

    fn scrub_bar(&self, controls: &ControlState, cx: &mut Context<Self>) -> Div {
        let view = cx.entity();
        let clock = controls
            .aria
            .value_text
            .clone()
            .unwrap_or_else(|| format_clock(self.widget.status().current_time));

        div()
            .flex()
            .flex_1()
            .items_center()
            .gap_2()
            .child(
                div()
                    .id("scrub")
                    .track_focus(&self.scrub_focus)
                    .relative()
                    .flex_1()
                    .h(px(8.))
                    .bg(rgba(0xffffff4d))
                    .cursor_pointer()
                    .child(
                        div()
                            .h_full()
                            .w(relative((controls.progress / 100.0) as f32))
                            .bg(rgb(0x4a90e2)),
                    )
                    .child(
                        canvas(
                            move |bounds, _window, cx| {
                                view.update(cx, |this, _| this.scrub_bounds = Some(bounds));
                            },
                            |_, _, _, _| {},
                        )
                        .absolute()
                        .size_full(),
                    )
                    .on_mouse_down(
                        MouseButton::Left,
                        cx.listener(|this: &mut Self, event: &MouseDownEvent, _window, cx| {
                            if let Some(surface) = this.scrub_surface() {
                                this.widget.scrub_pointer_down(x_of(event.position.x), surface);
                                cx.notify();
                            }
                        }),
                    )
                    .on_key_down(cx.listener(|this: &mut Self, event: &KeyDownEvent, _window, cx| {
                        this.on_key(ControlTarget::ScrubSurface, event, cx);
                    })),
            )
            .child(div().text_sm().child(SharedString::from(clock)))
    }

    fn volume_slider(&self, controls: &ControlState, cx: &mut Context<Self>) -> Stateful<Div> {
        let view = cx.entity();
        div()
            .id("volume")
            .relative()
            .w(px(80.))
            .h(px(6.))
            .bg(rgba(0xffffff4d))
            .cursor_pointer()
            .child(
                div()
                    .h_full()
                    .w(relative(controls.volume_slider as f32))
                    .bg(rgb(0xffffff)),
            )
            .child(
                canvas(
                    move |bounds, _window, cx| {
                        view.update(cx, |this, _| this.volume_bounds = Some(bounds));
                    },
                    |_, _, _, _| {},
                )
                .absolute()
                .size_full(),
            )
            .on_mouse_down(
                MouseButton::Left,
                cx.listener(|this: &mut Self, event: &MouseDownEvent, _window, cx| {
                    if let Some(bounds) = this.volume_bounds {
                        this.widget
                            .volume_pointer_down(x_of(event.position.x), surface(bounds));
                        cx.notify();
                    }
                }),
            )
    }

    /// Feed window-level mouse moves and releases into the scope. Registered
    /// at paint so it sees events outside every hitbox.
    fn window_pointer(&self, cx: &mut Context<Self>) -> Canvas<()> {
        let scope = self.scope.clone();
        let view = cx.entity_id();
        canvas(
            |_, _, _| {},
            move |_, _, window, _| {
                let moves = scope.clone();
                window.on_mouse_event(move |event: &MouseMoveEvent, phase, _window, cx| {
                    let x = x_of(event.position.x);
                    if phase == DispatchPhase::Bubble
                        && forward_pointer(&moves, GlobalPointer::Move { x })
                    {
                        cx.notify(view);
                    }
                });
                window.on_mouse_event(move |event: &MouseUpEvent, phase, _window, cx| {
                    if phase == DispatchPhase::Bubble
                        && event.button == MouseButton::Left
                        && forward_pointer(&scope, GlobalPointer::Up)
                    {
                        cx.notify(view);
                    }
                });
            },
        )
        .absolute()
        .size_full()
    }
}

impl<D: PlaybackDelegate + 'static> EventEmitter<VideoPlayerEvent> for VideoPlayerView<D> {}

impl<D: PlaybackDelegate + 'static> Render for VideoPlayerView<D> {
    fn render(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        self.pump(cx);

        // keep polling the primitive's bus
        window.request_animation_frame();
        let controls = self.widget.controls();

        let mut root = div()
            .id("video-widget")
            .relative()
            .size_full()
            .flex()
            .flex_col()
            .bg(rgb(0x000000))
            .text_color(rgb(0xffffff))
            .child(self.window_pointer(cx))
            .child(div().flex_1());

        if let Some(poster) = controls.poster.as_deref().filter(|_| controls.poster_visible) {
            root = root.child(img(poster_source(poster)).absolute().size_full());
        }

        if controls.error.visible {
            root = root.child(
                div()
                    .absolute()
                    .size_full()
                    .flex()
                    .flex_col()
                    .items_center()
                    .justify_center()
                    .gap_2()
                    .bg(rgba(0x000000b3))
                    .child("⚠️")
                    .child(controls.error.message),
            );
        }

        if controls.controls_visible {
            let play = self.button(
                "play-pause",
                controls.play_pause.label(),
                ControlTarget::PlayPause,
                &self.play_focus,
                cx,
            );
            let reset = self.button(
                "reset",
                "Reset",
                ControlTarget::Reset,
                &self.reset_focus,
                cx,
            );
            let mute = self.button(
                "volume-mute",
                controls.volume.label(),
                ControlTarget::VolumeMute,
                &self.mute_focus,
                cx,
            );
            let scrub = self.scrub_bar(&controls, cx);
            let volume = self.volume_slider(&controls, cx);

            root = root.child(
                div()
                    .flex()
                    .items_center()
                    .gap_3()
                    .p_2()
                    .bg(rgba(0x000000b3))
                    .child(play)
                    .child(reset)
                    .child(scrub)
                    .child(mute)
                    .child(volume),
            );
        }

        root
    }
}

impl<D> Drop for VideoPlayerView<D> {
    fn drop(&mut self) {
        self.widget.unsubscribe(self.subscription);
    }
}

/// Dispatch `event` if a drag is listening on `scope`. Returns whether it
/// was delivered.
fn forward_pointer(scope: &PointerScope, event: GlobalPointer) -> bool {
    if scope.listener_count() == 0 {
        return false;
    }
    scope.dispatch(event);
    true
}

fn poster_source(poster: &str) -> ImageSource {
    match Url::parse(poster) {
        Ok(_) => ImageSource::from(poster.to_owned()),
        Err(_) => ImageSource::from(PathBuf::from(poster)),
    }
}

fn x_of(x: Pixels) -> f64 {
    f64::from(f32::from(x))
}

fn surface(bounds: Bounds<Pixels>) -> ScrubSurface {
    ScrubSurface::new(x_of(bounds.origin.x), x_of(bounds.size.width))
}
