mod common;

use common::{FakeDelegate, fail_with, set_position, widget};
use gpui_video_widget::{
    Configuration, ErrorCode, FrameworkAdapter, HostCallbacks, MediaEvent, TimeUpdate,
};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct Calls {
    updates: Vec<TimeUpdate>,
    ended: usize,
    errors: Vec<ErrorCode>,
}

fn recording_callbacks(calls: &Arc<Mutex<Calls>>) -> HostCallbacks {
    let updates = Arc::clone(calls);
    let ended = Arc::clone(calls);
    let errors = Arc::clone(calls);
    HostCallbacks::new()
        .on_time_update(move |update| updates.lock().updates.push(update))
        .on_ended(move || ended.lock().ended += 1)
        .on_error(move |code| errors.lock().errors.push(code))
}

#[test]
fn forwards_notifications_while_mounted() {
    let (widget, _) = widget(FakeDelegate::new());
    let calls = Arc::new(Mutex::new(Calls::default()));
    let mut adapter = FrameworkAdapter::new(recording_callbacks(&calls));
    adapter.mount(&widget);

    set_position(&widget, 30.0, 120.0);
    widget.handle_media_event(MediaEvent::TimeUpdate);
    widget.handle_media_event(MediaEvent::Ended);
    fail_with(&widget, ErrorCode::Aborted);
    widget.handle_media_event(MediaEvent::Error);

    let calls = calls.lock();
    assert_eq!(
        calls.updates,
        vec![TimeUpdate {
            current_time_seconds: 30.0,
            duration_seconds: Some(120.0),
        }]
    );
    assert_eq!(calls.ended, 1);
    assert_eq!(calls.errors, vec![ErrorCode::Aborted]);
}

#[test]
fn mounting_twice_does_not_duplicate_callbacks() {
    let (widget, _) = widget(FakeDelegate::new());
    let calls = Arc::new(Mutex::new(Calls::default()));
    let mut adapter = FrameworkAdapter::new(recording_callbacks(&calls));

    adapter.mount(&widget);
    adapter.mount(&widget);
    assert_eq!(widget.listener_count(), 3);

    widget.handle_media_event(MediaEvent::Ended);
    assert_eq!(calls.lock().ended, 1);
}

#[test]
fn nothing_fires_after_unmount() {
    let (widget, _) = widget(FakeDelegate::new());
    let calls = Arc::new(Mutex::new(Calls::default()));
    let mut adapter = FrameworkAdapter::new(recording_callbacks(&calls));

    adapter.mount(&widget);
    adapter.unmount();
    assert!(!adapter.is_mounted());
    assert_eq!(widget.listener_count(), 0);

    widget.handle_media_event(MediaEvent::TimeUpdate);
    widget.handle_media_event(MediaEvent::Ended);
    let calls = calls.lock();
    assert!(calls.updates.is_empty());
    assert_eq!(calls.ended, 0);
}

#[test]
fn remount_after_unmount_subscribes_once() {
    let (widget, _) = widget(FakeDelegate::new());
    let calls = Arc::new(Mutex::new(Calls::default()));
    let mut adapter = FrameworkAdapter::new(recording_callbacks(&calls));

    adapter.mount(&widget);
    adapter.unmount();
    adapter.mount(&widget);

    widget.handle_media_event(MediaEvent::TimeUpdate);
    assert_eq!(calls.lock().updates.len(), 1);
}

#[test]
fn mounting_another_widget_moves_the_subscriptions() {
    let (first, _) = widget(FakeDelegate::new());
    let (second, _) = widget(FakeDelegate::new());
    let calls = Arc::new(Mutex::new(Calls::default()));
    let mut adapter = FrameworkAdapter::new(recording_callbacks(&calls));

    adapter.mount(&first);
    adapter.mount(&second);
    assert_eq!(first.listener_count(), 0);
    assert_eq!(second.listener_count(), 3);

    first.handle_media_event(MediaEvent::Ended);
    second.handle_media_event(MediaEvent::Ended);
    assert_eq!(calls.lock().ended, 1);
}

#[test]
fn dropping_the_adapter_unsubscribes() {
    let (widget, _) = widget(FakeDelegate::new());
    {
        let mut adapter = FrameworkAdapter::new(HostCallbacks::new().on_ended(|| {}));
        adapter.mount(&widget);
        assert_eq!(widget.listener_count(), 1);
    }
    assert_eq!(widget.listener_count(), 0);
}

#[test]
fn replacing_callbacks_resubscribes() {
    let (widget, _) = widget(FakeDelegate::new());
    let old = Arc::new(Mutex::new(Calls::default()));
    let new = Arc::new(Mutex::new(Calls::default()));
    let mut adapter = FrameworkAdapter::new(recording_callbacks(&old));

    adapter.mount(&widget);
    adapter.set_callbacks(recording_callbacks(&new));
    widget.handle_media_event(MediaEvent::Ended);

    assert_eq!(old.lock().ended, 0);
    assert_eq!(new.lock().ended, 1);
    assert_eq!(widget.listener_count(), 3);
}

#[test]
fn methods_forward_to_the_widget() {
    let (widget, _) = widget(FakeDelegate::with_duration(90.0));
    let mut adapter = FrameworkAdapter::new(HostCallbacks::new());

    adapter.play();
    assert!(widget.status().paused);

    adapter.mount(&widget);
    widget.apply_configuration(&Configuration::new("a.mp4"));
    set_position(&widget, 0.0, 90.0);

    adapter.play();
    assert!(!widget.status().paused);
    adapter.seek_to(45.0);
    assert_eq!(widget.status().current_time, 45.0);
    adapter.set_volume(2.0);
    assert_eq!(widget.status().volume, 1.0);
    adapter.toggle_mute();
    assert!(widget.status().muted);
    adapter.pause();
    assert!(widget.status().paused);
}
