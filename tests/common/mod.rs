#![allow(dead_code)]

use gpui_video_widget::{
    Error, ErrorCode, Notification, PlaybackDelegate, PlaybackStatus, PointerScope, VideoWidget,
};
use parking_lot::Mutex;
use std::sync::Arc;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// In-memory playback primitive that records what the widget asked of it.
#[derive(Debug, Default)]
pub struct FakeDelegate {
    pub status: PlaybackStatus,
    /// Sources currently attached, with the type they were attached under.
    pub sources: Vec<(String, Option<String>)>,
    pub attach_calls: usize,
    pub clear_calls: usize,
    pub load_calls: usize,
    pub seeks: Vec<f64>,
    pub poster: Option<String>,
    pub autoplay: bool,
    pub native_controls: bool,
    pub looping: bool,
    /// When set, `play()` fails the way a blocked autoplay does.
    pub reject_play: bool,
}

impl FakeDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duration(duration: f64) -> Self {
        let mut fake = Self::new();
        fake.status.duration = Some(duration);
        fake
    }

    pub fn rejecting_play() -> Self {
        Self {
            reject_play: true,
            ..Self::default()
        }
    }
}

impl PlaybackDelegate for FakeDelegate {
    fn clear_source(&mut self) {
        self.clear_calls += 1;
        self.sources.clear();
    }

    fn attach_source(&mut self, url: &str, mime_type: Option<&str>) {
        self.attach_calls += 1;
        self.sources
            .push((url.to_owned(), mime_type.map(str::to_owned)));
    }

    fn set_poster(&mut self, poster: Option<&str>) {
        self.poster = poster.map(str::to_owned);
    }

    fn set_autoplay(&mut self, autoplay: bool) {
        self.autoplay = autoplay;
    }

    fn set_native_controls(&mut self, visible: bool) {
        self.native_controls = visible;
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn set_muted(&mut self, muted: bool) {
        self.status.muted = muted;
    }

    fn set_volume(&mut self, volume: f64) {
        self.status.volume = volume;
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.seeks.push(seconds);
        let upper = self.status.duration.unwrap_or(f64::INFINITY);
        self.status.current_time = seconds.clamp(0.0, upper);
    }

    fn load(&mut self) {
        self.load_calls += 1;
        self.status.error = None;
        self.status.current_time = 0.0;
        self.status.paused = !self.autoplay;
    }

    fn play(&mut self) -> Result<(), Error> {
        if self.reject_play {
            return Err(Error::PlayRejected("autoplay blocked".into()));
        }
        self.status.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.status.paused = true;
    }

    fn status(&self) -> PlaybackStatus {
        self.status
    }
}

pub fn widget(delegate: FakeDelegate) -> (VideoWidget<FakeDelegate>, PointerScope) {
    init_logger();
    let scope = PointerScope::new();
    let widget = VideoWidget::new(delegate, scope.clone());
    (widget, scope)
}

/// Put the fake at `current_time` of `duration`.
pub fn set_position(widget: &VideoWidget<FakeDelegate>, current_time: f64, duration: f64) {
    widget.with_delegate(|fake| {
        fake.status.current_time = current_time;
        fake.status.duration = Some(duration);
    });
}

pub fn fail_with(widget: &VideoWidget<FakeDelegate>, code: ErrorCode) {
    widget.with_delegate(|fake| fake.status.error = Some(code));
}

/// Collects every notification a widget emits.
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<Notification>>>);

impl Recorder {
    pub fn attach(widget: &VideoWidget<FakeDelegate>) -> Self {
        let recorder = Self::default();
        let sink = Arc::clone(&recorder.0);
        widget.subscribe_all(Arc::new(move |notification: &Notification| {
            sink.lock().push(*notification);
        }));
        recorder
    }

    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.0.lock())
    }
}
