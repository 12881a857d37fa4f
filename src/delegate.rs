use crate::Error;
use crate::config::Configuration;
use std::fmt;

/// Volume restored when unmuting a primitive whose volume sits at zero.
pub const DEFAULT_AUDIBLE_VOLUME: f64 = 0.5;

/// Extension to MIME type table used when no explicit type is configured.
const MIME_TYPES: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("ogg", "video/ogg"),
    ("mov", "video/quicktime"),
];

/// Failure reported by the playback primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Fetching was aborted on request.
    Aborted,
    /// A network failure interrupted loading.
    Network,
    /// The resource was fetched but could not be decoded.
    Decode,
    /// The resource or its format is not supported.
    Unsupported,
    /// The primitive failed without a recognisable cause.
    Unknown,
}

impl ErrorCode {
    /// Map the numeric `MediaError` codes (1 through 4) used by media elements.
    pub fn from_media_error_code(code: u16) -> Self {
        match code {
            1 => ErrorCode::Aborted,
            2 => ErrorCode::Network,
            3 => ErrorCode::Decode,
            4 => ErrorCode::Unsupported,
            _ => ErrorCode::Unknown,
        }
    }

    /// Wire name carried by the `playback-error` notification.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Aborted => "aborted",
            ErrorCode::Network => "network",
            ErrorCode::Decode => "decode",
            ErrorCode::Unsupported => "unsupported",
            ErrorCode::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the primitive's playback state.
///
/// Always read fresh from the delegate; the widget never stores its own copy
/// as a source of truth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackStatus {
    pub paused: bool,
    pub current_time: f64,
    /// `None` while the primitive does not know the duration yet.
    pub duration: Option<f64>,
    pub volume: f64,
    pub muted: bool,
    pub error: Option<ErrorCode>,
}

impl Default for PlaybackStatus {
    fn default() -> Self {
        Self {
            paused: true,
            current_time: 0.0,
            duration: None,
            volume: 1.0,
            muted: false,
            error: None,
        }
    }
}

impl PlaybackStatus {
    /// Duration usable for ratio math: finite and strictly positive.
    pub fn known_duration(&self) -> Option<f64> {
        self.duration.filter(|d| d.is_finite() && *d > 0.0)
    }

    /// Whether the audio is silent, either muted or at zero volume.
    pub fn is_silent(&self) -> bool {
        self.muted || self.volume == 0.0
    }
}

/// Lifecycle notifications raised by the playback primitive.
///
/// Events carry no payload; handlers read the current [`PlaybackStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaEvent {
    Play,
    Pause,
    TimeUpdate,
    DurationChange,
    VolumeChange,
    Ended,
    Error,
}

/// The trusted playback primitive the widget orchestrates.
///
/// Implementations decode and render; the widget only issues commands and
/// reads back [`PlaybackStatus`]. Setters are infallible from the widget's
/// point of view: a primitive that fails to honour one reports it through
/// [`MediaEvent::Error`].
pub trait PlaybackDelegate {
    /// Detach every previously attached source.
    fn clear_source(&mut self);
    /// Attach a source. `mime_type` is `None` when the primitive should sniff.
    fn attach_source(&mut self, url: &str, mime_type: Option<&str>);
    fn set_poster(&mut self, poster: Option<&str>);
    fn set_autoplay(&mut self, autoplay: bool);
    fn set_native_controls(&mut self, visible: bool);
    fn set_looping(&mut self, looping: bool);
    fn set_muted(&mut self, muted: bool);
    fn set_volume(&mut self, volume: f64);
    /// Move the playhead. Primitives clamp to their own seekable range.
    fn set_current_time(&mut self, seconds: f64);
    /// (Re)load the attached resource with the current configuration.
    fn load(&mut self);
    fn play(&mut self) -> Result<(), Error>;
    fn pause(&mut self);
    fn status(&self) -> PlaybackStatus;

    /// Events raised since the last poll, for primitives that are polled
    /// rather than pushing into [`VideoWidget::handle_media_event`].
    ///
    /// [`VideoWidget::handle_media_event`]: crate::VideoWidget::handle_media_event
    fn poll_events(&mut self) -> Vec<MediaEvent> {
        Vec::new()
    }
}

/// Infer a MIME type from the extension of `source`.
///
/// Query strings and fragments are ignored, and the extension is compared
/// case-insensitively. Unknown extensions yield `None` so the primitive can
/// sniff the content itself.
pub fn infer_mime_type(source: &str) -> Option<&'static str> {
    let path = match url::Url::parse(source) {
        Ok(url) => url.path().to_owned(),
        Err(_) => source
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_owned(),
    };
    let file = path.rsplit('/').next().unwrap_or_default();
    let (_, extension) = file.rsplit_once('.')?;
    MIME_TYPES
        .iter()
        .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
        .map(|(_, mime)| *mime)
}

/// Resolve the MIME type to attach: an explicit, non-empty type wins over
/// inference.
pub fn resolve_mime_type(source: &str, explicit: Option<&str>) -> Option<String> {
    match explicit.map(str::trim).filter(|t| !t.is_empty()) {
        Some(mime) => Some(mime.to_owned()),
        None => infer_mime_type(source).map(str::to_owned),
    }
}

/// Thin command layer over a [`PlaybackDelegate`].
///
/// Every command funnels through here so invalid input is rejected in one
/// place and `play()` failures never escape.
#[derive(Debug)]
pub struct DelegateBinding<D> {
    delegate: D,
}

impl<D: PlaybackDelegate> DelegateBinding<D> {
    pub fn new(delegate: D) -> Self {
        Self { delegate }
    }

    /// Get a reference to the underlying primitive.
    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    /// Get a mutable reference to the underlying primitive.
    pub fn delegate_mut(&mut self) -> &mut D {
        &mut self.delegate
    }

    pub fn status(&self) -> PlaybackStatus {
        self.delegate.status()
    }

    /// Push a configuration record into the primitive.
    ///
    /// When a source is present the previous one is cleared first, so
    /// sources never accumulate. Loading is left to the caller.
    pub fn apply_configuration(&mut self, config: &Configuration) {
        if let Some(source) = config.source.as_deref() {
            let mime = resolve_mime_type(source, config.mime_type.as_deref());
            self.delegate.clear_source();
            self.delegate.attach_source(source, mime.as_deref());
            log::debug!("attached source {source} ({})", mime.as_deref().unwrap_or("sniffed"));
        }

        self.delegate.set_poster(config.poster.as_deref());
        self.delegate.set_autoplay(config.autoplay);
        self.delegate.set_native_controls(config.native_controls);
        self.delegate.set_muted(config.muted);
        self.delegate.set_looping(config.looping);
    }

    pub fn load(&mut self) {
        self.delegate.load();
    }

    /// Start playback. Returns whether the primitive accepted the request;
    /// a rejection is logged and absorbed.
    pub fn play(&mut self) -> bool {
        match self.delegate.play() {
            Ok(()) => true,
            Err(err) => {
                log::error!("Error playing video: {err}");
                false
            }
        }
    }

    pub fn pause(&mut self) {
        self.delegate.pause();
    }

    /// Play when paused, pause otherwise.
    pub fn toggle_play(&mut self) {
        if self.delegate.status().paused {
            self.play();
        } else {
            self.pause();
        }
    }

    /// Seek to `seconds`. Non-finite targets are rejected silently.
    pub fn seek(&mut self, seconds: f64) -> bool {
        if !seconds.is_finite() {
            log::trace!("rejected seek to {seconds}");
            return false;
        }
        self.delegate.set_current_time(seconds);
        true
    }

    /// Set the volume, clamped into `[0, 1]`. Zero implies muted; `NaN` is
    /// ignored.
    pub fn set_volume(&mut self, volume: f64) -> bool {
        if volume.is_nan() {
            log::trace!("rejected volume {volume}");
            return false;
        }
        let volume = volume.clamp(0.0, 1.0);
        self.delegate.set_volume(volume);
        self.delegate.set_muted(volume == 0.0);
        true
    }

    /// Flip the mute flag and return the new state. Unmuting at zero volume
    /// restores [`DEFAULT_AUDIBLE_VOLUME`].
    pub fn toggle_mute(&mut self) -> bool {
        let muted = !self.delegate.status().muted;
        self.delegate.set_muted(muted);
        if !muted && self.delegate.status().volume == 0.0 {
            self.delegate.set_volume(DEFAULT_AUDIBLE_VOLUME);
        }
        muted
    }
}
