use crate::Error;
use crate::delegate::{ErrorCode, MediaEvent, PlaybackDelegate, PlaybackStatus};
use gstreamer as gst;
use gstreamer::prelude::*;
use std::path::Path;
use url::Url;

/// A playback primitive backed by a GStreamer `playbin`.
///
/// `playbin` decodes and renders on its own; this type only forwards
/// commands and translates bus messages into [`MediaEvent`]s. Call
/// [`Video::poll_events`] regularly (once per frame is typical) and feed the
/// result to the widget.
///
/// [`Video::poll_events`]: PlaybackDelegate::poll_events
#[derive(Debug)]
pub struct Video {
    playbin: gst::Element,
    bus: gst::Bus,
    uri: Option<Url>,
    poster: Option<String>,
    autoplay: bool,
    native_controls: bool,
    looping: bool,
    error: Option<ErrorCode>,
    last_position: Option<gst::ClockTime>,
    /// Set when the stream ended; the next `play()` starts over.
    at_end: bool,
    pending: Vec<MediaEvent>,
}

impl Drop for Video {
    fn drop(&mut self) {
        if let Err(err) = self.playbin.set_state(gst::State::Null) {
            log::error!("failed to shut down pipeline: {err}");
        }
    }
}

impl Video {
    /// Create an empty player. Attach a source through the widget's
    /// configuration.
    pub fn new() -> Result<Self, Error> {
        gst::init()?;

        let playbin = gst::ElementFactory::make("playbin")
            .name("gpui_video_widget")
            .build()?;
        let bus = playbin.bus().ok_or(Error::NoBus)?;

        Ok(Self {
            playbin,
            bus,
            uri: None,
            poster: None,
            autoplay: false,
            native_controls: false,
            looping: false,
            error: None,
            last_position: None,
            at_end: false,
            pending: Vec::new(),
        })
    }

    /// Create a player with `uri` already attached.
    pub fn from_uri(uri: &Url) -> Result<Self, Error> {
        let mut video = Self::new()?;
        video.attach_source(uri.as_str(), None);
        Ok(video)
    }

    /// Get the underlying GStreamer element.
    pub fn pipeline(&self) -> gst::Element {
        self.playbin.clone()
    }

    /// Poster configured for the current source, for the view to draw
    /// before playback starts.
    pub fn poster(&self) -> Option<&str> {
        self.poster.as_deref()
    }

    pub fn native_controls(&self) -> bool {
        self.native_controls
    }

    fn restart(&mut self) {
        let start = gst::ClockTime::ZERO;
        if let Err(err) = self.playbin.seek_simple(gst::SeekFlags::FLUSH, start) {
            log::warn!("failed to restart looping stream: {err}");
        }
    }

    /// Hold the last frame once the stream ended.
    fn finish(&mut self) {
        self.at_end = true;
        if let Err(err) = self.playbin.set_state(gst::State::Paused) {
            log::warn!("failed to pause finished stream: {err}");
        }
    }

    fn fail(&mut self, code: ErrorCode) {
        self.error = Some(code);
        self.pending.push(MediaEvent::Error);
    }
}

impl PlaybackDelegate for Video {
    fn clear_source(&mut self) {
        if let Err(err) = self.playbin.set_state(gst::State::Null) {
            log::warn!("failed to reset pipeline: {err}");
        }
        self.uri = None;
        self.error = None;
        self.last_position = None;
        self.at_end = false;
    }

    fn attach_source(&mut self, source: &str, mime_type: Option<&str>) {
        match source_uri(source) {
            Ok(uri) => {
                // playbin's typefinder sniffs the container, the type is advisory
                log::debug!("playbin uri {uri} ({})", mime_type.unwrap_or("sniffed"));
                self.playbin.set_property("uri", uri.as_str());
                self.uri = Some(uri);
            }
            Err(err) => {
                log::error!("cannot play {source}: {err}");
                self.fail(ErrorCode::Unsupported);
            }
        }
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
        self.playbin.set_property("mute", muted);
        self.pending.push(MediaEvent::VolumeChange);
    }

    fn set_volume(&mut self, volume: f64) {
        self.playbin.set_property("volume", volume);
        self.pending.push(MediaEvent::VolumeChange);
    }

    fn set_current_time(&mut self, seconds: f64) {
        let mut seconds = seconds.max(0.0);
        if let Some(duration) = self.status().duration {
            seconds = seconds.min(duration);
        }
        let position = gst::ClockTime::from_nseconds((seconds * 1e9) as u64);
        match self
            .playbin
            .seek_simple(gst::SeekFlags::FLUSH | gst::SeekFlags::ACCURATE, position)
        {
            Ok(()) => {
                self.at_end = false;
                self.pending.push(MediaEvent::TimeUpdate);
            }
            Err(err) => log::warn!("seek to {seconds}s failed: {err}"),
        }
    }

    fn load(&mut self) {
        if self.uri.is_none() {
            return;
        }
        self.error = None;
        self.last_position = None;
        self.at_end = false;
        let target = if self.autoplay {
            gst::State::Playing
        } else {
            gst::State::Paused
        };
        if let Err(err) = self.playbin.set_state(target) {
            log::error!("failed to load media: {err}");
            self.fail(ErrorCode::Unknown);
        }
    }

    fn play(&mut self) -> Result<(), Error> {
        if self.uri.is_none() {
            return Err(Error::NoSource);
        }
        if self.at_end {
            self.at_end = false;
            self.restart();
        }
        self.playbin.set_state(gst::State::Playing)?;
        Ok(())
    }

    fn pause(&mut self) {
        if let Err(err) = self.playbin.set_state(gst::State::Paused) {
            log::warn!("failed to pause: {err}");
        }
    }

    fn status(&self) -> PlaybackStatus {
        let seconds = |t: gst::ClockTime| t.nseconds() as f64 / 1e9;
        PlaybackStatus {
            paused: self.at_end || self.playbin.current_state() != gst::State::Playing,
            current_time: self
                .playbin
                .query_position::<gst::ClockTime>()
                .map_or(0.0, seconds),
            duration: self
                .playbin
                .query_duration::<gst::ClockTime>()
                .map(seconds),
            volume: self.playbin.property::<f64>("volume"),
            muted: self.playbin.property::<bool>("mute"),
            error: self.error,
        }
    }

    /// Drain bus messages and report what happened since the last poll.
    ///
    /// A changed playhead position yields one [`MediaEvent::TimeUpdate`].
    fn poll_events(&mut self) -> Vec<MediaEvent> {
        let mut events = std::mem::take(&mut self.pending);

        while let Some(msg) = self.bus.pop_filtered(&[
            gst::MessageType::Error,
            gst::MessageType::Eos,
            gst::MessageType::StateChanged,
            gst::MessageType::DurationChanged,
        ]) {
            match msg.view() {
                gst::MessageView::Error(err) => {
                    log::error!("GStreamer error: {}", err.error());
                    self.error = Some(error_code(&err.error()));
                    events.push(MediaEvent::Error);
                }
                gst::MessageView::Eos(_) => {
                    if self.looping {
                        self.restart();
                    } else {
                        self.finish();
                        events.push(MediaEvent::Ended);
                    }
                }
                gst::MessageView::StateChanged(change) => {
                    if msg.src() != Some(self.playbin.upcast_ref::<gst::Object>()) {
                        continue;
                    }
                    match (change.old(), change.current()) {
                        (_, gst::State::Playing) => events.push(MediaEvent::Play),
                        (gst::State::Playing, gst::State::Paused) => events.push(MediaEvent::Pause),
                        _ => {}
                    }
                }
                gst::MessageView::DurationChanged(_) => events.push(MediaEvent::DurationChange),
                _ => {}
            }
        }

        let position = self.playbin.query_position::<gst::ClockTime>();
        if position.is_some() && position != self.last_position {
            self.last_position = position;
            events.push(MediaEvent::TimeUpdate);
        }

        events
    }
}

/// Accept absolute URIs as-is and turn anything else into a `file://` URI.
fn source_uri(source: &str) -> Result<Url, Error> {
    match Url::parse(source) {
        Ok(uri) => return Ok(uri),
        Err(url::ParseError::RelativeUrlWithoutBase) => {}
        Err(err) => return Err(err.into()),
    }
    let path = std::path::absolute(Path::new(source)).map_err(|e| Error::Path(e.to_string()))?;
    Url::from_file_path(&path).map_err(|()| Error::Path(path.display().to_string()))
}

fn error_code(err: &glib::Error) -> ErrorCode {
    if let Some(kind) = err.kind::<gst::ResourceError>() {
        return match kind {
            gst::ResourceError::NotFound => ErrorCode::Unsupported,
            _ => ErrorCode::Network,
        };
    }
    match err.kind::<gst::StreamError>() {
        Some(gst::StreamError::Decode | gst::StreamError::Demux | gst::StreamError::Decrypt) => {
            ErrorCode::Decode
        }
        Some(
            gst::StreamError::CodecNotFound
            | gst::StreamError::TypeNotFound
            | gst::StreamError::WrongType
            | gst::StreamError::Format
            | gst::StreamError::NotImplemented
            | gst::StreamError::DecryptNokey,
        ) => ErrorCode::Unsupported,
        _ => ErrorCode::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn end_of_stream(video: &Video) {
        let eos = gst::message::Eos::builder().src(&video.playbin).build();
        video.bus.post(eos).expect("bus accepts messages");
    }

    #[test]
    fn relative_paths_become_file_uris() {
        let uri = source_uri("clips/a.mp4").expect("path converts");
        assert_eq!(uri.scheme(), "file");
        assert!(uri.path().ends_with("/clips/a.mp4"));

        let remote = source_uri("https://cdn.test/a.mp4").expect("uri parses");
        assert_eq!(remote.host_str(), Some("cdn.test"));
    }

    #[test]
    fn malformed_uris_are_reported() {
        assert!(matches!(source_uri("http://[::1"), Err(Error::Uri(_))));
    }

    #[test]
    fn ended_stream_reports_paused() {
        let mut video = Video::new().expect("playbin available");
        end_of_stream(&video);

        let events = video.poll_events();
        assert!(events.contains(&MediaEvent::Ended));
        assert!(video.at_end);
        assert!(video.status().paused);
    }

    #[test]
    fn looping_stream_does_not_end() {
        let mut video = Video::new().expect("playbin available");
        video.set_looping(true);
        end_of_stream(&video);

        assert!(!video.poll_events().contains(&MediaEvent::Ended));
        assert!(!video.at_end);
    }
}
