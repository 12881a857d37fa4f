/// Errors raised by the widget and its playback primitives.
///
/// Most of these never reach the host: a rejected `play()` is logged by the
/// binding and swallowed, and primitive failures travel as
/// [`MediaEvent::Error`](crate::MediaEvent::Error) instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("playback request rejected: {0}")]
    PlayRejected(String),
    #[error("no media source attached")]
    NoSource,
    #[error("invalid media uri: {0}")]
    Uri(#[from] url::ParseError),
    #[error("media path cannot be expressed as a uri: {0}")]
    Path(String),
    #[cfg(feature = "gstreamer")]
    #[error("{0}")]
    Glib(#[from] glib::Error),
    #[cfg(feature = "gstreamer")]
    #[error("{0}")]
    Bool(#[from] glib::BoolError),
    #[cfg(feature = "gstreamer")]
    #[error("failed to change pipeline state: {0}")]
    StateChange(#[from] gstreamer::StateChangeError),
    #[cfg(feature = "gstreamer")]
    #[error("pipeline has no bus")]
    NoBus,
}
