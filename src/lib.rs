//! # GPUI Video Widget
//!
//! The state machine behind an accessible video widget: custom controls that
//! always mirror a native playback primitive, input translation, and typed
//! notifications for the host.
//!
//! ## Features
//!
//! - Pluggable playback primitive through [`PlaybackDelegate`]
//! - Derived control state (play/pause, volume, progress, error overlay)
//! - Pointer scrubbing with drag tracking beyond the widget
//! - Keyboard control of every focusable control
//! - Configuration sync with MIME type inference
//! - `time-update`, `ended` and `playback-error` notifications
//! - `gstreamer` feature: a GStreamer `playbin` delegate
//! - `gpui` feature: a GPUI view rendering the controls
//!
//! ## Example
//!
//! ```rust,ignore
//! use gpui_video_widget::{Configuration, HostCallbacks, FrameworkAdapter, PointerScope, VideoWidget};
//!
//! let scope = PointerScope::new();
//! let widget = VideoWidget::new(my_delegate, scope.clone());
//! widget.apply_configuration(&Configuration::new("movie.mp4").muted(true));
//!
//! let mut adapter = FrameworkAdapter::new(
//!     HostCallbacks::new().on_time_update(|t| println!("{}s", t.current_time_seconds)),
//! );
//! adapter.mount(&widget);
//! adapter.play();
//! ```

mod adapter;
mod config;
mod delegate;
mod error;
mod input;
mod notify;
mod reflector;
#[cfg(feature = "gstreamer")]
mod video;
#[cfg(feature = "gpui")]
mod video_player;
mod widget;

pub use adapter::{EndedCallback, ErrorCallback, FrameworkAdapter, HostCallbacks, TimeUpdateCallback};
pub use config::{ConfigSync, Configuration, PlaybackSession, SyncOutcome};
pub use delegate::{
    DEFAULT_AUDIBLE_VOLUME, DelegateBinding, ErrorCode, MediaEvent, PlaybackDelegate,
    PlaybackStatus, infer_mime_type, resolve_mime_type,
};
pub use error::Error;
pub use input::{
    Command, ControlTarget, DragSession, DragTarget, GlobalPointer, GlobalPointerHandler,
    InputTranslator, Key, KeyDisposition, ListenerToken, PointerScope, ScrubSurface, WideScope,
};
pub use notify::{Emitter, Listener, Notification, NotificationKind, SubscriptionId, TimeUpdate};
pub use reflector::{
    ControlState, ErrorOverlay, PlayPauseIcon, ProgressAria, VolumeIcon, error_message,
    format_clock, progress_percent,
};
#[cfg(feature = "gstreamer")]
pub use video::Video;
#[cfg(feature = "gpui")]
pub use video_player::{VideoPlayerEvent, VideoPlayerView};
pub use widget::{VideoWidget, WidgetId};

// Re-export commonly used types
pub use url::Url;
#[cfg(feature = "gstreamer")]
pub use gstreamer as gst;
