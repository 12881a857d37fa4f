//! Derived visual state of the custom controls.
//!
//! Every field except the error overlay, slider position and drag flag is a
//! pure function of the latest [`PlaybackStatus`]. Rendering reads this
//! structure and never writes back.

use crate::delegate::{ErrorCode, PlaybackStatus};

/// Icon shown on the play/pause button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayPauseIcon {
    #[default]
    ShowPlay,
    ShowPause,
}

impl PlayPauseIcon {
    pub fn from_status(status: &PlaybackStatus) -> Self {
        if status.paused {
            PlayPauseIcon::ShowPlay
        } else {
            PlayPauseIcon::ShowPause
        }
    }

    /// Accessible label of the button in this state.
    pub fn label(self) -> &'static str {
        match self {
            PlayPauseIcon::ShowPlay => "Play",
            PlayPauseIcon::ShowPause => "Pause",
        }
    }
}

/// Icon shown on the volume/mute button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VolumeIcon {
    #[default]
    ShowVolume,
    ShowMute,
}

impl VolumeIcon {
    pub fn from_status(status: &PlaybackStatus) -> Self {
        if status.is_silent() {
            VolumeIcon::ShowMute
        } else {
            VolumeIcon::ShowVolume
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VolumeIcon::ShowVolume => "Mute",
            VolumeIcon::ShowMute => "Unmute",
        }
    }
}

/// Accessible description of the scrub surface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressAria {
    /// Rounded percentage, `0..=100`.
    pub value_now: u8,
    /// `"m:ss of m:ss"`, absent while the duration is unknown.
    pub value_text: Option<String>,
}

impl ProgressAria {
    pub const LABEL: &'static str = "Video progress";

    pub fn from_status(status: &PlaybackStatus) -> Self {
        let Some(duration) = status.known_duration() else {
            return Self::default();
        };
        let percent = progress_percent(status).round() as u8;
        Self {
            value_now: percent,
            value_text: Some(format!(
                "{} of {}",
                format_clock(status.current_time),
                format_clock(duration)
            )),
        }
    }
}

/// Error banner over the video.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorOverlay {
    pub visible: bool,
    /// Code of the error on screen, `None` when the primitive gave none.
    pub code: Option<ErrorCode>,
    pub message: &'static str,
}

/// Complete derived state of the control surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlState {
    pub play_pause: PlayPauseIcon,
    pub volume: VolumeIcon,
    /// Fill of the progress bar, `0.0..=100.0`.
    pub progress: f64,
    pub aria: ProgressAria,
    pub error: ErrorOverlay,
    /// Position of the volume slider, `0.0..=1.0`.
    pub volume_slider: f64,
    /// Whether the custom control surface is shown at all.
    pub controls_visible: bool,
    /// Whether a scrub drag is in progress.
    pub dragging: bool,
    /// Poster image of the current source.
    pub poster: Option<String>,
    /// Poster is drawn over the video until playback first moves.
    pub poster_visible: bool,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            play_pause: PlayPauseIcon::default(),
            volume: VolumeIcon::default(),
            progress: 0.0,
            aria: ProgressAria::default(),
            error: ErrorOverlay {
                visible: false,
                code: None,
                message: error_message(None),
            },
            volume_slider: 1.0,
            controls_visible: true,
            dragging: false,
            poster: None,
            poster_visible: false,
        }
    }
}

impl ControlState {
    /// Recompute every status-derived control from `status`.
    pub fn reflect(&mut self, status: &PlaybackStatus) {
        self.play_pause = PlayPauseIcon::from_status(status);
        self.volume = VolumeIcon::from_status(status);
        self.progress = progress_percent(status);
        self.aria = ProgressAria::from_status(status);
        self.poster_visible =
            self.poster.is_some() && status.paused && status.current_time == 0.0;
    }

    /// Show the overlay for `code`. Returns `false` when the same error is
    /// already on screen, so one occurrence is only reported once. A
    /// different code replaces the message.
    pub fn show_error(&mut self, code: Option<ErrorCode>) -> bool {
        if self.error.visible && self.error.code == code {
            return false;
        }
        self.error = ErrorOverlay {
            visible: true,
            code,
            message: error_message(code),
        };
        true
    }

    pub fn hide_error(&mut self) {
        self.error.visible = false;
    }
}

/// Progress as a percentage of the duration, clamped to `[0, 100]`.
/// Zero while the duration is unknown.
pub fn progress_percent(status: &PlaybackStatus) -> f64 {
    match status.known_duration() {
        Some(duration) => (status.current_time / duration * 100.0).clamp(0.0, 100.0),
        None => 0.0,
    }
}

/// Human-readable message for the error overlay.
pub fn error_message(code: Option<ErrorCode>) -> &'static str {
    match code {
        Some(ErrorCode::Aborted) => "playback was aborted",
        Some(ErrorCode::Network) => "network error while loading",
        Some(ErrorCode::Decode) => "could not be decoded",
        Some(ErrorCode::Unsupported) => "format not supported",
        Some(ErrorCode::Unknown) | None => "could not be loaded",
    }
}

/// Format seconds as `m:ss`. Minutes are not wrapped into hours.
pub fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
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

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(0.0), "0:00");
        assert_eq!(format_clock(30.4), "0:30");
        assert_eq!(format_clock(120.0), "2:00");
        assert_eq!(format_clock(3725.9), "62:05");
        assert_eq!(format_clock(f64::NAN), "0:00");
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(progress_percent(&status(30.0, Some(120.0))), 25.0);
        assert_eq!(progress_percent(&status(500.0, Some(120.0))), 100.0);
        assert_eq!(progress_percent(&status(30.0, None)), 0.0);
        assert_eq!(progress_percent(&status(30.0, Some(0.0))), 0.0);
        assert_eq!(progress_percent(&status(30.0, Some(f64::INFINITY))), 0.0);
    }

    #[test]
    fn aria_describes_progress() {
        let aria = ProgressAria::from_status(&status(30.0, Some(120.0)));
        assert_eq!(aria.value_now, 25);
        assert_eq!(aria.value_text.as_deref(), Some("0:30 of 2:00"));

        assert_eq!(ProgressAria::from_status(&status(5.0, None)), ProgressAria::default());
    }

    #[test]
    fn icons_follow_status() {
        let mut state = ControlState::default();
        assert_eq!(state.play_pause, PlayPauseIcon::ShowPlay);

        state.reflect(&PlaybackStatus {
            paused: false,
            volume: 0.0,
            ..PlaybackStatus::default()
        });
        assert_eq!(state.play_pause, PlayPauseIcon::ShowPause);
        assert_eq!(state.volume, VolumeIcon::ShowMute);
        assert_eq!(state.volume.label(), "Unmute");
    }

    #[test]
    fn poster_shows_until_playback_moves() {
        let mut state = ControlState {
            poster: Some("still.png".into()),
            ..ControlState::default()
        };
        state.reflect(&status(0.0, Some(10.0)));
        assert!(state.poster_visible);

        state.reflect(&status(0.5, Some(10.0)));
        assert!(!state.poster_visible);

        state.poster = None;
        state.reflect(&status(0.0, Some(10.0)));
        assert!(!state.poster_visible);
    }

    #[test]
    fn error_overlay_latches() {
        let mut state = ControlState::default();
        assert!(state.show_error(Some(ErrorCode::Network)));
        assert!(!state.show_error(Some(ErrorCode::Network)));
        assert_eq!(state.error.message, "network error while loading");

        assert!(state.show_error(Some(ErrorCode::Decode)));
        assert_eq!(state.error.code, Some(ErrorCode::Decode));
        assert_eq!(state.error.message, "could not be decoded");

        state.hide_error();
        assert!(state.show_error(None));
        assert_eq!(state.error.message, "could not be loaded");
    }
}
