use crate::delegate::{DelegateBinding, PlaybackDelegate, resolve_mime_type};
use crate::reflector::ControlState;

/// Declarative configuration of the widget.
///
/// Compared by value: applying an equal record twice is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    /// Media resource to load.
    pub source: Option<String>,
    /// Overrides extension-based MIME inference.
    pub mime_type: Option<String>,
    /// Preview image shown before playback.
    pub poster: Option<String>,
    /// Attempt playback as soon as the resource loads.
    pub autoplay: bool,
    /// Defer to the primitive's own chrome instead of the custom controls.
    pub native_controls: bool,
    /// Initial mute state.
    pub muted: bool,
    /// Restart automatically on completion.
    pub looping: bool,
}

impl Configuration {
    pub fn new(source: impl Into<String>) -> Self {
        Self::default().with_source(source)
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_poster(mut self, poster: impl Into<String>) -> Self {
        self.poster = Some(poster.into());
        self
    }

    pub fn autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    pub fn native_controls(mut self, visible: bool) -> Self {
        self.native_controls = visible;
        self
    }

    pub fn muted(mut self, muted: bool) -> Self {
        self.muted = muted;
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Build a record from serialized attributes.
    ///
    /// `src`, `type` and `poster` carry values. `autoplay`, `controls`,
    /// `muted` and `loop` are presence flags: any value, empty included,
    /// turns them on. Unknown attributes are ignored.
    pub fn from_attributes<I, K, V>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Self::default();
        for (name, value) in attributes {
            match name.as_ref() {
                "src" => config.source = Some(value.into()),
                "type" => config.mime_type = Some(value.into()),
                "poster" => config.poster = Some(value.into()),
                "autoplay" => config.autoplay = true,
                "controls" => config.native_controls = true,
                "muted" => config.muted = true,
                "loop" => config.looping = true,
                other => log::trace!("ignoring attribute {other}"),
            }
        }
        config
    }

    /// Whether the custom control surface should be shown.
    pub fn custom_controls_visible(&self) -> bool {
        !self.native_controls
    }
}

/// The live binding between a widget and one media resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSession {
    /// Increments every time the session is replaced.
    pub generation: u64,
    pub source: Option<String>,
    /// Resolved type, explicit or inferred.
    pub mime_type: Option<String>,
    pub poster: Option<String>,
    pub autoplay: bool,
    pub looping: bool,
    pub native_controls: bool,
    pub muted: bool,
}

impl PlaybackSession {
    fn from_config(generation: u64, config: &Configuration) -> Self {
        let mime_type = config
            .source
            .as_deref()
            .and_then(|source| resolve_mime_type(source, config.mime_type.as_deref()));
        Self {
            generation,
            source: config.source.clone(),
            mime_type,
            poster: config.poster.clone(),
            autoplay: config.autoplay,
            looping: config.looping,
            native_controls: config.native_controls,
            muted: config.muted,
        }
    }

    fn same_resource(&self, other: &PlaybackSession) -> bool {
        self.source == other.source && self.mime_type == other.mime_type
    }
}

/// Result of a configuration sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The record matched the last applied one; nothing was touched.
    Unchanged,
    /// Flags changed on the existing session.
    Updated,
    /// The source changed and a new session replaced the old one.
    Replaced,
}

/// Reconciles declarative configuration into the delegate and the controls.
#[derive(Debug, Default)]
pub struct ConfigSync {
    applied: Option<Configuration>,
    session: Option<PlaybackSession>,
}

impl ConfigSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last applied record.
    pub fn configuration(&self) -> Option<&Configuration> {
        self.applied.as_ref()
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    /// Apply `config` if it differs from the last applied record.
    ///
    /// Steps run in a fixed order and all complete before the delegate is
    /// asked to load: hide the error overlay, attach the source, apply the
    /// flags, sync the volume slider, toggle the custom controls, load.
    pub fn apply<D: PlaybackDelegate>(
        &mut self,
        config: &Configuration,
        binding: &mut DelegateBinding<D>,
        controls: &mut ControlState,
    ) -> SyncOutcome {
        if self.applied.as_ref() == Some(config) {
            return SyncOutcome::Unchanged;
        }

        controls.hide_error();
        binding.apply_configuration(config);
        controls.poster = config.poster.clone();
        if config.muted {
            controls.volume_slider = 0.0;
        }
        controls.controls_visible = config.custom_controls_visible();
        binding.load();

        let outcome = self.replace_session(config);
        self.applied = Some(config.clone());
        controls.reflect(&binding.status());
        outcome
    }

    fn replace_session(&mut self, config: &Configuration) -> SyncOutcome {
        let generation = self.session.as_ref().map_or(0, |s| s.generation);
        let next = PlaybackSession::from_config(generation, config);
        match self.session.as_mut() {
            Some(current) if current.same_resource(&next) => {
                *current = next;
                SyncOutcome::Updated
            }
            _ => {
                let generation = generation + 1;
                log::debug!(
                    "playback session {generation} for {}",
                    config.source.as_deref().unwrap_or("<none>")
                );
                self.session = Some(PlaybackSession { generation, ..next });
                SyncOutcome::Replaced
            }
        }
    }
}
