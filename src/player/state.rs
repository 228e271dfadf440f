use crate::clips::registry::ClipId;

/// Whether the timeline is advancing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaybackState {
    /// No clip active.
    #[default]
    Idle,
    /// The active clip is advancing.
    Playing,
    /// The active clip holds its position.
    Paused,
}

/// Whether a recording session is running.
///
/// Orthogonal to [`PlaybackState`]: pausing or stopping playback leaves capture untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureState {
    /// No recording has been started.
    #[default]
    Idle,
    /// Frames and audio are being captured.
    Recording,
    /// The last recording was finalized.
    Stopped,
}

/// What initiated a call that may need to start audio output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayOrigin {
    /// Direct user interaction (click, key press, CLI invocation).
    UserGesture,
    /// Started by code without a user gesture.
    Programmatic,
}

/// Policy governing whether audio output may start without a user gesture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutoplayPolicy {
    /// Audio may start from any origin.
    #[default]
    Allowed,
    /// The first resume must come from a user gesture.
    RequireGesture,
}

impl AutoplayPolicy {
    /// Return `true` when `origin` may unlock audio output under this policy.
    pub fn permits(self, origin: PlayOrigin) -> bool {
        match self {
            AutoplayPolicy::Allowed => true,
            AutoplayPolicy::RequireGesture => origin == PlayOrigin::UserGesture,
        }
    }
}

/// Notifications produced by the controller, drained with `PlaybackController::drain_events`.
#[derive(Clone, Debug, PartialEq)]
pub enum ControllerEvent {
    /// A new clip became active.
    ClipChanged {
        /// Index of the new clip in the registry.
        index: usize,
        /// Identity of the new clip.
        id: ClipId,
    },
    /// The last clip ended and playback went idle.
    PlaybackCompleted,
    /// A recording was finalized and handed to the saver.
    RecordingSaved {
        /// Name the blob was saved under.
        file_name: String,
        /// Size of the saved blob.
        bytes: usize,
    },
    /// Finalizing or saving a recording failed.
    RecordingFailed {
        /// Human-readable failure.
        reason: String,
    },
}

#[cfg(test)]
#[path = "../../tests/unit/player/state.rs"]
mod tests;
