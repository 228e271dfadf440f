/// Convenience result type used across reelcast.
pub type ReelResult<T> = Result<T, ReelError>;

/// Top-level error taxonomy used by player, render and capture APIs.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// Invalid user-provided configuration or registry data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while probing, decoding or controlling a media source.
    #[error("media error: {0}")]
    Media(String),

    /// Playback start was rejected because no user gesture has unlocked audio yet.
    #[error("autoplay blocked: {0}")]
    AutoplayBlocked(String),

    /// Errors raised by a recorder while starting, encoding or finalizing.
    #[error("recorder error: {0}")]
    Recorder(String),

    /// No recording profile could be negotiated with the recorder.
    #[error("unsupported recording profile: {0}")]
    UnsupportedProfile(String),

    /// Errors while compositing a frame.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelError::Media`] value.
    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }

    /// Build a [`ReelError::AutoplayBlocked`] value.
    pub fn autoplay_blocked(msg: impl Into<String>) -> Self {
        Self::AutoplayBlocked(msg.into())
    }

    /// Build a [`ReelError::Recorder`] value.
    pub fn recorder(msg: impl Into<String>) -> Self {
        Self::Recorder(msg.into())
    }

    /// Build a [`ReelError::UnsupportedProfile`] value.
    pub fn unsupported_profile(msg: impl Into<String>) -> Self {
        Self::UnsupportedProfile(msg.into())
    }

    /// Build a [`ReelError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`ReelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
