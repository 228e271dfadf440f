//! Playback and capture control: the controller, its states and frame pacing.

/// Per-tick orchestration of clips, render, overlays, audio and capture.
pub mod controller;
/// Frame pacing for driving the controller.
pub mod scheduler;
/// Playback, capture and autoplay states plus controller events.
pub mod state;
