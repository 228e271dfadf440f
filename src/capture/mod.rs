//! Recording the composited session: recorder seam, profile negotiation, capture cadence and
//! saving the finished blob.

/// Recorder driving the system `ffmpeg` binary.
pub mod ffmpeg;
/// Recorder that keeps a manifest in memory.
pub mod memory;
/// Recorder trait, recording profiles and capture cadence.
pub mod recorder;
/// Destinations for finished recordings.
pub mod save;
