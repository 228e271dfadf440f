//! Media sources: the decodable handles the player drives and the compositor samples.

/// `ffprobe`/`ffmpeg` backed decoding.
pub mod ffmpeg;
/// The [`source::MediaSource`] contract and shared media types.
pub mod source;
/// Still-image and solid-color sources.
pub mod still;
