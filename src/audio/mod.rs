//! Audio routing: mixing helpers, analyser, backing track and the audio graph.

/// Frequency/time-domain analysis node feeding the visualizer.
pub mod analyser;
/// Optional backing track kept in sync with the global timeline.
pub mod backing;
/// Source → analyser → destinations routing graph.
pub mod graph;
/// PCM resampling and mixing helpers.
pub mod mix;
