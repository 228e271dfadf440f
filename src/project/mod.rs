//! Production documents: settings, clip list, overlays and suggestion merging.

/// Production document and controller assembly.
pub mod model;
/// Player tunables.
pub mod settings;
