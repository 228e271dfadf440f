//! CPU compositing: surfaces, blend math, color filters and the per-tick render loop.

/// Premultiplied RGBA8 blend math.
pub mod composite;
/// Contained draws, Ken Burns scaling and `vello_cpu` interop.
pub mod draw;
/// Color filters applied to live clip draws.
pub mod filter;
/// Output frames and drawing surfaces.
pub mod frame;
/// Ghost-frame transitions and steady-state clip drawing.
pub mod render_loop;
