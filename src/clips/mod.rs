/// Ordered clip list and per-frame clip roles.
pub mod registry;
/// Transition kinds and the per-gap transition plan.
pub mod transition;
