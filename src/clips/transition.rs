use std::collections::HashMap;

use crate::clips::registry::{ClipId, ClipRegistry};

/// How playback crosses from one clip to the next.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transition {
    /// Switch immediately, no blend.
    #[default]
    Cut,
    /// Cross-dissolve from the outgoing ghost frame to the incoming clip.
    Dissolve,
    /// Fade the outgoing frame to black, then fade the incoming clip in.
    FadeToBlack,
}

impl Transition {
    /// Return `true` when the transition blends with a ghost frame.
    pub fn needs_ghost(self) -> bool {
        !matches!(self, Transition::Cut)
    }
}

/// Per-gap transitions keyed by the outgoing clip, plus a fallback.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransitionPlan {
    gaps: HashMap<ClipId, Transition>,
    fallback: Transition,
}

impl TransitionPlan {
    /// Empty plan where every gap uses `fallback`.
    pub fn new(fallback: Transition) -> Self {
        Self {
            gaps: HashMap::new(),
            fallback,
        }
    }

    /// Build a plan from a positional list where entry `i` covers the gap after clip `i`.
    ///
    /// Entries past the last gap are ignored; gaps without an entry use `fallback`.
    pub fn from_positional(
        registry: &ClipRegistry,
        transitions: &[Transition],
        fallback: Transition,
    ) -> Self {
        let ids = registry.ids();
        let gap_count = ids.len().saturating_sub(1);
        if transitions.len() != gap_count {
            tracing::debug!(
                entries = transitions.len(),
                gaps = gap_count,
                "transition list length differs from gap count"
            );
        }
        let gaps = ids
            .iter()
            .take(gap_count)
            .zip(transitions)
            .map(|(id, t)| (*id, *t))
            .collect();
        Self { gaps, fallback }
    }

    /// Set the transition used after clip `from`.
    pub fn set_gap(&mut self, from: ClipId, transition: Transition) {
        self.gaps.insert(from, transition);
    }

    /// Remove an explicit gap entry, reverting it to the fallback.
    pub fn clear_gap(&mut self, from: ClipId) {
        self.gaps.remove(&from);
    }

    /// Explicit transition after clip `from`, if any.
    pub fn gap(&self, from: ClipId) -> Option<Transition> {
        self.gaps.get(&from).copied()
    }

    /// Transition used when a gap has no explicit entry.
    pub fn fallback(&self) -> Transition {
        self.fallback
    }

    /// Replace the fallback transition.
    pub fn set_fallback(&mut self, fallback: Transition) {
        self.fallback = fallback;
    }

    /// Effective transition for a switch from `from_index` to `to_index`.
    ///
    /// Anything other than a step to the immediately following clip is a jump and cuts hard.
    pub fn resolve(
        &self,
        from_index: usize,
        to_index: usize,
        registry: &ClipRegistry,
    ) -> Transition {
        if to_index != from_index + 1 || to_index >= registry.len() {
            return Transition::Cut;
        }
        registry
            .get(from_index)
            .and_then(|clip| self.gap(clip.id()))
            .unwrap_or(self.fallback)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/clips/transition.rs"]
mod tests;
