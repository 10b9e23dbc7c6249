//! Training Suggestion Engine
//!
//! Ranks the focus areas of a user's active plan by how urgently they need
//! attention, combining the points deficit inside each rolling period with
//! how far past its period the body area was last trained. Within each area,
//! exercises are ordered so the most neglected come first.
//!
//! The engine is a pure function over a [`SuggestionInput`] snapshot; all
//! data access happens in the store before it is called.

mod engine;
mod scoring;
mod types;

pub use engine::SuggestionEngine;
pub use scoring::{ScoreCalculator, ScoringWeights};
pub use types::*;

/// Default scoring weights
pub const DEFAULT_WEIGHTS: ScoringWeights =
    ScoringWeights { points_deficit: 2.0, overdue: 3.0 };

/// Overdue fraction reported for a body area with no finished history.
pub const NEVER_DONE_OVERDUE: f64 = 2.0;
