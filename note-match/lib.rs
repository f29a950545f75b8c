//! Descriptor matching and match scoring.
//!
//! [`BruteForceMatcher`] finds mutual nearest neighbours under Hamming
//! distance; [`MatchFilter`] discards weak correspondences and turns the rest
//! into a [`Score`] relative to the query's keypoint count.

mod matcher;
mod scorer;

pub use matcher::{BruteForceMatcher, DescriptorMatcher};
pub use scorer::{DEFAULT_MAX_DISTANCE, MatchFilter};

use note_core::{DescriptorSet, Score};

/// Match `query` against `reference` and score the result.
///
/// An empty set on either side yields [`Score::ZERO`] without any distance
/// computation.
pub fn score_pair<M: DescriptorMatcher + ?Sized>(
    matcher: &M,
    filter: &MatchFilter,
    query: &DescriptorSet,
    reference: &DescriptorSet,
) -> Score {
    if query.is_empty() || reference.is_empty() {
        return Score::ZERO;
    }
    let matches = matcher.match_sets(query, reference);
    filter.score(&matches, query.len())
}
