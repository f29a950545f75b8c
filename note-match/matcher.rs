use note_core::{Descriptor, DescriptorSet, Match, hamming_distance};
use rayon::prelude::*;

/// Produces correspondences between two descriptor sets
pub trait DescriptorMatcher {
    fn match_sets(&self, query: &DescriptorSet, reference: &DescriptorSet) -> Vec<Match>;
}

/// Exhaustive Hamming matcher.
///
/// With `cross_check` a pair (i, j) is kept only when j is the nearest
/// reference descriptor of query i and i is the nearest query descriptor of
/// reference j. Equal distances resolve to the lower index.
#[derive(Debug, Clone, Copy)]
pub struct BruteForceMatcher {
    cross_check: bool,
}

impl Default for BruteForceMatcher {
    fn default() -> Self {
        Self { cross_check: true }
    }
}

impl BruteForceMatcher {
    pub fn new(cross_check: bool) -> Self {
        Self { cross_check }
    }

    pub fn cross_check(&self) -> bool {
        self.cross_check
    }

    /// Index and distance of the nearest descriptor in `pool`; `pool` must not be empty
    fn nearest(desc: &Descriptor, pool: &[Descriptor]) -> (usize, u32) {
        let mut best_idx = 0;
        let mut best_distance = u32::MAX;
        for (idx, other) in pool.iter().enumerate() {
            let distance = hamming_distance(desc, other);
            if distance < best_distance {
                best_distance = distance;
                best_idx = idx;
                if distance == 0 {
                    break;
                }
            }
        }
        (best_idx, best_distance)
    }
}

impl DescriptorMatcher for BruteForceMatcher {
    fn match_sets(&self, query: &DescriptorSet, reference: &DescriptorSet) -> Vec<Match> {
        if query.is_empty() || reference.is_empty() {
            return Vec::new();
        }

        let query_desc = query.descriptors();
        let reference_desc = reference.descriptors();

        let forward: Vec<(usize, u32)> = query_desc
            .par_iter()
            .map(|d| Self::nearest(d, reference_desc))
            .collect();

        let backward: Option<Vec<usize>> = self.cross_check.then(|| {
            reference_desc
                .par_iter()
                .map(|d| Self::nearest(d, query_desc).0)
                .collect()
        });

        let mut matches: Vec<Match> = forward
            .into_iter()
            .enumerate()
            .filter(|&(query_idx, (reference_idx, _))| match &backward {
                Some(back) => back[reference_idx] == query_idx,
                None => true,
            })
            .map(|(query_idx, (reference_idx, distance))| Match {
                query_idx,
                reference_idx,
                distance,
            })
            .collect();

        matches.sort_by(|a, b| a.distance.cmp(&b.distance).then(a.query_idx.cmp(&b.query_idx)));
        matches
    }
}
