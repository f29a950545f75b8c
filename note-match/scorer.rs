use note_core::{Match, Score};

/// Default Hamming distance above which a correspondence is considered coincidental
pub const DEFAULT_MAX_DISTANCE: u32 = 40;

/// Drops weak correspondences and turns the survivors into a [`Score`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchFilter {
    max_distance: u32,
}

impl Default for MatchFilter {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_MAX_DISTANCE,
        }
    }
}

impl MatchFilter {
    pub fn new(max_distance: u32) -> Self {
        Self { max_distance }
    }

    pub fn max_distance(&self) -> u32 {
        self.max_distance
    }

    /// A match survives unless its distance exceeds the threshold
    #[inline]
    pub fn accepts(&self, m: &Match) -> bool {
        m.distance <= self.max_distance
    }

    /// Matches that survive the distance threshold
    pub fn filter<'a>(&'a self, matches: &'a [Match]) -> impl Iterator<Item = &'a Match> + 'a {
        matches.iter().filter(move |m| self.accepts(m))
    }

    /// Count surviving matches and express them as a percentage of the
    /// query's own keypoint count
    pub fn score(&self, matches: &[Match], query_keypoint_count: usize) -> Score {
        let match_count = self.filter(matches).count();
        let match_ratio = match_count as f64 / query_keypoint_count.max(1) as f64 * 100.0;
        Score {
            match_count,
            match_ratio,
        }
    }
}
