use crate::catalog::{ReferenceCatalog, ReferenceEntry};
use crate::denomination::Denomination;
use crate::error::VerifyError;
use crate::extractor::NoteExtractor;
use note_core::{DescriptorSet, Image, Score};
use note_match::{BruteForceMatcher, DescriptorMatcher, MatchFilter, score_pair};
use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("no reference note for denomination {denomination}")]
    NoReference { denomination: Denomination },

    #[error(transparent)]
    Extraction(#[from] VerifyError),
}

/// Best-scoring reference for a candidate
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub best_label: String,
    pub score: Score,
}

/// Scores a candidate against the references of its denomination
#[derive(Debug, Clone)]
pub struct CandidateSelector<'a, M = BruteForceMatcher> {
    catalog: &'a ReferenceCatalog,
    matcher: M,
    filter: MatchFilter,
}

impl<'a> CandidateSelector<'a, BruteForceMatcher> {
    pub fn new(catalog: &'a ReferenceCatalog, filter: MatchFilter) -> Self {
        Self::with_matcher(catalog, BruteForceMatcher::default(), filter)
    }
}

impl<'a, M: DescriptorMatcher + Sync> CandidateSelector<'a, M> {
    pub fn with_matcher(catalog: &'a ReferenceCatalog, matcher: M, filter: MatchFilter) -> Self {
        Self {
            catalog,
            matcher,
            filter,
        }
    }

    pub fn catalog(&self) -> &'a ReferenceCatalog {
        self.catalog
    }

    /// References whose denomination token equals `denomination`, in label order
    pub fn filter_catalog(&self, denomination: &Denomination) -> Vec<(&'a str, &'a ReferenceEntry)> {
        self.catalog
            .iter()
            .filter(|(_, entry)| entry.denomination.as_ref() == Some(denomination))
            .collect()
    }

    /// Extract `candidate` once and pick the best reference of its denomination.
    ///
    /// Extraction is skipped entirely when no reference qualifies.
    pub fn select_best(
        &self,
        extractor: &NoteExtractor,
        candidate: &Image,
        denomination: &Denomination,
    ) -> Result<Selection, SelectionError> {
        let references = self.filter_catalog(denomination);
        if references.is_empty() {
            return Err(SelectionError::NoReference {
                denomination: denomination.clone(),
            });
        }
        let descriptors = extractor.extract(candidate)?;
        Ok(self.pick_best(&descriptors, &references))
    }

    /// Same as [`select_best`](Self::select_best) for an already-extracted candidate
    pub fn select_best_from_set(
        &self,
        candidate: &DescriptorSet,
        denomination: &Denomination,
    ) -> Result<Selection, SelectionError> {
        let references = self.filter_catalog(denomination);
        if references.is_empty() {
            return Err(SelectionError::NoReference {
                denomination: denomination.clone(),
            });
        }
        Ok(self.pick_best(candidate, &references))
    }

    /// Strictly greatest match count wins; equal counts keep the earlier label
    fn pick_best(&self, candidate: &DescriptorSet, references: &[(&str, &ReferenceEntry)]) -> Selection {
        let scores: Vec<Score> = references
            .par_iter()
            .map(|(_, entry)| score_pair(&self.matcher, &self.filter, candidate, &entry.descriptors))
            .collect();

        let mut best: Option<(&str, Score)> = None;
        for (&(label, _), score) in references.iter().zip(scores) {
            debug!(reference = label, matches = score.match_count, ratio = score.match_ratio, "scored reference");
            if best.is_none_or(|(_, b)| score.match_count > b.match_count) {
                best = Some((label, score));
            }
        }

        // `references` is never empty here
        let (best_label, score) = best.unwrap_or(("", Score::ZERO));
        Selection {
            best_label: best_label.to_string(),
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use note_core::{Descriptor, Keypoint};

    fn set_from(descs: Vec<Descriptor>) -> DescriptorSet {
        let kps = (0..descs.len())
            .map(|i| Keypoint {
                x: i as f32,
                y: 0.0,
                angle: 0.0,
                response: 1.0,
                octave: 0,
                size: 31.0,
            })
            .collect();
        DescriptorSet::new(kps, descs).unwrap()
    }

    /// Descriptors `0..n` that are pairwise far apart
    fn distinct(n: usize) -> Vec<Descriptor> {
        (0..n)
            .map(|i| {
                let mut d = [0u8; 32];
                // Eight bytes set per descriptor, disjoint windows keep pairs at least 128 bits apart
                for k in 0..8 {
                    d[(i * 8 + k) % 32] = 0xFF;
                }
                d[31] ^= i as u8;
                d
            })
            .collect()
    }

    fn entry(denomination: &str, descriptors: DescriptorSet) -> ReferenceEntry {
        ReferenceEntry {
            denomination: Some(Denomination::new(denomination)),
            descriptors,
            source: None,
        }
    }

    fn catalog() -> ReferenceCatalog {
        let all = distinct(4);
        ReferenceCatalog::from_entries([
            ("500_b".to_string(), entry("500", set_from(all[..2].to_vec()))),
            ("500_a".to_string(), entry("500", set_from(all[..2].to_vec()))),
            ("500_c".to_string(), entry("500", set_from(all[..1].to_vec()))),
            ("100".to_string(), entry("100", set_from(all.clone()))),
        ])
    }

    #[test]
    fn test_filter_is_exact_denomination() {
        let cat = catalog();
        let selector = CandidateSelector::new(&cat, MatchFilter::default());
        let labels: Vec<&str> = selector
            .filter_catalog(&Denomination::new("500"))
            .into_iter()
            .map(|(l, _)| l)
            .collect();
        assert_eq!(labels, vec!["500_a", "500_b", "500_c"]);
        assert!(selector.filter_catalog(&Denomination::new("50")).is_empty());
    }

    #[test]
    fn test_best_count_wins_and_ties_keep_first_label() {
        let cat = catalog();
        let selector = CandidateSelector::new(&cat, MatchFilter::default());
        let candidate = set_from(distinct(4));
        let selection = selector.select_best_from_set(&candidate, &Denomination::new("500")).unwrap();
        assert_eq!(selection.best_label, "500_a");
        assert_eq!(selection.score.match_count, 2);
        assert!((selection.score.match_ratio - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_other_denominations_never_win() {
        // "100" would match all four descriptors but is not a 500 note
        let cat = catalog();
        let selector = CandidateSelector::new(&cat, MatchFilter::default());
        let selection = selector
            .select_best_from_set(&set_from(distinct(4)), &Denomination::new("500"))
            .unwrap();
        assert_ne!(selection.best_label, "100");
    }

    #[test]
    fn test_no_reference_is_reported() {
        let cat = catalog();
        let selector = CandidateSelector::new(&cat, MatchFilter::default());
        let err = selector
            .select_best_from_set(&set_from(distinct(1)), &Denomination::new("20"))
            .unwrap_err();
        assert!(matches!(err, SelectionError::NoReference { ref denomination } if denomination.as_str() == "20"));
    }

    #[test]
    fn test_empty_candidate_scores_zero() {
        let cat = catalog();
        let selector = CandidateSelector::new(&cat, MatchFilter::default());
        let selection = selector
            .select_best_from_set(&DescriptorSet::empty(), &Denomination::new("500"))
            .unwrap();
        assert_eq!(selection.score, Score::ZERO);
        assert_eq!(selection.best_label, "500_a");
    }
}
