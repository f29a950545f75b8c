use crate::denomination::{Denomination, DenominationExtractor};
use crate::error::VerifyResult;
use crate::extractor::NoteExtractor;
use crate::loader::{self, LabeledImage};
use note_core::DescriptorSet;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Precomputed reference note
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceEntry {
    /// Token derived from the label once, at build time
    pub denomination: Option<Denomination>,
    pub descriptors: DescriptorSet,
    /// File the entry was built from, when it came from disk
    pub source: Option<PathBuf>,
}

/// Known-genuine references keyed by label.
///
/// Iteration follows label order, which is also the tie-break order used when
/// two references score equally.
#[derive(Debug, Clone, Default)]
pub struct ReferenceCatalog {
    entries: BTreeMap<String, ReferenceEntry>,
}

impl ReferenceCatalog {
    /// Build from already-extracted entries; a repeated label keeps the last entry
    pub fn from_entries(entries: impl IntoIterator<Item = (String, ReferenceEntry)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Extract every reference image in parallel and derive its denomination.
    pub fn build(
        images: &[LabeledImage],
        extractor: &NoteExtractor,
        denominations: &dyn DenominationExtractor,
    ) -> VerifyResult<Self> {
        let built: Vec<(String, ReferenceEntry)> = images
            .par_iter()
            .map(|img| {
                let descriptors = extractor.extract(&img.image)?;
                let denomination = denominations.extract(&img.label);
                debug!(
                    label = %img.label,
                    denomination = denomination.as_ref().map(Denomination::as_str).unwrap_or("-"),
                    keypoints = descriptors.len(),
                    "reference extracted"
                );
                if denomination.is_none() {
                    warn!(label = %img.label, "reference has no denomination and can never be selected");
                }
                Ok((
                    img.label.clone(),
                    ReferenceEntry {
                        denomination,
                        descriptors,
                        source: Some(img.path.clone()),
                    },
                ))
            })
            .collect::<VerifyResult<_>>()?;

        let mut entries = BTreeMap::new();
        for (label, entry) in built {
            if let Some(previous) = entries.insert(label.clone(), entry) {
                warn!(label = %label, replaced = ?previous.source, "duplicate reference label, keeping the later file");
            }
        }

        Ok(Self { entries })
    }

    /// Load and extract every reference image in `dir`
    pub fn from_dir<P: AsRef<Path>>(
        dir: P,
        extractor: &NoteExtractor,
        denominations: &dyn DenominationExtractor,
    ) -> VerifyResult<Self> {
        let images = loader::load_reference_images(dir.as_ref())?;
        let catalog = Self::build(&images, extractor, denominations)?;
        info!(dir = %dir.as_ref().display(), references = catalog.len(), "reference catalog ready");
        Ok(catalog)
    }

    pub fn get(&self, label: &str) -> Option<&ReferenceEntry> {
        self.entries.get(label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in label order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ReferenceEntry)> {
        self.entries.iter().map(|(label, entry)| (label.as_str(), entry))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::denomination::DigitRunDenomination;
    use crate::testing::{banknote_like, small_extractor_config};

    fn labeled(label: &str, seed: u64) -> LabeledImage {
        LabeledImage {
            label: label.to_string(),
            path: PathBuf::from(format!("{label}.png")),
            image: banknote_like(240, 120, seed),
        }
    }

    #[test]
    fn test_build_orders_by_label_and_tags_denomination() {
        let extractor = NoteExtractor::new(small_extractor_config()).unwrap();
        let images = vec![labeled("500_b", 1), labeled("100", 2), labeled("500_a", 3), labeled("back", 4)];
        let catalog = ReferenceCatalog::build(&images, &extractor, &DigitRunDenomination).unwrap();

        assert_eq!(catalog.labels().collect::<Vec<_>>(), vec!["100", "500_a", "500_b", "back"]);
        assert_eq!(catalog.get("500_b").unwrap().denomination, Some(Denomination::new("500")));
        assert_eq!(catalog.get("back").unwrap().denomination, None);
        assert_eq!(catalog.get("100").unwrap().source, Some(PathBuf::from("100.png")));
        assert!(catalog.iter().all(|(_, e)| !e.descriptors.is_empty()));
    }

    #[test]
    fn test_duplicate_label_keeps_last() {
        let extractor = NoteExtractor::new(small_extractor_config()).unwrap();
        let mut second = labeled("200", 9);
        second.path = PathBuf::from("200.jpg");
        let catalog = ReferenceCatalog::build(&[labeled("200", 8), second], &extractor, &DigitRunDenomination).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("200").unwrap().source, Some(PathBuf::from("200.jpg")));
    }

    #[test]
    fn test_from_entries() {
        let entry = ReferenceEntry {
            denomination: Some(Denomination::new("50")),
            descriptors: DescriptorSet::empty(),
            source: None,
        };
        let catalog = ReferenceCatalog::from_entries([("50".to_string(), entry.clone())]);
        assert_eq!(catalog.get("50"), Some(&entry));
        assert!(!catalog.is_empty());
        assert!(ReferenceCatalog::default().is_empty());
    }
}
