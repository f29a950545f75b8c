use crate::catalog::ReferenceCatalog;
use crate::config::VerifyConfig;
use crate::decision::DecisionEngine;
use crate::denomination::{DenominationExtractor, DigitRunDenomination};
use crate::error::VerifyResult;
use crate::extractor::NoteExtractor;
use crate::loader;
use crate::render;
use crate::report::{CandidateReport, Outcome, ReportSink, SkipReason};
use crate::selector::{CandidateSelector, SelectionError};
use note_core::Image;
use note_match::MatchFilter;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Checks candidate notes against an already-built reference catalog
pub struct NoteVerifier {
    extractor: NoteExtractor,
    catalog: ReferenceCatalog,
    denominations: Box<dyn DenominationExtractor>,
    filter: MatchFilter,
    engine: DecisionEngine,
    parallel: bool,
    annotate_dir: Option<PathBuf>,
}

impl NoteVerifier {
    /// Verifier over `catalog`. The catalog's denominations must come from the
    /// same denomination extractor passed here.
    pub fn new(
        config: &VerifyConfig,
        catalog: ReferenceCatalog,
        denominations: Box<dyn DenominationExtractor>,
    ) -> VerifyResult<Self> {
        config.validate()?;
        Ok(Self {
            extractor: NoteExtractor::new(config.extractor.clone())?,
            catalog,
            denominations,
            filter: MatchFilter::new(config.max_match_distance),
            engine: DecisionEngine::new(config.min_match_percent),
            parallel: config.parallel,
            annotate_dir: None,
        })
    }

    /// Build the catalog from `dir` using digit-run denominations
    pub fn from_reference_dir<P: AsRef<Path>>(config: &VerifyConfig, dir: P) -> VerifyResult<Self> {
        Self::from_reference_dir_with(config, dir, Box::new(DigitRunDenomination))
    }

    pub fn from_reference_dir_with<P: AsRef<Path>>(
        config: &VerifyConfig,
        dir: P,
        denominations: Box<dyn DenominationExtractor>,
    ) -> VerifyResult<Self> {
        config.validate()?;
        let extractor = NoteExtractor::new(config.extractor.clone())?;
        let catalog = ReferenceCatalog::from_dir(dir, &extractor, denominations.as_ref())?;
        Ok(Self {
            extractor,
            catalog,
            denominations,
            filter: MatchFilter::new(config.max_match_distance),
            engine: DecisionEngine::new(config.min_match_percent),
            parallel: config.parallel,
            annotate_dir: None,
        })
    }

    /// Write a composite image per checked candidate into `dir`
    pub fn with_annotate_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.annotate_dir = Some(dir.into());
        self
    }

    pub fn catalog(&self) -> &ReferenceCatalog {
        &self.catalog
    }

    pub fn extractor(&self) -> &NoteExtractor {
        &self.extractor
    }

    pub fn threshold(&self) -> f64 {
        self.engine.threshold()
    }

    /// Score one decoded candidate. The denomination is read from `filename`.
    pub fn verify(&self, filename: &str, image: &Image) -> CandidateReport {
        let outcome = self.evaluate(filename, image);
        CandidateReport {
            filename: filename.to_string(),
            outcome,
        }
    }

    fn evaluate(&self, filename: &str, image: &Image) -> Outcome {
        let Some(denomination) = self.denominations.extract(&loader::label_of(Path::new(filename))) else {
            return Outcome::Skipped {
                reason: SkipReason::NoDenomination,
            };
        };

        let selector = CandidateSelector::new(&self.catalog, self.filter);
        match selector.select_best(&self.extractor, image, &denomination) {
            Ok(selection) => {
                debug!(
                    candidate = filename,
                    denomination = %denomination,
                    reference = %selection.best_label,
                    matches = selection.score.match_count,
                    "best reference selected"
                );
                self.engine.decide(selection).into()
            }
            Err(SelectionError::NoReference { denomination }) => Outcome::Skipped {
                reason: SkipReason::NoReference { denomination },
            },
            Err(SelectionError::Extraction(err)) => Outcome::Skipped {
                reason: SkipReason::ExtractionFailed {
                    message: err.to_string(),
                },
            },
        }
    }

    /// Load, score and optionally annotate one candidate file
    pub fn verify_path(&self, path: &Path) -> CandidateReport {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let report = match loader::load_gray(path) {
            Ok(image) => self.verify(&filename, &image),
            Err(err) => CandidateReport {
                filename,
                outcome: Outcome::Skipped {
                    reason: SkipReason::UnreadableImage {
                        message: err.to_string(),
                    },
                },
            },
        };

        if let Some(dir) = &self.annotate_dir {
            if let Err(err) = self.annotate(dir, path, &report) {
                warn!(candidate = %report.filename, error = %err, "could not write composite");
            }
        }
        report
    }

    fn annotate(&self, dir: &Path, path: &Path, report: &CandidateReport) -> VerifyResult<()> {
        let Outcome::Checked { best_label, verdict, .. } = &report.outcome else {
            return Ok(());
        };
        let candidate = loader::load_color(path)?;
        let reference = self
            .catalog
            .get(best_label)
            .and_then(|entry| entry.source.as_deref())
            .and_then(|source| loader::load_color(source).ok());
        let out = render::save_composite(dir, &report.filename, reference.as_ref(), &candidate, *verdict)?;
        debug!(path = %out.display(), "composite written");
        Ok(())
    }

    /// Verify every path; reports follow input order in both modes
    pub fn verify_paths(&self, paths: &[PathBuf]) -> Vec<CandidateReport> {
        if self.parallel {
            paths.par_iter().map(|p| self.verify_path(p)).collect()
        } else {
            paths.iter().map(|p| self.verify_path(p)).collect()
        }
    }

    /// Verify every image in `dir` and hand the reports to `sink`
    pub fn verify_dir<P: AsRef<Path>>(&self, dir: P, sink: &mut dyn ReportSink) -> VerifyResult<Vec<CandidateReport>> {
        let paths = loader::list_images(dir.as_ref())?;
        info!(
            dir = %dir.as_ref().display(),
            candidates = paths.len(),
            references = self.catalog.len(),
            threshold = self.threshold(),
            "checking candidates"
        );

        let reports = self.verify_paths(&paths);
        for report in &reports {
            sink.report(report)?;
        }
        sink.finish()?;

        let genuine = reports.iter().filter(|r| r.verdict().is_some_and(|v| v.is_genuine())).count();
        let skipped = reports.iter().filter(|r| r.skip_reason().is_some()).count();
        info!(
            checked = reports.len() - skipped,
            genuine,
            skipped,
            "batch finished"
        );
        Ok(reports)
    }
}
