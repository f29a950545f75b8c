//! Banknote authenticity checking.
//!
//! A candidate photo is reduced to oriented FAST keypoints with steered BRIEF
//! descriptors ([`NoteExtractor`]), matched against every known-genuine
//! reference of the same denomination ([`CandidateSelector`]) and judged by
//! the share of its keypoints that found a close mutual match
//! ([`DecisionEngine`]). [`NoteVerifier`] runs the whole batch from disk.

mod catalog;
mod config;
mod decision;
mod denomination;
mod error;
mod extractor;
pub mod loader;
mod pipeline;
pub mod render;
mod report;
mod selector;

#[cfg(test)]
mod testing;

pub use catalog::{ReferenceCatalog, ReferenceEntry};
pub use config::{DEFAULT_MIN_MATCH_PERCENT, VerifyConfig};
pub use decision::{Authenticity, DecisionEngine, Verdict, decide};
pub use denomination::{Denomination, DenominationExtractor, DigitRunDenomination};
pub use error::{VerifyError, VerifyResult};
pub use extractor::NoteExtractor;
pub use pipeline::NoteVerifier;
pub use report::{CandidateReport, JsonLinesSink, LogSink, Outcome, ReportSink, SkipReason};
pub use selector::{CandidateSelector, Selection, SelectionError};

pub use note_core::{self, DescriptorSet, ExtractorConfig, Image, Keypoint, Score, init_thread_pool};
pub use note_match::{self, BruteForceMatcher, DescriptorMatcher, MatchFilter};
