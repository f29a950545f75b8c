use crate::decision::{Authenticity, Verdict};
use crate::denomination::Denomination;
use crate::error::VerifyResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use tracing::{info, warn};

/// Why a candidate received no verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    UnreadableImage { message: String },
    NoDenomination,
    NoReference { denomination: Denomination },
    ExtractionFailed { message: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnreadableImage { message } => write!(f, "unreadable image: {message}"),
            SkipReason::NoDenomination => f.write_str("no denomination in filename"),
            SkipReason::NoReference { denomination } => write!(f, "no reference note for {denomination}"),
            SkipReason::ExtractionFailed { message } => write!(f, "feature extraction failed: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Checked {
        best_label: String,
        best_match_count: usize,
        best_match_ratio: f64,
        verdict: Authenticity,
    },
    Skipped {
        reason: SkipReason,
    },
}

impl From<Verdict> for Outcome {
    fn from(v: Verdict) -> Self {
        Outcome::Checked {
            best_label: v.best_label,
            best_match_count: v.best_score.match_count,
            best_match_ratio: v.best_score.match_ratio,
            verdict: v.authenticity,
        }
    }
}

/// Result line for one candidate file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateReport {
    pub filename: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl CandidateReport {
    pub fn verdict(&self) -> Option<Authenticity> {
        match &self.outcome {
            Outcome::Checked { verdict, .. } => Some(*verdict),
            Outcome::Skipped { .. } => None,
        }
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match &self.outcome {
            Outcome::Skipped { reason } => Some(reason),
            Outcome::Checked { .. } => None,
        }
    }
}

impl fmt::Display for CandidateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Checked {
                best_match_count,
                best_match_ratio,
                verdict,
                ..
            } => write!(
                f,
                "{} → Best Score: {}, Match: {:.2}% → {}",
                self.filename, best_match_count, best_match_ratio, verdict
            ),
            Outcome::Skipped { reason } => write!(f, "{} → skipped ({})", self.filename, reason),
        }
    }
}

/// Receives candidate reports in input order
pub trait ReportSink {
    fn report(&mut self, report: &CandidateReport) -> VerifyResult<()>;

    fn finish(&mut self) -> VerifyResult<()> {
        Ok(())
    }
}

/// Writes each report as a `tracing` event
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn report(&mut self, report: &CandidateReport) -> VerifyResult<()> {
        match &report.outcome {
            Outcome::Checked { best_label, .. } => info!(reference = %best_label, "{report}"),
            Outcome::Skipped { .. } => warn!("{report}"),
        }
        Ok(())
    }
}

/// One JSON object per line
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for JsonLinesSink<W> {
    fn report(&mut self, report: &CandidateReport) -> VerifyResult<()> {
        serde_json::to_writer(&mut self.writer, report)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> VerifyResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl ReportSink for Vec<CandidateReport> {
    fn report(&mut self, report: &CandidateReport) -> VerifyResult<()> {
        self.push(report.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checked() -> CandidateReport {
        CandidateReport {
            filename: "500_test.jpg".to_string(),
            outcome: Outcome::Checked {
                best_label: "500_front".to_string(),
                best_match_count: 812,
                best_match_ratio: 93.456,
                verdict: Authenticity::Genuine,
            },
        }
    }

    fn skipped() -> CandidateReport {
        CandidateReport {
            filename: "note.jpg".to_string(),
            outcome: Outcome::Skipped {
                reason: SkipReason::NoDenomination,
            },
        }
    }

    #[test]
    fn test_display_line() {
        assert_eq!(
            checked().to_string(),
            "500_test.jpg → Best Score: 812, Match: 93.46% → Real"
        );
        assert_eq!(skipped().to_string(), "note.jpg → skipped (no denomination in filename)");
    }

    #[test]
    fn test_accessors() {
        assert_eq!(checked().verdict(), Some(Authenticity::Genuine));
        assert_eq!(checked().skip_reason(), None);
        assert_eq!(skipped().verdict(), None);
        assert_eq!(skipped().skip_reason(), Some(&SkipReason::NoDenomination));
    }

    #[test]
    fn test_json_lines() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.report(&checked()).unwrap();
        sink.report(&skipped()).unwrap();
        sink.finish().unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["status"], "checked");
        assert_eq!(first["verdict"], "genuine");
        assert_eq!(first["best_match_count"], 812);

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["status"], "skipped");
        assert_eq!(second["reason"]["kind"], "no_denomination");
    }

    #[test]
    fn test_json_parses_back() {
        let line = serde_json::to_string(&checked()).unwrap();
        let back: CandidateReport = serde_json::from_str(&line).unwrap();
        assert_eq!(back, checked());
    }

    #[test]
    fn test_collecting_sink() {
        let mut sink: Vec<CandidateReport> = Vec::new();
        sink.report(&skipped()).unwrap();
        assert_eq!(sink, vec![skipped()]);
    }
}
