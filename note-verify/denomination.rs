use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized face-value token of a banknote, compared by exact equality
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Denomination(String);

impl Denomination {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Denomination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives the denomination of a reference label or candidate filename.
///
/// References and candidates are only ever compared when their tokens are
/// equal, so this is the single place the labelling convention lives.
pub trait DenominationExtractor: Send + Sync {
    fn extract(&self, label: &str) -> Option<Denomination>;
}

impl<F> DenominationExtractor for F
where
    F: Fn(&str) -> Option<Denomination> + Send + Sync,
{
    fn extract(&self, label: &str) -> Option<Denomination> {
        self(label)
    }
}

/// First run of ASCII digits in the label (`"500_old_front"` → `500`)
#[derive(Debug, Clone, Copy, Default)]
pub struct DigitRunDenomination;

impl DenominationExtractor for DigitRunDenomination {
    fn extract(&self, label: &str) -> Option<Denomination> {
        let start = label.find(|c: char| c.is_ascii_digit())?;
        let rest = &label[start..];
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        Some(Denomination::new(&rest[..end]))
    }
}
