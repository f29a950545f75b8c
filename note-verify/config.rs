use crate::error::{VerifyError, VerifyResult};
use note_core::ExtractorConfig;
use note_fast::FastDetector;
use note_match::DEFAULT_MAX_DISTANCE;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default minimum match percentage for a genuine verdict
pub const DEFAULT_MIN_MATCH_PERCENT: f64 = 90.0;

/// Complete verification settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Matches with a larger Hamming distance are discarded
    pub max_match_distance: u32,
    /// Genuine iff the best match ratio reaches this percentage
    pub min_match_percent: f64,
    /// Score candidates concurrently
    pub parallel: bool,
    /// Keypoint/descriptor extraction
    pub extractor: ExtractorConfig,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            max_match_distance: DEFAULT_MAX_DISTANCE,
            min_match_percent: DEFAULT_MIN_MATCH_PERCENT,
            parallel: true,
            extractor: ExtractorConfig::default(),
        }
    }
}

impl VerifyConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> VerifyResult<()> {
        if !self.min_match_percent.is_finite() || !(0.0..=100.0).contains(&self.min_match_percent) {
            return Err(VerifyError::InvalidConfig(format!(
                "min_match_percent must be within 0-100, got {}",
                self.min_match_percent
            )));
        }
        if self.max_match_distance > 256 {
            return Err(VerifyError::InvalidConfig(format!(
                "max_match_distance must be at most 256, got {}",
                self.max_match_distance
            )));
        }
        if self.extractor.n_threads == 0 {
            return Err(VerifyError::InvalidConfig("n_threads must be at least 1".to_string()));
        }
        FastDetector::new(self.extractor.clone())?;
        Ok(())
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "VerifyConfig: {}x{}, max_features={}, fast_threshold={}, levels={}, max_distance={}, min_match={:.1}%, parallel={}",
            self.extractor.working_width,
            self.extractor.working_height,
            self.extractor.max_features,
            self.extractor.fast_threshold,
            self.extractor.n_levels,
            self.max_match_distance,
            self.min_match_percent,
            self.parallel
        )
    }

    /// Load from a `.json` or `.toml` file, chosen by extension
    pub fn load<P: AsRef<Path>>(path: P) -> VerifyResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()) {
            Some(ext) if ext == "json" => Self::load_json(path),
            _ => Self::load_toml(path),
        }
    }

    /// Save configuration to JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> VerifyResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> VerifyResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save configuration to TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> VerifyResult<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Load configuration from TOML file
    pub fn load_toml<P: AsRef<Path>>(path: P) -> VerifyResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> VerifyResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> VerifyResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> VerifyResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Deserialize from TOML string
    pub fn from_toml(toml_str: &str) -> VerifyResult<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}
