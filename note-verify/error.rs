use note_fast::FastError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Detector error: {0}")]
    Fast(#[from] FastError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No reference notes found in {}", .0.display())]
    EmptyCatalog(PathBuf),

    #[error("Image buffer does not match its dimensions")]
    InvalidBuffer,
}

pub type VerifyResult<T> = Result<T, VerifyError>;
