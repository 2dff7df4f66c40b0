use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid airfoil: {0}")]
    InvalidAirfoil(String),

    #[error("Macro parse error at line {line}: {message}")]
    MacroParse { line: usize, message: String },

    #[error("Case ID '{0}' not found")]
    CaseNotFound(String),

    #[error("JavaFoil failed for {case_id} (status {status:?}): {stderr}")]
    Solver {
        case_id: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Polar file not written: {}", .0.display())]
    MissingPolar(PathBuf),

    #[error("Polar file has no data points: {}", .0.display())]
    EmptyPolar(PathBuf),

    #[error("Invalid number '{value}' in {context}")]
    Number { value: String, context: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML read error: {0}")]
    TomlRead(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Worker pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

pub type SweepResult<T> = Result<T, SweepError>;
