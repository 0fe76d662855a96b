use std::{
    num::{ParseFloatError, ParseIntError},
    path::PathBuf,
};
use thiserror::Error;

pub type SvReconResult<T> = std::result::Result<T, SvReconError>;

#[derive(Debug, Error)]
pub enum SvReconError {
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    ParseInt(#[from] ParseIntError),
    #[error(transparent)]
    ParseFloat(#[from] ParseFloatError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("Invalid SV type: {value}")]
    InvalidSvtype { value: String },
    #[error("Invalid breakend orientation: {value}")]
    InvalidOrientation { value: String },
    #[error("Cluster {cluster} references variant {variant} which is not in the sample")]
    MissingClusterVariant { cluster: usize, variant: usize },
    #[error("Junction copy number of breakend {breakend} has already been refined")]
    JcnAlreadyRefined { breakend: String },
    #[error("Invalid gzip header: {}", path.display())]
    InvalidGzipHeader { path: PathBuf },
    #[error("Sample {sample} failed: {message}")]
    SampleFailed { sample: String, message: String },
}

impl SvReconError {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

#[macro_export]
macro_rules! svrecon_error {
    ($($arg:tt)*) => {
        $crate::error::SvReconError::message(format!($($arg)*))
    };
}
