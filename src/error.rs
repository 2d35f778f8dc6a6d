use std::{
    num::{ParseFloatError, ParseIntError},
    path::PathBuf,
};
use thiserror::Error;

pub type GvxResult<T> = std::result::Result<T, GvxError>;

#[derive(Debug, Error)]
pub enum GvxError {
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    ParseInt(#[from] ParseIntError),
    #[error(transparent)]
    ParseFloat(#[from] ParseFloatError),
    #[error("Inconsistent reference alleles at column {column_begin}: '{shorter}' vs '{longer}'")]
    InconsistentReference {
        column_begin: u64,
        shorter: String,
        longer: String,
    },
    #[error(
        "GT allele index {allele_idx} of call {call_idx} at column {column_begin} has no merged mapping"
    )]
    UnmappedGtAllele {
        column_begin: u64,
        call_idx: usize,
        allele_idx: i32,
    },
    #[error("Field {field} has unsupported element type {element_type} for allele remapping")]
    UnsupportedElementType { field: String, element_type: String },
    #[error("Required field {field} is missing at column {column_begin}")]
    MissingRequiredField { column_begin: u64, field: String },
    #[error("Invalid allele string: '{value}'")]
    InvalidAllele { value: String },
    #[error("Invalid gzip header: {}", path.display())]
    InvalidGzipHeader { path: PathBuf },
}

impl GvxError {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

#[macro_export]
macro_rules! gvx_error {
    ($($arg:tt)*) => {
        $crate::error::GvxError::message(format!($($arg)*))
    };
}
