use thiserror::Error;

#[derive(Debug, Error)]
pub enum PDBError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The type/creator tag is neither `BOOKMOBI` nor `TEXtREAd`.
    #[error("Unrecognized type/creator '{}'", .0.escape_ascii())]
    UnrecognizedFormat([u8; 8]),

    #[error("Invalid PDB header: {0}")]
    InvalidHeader(String),

    #[error("Record {index} starts at {offset:#x}, after the next record at {next:#x}")]
    CorruptOffsetTable { index: usize, offset: u64, next: u64 },

    #[error("Record {index} out of range, database has {count} records")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("Truncated read at {offset:#x}: wanted {expected} bytes, got {found}")]
    TruncatedRead {
        offset: u64,
        expected: usize,
        found: usize,
    },

    #[error("Missing builder field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, PDBError>;
