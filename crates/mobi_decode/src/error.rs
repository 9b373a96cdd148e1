use crate::palmdoc_header::Encryption;
use palm_database::PDBError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MobiError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Container-level failure: unknown format, bad record table, short read.
    #[error(transparent)]
    Database(#[from] PDBError),

    #[error("Invalid document header: {0}")]
    InvalidHeader(String),

    #[error("Unsupported compression type {0}")]
    UnsupportedCompression(u16),

    #[error("Document is encrypted ({0:?}), decryption is not supported")]
    EncryptionUnsupported(Encryption),

    #[error("Invalid MOBI header: {0}")]
    InvalidExtendedHeader(String),

    #[error("MOBI header claims {declared} bytes but only {available} remain in record 0")]
    HeaderTooLarge { declared: usize, available: usize },

    #[error("Malformed HUFF/CDIC record: {0}")]
    MalformedHuffmanHeader(String),

    #[error("Huffman decoding failed: {0}")]
    HuffmanDecodeFailure(String),

    #[error("Decompressed output exceeds the {limit} byte bound")]
    OutputBufferTooSmall { limit: usize },

    #[error("Back-reference of distance {distance} with only {available} bytes produced")]
    InvalidBackReference { distance: usize, available: usize },

    #[error("Compressed data ends inside an instruction at byte {position}")]
    TruncatedInput { position: usize },

    #[error("Trailing data of record {record} is corrupt: {reason}")]
    CorruptTrailingData { record: usize, reason: String },

    #[error("Decoded {found} bytes but the header declares {expected}")]
    SizeMismatch { expected: usize, found: usize },
}

pub type Result<T> = std::result::Result<T, MobiError>;
