//! Decoding of MOBI and PalmDOC e-books into their flat text stream.
//!
//! ```no_run
//! let mut file = std::fs::File::open("book.mobi")?;
//! let text = mobi_decode::decode(&mut file)?;
//! # Ok::<(), mobi_decode::MobiError>(())
//! ```

pub mod compression;
pub mod error;
pub mod exth_header;
pub mod huffcdic;
pub mod mobi;
pub mod mobi_header;
pub mod palmdoc_header;
pub mod trailing;

pub use error::{MobiError, Result};
pub use mobi::MOBI;
pub use palm_database::{ByteSource, PDBError, PDBKind};

/// Opens the book in `source` and returns its decoded text.
pub fn decode<S: ByteSource + ?Sized>(source: &mut S) -> Result<Vec<u8>> {
    MOBI::open(source)?.text(source)
}
