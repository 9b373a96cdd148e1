use crate::error::{MobiError, Result};
use byyte::ByteReader;
use log::warn;
use palm_database::PDBKind;
use std::io::Cursor;

pub const PALMDOC_HEADER_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    PalmDoc,
    HuffCdic,
}

impl TryFrom<u16> for Compression {
    type Error = MobiError;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            1 => Ok(Compression::None),
            2 => Ok(Compression::PalmDoc),
            17480 => Ok(Compression::HuffCdic),
            other => Err(MobiError::UnsupportedCompression(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encryption {
    None,
    Old,
    New,
    Unknown(u16),
}

impl From<u16> for Encryption {
    fn from(value: u16) -> Self {
        match value {
            0 => Encryption::None,
            1 => Encryption::Old,
            2 => Encryption::New,
            other => Encryption::Unknown(other),
        }
    }
}

/// The last four bytes of the PalmDOC header mean different things
/// depending on the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PalmDOCTail {
    /// `TEXtREAd`: reading position saved by the device.
    CurrentPosition(u32),
    /// `BOOKMOBI`: encryption scheme and a reserved half-word.
    Mobi { encryption: Encryption, reserved: u16 },
}

#[derive(Debug, Clone)]
pub struct PalmDOCHeader {
    pub compression: Compression,
    pub text_length: u32,
    pub record_count: u16,
    pub record_size: u16,
    pub tail: PalmDOCTail,
}

impl PalmDOCHeader {
    /// Decodes the header at the start of record 0. Encrypted documents are
    /// refused before the compression type is even looked at.
    pub fn from_bytes(record0: &[u8], kind: PDBKind) -> Result<Self> {
        let block = record0.get(..PALMDOC_HEADER_LEN).ok_or_else(|| {
            MobiError::InvalidHeader(format!(
                "record 0 holds {} bytes, the PalmDOC header needs {PALMDOC_HEADER_LEN}",
                record0.len()
            ))
        })?;

        let mut reader = Cursor::new(block);
        let compression = reader.read_u16()?;
        _ = reader.read_u16()?; // Reserved, usually 0
        let text_length = reader.read_u32()?;
        let record_count = reader.read_u16()?;
        let record_size = reader.read_u16()?;
        let tail = match kind {
            PDBKind::PalmDoc => PalmDOCTail::CurrentPosition(reader.read_u32()?),
            PDBKind::Mobi => PalmDOCTail::Mobi {
                encryption: Encryption::from(reader.read_u16()?),
                reserved: reader.read_u16()?,
            },
        };

        let header = PalmDOCHeader {
            compression: Compression::None,
            text_length,
            record_count,
            record_size,
            tail,
        };
        let encryption = header.encryption();
        if encryption != Encryption::None {
            warn!("Refusing encrypted document ({encryption:?})");
            return Err(MobiError::EncryptionUnsupported(encryption));
        }

        Ok(PalmDOCHeader {
            compression: Compression::try_from(compression)?,
            ..header
        })
    }

    pub fn encryption(&self) -> Encryption {
        match self.tail {
            PalmDOCTail::CurrentPosition(_) => Encryption::None,
            PalmDOCTail::Mobi { encryption, .. } => encryption,
        }
    }
}
