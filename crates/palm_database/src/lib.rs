//! Palm Database (PDB) containers: a 78-byte header, a table of record
//! offsets and the record data itself.
//!
//! All multi-byte fields are big-endian on disk. Each structured region is
//! read into memory as one block and decoded field by field with
//! [`byyte::ByteReader`], so nothing downstream ever sees a raw field.

pub mod builder;
pub mod error;
pub mod source;
pub mod timestamp;

use byyte::ByteReader;
use log::debug;
use std::io::Cursor;

pub use builder::PDBBuilder;
pub use error::{PDBError, Result};
pub use source::ByteSource;
use timestamp::from_palm_timestamp;

pub const PDB_HEADER_LEN: usize = 78;
pub const PDB_RECORD_ENTRY_LEN: usize = 8;

/// Which reader family a database belongs to, from its type/creator tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PDBKind {
    /// `BOOKMOBI`: a PalmDOC header followed by a MOBI header.
    Mobi,
    /// `TEXtREAd`: a bare PalmDOC document.
    PalmDoc,
}

impl PDBKind {
    pub fn from_type_creator(tag: &[u8; 8]) -> Option<Self> {
        match tag {
            b"BOOKMOBI" => Some(PDBKind::Mobi),
            b"TEXtREAd" => Some(PDBKind::PalmDoc),
            _ => None,
        }
    }

    pub fn type_creator(self) -> &'static [u8; 8] {
        match self {
            PDBKind::Mobi => b"BOOKMOBI",
            PDBKind::PalmDoc => b"TEXtREAd",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PDBHeader {
    pub name: String,
    pub attributes: u16,
    pub version: u16,
    pub creation_time: chrono::NaiveDateTime,
    pub modification_time: chrono::NaiveDateTime,
    pub last_backup_date: chrono::NaiveDateTime,
    pub modification_number: u32,
    pub app_info_id: u32,
    pub sort_info_id: u32,
    pub kind: PDBKind,
    pub unique_id_seed: u32,
    pub next_record_list_id: u32,
    pub number_of_records: u16,
}

impl PDBHeader {
    /// Decodes the fixed header block. The type/creator tag is checked
    /// before anything else so foreign files fail early.
    pub fn from_bytes(block: &[u8; PDB_HEADER_LEN]) -> Result<Self> {
        let mut tag = [0u8; 8];
        tag.copy_from_slice(&block[60..68]);
        let kind = PDBKind::from_type_creator(&tag).ok_or(PDBError::UnrecognizedFormat(tag))?;

        let mut reader = Cursor::new(&block[..]);
        let name = reader.read_cstr(32)?;
        let attributes = reader.read_u16()?;
        let version = reader.read_u16()?;
        let creation_time = from_palm_timestamp(reader.read_u32()?)?;
        let modification_time = from_palm_timestamp(reader.read_u32()?)?;
        let last_backup_date = from_palm_timestamp(reader.read_u32()?)?;
        let modification_number = reader.read_u32()?;
        let app_info_id = reader.read_u32()?;
        let sort_info_id = reader.read_u32()?;
        let _type_creator: [u8; 8] = reader.read_array()?;
        let unique_id_seed = reader.read_u32()?;
        let next_record_list_id = reader.read_u32()?;
        let number_of_records = reader.read_u16()?;

        if number_of_records < 1 {
            return Err(PDBError::InvalidHeader("database has no records".to_owned()));
        }

        Ok(PDBHeader {
            name,
            attributes,
            version,
            creation_time,
            modification_time,
            last_backup_date,
            modification_number,
            app_info_id,
            sort_info_id,
            kind,
            unique_id_seed,
            next_record_list_id,
            number_of_records,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PDBRecord {
    pub data_offset: u32,
    pub attributes: u8,
    pub unique_id: u32,
}

impl PDBRecord {
    pub fn new<R: std::io::Read>(reader: &mut R) -> std::io::Result<Self> {
        let data_offset = reader.read_u32()?;
        let attributes = reader.read_u8()?;
        let unique_id = reader.read_u24()?;

        Ok(PDBRecord {
            data_offset,
            attributes,
            unique_id,
        })
    }
}

/// An opened database. Record data stays in the source and is read on
/// demand.
#[derive(Debug, Clone)]
pub struct PDB {
    pub header: PDBHeader,
    pub records: Vec<PDBRecord>,
    /// One start offset per record plus a trailing sentinel equal to the
    /// source length, so every record's size is a subtraction.
    offsets: Vec<u64>,
}

impl PDB {
    pub fn open<S: ByteSource + ?Sized>(source: &mut S) -> Result<Self> {
        let mut block = [0u8; PDB_HEADER_LEN];
        read_exact_at(source, 0, &mut block)?;
        let header = PDBHeader::from_bytes(&block)?;

        let count = header.number_of_records as usize;
        let mut table = vec![0u8; count * PDB_RECORD_ENTRY_LEN];
        read_exact_at(source, PDB_HEADER_LEN as u64, &mut table)?;

        let mut reader = Cursor::new(table.as_slice());
        let mut records = Vec::with_capacity(count);
        for _ in 0..count {
            records.push(PDBRecord::new(&mut reader)?);
        }

        let mut offsets: Vec<u64> = records.iter().map(|r| r.data_offset as u64).collect();
        offsets.push(source.size()?);

        for (index, pair) in offsets.windows(2).enumerate() {
            if pair[1] < pair[0] {
                return Err(PDBError::CorruptOffsetTable {
                    index,
                    offset: pair[0],
                    next: pair[1],
                });
            }
        }

        debug!(
            "Opened PDB '{}' ({:?}) with {} records, {} bytes",
            header.name,
            header.kind,
            count,
            offsets[count]
        );

        Ok(PDB {
            header,
            records,
            offsets,
        })
    }

    pub fn kind(&self) -> PDBKind {
        self.header.kind
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Record start offsets followed by the source-length sentinel.
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    pub fn record_size(&self, index: usize) -> Result<usize> {
        if index >= self.records.len() {
            return Err(PDBError::IndexOutOfRange {
                index,
                count: self.records.len(),
            });
        }
        let size = self.offsets[index + 1] - self.offsets[index];
        usize::try_from(size)
            .map_err(|_| PDBError::InvalidHeader(format!("record {index} is too large")))
    }

    pub fn read_record<S: ByteSource + ?Sized>(&self, source: &mut S, index: usize) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.read_record_into(source, index, &mut data)?;
        Ok(data)
    }

    /// Reads record `index` into `buf`, replacing its contents. The buffer's
    /// allocation is kept, so reusing one buffer across records only grows
    /// it to the largest record seen.
    pub fn read_record_into<S: ByteSource + ?Sized>(
        &self,
        source: &mut S,
        index: usize,
        buf: &mut Vec<u8>,
    ) -> Result<()> {
        let size = self.record_size(index)?;
        buf.clear();
        buf.resize(size, 0);
        read_exact_at(source, self.offsets[index], buf)
    }
}

fn read_exact_at<S: ByteSource + ?Sized>(source: &mut S, offset: u64, buf: &mut [u8]) -> Result<()> {
    let found = source.read_at(offset, buf)?;
    if found != buf.len() {
        return Err(PDBError::TruncatedRead {
            offset,
            expected: buf.len(),
            found,
        });
    }
    Ok(())
}
