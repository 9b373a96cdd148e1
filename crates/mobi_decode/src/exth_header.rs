use crate::error::{MobiError, Result};
use byyte::{tag_at, u32_at};
use log::debug;

const EXTH_PREAMBLE_LEN: usize = 12;
const EXTH_RECORD_PREAMBLE_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EXTHRecord {
    pub kind: u32,
    pub data: Vec<u8>,
}

/// Metadata block following the MOBI header (author, publisher, cover...).
#[derive(Debug, Clone, Default)]
pub struct EXTHHeader {
    pub header_length: u32,
    pub records: Vec<EXTHRecord>,
}

fn invalid(reason: impl Into<String>) -> MobiError {
    MobiError::InvalidExtendedHeader(format!("EXTH: {}", reason.into()))
}

impl EXTHHeader {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if tag_at(data, 0) != Some(*b"EXTH") {
            return Err(invalid("missing identifier"));
        }
        let header_length = u32_at(data, 4).ok_or_else(|| invalid("truncated preamble"))?;
        let record_count = u32_at(data, 8).ok_or_else(|| invalid("truncated preamble"))?;
        let block = data
            .get(..header_length as usize)
            .filter(|block| block.len() >= EXTH_PREAMBLE_LEN)
            .ok_or_else(|| invalid(format!("length {header_length} does not fit record 0")))?;

        let mut records = Vec::new();
        let mut offset = EXTH_PREAMBLE_LEN;
        for _ in 0..record_count {
            let kind = u32_at(block, offset).ok_or_else(|| invalid("truncated record"))?;
            let len = u32_at(block, offset + 4).ok_or_else(|| invalid("truncated record"))? as usize;
            let end = offset
                .checked_add(len)
                .filter(|&end| len >= EXTH_RECORD_PREAMBLE_LEN && end <= block.len())
                .ok_or_else(|| invalid(format!("record of type {kind} has bad length {len}")))?;
            records.push(EXTHRecord {
                kind,
                data: block[offset + EXTH_RECORD_PREAMBLE_LEN..end].to_vec(),
            });
            offset = end;
        }

        debug!("Read EXTH header: {} records", records.len());

        Ok(EXTHHeader {
            header_length,
            records,
        })
    }

    pub fn get(&self, kind: u32) -> impl Iterator<Item = &[u8]> {
        self.records
            .iter()
            .filter(move |r| r.kind == kind)
            .map(|r| r.data.as_slice())
    }
}
