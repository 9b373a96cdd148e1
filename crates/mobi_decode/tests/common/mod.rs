#![allow(dead_code)]

use byyte::ByteWriter;
use palm_database::{PDBBuilder, PDBKind};

pub const COMPRESSION_NONE: u16 = 1;
pub const COMPRESSION_PALMDOC: u16 = 2;
pub const COMPRESSION_HUFFCDIC: u16 = 17480;

/// Describes a book to be laid out as a PDB image.
pub struct Book {
    pub kind: PDBKind,
    pub compression: u16,
    pub encryption: u16,
    pub text_length: u32,
    /// Text record count written to record 0; defaults to the records given.
    pub record_count: Option<u16>,
    /// Length of the MOBI header in record 0; zero leaves it out.
    pub mobi_header_len: u32,
    pub extra_flags: u16,
    pub huffman: (u32, u32),
    pub title: Option<&'static str>,
    pub text_records: Vec<Vec<u8>>,
    /// Records stored after the text, such as HUFF and CDIC.
    pub extra_records: Vec<Vec<u8>>,
}

impl Book {
    pub fn palmdoc(text_records: Vec<Vec<u8>>, text_length: u32) -> Self {
        Book {
            kind: PDBKind::PalmDoc,
            compression: COMPRESSION_NONE,
            encryption: 0,
            text_length,
            record_count: None,
            mobi_header_len: 0,
            extra_flags: 0,
            huffman: (0, 0),
            title: None,
            text_records,
            extra_records: Vec::new(),
        }
    }

    pub fn mobi(compression: u16, text_records: Vec<Vec<u8>>, text_length: u32) -> Self {
        Book {
            kind: PDBKind::Mobi,
            compression,
            mobi_header_len: 0xE8,
            ..Book::palmdoc(text_records, text_length)
        }
    }

    pub fn record0(&self) -> Vec<u8> {
        let mut record0 = Vec::new();
        record0.write_u16(self.compression).unwrap();
        record0.write_u16(0).unwrap();
        record0.write_u32(self.text_length).unwrap();
        record0
            .write_u16(self.record_count.unwrap_or(self.text_records.len() as u16))
            .unwrap();
        record0.write_u16(4096).unwrap();
        record0.write_u16(self.encryption).unwrap();
        record0.write_u16(0).unwrap();

        if self.mobi_header_len > 0 {
            let len = self.mobi_header_len;
            let mut header = vec![0u8; len as usize];
            put(&mut header, 0, u32::from_be_bytes(*b"MOBI"));
            put(&mut header, 4, len);
            put(&mut header, 0x08, 2);
            put(&mut header, 0x0C, 65001);
            if let Some(title) = self.title {
                put(&mut header, 0x44, 16 + len);
                put(&mut header, 0x48, title.len() as u32);
            }
            put(&mut header, 0x60, self.huffman.0);
            put(&mut header, 0x64, self.huffman.1);
            put(&mut header, 0xE0, self.extra_flags as u32);
            record0.extend_from_slice(&header);
            if let Some(title) = self.title {
                record0.extend_from_slice(title.as_bytes());
            }
        }
        record0
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut builder = PDBBuilder::new()
            .name("Fixture")
            .kind(self.kind)
            .add_record(&self.record0());
        for record in self.text_records.iter().chain(&self.extra_records) {
            builder = builder.add_record(record);
        }
        builder.to_bytes().unwrap()
    }
}

/// Writes `value` at `offset` when the header is long enough to hold it.
fn put(header: &mut [u8], offset: usize, value: u32) {
    if let Some(field) = header.get_mut(offset..offset + 4) {
        field.copy_from_slice(&value.to_be_bytes());
    }
}

/// A HUFF record where every input byte is an eight bit code for phrase
/// `255 - byte`.
pub fn uniform_huff() -> Vec<u8> {
    let mut data = b"HUFF".to_vec();
    data.extend_from_slice(&24u32.to_be_bytes());
    data.extend_from_slice(&24u32.to_be_bytes());
    data.extend_from_slice(&(24u32 + 1024).to_be_bytes());
    data.extend_from_slice(&[0u8; 8]);
    for _ in 0..256 {
        data.extend_from_slice(&((255u32 << 8) | 0x80 | 8).to_be_bytes());
    }
    for len in 1..=32u32 {
        let (min, max) = if len == 8 { (0u32, 255u32) } else { (0, 0) };
        data.extend_from_slice(&min.to_be_bytes());
        data.extend_from_slice(&max.to_be_bytes());
    }
    data
}

/// The input byte that selects phrase `index` under [`uniform_huff`].
pub fn code(index: u8) -> u8 {
    255 - index
}

pub fn cdic(total: u32, bits: u32, phrases: &[(bool, Vec<u8>)]) -> Vec<u8> {
    let mut data = b"CDIC".to_vec();
    data.extend_from_slice(&16u32.to_be_bytes());
    data.extend_from_slice(&total.to_be_bytes());
    data.extend_from_slice(&bits.to_be_bytes());
    let mut offset = phrases.len() * 2;
    for (_, bytes) in phrases {
        data.extend_from_slice(&(offset as u16).to_be_bytes());
        offset += 2 + bytes.len();
    }
    for (literal, bytes) in phrases {
        let flag = if *literal { 0x8000 } else { 0 };
        data.extend_from_slice(&(bytes.len() as u16 | flag).to_be_bytes());
        data.extend_from_slice(bytes);
    }
    data
}
