use crate::error::{MobiError, Result};
use byyte::{ByteReader, tag_at, u32_at};
use log::debug;
use std::io::Cursor;

pub const NULL_INDEX: u32 = 0xFFFFFFFF;

/// Size of the layout this parser knows about. Shorter headers are
/// zero-extended; longer ones keep their extra bytes unread.
const KNOWN_HEADER_LEN: usize = 0xE8;
/// Headers at least this long carry the extra record data flags.
pub const EXTRA_FLAGS_MIN_LEN: u32 = 0xE4;
const HUFFMAN_LOCATION_END: u32 = 0x68;
const EXTH_FLAGS_END: u32 = 0x74;
const EXTH_PRESENT: u32 = 0x40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MOBIType {
    MobiBook,
    PalmDoc,
    Audio,
    News,
    NewsFeed,
    NewsMagazine,
    Pics,
    Word,
    Xls,
    Ppt,
    Text,
    Html,
    Unknown(u32),
}

impl From<u32> for MOBIType {
    fn from(value: u32) -> Self {
        match value {
            2 => MOBIType::MobiBook,
            3 => MOBIType::PalmDoc,
            4 => MOBIType::Audio,
            257 => MOBIType::News,
            258 => MOBIType::NewsFeed,
            259 => MOBIType::NewsMagazine,
            513 => MOBIType::Pics,
            514 => MOBIType::Word,
            515 => MOBIType::Xls,
            516 => MOBIType::Ppt,
            517 => MOBIType::Text,
            518 => MOBIType::Html,
            other => MOBIType::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Cp1252,
    Utf8,
    Unknown(u32),
}

impl From<u32> for TextEncoding {
    fn from(value: u32) -> Self {
        match value {
            1252 => TextEncoding::Cp1252,
            65001 => TextEncoding::Utf8,
            other => TextEncoding::Unknown(other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MOBIHeader {
    pub header_length: u32,
    pub mobi_type: MOBIType,
    pub text_encoding: TextEncoding,
    pub unique_id: u32,
    pub file_version: u32,
    pub orthographic_index: u32,
    pub inflection_index: u32,
    pub index_names: u32,
    pub index_keys: u32,
    pub extra_indices: [u32; 6],
    pub first_non_book_index: u32,
    pub full_name_offset: u32,
    pub full_name_length: u32,
    pub locale: u32,
    pub input_language: u32,
    pub output_language: u32,
    pub min_version: u32,
    pub first_image_index: u32,
    pub huffman_record_offset: u32,
    pub huffman_record_count: u32,
    pub huffman_table_offset: u32,
    pub huffman_table_length: u32,
    pub exth_flags: u32,
    pub drm_offset: u32,
    pub drm_count: u32,
    pub drm_size: u32,
    pub drm_flags: u32,
    pub first_content_record_number: u16,
    pub last_content_record_number: u16,
    pub fcis_record_number: u32,
    pub flis_record_number: u32,
    pub first_compilation_data_section_count: u32,
    pub number_of_compilation_data_sections: u32,
    pub extra_record_data_flags: u32,
    pub indx_record_offset: u32,
}

impl MOBIHeader {
    /// Parses the MOBI header at the start of `data`, which holds everything
    /// in record 0 after the PalmDOC header.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let identifier = tag_at(data, 0)
            .ok_or_else(|| MobiError::InvalidExtendedHeader("truncated identifier".to_owned()))?;
        if &identifier != b"MOBI" {
            return Err(MobiError::InvalidExtendedHeader(format!(
                "identifier is '{}', expected 'MOBI'",
                identifier.escape_ascii()
            )));
        }
        let header_length = u32_at(data, 4)
            .ok_or_else(|| MobiError::InvalidExtendedHeader("truncated header length".to_owned()))?;
        let declared = header_length as usize;
        if declared > data.len() {
            return Err(MobiError::HeaderTooLarge {
                declared,
                available: data.len(),
            });
        }
        if declared < 8 {
            return Err(MobiError::InvalidExtendedHeader(format!(
                "header length {declared} is shorter than its own preamble"
            )));
        }

        let mut block = data[..declared].to_vec();
        if block.len() < KNOWN_HEADER_LEN {
            block.resize(KNOWN_HEADER_LEN, 0);
        }
        let mut reader = Cursor::new(&block[8..]);

        let mobi_type = MOBIType::from(reader.read_u32()?);
        let text_encoding = TextEncoding::from(reader.read_u32()?);
        let unique_id = reader.read_u32()?;
        let file_version = reader.read_u32()?;
        let orthographic_index = reader.read_u32()?;
        let inflection_index = reader.read_u32()?;
        let index_names = reader.read_u32()?;
        let index_keys = reader.read_u32()?;
        let mut extra_indices = [0u32; 6];
        for index in extra_indices.iter_mut() {
            *index = reader.read_u32()?;
        }
        let first_non_book_index = reader.read_u32()?;
        let full_name_offset = reader.read_u32()?;
        let full_name_length = reader.read_u32()?;
        let locale = reader.read_u32()?;
        let input_language = reader.read_u32()?;
        let output_language = reader.read_u32()?;
        let min_version = reader.read_u32()?;
        let first_image_index = reader.read_u32()?;
        let huffman_record_offset = reader.read_u32()?;
        let huffman_record_count = reader.read_u32()?;
        let huffman_table_offset = reader.read_u32()?;
        let huffman_table_length = reader.read_u32()?;
        let exth_flags = reader.read_u32()?;

        _ = reader.read_array::<32>()?;
        _ = reader.read_u32()?;
        let drm_offset = reader.read_u32()?;
        let drm_count = reader.read_u32()?;
        let drm_size = reader.read_u32()?;
        let drm_flags = reader.read_u32()?;
        _ = reader.read_array::<8>()?;
        let first_content_record_number = reader.read_u16()?;
        let last_content_record_number = reader.read_u16()?;
        _ = reader.read_u32()?;
        let fcis_record_number = reader.read_u32()?;
        _ = reader.read_u32()?;
        let flis_record_number = reader.read_u32()?;
        _ = reader.read_u32()?;
        _ = reader.read_array::<8>()?;
        _ = reader.read_u32()?;
        let first_compilation_data_section_count = reader.read_u32()?;
        let number_of_compilation_data_sections = reader.read_u32()?;
        _ = reader.read_u32()?;
        let extra_record_data_flags = reader.read_u32()?;
        let indx_record_offset = reader.read_u32()?;

        debug!("Read MOBI header: {header_length} bytes, type {mobi_type:?}, version {file_version}");

        Ok(MOBIHeader {
            header_length,
            mobi_type,
            text_encoding,
            unique_id,
            file_version,
            orthographic_index,
            inflection_index,
            index_names,
            index_keys,
            extra_indices,
            first_non_book_index,
            full_name_offset,
            full_name_length,
            locale,
            input_language,
            output_language,
            min_version,
            first_image_index,
            huffman_record_offset,
            huffman_record_count,
            huffman_table_offset,
            huffman_table_length,
            exth_flags,
            drm_offset,
            drm_count,
            drm_size,
            drm_flags,
            first_content_record_number,
            last_content_record_number,
            fcis_record_number,
            flis_record_number,
            first_compilation_data_section_count,
            number_of_compilation_data_sections,
            extra_record_data_flags,
            indx_record_offset,
        })
    }

    /// Low half of the extra record data flags, when the header is long
    /// enough to carry them.
    pub fn extra_data_flags(&self) -> Option<u16> {
        (self.header_length >= EXTRA_FLAGS_MIN_LEN).then_some((self.extra_record_data_flags & 0xFFFF) as u16)
    }

    /// First record and record count of the HUFF/CDIC dictionary.
    pub fn huffman_location(&self) -> Option<(u32, u32)> {
        (self.header_length >= HUFFMAN_LOCATION_END)
            .then_some((self.huffman_record_offset, self.huffman_record_count))
    }

    pub fn has_exth(&self) -> bool {
        self.header_length >= EXTH_FLAGS_END && self.exth_flags & EXTH_PRESENT != 0
    }
}
