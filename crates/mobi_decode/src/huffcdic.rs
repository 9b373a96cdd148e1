//! HUFF/CDIC decompression.
//!
//! The HUFF record holds a 256-entry lookup keyed by the next eight bits of
//! input plus a table of per-length code bounds for codes longer than the
//! lookup resolves. Each decoded code is an index into the phrase
//! dictionary spread across the CDIC records. A phrase is either literal
//! text or itself Huffman-coded, in which case it is expanded on first use
//! and kept expanded.

use crate::error::{MobiError, Result};
use byyte::{tag_at, u16_at, u32_at, u64_at};
use log::debug;

const HUFF_HEADER_LEN: u32 = 24;
const CDIC_HEADER_LEN: u32 = 16;
const CACHE_LEN: usize = 256 * 4;
const BASE_TABLE_LEN: usize = 32 * 8;
const MAX_CODE_LEN: usize = 32;
/// Nesting limit for phrases that expand into other phrases.
const MAX_PHRASE_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, Default)]
struct CacheEntry {
    code_len: u8,
    terminal: bool,
    max_code: u64,
}

#[derive(Debug, Clone)]
enum Phrase {
    Literal(Vec<u8>),
    Packed(Vec<u8>),
    /// Placeholder while a packed phrase is being expanded.
    Expanding,
}

#[derive(Debug, Clone)]
pub struct HuffCdicReader {
    cache: [CacheEntry; 256],
    /// Smallest code of each length, left-aligned in 32 bits. Index 0 unused.
    min_codes: [u64; MAX_CODE_LEN + 1],
    max_codes: [u64; MAX_CODE_LEN + 1],
    phrases: Vec<Phrase>,
}

fn malformed(reason: impl Into<String>) -> MobiError {
    MobiError::MalformedHuffmanHeader(reason.into())
}

fn decode_failure(reason: impl Into<String>) -> MobiError {
    MobiError::HuffmanDecodeFailure(reason.into())
}

impl HuffCdicReader {
    /// Builds the code tables from the HUFF record.
    pub fn new(huff: &[u8]) -> Result<Self> {
        if huff.len() < HUFF_HEADER_LEN as usize || tag_at(huff, 0) != Some(*b"HUFF") {
            return Err(malformed("missing HUFF identifier"));
        }
        let header_len = u32_at(huff, 4).ok_or_else(|| malformed("truncated HUFF header"))?;
        let cache_offset = u32_at(huff, 8).ok_or_else(|| malformed("truncated HUFF header"))? as usize;
        let base_offset = u32_at(huff, 12).ok_or_else(|| malformed("truncated HUFF header"))? as usize;

        if header_len != HUFF_HEADER_LEN {
            return Err(malformed(format!("HUFF header length {header_len}, expected {HUFF_HEADER_LEN}")));
        }
        if cache_offset.checked_add(CACHE_LEN) != Some(base_offset) {
            return Err(malformed(format!(
                "base table at {base_offset} does not follow the cache at {cache_offset}"
            )));
        }
        if base_offset.saturating_add(BASE_TABLE_LEN) > huff.len() {
            return Err(malformed(format!(
                "base table at {base_offset} runs past the {} byte record",
                huff.len()
            )));
        }

        let mut cache = [CacheEntry::default(); 256];
        for (i, entry) in cache.iter_mut().enumerate() {
            let v = u32_at(huff, cache_offset + i * 4).ok_or_else(|| malformed("truncated cache"))?;
            let code_len = (v & 0x1F) as u8;
            let terminal = v & 0x80 != 0;
            if code_len == 0 {
                return Err(malformed(format!("cache entry {i} has no code length")));
            }
            if code_len <= 8 && !terminal {
                return Err(malformed(format!("cache entry {i} is short but not terminal")));
            }
            *entry = CacheEntry {
                code_len,
                terminal,
                max_code: (((v >> 8) as u64 + 1) << (32 - code_len)) - 1,
            };
        }

        let mut min_codes = [0u64; MAX_CODE_LEN + 1];
        let mut max_codes = [0u64; MAX_CODE_LEN + 1];
        for len in 1..=MAX_CODE_LEN {
            let pos = base_offset + (len - 1) * 8;
            let min = u32_at(huff, pos).ok_or_else(|| malformed("truncated base table"))?;
            let max = u32_at(huff, pos + 4).ok_or_else(|| malformed("truncated base table"))?;
            min_codes[len] = (min as u64) << (32 - len);
            max_codes[len] = ((max as u64 + 1) << (32 - len)) - 1;
        }

        Ok(HuffCdicReader {
            cache,
            min_codes,
            max_codes,
            phrases: Vec::new(),
        })
    }

    /// Appends the phrases carried by one CDIC record.
    pub fn add_cdic(&mut self, cdic: &[u8]) -> Result<()> {
        if tag_at(cdic, 0) != Some(*b"CDIC") {
            return Err(malformed("missing CDIC identifier"));
        }
        let header_len = u32_at(cdic, 4).ok_or_else(|| malformed("truncated CDIC header"))?;
        let total = u32_at(cdic, 8).ok_or_else(|| malformed("truncated CDIC header"))? as usize;
        let bits = u32_at(cdic, 12).ok_or_else(|| malformed("truncated CDIC header"))?;
        if header_len != CDIC_HEADER_LEN {
            return Err(malformed(format!("CDIC header length {header_len}, expected {CDIC_HEADER_LEN}")));
        }
        let per_record = 1usize
            .checked_shl(bits)
            .filter(|_| bits <= MAX_CODE_LEN as u32)
            .ok_or_else(|| malformed(format!("CDIC code width of {bits} bits")))?;

        let count = per_record.min(total.saturating_sub(self.phrases.len()));
        let base = CDIC_HEADER_LEN as usize;
        let mut phrases = Vec::with_capacity(count);
        for i in 0..count {
            let offset = u16_at(cdic, base + i * 2)
                .ok_or_else(|| malformed(format!("CDIC offset table ends before phrase {i}")))?;
            let pos = base + offset as usize;
            let blen = u16_at(cdic, pos).ok_or_else(|| malformed(format!("phrase {i} starts outside the record")))?;
            let len = (blen & 0x7FFF) as usize;
            let bytes = cdic
                .get(pos + 2..pos + 2 + len)
                .ok_or_else(|| malformed(format!("phrase {i} of {len} bytes runs past the record")))?
                .to_vec();
            phrases.push(if blen & 0x8000 != 0 {
                Phrase::Literal(bytes)
            } else {
                Phrase::Packed(bytes)
            });
        }
        self.phrases.append(&mut phrases);

        debug!("Loaded CDIC record: {count} phrases, {} total", self.phrases.len());
        Ok(())
    }

    pub fn phrase_count(&self) -> usize {
        self.phrases.len()
    }

    pub fn decompress(&mut self, data: &[u8], max_output_len: usize) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.decompress_into(data, &mut out, max_output_len)?;
        Ok(out)
    }

    /// Appends the expansion of `data` to `out`. Fails as soon as more than
    /// `max_output_len` bytes would be appended, including while a packed
    /// phrase is being expanded.
    pub fn decompress_into(&mut self, data: &[u8], out: &mut Vec<u8>, max_output_len: usize) -> Result<()> {
        let limit = out.len().saturating_add(max_output_len);
        self.unpack(data, out, limit, 0).map_err(|e| match e {
            MobiError::OutputBufferTooSmall { .. } => MobiError::OutputBufferTooSmall { limit: max_output_len },
            e => e,
        })
    }

    /// `limit` is the length `out` may grow to.
    fn unpack(&mut self, data: &[u8], out: &mut Vec<u8>, limit: usize, depth: usize) -> Result<()> {
        let mut bits_left = data.len() as i64 * 8;
        let mut padded = Vec::with_capacity(data.len() + 8);
        padded.extend_from_slice(data);
        padded.extend_from_slice(&[0u8; 8]);

        let window = |pos: usize| u64_at(&padded, pos).ok_or_else(|| decode_failure("bit cursor ran past input"));
        let mut pos = 0usize;
        let mut x = window(pos)?;
        let mut n: i32 = 32;

        loop {
            if n <= 0 {
                pos += 4;
                x = window(pos)?;
                n += 32;
            }
            let code = (x >> n) & 0xFFFF_FFFF;

            let entry = self.cache[(code >> 24) as usize];
            let mut code_len = entry.code_len as usize;
            let mut max_code = entry.max_code;
            if !entry.terminal {
                while code < self.min_codes[code_len] {
                    code_len += 1;
                    if code_len > MAX_CODE_LEN {
                        return Err(decode_failure(format!("no code length fits {code:#010x}")));
                    }
                }
                max_code = self.max_codes[code_len];
            }

            n -= code_len as i32;
            bits_left -= code_len as i64;
            if bits_left < 0 {
                break;
            }

            let index = max_code
                .checked_sub(code)
                .ok_or_else(|| decode_failure(format!("code {code:#010x} lies above its length's range")))?
                >> (32 - code_len);
            self.expand_phrase(index as usize, out, limit, depth)?;
        }

        Ok(())
    }

    fn expand_phrase(&mut self, index: usize, out: &mut Vec<u8>, limit: usize, depth: usize) -> Result<()> {
        let room = limit.saturating_sub(out.len());
        let count = self.phrases.len();
        let phrase = self.phrases.get_mut(index).ok_or_else(|| {
            decode_failure(format!("code resolves to phrase {index}, dictionary holds {count}"))
        })?;
        let packed = match phrase {
            Phrase::Literal(bytes) => {
                if bytes.len() > room {
                    return Err(MobiError::OutputBufferTooSmall { limit: room });
                }
                out.extend_from_slice(bytes);
                return Ok(());
            }
            Phrase::Expanding => return Err(decode_failure(format!("phrase {index} refers to itself"))),
            Phrase::Packed(bytes) => std::mem::take(bytes),
        };
        if depth >= MAX_PHRASE_DEPTH {
            self.phrases[index] = Phrase::Packed(packed);
            return Err(decode_failure(format!("phrases nest deeper than {MAX_PHRASE_DEPTH}")));
        }

        self.phrases[index] = Phrase::Expanding;
        let mut expanded = Vec::new();
        match self.unpack(&packed, &mut expanded, room, depth + 1) {
            Ok(()) => {
                out.extend_from_slice(&expanded);
                self.phrases[index] = Phrase::Literal(expanded);
                Ok(())
            }
            Err(e) => {
                self.phrases[index] = Phrase::Packed(packed);
                Err(e)
            }
        }
    }
}
