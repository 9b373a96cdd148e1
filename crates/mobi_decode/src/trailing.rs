//! Extra bytes appended to text records.
//!
//! Bit 0 of the extra record data flags marks a multibyte-overlap trailer;
//! every other set bit adds one size-prefixed trailer entry. Entries are
//! stripped from the end first, the multibyte trailer last.

/// How much to cut from the tail of every text record before decompressing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrailingDataShape {
    pub trailers: u32,
    pub multibyte: bool,
}

impl TrailingDataShape {
    pub fn from_flags(flags: u16) -> Self {
        TrailingDataShape {
            trailers: (flags >> 1).count_ones(),
            multibyte: flags & 1 == 1,
        }
    }

    /// Length of the record once its trailing data is removed.
    pub fn payload_len(&self, record: &[u8]) -> Result<usize, String> {
        let mut len = record.len();

        for _ in 0..self.trailers {
            let size = trailer_entry_size(&record[..len]);
            len = len.checked_sub(size).ok_or_else(|| {
                format!("trailer entry of {size} bytes exceeds the remaining {len}")
            })?;
        }

        if self.multibyte {
            let last = match len.checked_sub(1) {
                Some(index) => record[index],
                None => return Err("no bytes left for the multibyte trailer".to_owned()),
            };
            let size = (last & 3) as usize + 1;
            len = len.checked_sub(size).ok_or_else(|| {
                format!("multibyte trailer of {size} bytes exceeds the remaining {len}")
            })?;
        }

        Ok(len)
    }
}

/// Reads the backward-encoded size at the end of `data`. Each byte adds
/// seven bits; a byte with the high bit set starts the number over.
fn trailer_entry_size(data: &[u8]) -> usize {
    let tail = &data[data.len().saturating_sub(4)..];
    tail.iter().fold(0usize, |num, &byte| {
        let num = if byte & 0x80 != 0 { 0 } else { num };
        (num << 7) | (byte & 0x7F) as usize
    })
}
