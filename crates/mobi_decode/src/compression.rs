use crate::error::{MobiError, Result};

/// Expands one PalmDOC-compressed record, producing at most
/// `max_output_len` bytes.
pub fn palmdoc_decompress(data: &[u8], max_output_len: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(max_output_len.min(data.len() * 8));
    palmdoc_decompress_into(data, &mut out, max_output_len)?;
    Ok(out)
}

/// Appends the expansion of `data` to `out`. Back-references only reach
/// bytes produced by this call; at most `max_output_len` bytes are added.
pub fn palmdoc_decompress_into(data: &[u8], out: &mut Vec<u8>, max_output_len: usize) -> Result<()> {
    let start = out.len();
    let limit = start.saturating_add(max_output_len);
    let room = |out: &Vec<u8>, n: usize| {
        if out.len() + n > limit {
            Err(MobiError::OutputBufferTooSmall { limit: max_output_len })
        } else {
            Ok(())
        }
    };

    let mut i = 0usize;
    while i < data.len() {
        let frame = data[i];
        i += 1;

        match frame {
            // 1..=8: copy next `frame` raw bytes
            1..=8 => {
                let n = frame as usize;
                let run = data
                    .get(i..i + n)
                    .ok_or(MobiError::TruncatedInput { position: i - 1 })?;
                room(out, n)?;
                out.extend_from_slice(run);
                i += n;
            }

            // 0 and 9..=127 stand for themselves
            0..=127 => {
                room(out, 1)?;
                out.push(frame);
            }

            // space + (frame ^ 0x80)
            192..=255 => {
                room(out, 2)?;
                out.push(b' ');
                out.push(frame ^ 0x80);
            }

            // 128..=191: two-byte backreference
            128..=191 => {
                let second = *data
                    .get(i)
                    .ok_or(MobiError::TruncatedInput { position: i - 1 })?;
                i += 1;

                let concat = ((frame as u16) << 8) | (second as u16);
                let distance = ((concat >> 3) & 0x07FF) as usize;
                let length = ((concat & 0x07) + 3) as usize;

                let available = out.len() - start;
                if distance == 0 || distance > available {
                    return Err(MobiError::InvalidBackReference { distance, available });
                }
                room(out, length)?;

                // Source and destination may overlap; bytes written by this
                // copy are read again when distance < length.
                let mut src = out.len() - distance;
                for _ in 0..length {
                    let b = out[src];
                    out.push(b);
                    src += 1;
                }
            }
        }
    }

    Ok(())
}
