use crate::compression::palmdoc_decompress_into;
use crate::error::{MobiError, Result};
use crate::exth_header::EXTHHeader;
use crate::huffcdic::HuffCdicReader;
pub use crate::mobi_header::MOBIHeader;
use crate::palmdoc_header::PALMDOC_HEADER_LEN;
pub use crate::palmdoc_header::{Compression, PalmDOCHeader};
use crate::trailing::TrailingDataShape;
use log::{debug, info, warn};
use palm_database::{ByteSource, PDB, PDBKind};

/// An opened MOBI or PalmDOC book: container, headers and, for HUFF/CDIC
/// books, the loaded dictionary. Text is decoded with [`MOBI::text`].
#[derive(Debug, Clone)]
pub struct MOBI {
    pub pdb: PDB,
    pub palmdoc_header: PalmDOCHeader,
    pub header: Option<MOBIHeader>,
    pub exth: Option<EXTHHeader>,
    /// Title bytes from record 0, in the book's text encoding.
    pub full_name: Option<Vec<u8>>,
    pub trailing: TrailingDataShape,
    huffman: Option<HuffCdicReader>,
}

impl MOBI {
    pub fn open<S: ByteSource + ?Sized>(source: &mut S) -> Result<Self> {
        let pdb = PDB::open(source)?;
        let record0 = pdb.read_record(source, 0)?;
        let palmdoc_header = PalmDOCHeader::from_bytes(&record0, pdb.kind())?;

        let rest = &record0[PALMDOC_HEADER_LEN..];
        let header = if rest.is_empty() {
            if pdb.kind() == PDBKind::Mobi {
                return Err(MobiError::InvalidExtendedHeader(
                    "BOOKMOBI record 0 ends after the PalmDOC header".to_owned(),
                ));
            }
            None
        } else {
            Some(MOBIHeader::from_bytes(rest)?)
        };

        let trailing = header
            .as_ref()
            .and_then(MOBIHeader::extra_data_flags)
            .map(TrailingDataShape::from_flags)
            .unwrap_or_default();
        debug!(
            "Text records carry {} trailer entries, multibyte: {}",
            trailing.trailers, trailing.multibyte
        );

        let mut exth = None;
        let mut full_name = None;
        if let Some(header) = &header {
            if header.has_exth() {
                exth = Some(EXTHHeader::from_bytes(&rest[header.header_length as usize..])?);
            }
            if header.full_name_length > 0 {
                full_name = Some(read_full_name(&record0, header)?.to_vec());
            }
        }

        let huffman = match palmdoc_header.compression {
            Compression::HuffCdic => Some(load_huffman(&pdb, source, header.as_ref())?),
            _ => None,
        };

        info!(
            "Opened {:?} book '{}': {:?} compression, {} text records, {} bytes of text",
            pdb.kind(),
            pdb.header.name,
            palmdoc_header.compression,
            palmdoc_header.record_count,
            palmdoc_header.text_length
        );

        Ok(MOBI {
            pdb,
            palmdoc_header,
            header,
            exth,
            full_name,
            trailing,
            huffman,
        })
    }

    /// Reads text record `index` into `buf` and returns the length of its
    /// payload once trailing data is removed.
    pub fn read_record<S: ByteSource + ?Sized>(
        &self,
        source: &mut S,
        index: usize,
        buf: &mut Vec<u8>,
    ) -> Result<usize> {
        self.pdb.read_record_into(source, index, buf)?;
        self.trailing
            .payload_len(buf)
            .map_err(|reason| MobiError::CorruptTrailingData { record: index, reason })
    }

    /// Decodes every text record in order. Output is bounded by the declared
    /// text length: running past it is `OutputBufferTooSmall`, falling short
    /// of it is `SizeMismatch`.
    pub fn text<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Result<Vec<u8>> {
        let expected = self.palmdoc_header.text_length as usize;
        let mut out = Vec::with_capacity(expected);
        let mut raw = Vec::new();

        for index in 1..=self.palmdoc_header.record_count as usize {
            let len = self.read_record(source, index, &mut raw)?;
            let payload = &raw[..len];
            // Each record may only fill what the declared length still owes.
            let remaining = expected.saturating_sub(out.len());

            let decoded = match self.palmdoc_header.compression {
                Compression::None if payload.len() > remaining => {
                    Err(MobiError::OutputBufferTooSmall { limit: remaining })
                }
                Compression::None => {
                    out.extend_from_slice(payload);
                    Ok(())
                }
                Compression::PalmDoc => palmdoc_decompress_into(payload, &mut out, remaining),
                Compression::HuffCdic => match self.huffman.as_mut() {
                    Some(reader) => reader.decompress_into(payload, &mut out, remaining),
                    None => Err(MobiError::InvalidExtendedHeader(
                        "no Huffman dictionary loaded".to_owned(),
                    )),
                },
            };
            decoded.map_err(|e| match e {
                MobiError::OutputBufferTooSmall { .. } => {
                    warn!("Text record {index} runs past the declared {expected} bytes");
                    MobiError::OutputBufferTooSmall { limit: expected }
                }
                e => e,
            })?;
        }

        if out.len() != expected {
            return Err(MobiError::SizeMismatch {
                expected,
                found: out.len(),
            });
        }

        info!("Decoded {} bytes from {} text records", out.len(), self.palmdoc_header.record_count);
        Ok(out)
    }
}

fn read_full_name<'a>(record0: &'a [u8], header: &MOBIHeader) -> Result<&'a [u8]> {
    let start = header.full_name_offset as usize;
    let end = start.saturating_add(header.full_name_length as usize);
    record0.get(start..end).ok_or_else(|| {
        MobiError::InvalidExtendedHeader(format!(
            "full name at {start}..{end} lies outside the {} byte record 0",
            record0.len()
        ))
    })
}

fn load_huffman<S: ByteSource + ?Sized>(
    pdb: &PDB,
    source: &mut S,
    header: Option<&MOBIHeader>,
) -> Result<HuffCdicReader> {
    let header = header.ok_or_else(|| {
        MobiError::InvalidExtendedHeader("HUFF/CDIC compression without a MOBI header".to_owned())
    })?;
    let (first, count) = header.huffman_location().ok_or_else(|| {
        MobiError::InvalidExtendedHeader("MOBI header too short to locate the HUFF record".to_owned())
    })?;
    if count == 0 {
        return Err(MobiError::InvalidExtendedHeader("HUFF record count is zero".to_owned()));
    }

    let first = first as usize;
    let mut reader = HuffCdicReader::new(&pdb.read_record(source, first)?)?;
    for i in 1..count as usize {
        reader.add_cdic(&pdb.read_record(source, first.saturating_add(i))?)?;
    }

    debug!(
        "Loaded HUFF/CDIC dictionary from records {first}..{}: {} phrases",
        first.saturating_add(count as usize),
        reader.phrase_count()
    );
    Ok(reader)
}
