use crate::timestamp::to_palm_timestamp;
use crate::{PDB_HEADER_LEN, PDB_RECORD_ENTRY_LEN, PDBError, PDBKind, Result};
use byyte::ByteWriter;

/// Gap written between the record table and the first record, as Palm OS
/// tools do.
const TABLE_PADDING: usize = 2;

struct PendingRecord {
    unique_id: u32,
    attributes: u8,
    data: Vec<u8>,
}

/// Composes a PDB image record by record.
pub struct PDBBuilder {
    name: Option<String>,
    attributes: u16,
    version: u16,
    creation_time: Option<chrono::NaiveDateTime>,
    modification_time: Option<chrono::NaiveDateTime>,
    type_creator: Option<[u8; 8]>,
    records: Vec<PendingRecord>,
}

impl Default for PDBBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PDBBuilder {
    pub fn new() -> Self {
        PDBBuilder {
            name: None,
            attributes: 0,
            version: 0,
            creation_time: None,
            modification_time: None,
            type_creator: None,
            records: Vec::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn attributes(mut self, attributes: u16) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn version(mut self, version: u16) -> Self {
        self.version = version;
        self
    }

    pub fn creation_time(mut self, time: chrono::NaiveDateTime) -> Self {
        self.creation_time = Some(time);
        self
    }

    pub fn modification_time(mut self, time: chrono::NaiveDateTime) -> Self {
        self.modification_time = Some(time);
        self
    }

    pub fn kind(mut self, kind: PDBKind) -> Self {
        self.type_creator = Some(*kind.type_creator());
        self
    }

    /// Sets a raw type/creator tag, recognised or not.
    pub fn type_creator(mut self, tag: [u8; 8]) -> Self {
        self.type_creator = Some(tag);
        self
    }

    pub fn add_record(self, data: &[u8]) -> Self {
        let unique_id = self.records.len() as u32 * 2;
        self.add_record_with(unique_id, 0, data)
    }

    pub fn add_record_with(mut self, unique_id: u32, attributes: u8, data: &[u8]) -> Self {
        self.records.push(PendingRecord {
            unique_id,
            attributes,
            data: data.to_vec(),
        });
        self
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let name = self.name.as_deref().ok_or(PDBError::MissingField("name"))?;
        let type_creator = self.type_creator.ok_or(PDBError::MissingField("type/creator"))?;
        let number_of_records = u16::try_from(self.records.len()).map_err(|_| PDBError::InvalidField {
            field: "records",
            reason: format!("{} records do not fit in a PDB", self.records.len()),
        })?;

        let now = chrono::Utc::now().naive_utc();
        let timestamp = |time: Option<chrono::NaiveDateTime>| {
            to_palm_timestamp(time.unwrap_or(now)).map_err(|_| PDBError::InvalidField {
                field: "timestamp",
                reason: "date is not representable".to_owned(),
            })
        };

        let mut data = Vec::new();
        data.write_cstr(name, 32).map_err(|_| PDBError::InvalidField {
            field: "name",
            reason: format!("'{name}' is longer than 31 bytes"),
        })?;
        data.write_u16(self.attributes)?;
        data.write_u16(self.version)?;
        data.write_u32(timestamp(self.creation_time)?)?;
        data.write_u32(timestamp(self.modification_time)?)?;
        data.write_u32(0)?; // Never backed up
        data.write_u32(0)?; // Modification number
        data.write_u32(0)?; // App info
        data.write_u32(0)?; // Sort info
        data.extend_from_slice(&type_creator);
        data.write_u32(0)?; // Unique id seed
        data.write_u32(0)?; // Next record list
        data.write_u16(number_of_records)?;

        let mut offset = PDB_HEADER_LEN + self.records.len() * PDB_RECORD_ENTRY_LEN + TABLE_PADDING;
        for record in &self.records {
            let data_offset = u32::try_from(offset).map_err(|_| PDBError::InvalidField {
                field: "records",
                reason: "database exceeds 4 GiB".to_owned(),
            })?;
            data.write_u32(data_offset)?;
            data.write_u8(record.attributes)?;
            data.write_u24(record.unique_id & 0x00FF_FFFF)?;
            offset += record.data.len();
        }
        data.extend_from_slice(&[0u8; TABLE_PADDING]);

        for record in &self.records {
            data.extend_from_slice(&record.data);
        }

        Ok(data)
    }
}
