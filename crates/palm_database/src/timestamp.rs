//! Palm timestamps.
//!
//! Palm OS itself counts unsigned seconds since 1904-01-01.
//! Many later tools wrote signed seconds since the Unix epoch instead; the two
//! are told apart by the top bit, which is always set for any 1904-based date
//! after early 1972.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};
use std::io::{Error, ErrorKind};

fn palm_epoch() -> Result<NaiveDateTime, Error> {
    NaiveDate::from_ymd_opt(1904, 1, 1)
        .and_then(|t| t.and_hms_opt(0, 0, 0))
        .ok_or(Error::from(ErrorKind::InvalidData))
}

pub fn from_palm_timestamp(timestamp: u32) -> Result<NaiveDateTime, Error> {
    if timestamp & 0x8000_0000 != 0 {
        Ok(palm_epoch()? + TimeDelta::seconds(timestamp as i64))
    } else {
        DateTime::from_timestamp(timestamp as i64, 0)
            .map(|t| t.naive_utc())
            .ok_or(Error::from(ErrorKind::InvalidData))
    }
}

/// Encodes `datetime` in the 1904 convention.
pub fn to_palm_timestamp(datetime: NaiveDateTime) -> Result<u32, Error> {
    let seconds = datetime.signed_duration_since(palm_epoch()?).num_seconds();
    u32::try_from(seconds).map_err(|_| Error::from(ErrorKind::InvalidData))
}
