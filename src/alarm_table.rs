//! The per-weekday alarm table and its persisted form.
//!
//! The table is stored as one document in a [`BlobStore`]: a small header, a postcard payload,
//! and a CRC over both. Every save replaces the whole document.

use core::fmt;

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use time::Weekday;

use crate::hardware::BlobStore;
use crate::{Error, Result};

/// Time of day an alarm is due.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmTime {
    hour: u8,
    minute: u8,
}

impl AlarmTime {
    /// # Errors
    /// Returns [`Error::InvalidTime`] unless `hour < 24` and `minute < 60`.
    pub const fn new(hour: u8, minute: u8) -> Result<Self> {
        if hour < 24 && minute < 60 {
            Ok(Self { hour, minute })
        } else {
            Err(Error::InvalidTime)
        }
    }

    /// Parse `HH:MM`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidTime`] for anything else.
    pub fn parse(text: &str) -> Result<Self> {
        let (hour, minute) = text.split_once(':').ok_or(Error::InvalidTime)?;
        let hour = hour.parse().map_err(|_| Error::InvalidTime)?;
        let minute = minute.parse().map_err(|_| Error::InvalidTime)?;
        Self::new(hour, minute)
    }

    #[must_use]
    pub const fn hour(self) -> u8 {
        self.hour
    }

    #[must_use]
    pub const fn minute(self) -> u8 {
        self.minute
    }
}

impl fmt::Display for AlarmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Alarm time for each day, Monday first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmTable {
    entries: [AlarmTime; 7],
}

/// Every day's alarm when nothing has been stored yet.
pub const DEFAULT_ALARM: AlarmTime = AlarmTime {
    hour: 10,
    minute: 0,
};

impl Default for AlarmTable {
    fn default() -> Self {
        Self {
            entries: [DEFAULT_ALARM; 7],
        }
    }
}

impl AlarmTable {
    #[must_use]
    pub fn get(&self, day: Weekday) -> AlarmTime {
        self.entries
            .get(usize::from(day.number_days_from_monday()))
            .copied()
            .unwrap_or(DEFAULT_ALARM)
    }

    pub fn set(&mut self, day: Weekday, time: AlarmTime) {
        if let Some(entry) = self.entries.get_mut(usize::from(day.number_days_from_monday())) {
            *entry = time;
        }
    }

    /// `(day, time)` for every day, Monday first.
    pub fn iter(&self) -> impl Iterator<Item = (Weekday, AlarmTime)> + '_ {
        WEEK.iter().copied().zip(self.entries.iter().copied())
    }
}

/// The days of the week, Monday first.
pub const WEEK: [Weekday; 7] = [
    Weekday::Monday,
    Weekday::Tuesday,
    Weekday::Wednesday,
    Weekday::Thursday,
    Weekday::Friday,
    Weekday::Saturday,
    Weekday::Sunday,
];

// ===== Persistence ==========================================================

const MAGIC: u32 = 0x414C_524D; // 'ALRM'
const VERSION: u16 = 1;
const HEADER_SIZE: usize = 4 + 2 + 2; // Magic + Version + PayloadLen
const CRC_SIZE: usize = 4;
const MAX_PAYLOAD_SIZE: usize = 32;

/// Largest stored document.
pub const DOCUMENT_CAPACITY: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE + CRC_SIZE;

/// Serialize `table` into `buffer`, returning the bytes to store.
///
/// # Errors
/// Returns [`Error::Codec`] if `buffer` is too small.
pub fn encode<'b>(
    table: &AlarmTable,
    buffer: &'b mut [u8; DOCUMENT_CAPACITY],
) -> Result<&'b [u8]> {
    let (header, rest) = buffer.split_at_mut(HEADER_SIZE);
    let payload = rest.get_mut(..MAX_PAYLOAD_SIZE).ok_or(Error::Codec)?;
    let payload_len = postcard::to_slice(table, payload)?.len();

    header
        .get_mut(0..4)
        .ok_or(Error::Codec)?
        .copy_from_slice(&MAGIC.to_le_bytes());
    header
        .get_mut(4..6)
        .ok_or(Error::Codec)?
        .copy_from_slice(&VERSION.to_le_bytes());
    let payload_len_u16 = u16::try_from(payload_len).map_err(|_| Error::Codec)?;
    header
        .get_mut(6..8)
        .ok_or(Error::Codec)?
        .copy_from_slice(&payload_len_u16.to_le_bytes());

    let crc_offset = HEADER_SIZE + payload_len;
    let crc = compute_crc(buffer.get(..crc_offset).ok_or(Error::Codec)?);
    buffer
        .get_mut(crc_offset..crc_offset + CRC_SIZE)
        .ok_or(Error::Codec)?
        .copy_from_slice(&crc.to_le_bytes());
    buffer.get(..crc_offset + CRC_SIZE).ok_or(Error::Codec)
}

/// Parse a stored document.
///
/// Returns `Ok(None)` if the document was written by something else (wrong magic or version).
///
/// # Errors
/// Returns [`Error::CorruptAlarmTable`] on a bad length, CRC, or payload.
pub fn decode(bytes: &[u8]) -> Result<Option<AlarmTable>> {
    if read_u32(bytes, 0) != Some(MAGIC) || read_u16(bytes, 4) != Some(VERSION) {
        return Ok(None);
    }
    let payload_len = usize::from(read_u16(bytes, 6).ok_or(Error::CorruptAlarmTable)?);
    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(Error::CorruptAlarmTable);
    }

    let crc_offset = HEADER_SIZE + payload_len;
    let stored_crc = read_u32(bytes, crc_offset).ok_or(Error::CorruptAlarmTable)?;
    let covered = bytes.get(..crc_offset).ok_or(Error::CorruptAlarmTable)?;
    if compute_crc(covered) != stored_crc {
        return Err(Error::CorruptAlarmTable);
    }

    let payload = bytes
        .get(HEADER_SIZE..crc_offset)
        .ok_or(Error::CorruptAlarmTable)?;
    let table: AlarmTable = postcard::from_bytes(payload).map_err(|_| Error::CorruptAlarmTable)?;
    // Reject out-of-range times.
    for (_, time) in table.iter() {
        AlarmTime::new(time.hour, time.minute).map_err(|_| Error::CorruptAlarmTable)?;
    }
    Ok(Some(table))
}

/// Read the table from `store`.
///
/// # Errors
/// Returns the store's error, or [`Error::CorruptAlarmTable`].
pub fn load(store: &mut dyn BlobStore) -> Result<Option<AlarmTable>> {
    let mut buffer = [0u8; DOCUMENT_CAPACITY];
    let len = store.load(&mut buffer)?;
    decode(buffer.get(..len).ok_or(Error::CorruptAlarmTable)?)
}

/// Replace the stored table with `table`.
///
/// # Errors
/// Returns the store's error if the write fails.
pub fn save(store: &mut dyn BlobStore, table: &AlarmTable) -> Result<()> {
    let mut buffer = [0u8; DOCUMENT_CAPACITY];
    let bytes = encode(table, &mut buffer)?;
    store.save(bytes)
}

/// Load the table, or fall back to [`AlarmTable::default`] and store that.
pub fn load_or_default(store: &mut dyn BlobStore) -> AlarmTable {
    match load(store) {
        Ok(Some(table)) => {
            info!("alarm table loaded");
            return table;
        }
        Ok(None) => warn!("no alarm table stored, using defaults"),
        Err(error) => warn!("alarm table unreadable ({}), using defaults", error),
    }
    let table = AlarmTable::default();
    if let Err(error) = save(store, &table) {
        error!("could not store default alarm table: {}", error);
    }
    table
}

fn read_u16(bytes: &[u8], at: usize) -> Option<u16> {
    let raw = bytes.get(at..at + 2)?;
    Some(u16::from_le_bytes(raw.try_into().ok()?))
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let raw = bytes.get(at..at + 4)?;
    Some(u32::from_le_bytes(raw.try_into().ok()?))
}

fn compute_crc(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_parsing() {
        assert_eq!(AlarmTime::parse("07:30"), AlarmTime::new(7, 30));
        assert_eq!(AlarmTime::parse("7:5").map(|t| (t.hour(), t.minute())), Ok((7, 5)));
        assert_eq!(AlarmTime::parse("24:00"), Err(Error::InvalidTime));
        assert_eq!(AlarmTime::parse("12:60"), Err(Error::InvalidTime));
        assert_eq!(AlarmTime::parse("noon"), Err(Error::InvalidTime));
    }

    #[test]
    fn flipped_bit_is_detected() {
        let mut buffer = [0u8; DOCUMENT_CAPACITY];
        let mut table = AlarmTable::default();
        table.set(Weekday::Friday, AlarmTime::new(6, 45).expect("valid"));
        let mut bytes = [0u8; DOCUMENT_CAPACITY];
        let encoded = encode(&table, &mut buffer).expect("fits");
        let len = encoded.len();
        bytes[..len].copy_from_slice(encoded);

        assert_eq!(decode(&bytes[..len]), Ok(Some(table)));
        bytes[HEADER_SIZE] ^= 0x01;
        assert_eq!(decode(&bytes[..len]), Err(Error::CorruptAlarmTable));
    }

    #[test]
    fn foreign_document_is_not_a_table() {
        assert_eq!(decode(b"hello world"), Ok(None));
        assert_eq!(decode(&[]), Ok(None));
    }
}
