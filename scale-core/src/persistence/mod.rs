//! Persisted-record layout, CRC pairing, and the synchronous storage seam
//! `scale-core` calls into. `scale-core` never touches a filesystem or bus
//! directly -- it hands a caller-implemented [`Store`] a key and an
//! already-CRC'd byte buffer and expects the write to be durable by the
//! time the call returns, the same synchronous-write contract the original
//! firmware gets from masking interrupts around a single FRAM write.

pub mod crc;
pub mod records;

use crate::error::PersistError;

/// One persisted record slot. Each sensor/subsystem gets its own key so a
/// corrupt record doesn't take the rest of the store down with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKey {
    CalTable(u8),
    ScaleStandardMode(u8),
    SensorFeature(u8),
    TotalStatistics(u8),
    LoadcellDynamic(u8),
    ServiceCounters(u8),
    ListenerSettings,
    SetpointBlock(u8),
    LcTotalMotionOpMode(u8),
    LcStandardModeAzm(u8),
}

/// The synchronous persistence seam. A real implementation backs this with
/// FRAM/NVM/EEPROM; `scale-service` backs it with a lock-guarded in-process
/// store (see `SPEC_FULL.md` 5).
pub trait Store {
    fn write(&mut self, key: RecordKey, bytes: &[u8]) -> Result<(), PersistError>;
    fn read(&self, key: RecordKey) -> Result<Vec<u8>, PersistError>;
}

/// A dynamic loadcell record: the running gross/net/tare and status bits
/// that must survive a crash, not a clean shutdown, so the scale can report
/// a sane reading immediately on restart instead of zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadcellDynamicRecord {
    pub zero_adc: i32,
    pub tare_value: f32,
}

impl LoadcellDynamicRecord {
    fn payload_bytes(&self) -> [u8; 8] {
        let mut buf = [0u8; 8];
        buf[..4].copy_from_slice(&self.zero_adc.to_le_bytes());
        buf[4..].copy_from_slice(&self.tare_value.to_le_bytes());
        buf
    }

    pub fn crc(&self) -> u8 {
        crc::crc8_dallas_ff(&self.payload_bytes())
    }
}

/// Accumulated totaling-engine statistics, persisted so a total survives a
/// restart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TotalStatisticsRecord {
    pub accumulator: f64,
    pub count: u32,
    pub sum_sq: f64,
    pub max_total: f32,
    pub min_total: f32,
}

impl TotalStatisticsRecord {
    fn payload_bytes(&self) -> [u8; 28] {
        let mut buf = [0u8; 28];
        buf[..8].copy_from_slice(&self.accumulator.to_le_bytes());
        buf[8..12].copy_from_slice(&self.count.to_le_bytes());
        buf[12..20].copy_from_slice(&self.sum_sq.to_le_bytes());
        buf[20..24].copy_from_slice(&self.max_total.to_le_bytes());
        buf[24..].copy_from_slice(&self.min_total.to_le_bytes());
        buf
    }

    pub fn crc(&self) -> u16 {
        crc::crc16_xmodem(&self.payload_bytes())
    }
}

/// An in-memory [`Store`] for tests: no durability guarantees beyond the
/// process lifetime, used to exercise the CRC-mismatch rejection path.
#[derive(Debug, Default)]
pub struct MemStore {
    entries: std::collections::HashMap<u64, Vec<u8>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(key: RecordKey) -> u64 {
        // Cheap, stable-enough hash for a test double; collisions would
        // only ever surface inside this crate's own test suite.
        let (tag, idx): (u64, u64) = match key {
            RecordKey::CalTable(i) => (0, i as u64),
            RecordKey::ScaleStandardMode(i) => (1, i as u64),
            RecordKey::SensorFeature(i) => (2, i as u64),
            RecordKey::TotalStatistics(i) => (3, i as u64),
            RecordKey::LoadcellDynamic(i) => (4, i as u64),
            RecordKey::ServiceCounters(i) => (5, i as u64),
            RecordKey::ListenerSettings => (6, 0),
            RecordKey::SetpointBlock(i) => (7, i as u64),
            RecordKey::LcTotalMotionOpMode(i) => (8, i as u64),
            RecordKey::LcStandardModeAzm(i) => (9, i as u64),
        };
        (tag << 8) | idx
    }
}

impl Store for MemStore {
    fn write(&mut self, key: RecordKey, bytes: &[u8]) -> Result<(), PersistError> {
        self.entries.insert(Self::slot(key), bytes.to_vec());
        Ok(())
    }

    fn read(&self, key: RecordKey) -> Result<Vec<u8>, PersistError> {
        self.entries
            .get(&Self::slot(key))
            .cloned()
            .ok_or(PersistError::NvMemoryFail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mem_store_round_trips() {
        let mut store = MemStore::new();
        store.write(RecordKey::CalTable(0), &[1, 2, 3]).unwrap();
        assert_eq!(store.read(RecordKey::CalTable(0)).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn mem_store_missing_key_fails() {
        let store = MemStore::new();
        assert_eq!(store.read(RecordKey::CalTable(0)).unwrap_err(), PersistError::NvMemoryFail);
    }

    #[test]
    fn loadcell_dynamic_crc_detects_corruption() {
        let rec = LoadcellDynamicRecord {
            zero_adc: 1000,
            tare_value: 5.0,
        };
        let good = rec.crc();
        let corrupted = LoadcellDynamicRecord {
            zero_adc: 1001,
            ..rec
        };
        assert_ne!(corrupted.crc(), good);
    }
}
