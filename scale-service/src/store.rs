//! Backs `scale-core`'s synchronous [`scale_core::persistence::Store`] seam
//! with a lock-guarded in-process map, the same durability contract
//! `tfc::confman::ConfMan` gives its callers: the write is visible to every
//! reader the instant the call returns.

use parking_lot::RwLock;
use scale_core::error::PersistError;
use scale_core::persistence::{RecordKey, Store};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct SharedStore {
    inner: Arc<RwLock<HashMap<RecordKeyBits, Vec<u8>>>>,
}

type RecordKeyBits = (u8, u8);

fn key_bits(key: RecordKey) -> RecordKeyBits {
    match key {
        RecordKey::CalTable(i) => (0, i),
        RecordKey::ScaleStandardMode(i) => (1, i),
        RecordKey::SensorFeature(i) => (2, i),
        RecordKey::TotalStatistics(i) => (3, i),
        RecordKey::LoadcellDynamic(i) => (4, i),
        RecordKey::ServiceCounters(i) => (5, i),
        RecordKey::ListenerSettings => (6, 0),
        RecordKey::SetpointBlock(i) => (7, i),
        RecordKey::LcTotalMotionOpMode(i) => (8, i),
        RecordKey::LcStandardModeAzm(i) => (9, i),
    }
}

impl SharedStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for SharedStore {
    fn write(&mut self, key: RecordKey, bytes: &[u8]) -> Result<(), PersistError> {
        self.inner.write().insert(key_bits(key), bytes.to_vec());
        Ok(())
    }

    fn read(&self, key: RecordKey) -> Result<Vec<u8>, PersistError> {
        self.inner
            .read()
            .get(&key_bits(key))
            .cloned()
            .ok_or(PersistError::NvMemoryFail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_are_visible_through_any_clone() {
        let mut store = SharedStore::new();
        let reader = store.clone();
        store.write(RecordKey::CalTable(1), &[9, 9]).unwrap();
        assert_eq!(reader.read(RecordKey::CalTable(1)).unwrap(), vec![9, 9]);
    }
}
