//! The ADC layer is an external collaborator (a real EtherCAT/SPI driver
//! lives in its own crate); `scale-core` only needs something that can hand
//! it a [`RawSample`] per sensor per tick.

use crate::sensor::{RawSample, SensorId};

pub trait SampleSource {
    fn sample(&mut self, id: SensorId) -> Option<RawSample>;
}

/// A deterministic source for tests and demos: each sensor replays a fixed
/// sequence of ADC counts, holding the last value once the sequence is
/// exhausted.
pub struct ScriptedSource {
    scripts: std::collections::HashMap<SensorId, (Vec<i32>, usize)>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        ScriptedSource {
            scripts: std::collections::HashMap::new(),
        }
    }

    pub fn with_script(mut self, id: SensorId, counts: Vec<i32>) -> Self {
        self.scripts.insert(id, (counts, 0));
        self
    }
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleSource for ScriptedSource {
    fn sample(&mut self, id: SensorId) -> Option<RawSample> {
        let (counts, pos) = self.scripts.get_mut(&id)?;
        if counts.is_empty() {
            return None;
        }
        let adc = counts[(*pos).min(counts.len() - 1)];
        if *pos < counts.len() - 1 {
            *pos += 1;
        }
        Some(RawSample {
            cur_adc_count: adc,
            cur_raw_adc_count: adc,
            max_raw_adc_count: i32::MAX,
            status: crate::sensor::SampleStatus::GOT_ADC_CNT,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_source_replays_then_holds_last() {
        let mut src = ScriptedSource::new().with_script(SensorId(0), vec![0, 10_000, 20_000]);
        assert_eq!(src.sample(SensorId(0)).unwrap().cur_adc_count, 0);
        assert_eq!(src.sample(SensorId(0)).unwrap().cur_adc_count, 10_000);
        assert_eq!(src.sample(SensorId(0)).unwrap().cur_adc_count, 20_000);
        assert_eq!(src.sample(SensorId(0)).unwrap().cur_adc_count, 20_000);
    }

    #[test]
    fn unknown_sensor_returns_none() {
        let mut src = ScriptedSource::new();
        assert!(src.sample(SensorId(9)).is_none());
    }
}
