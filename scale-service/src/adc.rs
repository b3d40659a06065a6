//! Wraps a [`scale_core::adc::SampleSource`] to remember the last raw ADC
//! count handed to each sensor, so [`crate::runtime::Runtime`] has
//! something for a zero/cal command issued between ticks to act on without
//! re-reading hardware.

use std::collections::HashMap;

use scale_core::adc::SampleSource;
use scale_core::sensor::{RawSample, SensorId};

pub struct RecordingSource<S> {
    inner: S,
    pub last: HashMap<SensorId, i32>,
}

impl<S: SampleSource> RecordingSource<S> {
    pub fn new(inner: S) -> Self {
        RecordingSource {
            inner,
            last: HashMap::new(),
        }
    }
}

impl<S: SampleSource> SampleSource for RecordingSource<S> {
    fn sample(&mut self, id: SensorId) -> Option<RawSample> {
        let sample = self.inner.sample(id)?;
        self.last.insert(id, sample.cur_adc_count);
        Some(sample)
    }
}
