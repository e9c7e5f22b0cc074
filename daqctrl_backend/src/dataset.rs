//! Input/output columns of a finished run, prepared for model identification.
//!
//! The first samples of a session are usually transient and are skipped; the
//! tail is held back for validation. [`IdentificationData::split`] cuts the
//! columns into those two windows.

use ndarray::{s, Array1, Array2, ArrayView1};

use crate::acquisition::SampleRecord;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq)]
pub struct IdentificationData {
    pub time: Array1<f64>,
    pub input: Array1<f64>,
    pub output: Array1<f64>,
}

/// A contiguous window of input/output samples.
#[derive(Debug, Clone, Copy)]
pub struct DataWindow<'a> {
    pub input: ArrayView1<'a, f64>,
    pub output: ArrayView1<'a, f64>,
}

impl<'a> DataWindow<'a> {
    pub fn len(&self) -> usize {
        self.input.len()
    }
    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }
}

impl IdentificationData {
    pub fn from_records(records: &[SampleRecord]) -> Self {
        Self {
            time: records.iter().map(|rec| rec.elapsed_time).collect(),
            input: records.iter().map(|rec| rec.excitation as f64).collect(),
            output: records.iter().map(|rec| rec.measurement).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// `(n, 3)` array with columns `time, input, output`.
    pub fn to_array2(&self) -> Array2<f64> {
        let mut arr = Array2::zeros((self.len(), 3));
        arr.column_mut(0).assign(&self.time);
        arr.column_mut(1).assign(&self.input);
        arr.column_mut(2).assign(&self.output);
        arr
    }

    /// Splits into `(training, validation)`.
    ///
    /// Training starts at sample `floor(start_save_time / sampling_period)` and
    /// ends where validation begins, at `floor(n - n * validation_percent / 100)`.
    /// Training is empty when the skipped prefix reaches into validation.
    ///
    /// # Errors
    ///
    /// [`ConfigError::SamplingPeriod`] for a non-positive period,
    /// [`ConfigError::ValidationPercent`] outside `[0, 100]`.
    pub fn split(
        &self,
        start_save_time: f64,
        sampling_period: f64,
        validation_percent: f64,
    ) -> Result<(DataWindow<'_>, DataWindow<'_>), ConfigError> {
        prbs_backend::validate_sampling_period(sampling_period)?;
        if !(0. ..=100.).contains(&validation_percent) {
            return Err(ConfigError::ValidationPercent(validation_percent));
        }

        let n = self.len();
        let skip = ((start_save_time.max(0.) / sampling_period).floor() as usize).min(n);
        let cut = ((n as f64 - n as f64 * validation_percent / 100.).floor() as usize).min(n);
        let train_end = cut.max(skip);

        let training = DataWindow {
            input: self.input.slice(s![skip..train_end]),
            output: self.output.slice(s![skip..train_end]),
        };
        let validation = DataWindow {
            input: self.input.slice(s![cut..]),
            output: self.output.slice(s![cut..]),
        };
        Ok((training, validation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<SampleRecord> {
        (0..n)
            .map(|k| SampleRecord {
                tick_index: k,
                elapsed_time: k as f64 * 0.5,
                excitation: (k % 2) as u8,
                measurement: k as f64,
            })
            .collect()
    }

    #[test]
    fn columns_follow_records() {
        let data = IdentificationData::from_records(&records(4));
        let arr = data.to_array2();
        assert_eq!(arr.shape(), &[4, 3]);
        assert_eq!(arr[[3, 0]], 1.5);
        assert_eq!(arr[[3, 1]], 1.);
        assert_eq!(arr[[3, 2]], 3.);
    }

    #[test]
    fn split_skips_transient_and_holds_back_tail() {
        let data = IdentificationData::from_records(&records(20));
        // skip 2 s / 0.5 s = 4 samples, hold back 15% of 20 -> cut at 17
        let (train, valid) = data.split(2., 0.5, 15.).unwrap();
        assert_eq!(train.len(), 13);
        assert_eq!(train.output[0], 4.);
        assert_eq!(valid.len(), 3);
        assert_eq!(valid.output[0], 17.);
    }

    #[test]
    fn split_with_overlapping_skip_gives_empty_training() {
        let data = IdentificationData::from_records(&records(10));
        let (train, valid) = data.split(100., 0.5, 50.).unwrap();
        assert!(train.is_empty());
        assert_eq!(valid.len(), 5);
    }

    #[test]
    fn split_rejects_bad_percent() {
        let data = IdentificationData::from_records(&records(10));
        assert_eq!(
            data.split(0., 0.5, 120.).unwrap_err(),
            ConfigError::ValidationPercent(120.)
        );
    }
}
