//! The device capability consumed by the acquisition loop.
//!
//! A [`Device`] is whatever sits between the loop and the physical excitation
//! output / measurement input: an NI-DAQ task pair, an Arduino behind a serial
//! port, or the [`SimulatedPlant`](crate::sim::SimulatedPlant). The loop only
//! relies on the four operations below; wire protocols and vendor drivers live
//! in the implementations.

use crate::error::DeviceError;

pub trait Device {
    /// Sends one excitation sample (`0` or `1`) to the hardware output.
    fn write_excitation(&mut self, bit: u8) -> Result<(), DeviceError>;

    /// Blocks for the hardware turnaround and returns one calibrated measurement.
    fn read_measurement(&mut self) -> Result<f64, DeviceError>;

    /// Discards buffered input so the next read cannot return a stale value.
    fn reset_input_buffer(&mut self) -> Result<(), DeviceError>;

    /// Leaves the excitation output low once a run is over.
    fn park(&mut self) -> Result<(), DeviceError> {
        self.write_excitation(0)
    }
}

impl<D: Device + ?Sized> Device for &mut D {
    fn write_excitation(&mut self, bit: u8) -> Result<(), DeviceError> {
        (**self).write_excitation(bit)
    }
    fn read_measurement(&mut self) -> Result<f64, DeviceError> {
        (**self).read_measurement()
    }
    fn reset_input_buffer(&mut self) -> Result<(), DeviceError> {
        (**self).reset_input_buffer()
    }
    fn park(&mut self) -> Result<(), DeviceError> {
        (**self).park()
    }
}

impl<D: Device + ?Sized> Device for Box<D> {
    fn write_excitation(&mut self, bit: u8) -> Result<(), DeviceError> {
        (**self).write_excitation(bit)
    }
    fn read_measurement(&mut self) -> Result<f64, DeviceError> {
        (**self).read_measurement()
    }
    fn reset_input_buffer(&mut self) -> Result<(), DeviceError> {
        (**self).reset_input_buffer()
    }
    fn park(&mut self) -> Result<(), DeviceError> {
        (**self).park()
    }
}

/// Linear ADC transfer: `bits` of resolution spanning `[v_min, v_max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdcCalibration {
    pub bits: u32,
    pub v_min: f64,
    pub v_max: f64,
}

impl Default for AdcCalibration {
    /// 10-bit converter over 0-5 V (Arduino analog input).
    fn default() -> Self {
        Self {
            bits: 10,
            v_min: 0.,
            v_max: 5.,
        }
    }
}

impl AdcCalibration {
    pub fn new(bits: u32, v_min: f64, v_max: f64) -> Self {
        Self { bits, v_min, v_max }
    }

    /// Volts represented by one count, `(v_max - v_min) / 2^bits`.
    pub fn volts_per_count(&self) -> f64 {
        (self.v_max - self.v_min) / (1u64 << self.bits) as f64
    }

    pub fn max_count(&self) -> u32 {
        ((1u64 << self.bits) - 1) as u32
    }

    pub fn to_volts(&self, counts: u32) -> f64 {
        self.v_min + counts as f64 * self.volts_per_count()
    }

    /// Counts the converter reports for an input of `volts`, saturating at both rails.
    pub fn quantize(&self, volts: f64) -> u32 {
        let counts = ((volts - self.v_min) / self.volts_per_count()).floor();
        if counts.is_nan() || counts <= 0. {
            0
        } else {
            (counts as u64).min(self.max_count() as u64) as u32
        }
    }
}
