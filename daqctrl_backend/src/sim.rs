//! A simulated first-order plant behind an ADC.
//!
//! The excitation bit drives the plant input between `0` and `high_level`
//! volts. Each measurement advances the plant by one step,
//! `y[k+1] = pole * y[k] + (1 - pole) * gain * u[k]`, and returns `y[k+1]`
//! as the converter would report it. An optional turnaround delay is slept on
//! the plant's clock to mimic hardware round trips.

use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::device::{AdcCalibration, Device};
use crate::error::DeviceError;

#[derive(Debug, Clone)]
pub struct SimulatedPlant<C: Clock = SystemClock> {
    pole: f64,
    gain: f64,
    high_level: f64,
    adc: AdcCalibration,
    turnaround: Duration,
    clock: C,
    input: f64,
    state: f64,
}

impl Default for SimulatedPlant<SystemClock> {
    fn default() -> Self {
        Self::new(0.8, 0.9)
    }
}

impl SimulatedPlant<SystemClock> {
    pub fn new(pole: f64, gain: f64) -> Self {
        Self::with_clock(pole, gain, SystemClock::new())
    }
}

impl<C: Clock> SimulatedPlant<C> {
    /// `pole` is clamped into `[0, 1)` to keep the plant stable.
    pub fn with_clock(pole: f64, gain: f64, clock: C) -> Self {
        Self {
            pole: pole.clamp(0., 0.999_999),
            gain,
            high_level: 5.,
            adc: AdcCalibration::default(),
            turnaround: Duration::ZERO,
            clock,
            input: 0.,
            state: 0.,
        }
    }

    pub fn high_level(mut self, volts: f64) -> Self {
        self.high_level = volts;
        self
    }

    pub fn adc(mut self, adc: AdcCalibration) -> Self {
        self.adc = adc;
        self
    }

    pub fn turnaround(mut self, turnaround: Duration) -> Self {
        self.turnaround = turnaround;
        self
    }

    /// Unquantized plant output.
    pub fn state(&self) -> f64 {
        self.state
    }

    /// Voltage currently applied to the plant input.
    pub fn input(&self) -> f64 {
        self.input
    }
}

impl<C: Clock> Device for SimulatedPlant<C> {
    fn write_excitation(&mut self, bit: u8) -> Result<(), DeviceError> {
        self.input = if bit == 0 { 0. } else { self.high_level };
        Ok(())
    }

    fn read_measurement(&mut self) -> Result<f64, DeviceError> {
        if !self.turnaround.is_zero() {
            self.clock.sleep(self.turnaround);
        }
        self.state = self.pole * self.state + (1. - self.pole) * self.gain * self.input;
        Ok(self.adc.to_volts(self.adc.quantize(self.state)))
    }

    fn reset_input_buffer(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }
}
