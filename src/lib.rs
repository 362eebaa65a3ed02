#![cfg_attr(not(test), no_std)]

//! HX711 load cell sensor component.
//!
//! [`LoadCellDriver`] lazily opens a [`SensorHandle`] through a [`Platform`],
//! averages raw samples into kilograms, keeps a tare offset and throws away
//! the handle whenever the hardware misbehaves so the next call starts from a
//! fresh reset.

extern crate alloc;

use alloc::vec::Vec;
use core::fmt;

pub mod config;
pub mod driver;
pub mod error;
pub mod handle;
pub mod hx711;
pub mod shared;

#[cfg(test)]
mod mock;

pub use config::{validate_config, Config, Pins};
pub use driver::{LoadCellDriver, Readings, COUNTS_PER_KG};
pub use error::{ConfigError, Error};
pub use handle::HandleState;
pub use hx711::GainMode;
pub use shared::SharedLoadCell;

/// Attribute maps exchanged with the host, for configuration, readings and commands.
pub type Attributes = serde_json::Map<alloc::string::String, serde_json::Value>;

/// A connection to the ADC that produces raw samples.
pub trait SensorHandle {
    type Error: fmt::Debug;

    /// Bring the ADC into a known state. Called once per handle, before any read.
    fn reset(&mut self) -> Result<(), Self::Error>;

    /// Read `count` raw samples in the ADC's native signed range.
    fn read_samples(&mut self, count: usize) -> Result<Vec<i32>, Self::Error>;
}

/// The GPIO subsystem of the host.
///
/// Open and cleanup failures have their own error type. Handle failures are
/// converted into it, so a platform built on [`hx711::HX711`] wraps
/// [`hx711::Error`] in one variant and keeps pin claim errors in others.
pub trait Platform {
    type Handle: SensorHandle;
    type Error: fmt::Debug + From<<Self::Handle as SensorHandle>::Error>;

    /// Build a handle bound to `pins`. The handle is not reset yet.
    fn open(&mut self, pins: Pins, gain: GainMode) -> Result<Self::Handle, Self::Error>;

    /// Release exactly the given pins, leaving every other pin alone.
    fn cleanup(&mut self, pins: &[u8]) -> Result<(), Self::Error>;
}
