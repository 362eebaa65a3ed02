use alloc::vec::Vec;

use log::{debug, trace, warn};
use micromath::statistics::Mean;
use serde_json::Value;

use crate::config::{
    Config, Pins, CLOCK_PIN_KEY, DATA_PIN_KEY, GAIN_KEY, SAMPLE_COUNT_KEY, TARE_OFFSET_KEY,
};
use crate::error::{ConfigError, Error};
use crate::handle::HandleState;
use crate::{Attributes, Platform, SensorHandle};

/// Raw ADC counts per kilogram for the fitted load cell.
pub const COUNTS_PER_KG: f32 = 8200.0;

pub const TARE_COMMAND: &str = "tare";
pub const MEASURES_KEY: &str = "measures";
pub const WEIGHT_KEY: &str = "weight";

/// One averaged reading together with the settings it was taken with.
#[derive(Debug, Clone, PartialEq)]
pub struct Readings {
    pub pins: Pins,
    pub gain: u8,
    pub sample_count: usize,
    /// Tare offset in kilograms.
    pub tare_offset: f32,
    /// Every sample, tared and in kilograms.
    pub measures: Vec<f32>,
    /// Mean of `measures`.
    pub weight: f32,
}

impl Readings {
    pub fn into_attributes(self) -> Attributes {
        let mut map = Attributes::new();
        map.insert(DATA_PIN_KEY.into(), Value::from(self.pins.data));
        map.insert(CLOCK_PIN_KEY.into(), Value::from(self.pins.clock));
        map.insert(GAIN_KEY.into(), Value::from(self.gain));
        map.insert(SAMPLE_COUNT_KEY.into(), Value::from(self.sample_count));
        map.insert(TARE_OFFSET_KEY.into(), Value::from(self.tare_offset));
        map.insert(MEASURES_KEY.into(), Value::from(self.measures));
        map.insert(WEIGHT_KEY.into(), Value::from(self.weight));
        map
    }
}

/// Load cell sensor component.
///
/// Calls must be serialised by the caller, see [`crate::SharedLoadCell`]
/// for hosts that cannot guarantee that.
pub struct LoadCellDriver<P: Platform> {
    platform: P,
    config: Config,
    handle: HandleState<P::Handle>,
    // pins handed to the platform since the last release
    claimed: Option<Pins>,
}

impl<P: Platform> LoadCellDriver<P> {
    /// Construct from `attributes`, defaults filling in absent keys.
    ///
    /// No hardware is touched until the first reading.
    pub fn new(attributes: &Attributes, platform: P) -> Result<Self, ConfigError> {
        let config = Config::from_attributes(attributes)?;
        Ok(Self::with_config(config, platform))
    }

    pub fn with_config(config: Config, platform: P) -> Self {
        Self {
            platform,
            config,
            handle: HandleState::Absent,
            claimed: None,
        }
    }

    /// Replace the configuration. An invalid configuration is rejected as a
    /// whole and leaves the driver untouched.
    ///
    /// Moving to other pins or another gain drops the handle, so the next
    /// read opens a new one. Pins claimed before the move are released.
    pub fn reconfigure(&mut self, attributes: &Attributes) -> Result<(), ConfigError> {
        let config = Config::from_attributes(attributes)?;
        let old = core::mem::replace(&mut self.config, config);
        if old.pins != config.pins || old.gain != config.gain {
            self.invalidate();
        }
        if let Some(pins) = self.claimed.filter(|pins| *pins != config.pins) {
            self.claimed = None;
            self.release_pins(pins);
        }
        debug!("load cell configured: {:?}", self.config);
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn has_handle(&self) -> bool {
        self.handle.is_ready()
    }

    /// Tare offset in kilograms.
    pub fn tare_offset_kg(&self) -> f32 {
        self.config.tare_offset / COUNTS_PER_KG
    }

    /// Take `sample_count` samples and convert them to kilograms.
    pub fn get_readings(&mut self) -> Result<Readings, Error<P::Error>> {
        let raw = self.sample()?;
        let tare_offset = self.config.tare_offset;
        let measures: Vec<f32> = raw
            .iter()
            .map(|&sample| (sample as f32 - tare_offset) / COUNTS_PER_KG)
            .collect();
        let weight = measures.iter().copied().mean();
        trace!("load cell raw {:?}, weight {} kg", raw, weight);

        Ok(Readings {
            pins: self.config.pins,
            gain: self.config.gain.factor(),
            sample_count: self.config.sample_count,
            tare_offset: self.tare_offset_kg(),
            measures,
            weight,
        })
    }

    /// Make the current load the zero point. Returns the new offset in raw counts.
    ///
    /// On failure the previous offset is kept.
    pub fn tare(&mut self) -> Result<f32, Error<P::Error>> {
        let raw = self.sample()?;
        let sum: i64 = raw.iter().map(|&sample| i64::from(sample)).sum();
        self.config.tare_offset = (sum as f64 / raw.len() as f64) as f32;
        debug!(
            "load cell tared at {} ({} kg)",
            self.config.tare_offset,
            self.tare_offset_kg()
        );
        Ok(self.config.tare_offset)
    }

    /// Run every command in `command`, answering each key.
    ///
    /// `tare` answers with the new offset in kilograms, anything else with `false`.
    pub fn do_command(&mut self, command: &Attributes) -> Result<Attributes, Error<P::Error>> {
        let mut result = Attributes::new();
        for name in command.keys() {
            let answer = if name == TARE_COMMAND {
                self.tare()?;
                Value::from(self.tare_offset_kg())
            } else {
                debug!("ignoring unknown load cell command {name:?}");
                Value::Bool(false)
            };
            result.insert(name.clone(), answer);
        }
        Ok(result)
    }

    /// Drop the handle and release the pins. Never fails.
    pub fn close(&mut self) {
        self.invalidate();
        self.claimed = None;
        self.release_pins(self.config.pins);
    }

    /// Return the ready handle, opening one if needed.
    fn acquire(&mut self) -> Result<&mut P::Handle, Error<P::Error>> {
        let Self {
            platform,
            config,
            handle,
            claimed,
        } = self;
        handle
            .acquire(|| {
                debug!("opening load cell on {:?}, gain {}", config.pins, config.gain.factor());
                *claimed = Some(config.pins);
                platform.open(config.pins, config.gain)
            })
            .map_err(|e| {
                warn!("load cell initialization failed: {e:?}");
                Error::DeviceInitialization(e)
            })
    }

    /// Read one batch of raw samples. Any failure drops the handle.
    fn sample(&mut self) -> Result<Vec<i32>, Error<P::Error>> {
        let expected = self.config.sample_count;
        let result = self.acquire()?.read_samples(expected);
        match result {
            Ok(raw) if raw.len() == expected && !raw.is_empty() => Ok(raw),
            Ok(raw) => {
                self.invalidate();
                Err(Error::MalformedRead {
                    expected,
                    received: raw.len(),
                })
            }
            Err(e) => {
                warn!("load cell read failed: {e:?}");
                self.invalidate();
                Err(Error::DeviceRead(P::Error::from(e)))
            }
        }
    }

    fn invalidate(&mut self) {
        if self.handle.invalidate().is_some() {
            debug!("load cell handle dropped");
        }
    }

    /// Best effort: a failed release is logged and otherwise ignored.
    fn release_pins(&mut self, pins: Pins) {
        if let Err(e) = self.platform.cleanup(&pins.as_array()) {
            warn!("could not release pins {:?}: {e:?}", pins);
        }
    }
}
