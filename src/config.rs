//! Validating parser for the component attributes.
//!
//! | key              | type    | default |
//! |------------------|---------|---------|
//! | gain             | number  | 64      |
//! | doutPin          | integer | 5       |
//! | sckPin           | integer | 6       |
//! | numberOfReadings | integer | 3       |
//! | tare_offset      | number  | 0.0     |

use alloc::string::String;
use alloc::vec::Vec;

use serde_json::Value;

use crate::error::ConfigError;
use crate::hx711::{GainMode, HX711_MAXIMUM, HX711_MINIMUM};
use crate::Attributes;

pub const GAIN_KEY: &str = "gain";
pub const DATA_PIN_KEY: &str = "doutPin";
pub const CLOCK_PIN_KEY: &str = "sckPin";
pub const SAMPLE_COUNT_KEY: &str = "numberOfReadings";
pub const TARE_OFFSET_KEY: &str = "tare_offset";

/// Highest BCM GPIO number on the 40 pin header.
pub const MAX_PIN: u8 = 27;
pub const MAX_SAMPLE_COUNT: usize = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pins {
    /// DOUT, read by the host.
    pub data: u8,
    /// PD_SCK, driven by the host.
    pub clock: u8,
}

impl Pins {
    pub fn as_array(&self) -> [u8; 2] {
        [self.data, self.clock]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub gain: GainMode,
    pub pins: Pins,
    /// Raw samples averaged per reading, at least one.
    pub sample_count: usize,
    /// Raw ADC counts subtracted from every sample.
    pub tare_offset: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gain: GainMode::A64,
            pins: Pins { data: 5, clock: 6 },
            sample_count: 3,
            tare_offset: 0.0,
        }
    }
}

impl Config {
    /// Parse the attributes, falling back to the defaults for absent keys.
    pub fn from_attributes(attributes: &Attributes) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let gain = match number(attributes, GAIN_KEY)? {
            Some(value) => parse_gain(value)?,
            None => defaults.gain,
        };
        let data = match integer(attributes, DATA_PIN_KEY)? {
            Some(pin) => parse_pin(DATA_PIN_KEY, pin)?,
            None => defaults.pins.data,
        };
        let clock = match integer(attributes, CLOCK_PIN_KEY)? {
            Some(pin) => parse_pin(CLOCK_PIN_KEY, pin)?,
            None => defaults.pins.clock,
        };
        if data == clock {
            return Err(ConfigError::PinConflict(data));
        }
        let sample_count = match integer(attributes, SAMPLE_COUNT_KEY)? {
            Some(count) => parse_sample_count(count)?,
            None => defaults.sample_count,
        };
        let tare_offset = match number(attributes, TARE_OFFSET_KEY)? {
            Some(value) => parse_tare_offset(value)?,
            None => defaults.tare_offset,
        };

        Ok(Self {
            gain,
            pins: Pins { data, clock },
            sample_count,
            tare_offset,
        })
    }
}

/// Check the attributes without keeping them.
///
/// Returns the names of implicit dependencies, which this component has none of.
pub fn validate_config(attributes: &Attributes) -> Result<Vec<String>, ConfigError> {
    Config::from_attributes(attributes)?;
    Ok(Vec::new())
}

fn number(attributes: &Attributes, key: &'static str) -> Result<Option<f64>, ConfigError> {
    match attributes.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or(ConfigError::NotANumber { key }),
    }
}

// hosts may transport every number as a double, so 5.0 is a valid pin
fn integer(attributes: &Attributes, key: &'static str) -> Result<Option<i64>, ConfigError> {
    if let Some(Value::Number(n)) = attributes.get(key) {
        if let Some(i) = n.as_i64() {
            return Ok(Some(i));
        }
    }
    let Some(value) = number(attributes, key)? else {
        return Ok(None);
    };
    let whole = value as i64;
    if whole as f64 != value {
        return Err(ConfigError::NotAnInteger { key, value });
    }
    Ok(Some(whole))
}

fn parse_gain(value: f64) -> Result<GainMode, ConfigError> {
    let factor = value as u8;
    if factor as f64 != value {
        return Err(ConfigError::UnsupportedGain(value));
    }
    GainMode::from_factor(factor).ok_or(ConfigError::UnsupportedGain(value))
}

fn parse_pin(key: &'static str, pin: i64) -> Result<u8, ConfigError> {
    match u8::try_from(pin) {
        Ok(pin) if pin <= MAX_PIN => Ok(pin),
        _ => Err(ConfigError::PinOutOfRange {
            key,
            pin,
            max: MAX_PIN,
        }),
    }
}

fn parse_sample_count(count: i64) -> Result<usize, ConfigError> {
    match usize::try_from(count) {
        Ok(n) if (1..=MAX_SAMPLE_COUNT).contains(&n) => Ok(n),
        _ => Err(ConfigError::SampleCountOutOfRange {
            count,
            max: MAX_SAMPLE_COUNT,
        }),
    }
}

fn parse_tare_offset(value: f64) -> Result<f32, ConfigError> {
    if value.is_finite() && (HX711_MINIMUM as f64..=HX711_MAXIMUM as f64).contains(&value) {
        Ok(value as f32)
    } else {
        Err(ConfigError::TareOffsetOutOfRange {
            value,
            min: HX711_MINIMUM,
            max: HX711_MAXIMUM,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attributes(value: Value) -> Attributes {
        match value {
            Value::Object(map) => map,
            _ => panic!("attributes must be an object"),
        }
    }

    #[test]
    fn empty_attributes_give_defaults() {
        let config = Config::from_attributes(&Attributes::new()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.gain, GainMode::A64);
        assert_eq!(config.pins, Pins { data: 5, clock: 6 });
        assert_eq!(config.sample_count, 3);
        assert_eq!(config.tare_offset, 0.0);
    }

    #[test]
    fn parses_every_key() {
        let attrs = attributes(json!({
            "gain": 128,
            "doutPin": 7,
            "sckPin": 8,
            "numberOfReadings": 5,
            "tare_offset": 100.0
        }));
        let config = Config::from_attributes(&attrs).unwrap();
        assert_eq!(config.gain, GainMode::A128);
        assert_eq!(config.pins, Pins { data: 7, clock: 8 });
        assert_eq!(config.sample_count, 5);
        assert_eq!(config.tare_offset, 100.0);
    }

    #[test]
    fn accepts_integral_doubles() {
        let attrs = attributes(json!({ "gain": 32.0, "doutPin": 17.0, "numberOfReadings": 10.0 }));
        let config = Config::from_attributes(&attrs).unwrap();
        assert_eq!(config.gain, GainMode::B32);
        assert_eq!(config.pins.data, 17);
        assert_eq!(config.sample_count, 10);
    }

    #[test]
    fn null_is_treated_as_absent() {
        let attrs = attributes(json!({ "gain": null, "tare_offset": null }));
        assert_eq!(Config::from_attributes(&attrs).unwrap(), Config::default());
    }

    #[test]
    fn rejects_wrong_types() {
        let attrs = attributes(json!({ "gain": "high" }));
        assert_eq!(
            Config::from_attributes(&attrs),
            Err(ConfigError::NotANumber { key: GAIN_KEY })
        );

        let attrs = attributes(json!({ "doutPin": [5] }));
        assert_eq!(
            Config::from_attributes(&attrs),
            Err(ConfigError::NotANumber { key: DATA_PIN_KEY })
        );

        let attrs = attributes(json!({ "tare_offset": true }));
        assert_eq!(
            Config::from_attributes(&attrs),
            Err(ConfigError::NotANumber { key: TARE_OFFSET_KEY })
        );
    }

    #[test]
    fn rejects_fractional_integers() {
        let attrs = attributes(json!({ "sckPin": 6.5 }));
        assert_eq!(
            Config::from_attributes(&attrs),
            Err(ConfigError::NotAnInteger {
                key: CLOCK_PIN_KEY,
                value: 6.5
            })
        );
    }

    #[test]
    fn rejects_out_of_range_pins() {
        for pin in [-1, 28, 300] {
            let attrs = attributes(json!({ "doutPin": pin }));
            assert!(matches!(
                Config::from_attributes(&attrs),
                Err(ConfigError::PinOutOfRange { key: DATA_PIN_KEY, .. })
            ));
        }
    }

    #[test]
    fn rejects_shared_pin() {
        let attrs = attributes(json!({ "doutPin": 6, "sckPin": 6 }));
        assert_eq!(
            Config::from_attributes(&attrs),
            Err(ConfigError::PinConflict(6))
        );
    }

    #[test]
    fn rejects_unsupported_gain() {
        for gain in [0.0, 16.0, 64.5, 256.0] {
            let attrs = attributes(json!({ "gain": gain }));
            assert_eq!(
                Config::from_attributes(&attrs),
                Err(ConfigError::UnsupportedGain(gain))
            );
        }
    }

    #[test]
    fn sample_count_bounds() {
        for count in [0, -3, 100] {
            let attrs = attributes(json!({ "numberOfReadings": count }));
            assert!(matches!(
                Config::from_attributes(&attrs),
                Err(ConfigError::SampleCountOutOfRange { .. })
            ));
        }
        let attrs = attributes(json!({ "numberOfReadings": 99 }));
        assert_eq!(Config::from_attributes(&attrs).unwrap().sample_count, 99);
    }

    #[test]
    fn tare_offset_may_have_either_sign() {
        for offset in [-24_600.0, 0.0, 24_600.0] {
            let attrs = attributes(json!({ "tare_offset": offset }));
            assert_eq!(
                Config::from_attributes(&attrs).unwrap().tare_offset,
                offset as f32
            );
        }
        let attrs = attributes(json!({ "tare_offset": 9_000_000.0 }));
        assert!(matches!(
            Config::from_attributes(&attrs),
            Err(ConfigError::TareOffsetOutOfRange { .. })
        ));
    }

    #[test]
    fn validate_reports_no_dependencies() {
        let attrs = attributes(json!({ "gain": 64 }));
        assert_eq!(validate_config(&attrs).unwrap(), Vec::<String>::new());

        let attrs = attributes(json!({ "gain": 65 }));
        assert_eq!(
            validate_config(&attrs),
            Err(ConfigError::UnsupportedGain(65.0))
        );
    }
}
