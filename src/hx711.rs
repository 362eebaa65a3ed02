//! Bit-banged HX711 driver.
//!
//! The HX711 signals a finished conversion by pulling DOUT low. The host then
//! clocks 24 data bits out on PD_SCK, MSB first, followed by 1 to 3 extra
//! pulses that select the channel and gain of the *next* conversion.

use alloc::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::trace;

use crate::SensorHandle;

pub const HX711_MINIMUM: i32 = -(1 << (24 - 1));
pub const HX711_MAXIMUM: i32 = (1 << (24 - 1)) - 1;
const HX711_DELAY_TIME_US: u32 = 1;
// PD_SCK high for more than 60us powers the chip down
const HX711_POWER_DOWN_US: u32 = 100;
const HX711_READY_POLL_US: u32 = 100;
// 10 SPS is the slowest output rate, allow a full second
const HX711_DEFAULT_READY_POLLS: u32 = 10_000;

/// Channel and gain selection, encoded as the number of extra clock pulses.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GainMode {
    A128 = 1, // extra pulses
    B32 = 2,
    A64 = 3,
}

impl GainMode {
    fn pulses(self) -> u8 {
        self as u8
    }

    /// The amplifier gain as configured by users: 32, 64 or 128.
    pub fn factor(self) -> u8 {
        match self {
            GainMode::A128 => 128,
            GainMode::A64 => 64,
            GainMode::B32 => 32,
        }
    }

    pub fn from_factor(factor: u8) -> Option<Self> {
        match factor {
            128 => Some(GainMode::A128),
            64 => Some(GainMode::A64),
            32 => Some(GainMode::B32),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error<SckE, DtE> {
    #[error("could not drive the clock pin: {0:?}")]
    Sck(SckE),
    #[error("could not read the data pin: {0:?}")]
    Dt(DtE),
    #[error("hx711 did not signal a ready conversion")]
    NotReady,
}

pub struct HX711<SckPin, DtPin, Delay> {
    sck_pin: SckPin,
    dt_pin: DtPin,
    delay: Delay,
    last_reading: i32,
    gain_mode: GainMode,
    ready_polls: u32,
}

impl<SckPin, DtPin, Delay> HX711<SckPin, DtPin, Delay>
where
    SckPin: OutputPin,
    DtPin: InputPin,
    Delay: DelayNs,
{
    /// Bind the driver to its pins. Nothing is clocked until [`HX711::reset`].
    pub fn new(sck_pin: SckPin, dt_pin: DtPin, delay: Delay, gain_mode: GainMode) -> Self {
        Self {
            sck_pin,
            dt_pin,
            delay,
            last_reading: 0,
            gain_mode,
            ready_polls: HX711_DEFAULT_READY_POLLS,
        }
    }

    /// Limit how many times DOUT is polled before a read gives up.
    pub fn set_ready_polls(&mut self, polls: u32) {
        self.ready_polls = polls;
    }

    pub fn is_ready(&mut self) -> Result<bool, Error<SckPin::Error, DtPin::Error>> {
        // if the dt pin is low, device is ready for read
        self.dt_pin.is_low().map_err(Error::Dt)
    }

    /// Power cycle the chip and latch the configured gain.
    ///
    /// After power up the HX711 converts on channel A with gain 128, so one
    /// conversion is read and discarded to apply `gain_mode`.
    pub fn reset(&mut self) -> Result<(), Error<SckPin::Error, DtPin::Error>> {
        self.sck_pin.set_high().map_err(Error::Sck)?;
        self.delay.delay_us(HX711_POWER_DOWN_US);
        self.sck_pin.set_low().map_err(Error::Sck)?;
        self.read()?;
        trace!("hx711 reset, gain {}", self.gain_mode.factor());
        Ok(())
    }

    pub fn read(&mut self) -> Result<i32, Error<SckPin::Error, DtPin::Error>> {
        self.wait_ready()?;

        let mut value: u32 = 0;
        for _ in 0..24 {
            let bit = self.read_hx711_bit(HX711_DELAY_TIME_US)? as u32;
            // bits arrive MSB first
            value = (value << 1) | bit;
        }
        // send gain mode for next reading
        for _ in 0..self.gain_mode.pulses() {
            self.toggle_sck_bit(HX711_DELAY_TIME_US)?;
        }

        // shift the sign bit into place and back to extend it
        let signed = ((value << 8) as i32) >> 8;
        self.last_reading = signed;
        Ok(signed)
    }

    /// Read `times` consecutive conversions.
    pub fn get_raw_data(
        &mut self,
        times: usize,
    ) -> Result<Vec<i32>, Error<SckPin::Error, DtPin::Error>> {
        (0..times).map(|_| self.read()).collect()
    }

    pub fn get_last_raw(&self) -> i32 {
        self.last_reading
    }

    fn wait_ready(&mut self) -> Result<(), Error<SckPin::Error, DtPin::Error>> {
        for _ in 0..self.ready_polls {
            if self.is_ready()? {
                return Ok(());
            }
            self.delay.delay_us(HX711_READY_POLL_US);
        }
        Err(Error::NotReady)
    }

    fn read_hx711_bit(
        &mut self,
        hx711_delay_time_us: u32,
    ) -> Result<bool, Error<SckPin::Error, DtPin::Error>> {
        self.sck_pin.set_high().map_err(Error::Sck)?;
        self.delay.delay_us(hx711_delay_time_us);

        let pin_state = self.dt_pin.is_high().map_err(Error::Dt)?;

        self.sck_pin.set_low().map_err(Error::Sck)?;
        self.delay.delay_us(hx711_delay_time_us);

        Ok(pin_state)
    }

    fn toggle_sck_bit(
        &mut self,
        hx711_delay_time_us: u32,
    ) -> Result<(), Error<SckPin::Error, DtPin::Error>> {
        self.sck_pin.set_high().map_err(Error::Sck)?;
        self.delay.delay_us(hx711_delay_time_us);
        self.sck_pin.set_low().map_err(Error::Sck)?;
        self.delay.delay_us(hx711_delay_time_us);
        Ok(())
    }
}

impl<SckPin, DtPin, Delay> SensorHandle for HX711<SckPin, DtPin, Delay>
where
    SckPin: OutputPin,
    DtPin: InputPin,
    Delay: DelayNs,
{
    type Error = Error<SckPin::Error, DtPin::Error>;

    fn reset(&mut self) -> Result<(), Self::Error> {
        HX711::reset(self)
    }

    fn read_samples(&mut self, count: usize) -> Result<Vec<i32>, Self::Error> {
        self.get_raw_data(count)
    }
}
