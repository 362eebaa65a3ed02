use core::fmt;

/// A configuration attribute was present but unusable. Nothing touched the hardware.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be a valid number")]
    NotANumber { key: &'static str },
    #[error("{key} must be a whole number, got {value}")]
    NotAnInteger { key: &'static str, value: f64 },
    #[error("{key} must be a GPIO pin between 0 and {max}, got {pin}")]
    PinOutOfRange { key: &'static str, pin: i64, max: u8 },
    #[error("doutPin and sckPin must be different pins, both are {0}")]
    PinConflict(u8),
    #[error("gain must be one of 32, 64 or 128, got {0}")]
    UnsupportedGain(f64),
    #[error("numberOfReadings must be between 1 and {max}, got {count}")]
    SampleCountOutOfRange { count: i64, max: usize },
    #[error("tare_offset must be a finite raw value between {min} and {max}, got {value}")]
    TareOffsetOutOfRange { value: f64, min: i32, max: i32 },
}

/// Failure of a driver operation. `E` is the platform's device error, passed through as is.
#[derive(Debug, thiserror::Error)]
pub enum Error<E: fmt::Debug> {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not initialize the load cell: {0:?}")]
    DeviceInitialization(E),
    #[error("could not read the load cell: {0:?}")]
    DeviceRead(E),
    #[error("asked the load cell for {expected} samples, got {received}")]
    MalformedRead { expected: usize, received: usize },
}

impl<E: fmt::Debug> Error<E> {
    /// The device error, if the failure came from the hardware.
    pub fn device_error(&self) -> Option<&E> {
        match self {
            Error::DeviceInitialization(e) | Error::DeviceRead(e) => Some(e),
            Error::Config(_) | Error::MalformedRead { .. } => None,
        }
    }
}
