//! Access to one driver from several contexts.
//!
//! Every operation runs inside a single critical section, so acquiring,
//! reading and dropping the handle can't interleave and at most one handle
//! is ever alive.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::driver::{LoadCellDriver, Readings};
use crate::error::{ConfigError, Error};
use crate::{Attributes, Platform};

pub struct SharedLoadCell<P: Platform> {
    driver: Mutex<RefCell<LoadCellDriver<P>>>,
}

impl<P: Platform> SharedLoadCell<P> {
    pub fn new(driver: LoadCellDriver<P>) -> Self {
        Self {
            driver: Mutex::new(RefCell::new(driver)),
        }
    }

    /// Run `f` with exclusive access to the driver.
    pub fn with<R>(&self, f: impl FnOnce(&mut LoadCellDriver<P>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.driver.borrow_ref_mut(cs)))
    }

    pub fn reconfigure(&self, attributes: &Attributes) -> Result<(), ConfigError> {
        self.with(|driver| driver.reconfigure(attributes))
    }

    pub fn get_readings(&self) -> Result<Readings, Error<P::Error>> {
        self.with(|driver| driver.get_readings())
    }

    pub fn tare(&self) -> Result<f32, Error<P::Error>> {
        self.with(|driver| driver.tare())
    }

    pub fn do_command(&self, command: &Attributes) -> Result<Attributes, Error<P::Error>> {
        self.with(|driver| driver.do_command(command))
    }

    pub fn close(&self) {
        self.with(|driver| driver.close())
    }

    pub fn into_inner(self) -> LoadCellDriver<P> {
        self.driver.into_inner().into_inner()
    }
}
