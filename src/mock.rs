//! Simulated load cell for tests.

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::{GainMode, Pins, Platform, SensorHandle, COUNTS_PER_KG};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Wiring,
    Dropout,
    Permission,
    NotReset,
}

// small zero-mean wobble so averages are exercised
const NOISE: [i32; 3] = [0, 40, -40];

#[derive(Debug, Default)]
struct State {
    weight_kg: f32,
    batches: VecDeque<Vec<i32>>,
    opened: Vec<(Pins, GainMode)>,
    resets: usize,
    cleaned: Vec<Vec<u8>>,
    open_fault: Option<Fault>,
    reset_fault: Option<Fault>,
    read_fault: Option<Fault>,
    cleanup_fault: Option<Fault>,
    drop_last_sample: bool,
}

/// Shared view of the simulated hardware, cloned into handles and platforms.
#[derive(Debug, Clone, Default)]
pub struct Sim(Rc<RefCell<State>>);

impl Sim {
    pub fn set_weight(&self, kg: f32) {
        self.0.borrow_mut().weight_kg = kg;
    }

    /// Serve exactly these samples on the next read.
    pub fn push_batch(&self, samples: &[i32]) {
        self.0.borrow_mut().batches.push_back(samples.to_vec());
    }

    pub fn fail_open(&self, fault: Fault) {
        self.0.borrow_mut().open_fault = Some(fault);
    }

    pub fn fail_reset(&self, fault: Fault) {
        self.0.borrow_mut().reset_fault = Some(fault);
    }

    pub fn fail_reads(&self, fault: Fault) {
        self.0.borrow_mut().read_fault = Some(fault);
    }

    pub fn fail_cleanup(&self, fault: Fault) {
        self.0.borrow_mut().cleanup_fault = Some(fault);
    }

    pub fn drop_last_sample(&self) {
        self.0.borrow_mut().drop_last_sample = true;
    }

    /// Clear every injected fault.
    pub fn heal(&self) {
        let mut state = self.0.borrow_mut();
        state.open_fault = None;
        state.reset_fault = None;
        state.read_fault = None;
        state.cleanup_fault = None;
        state.drop_last_sample = false;
    }

    pub fn opened(&self) -> Vec<(Pins, GainMode)> {
        self.0.borrow().opened.clone()
    }

    pub fn resets(&self) -> usize {
        self.0.borrow().resets
    }

    pub fn cleaned(&self) -> Vec<Vec<u8>> {
        self.0.borrow().cleaned.clone()
    }
}

#[derive(Debug)]
pub struct MockHandle {
    sim: Sim,
    reset: bool,
}

impl MockHandle {
    pub fn new(sim: &Sim) -> Self {
        Self {
            sim: sim.clone(),
            reset: false,
        }
    }
}

impl SensorHandle for MockHandle {
    type Error = Fault;

    fn reset(&mut self) -> Result<(), Fault> {
        let mut state = self.sim.0.borrow_mut();
        if let Some(fault) = state.reset_fault {
            return Err(fault);
        }
        state.resets += 1;
        self.reset = true;
        Ok(())
    }

    fn read_samples(&mut self, count: usize) -> Result<Vec<i32>, Fault> {
        if !self.reset {
            return Err(Fault::NotReset);
        }
        let mut state = self.sim.0.borrow_mut();
        if let Some(fault) = state.read_fault {
            return Err(fault);
        }
        let mut samples = match state.batches.pop_front() {
            Some(batch) => batch,
            None => {
                let base = (state.weight_kg * COUNTS_PER_KG) as i32;
                (0..count).map(|i| base + NOISE[i % NOISE.len()]).collect()
            }
        };
        if state.drop_last_sample {
            samples.pop();
        }
        Ok(samples)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockPlatform {
    pub sim: Sim,
}

impl Platform for MockPlatform {
    type Handle = MockHandle;
    type Error = Fault;

    fn open(&mut self, pins: Pins, gain: GainMode) -> Result<MockHandle, Fault> {
        let mut state = self.sim.0.borrow_mut();
        if let Some(fault) = state.open_fault {
            return Err(fault);
        }
        state.opened.push((pins, gain));
        Ok(MockHandle::new(&self.sim))
    }

    fn cleanup(&mut self, pins: &[u8]) -> Result<(), Fault> {
        let mut state = self.sim.0.borrow_mut();
        state.cleaned.push(pins.to_vec());
        match state.cleanup_fault {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }
}
