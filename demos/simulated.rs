//! Load cell lifecycle against a simulated HX711
//!
//! Reads a 2.5kg load, tares it away, adds another kilogram and
//! shows a dropped connection being recovered on the next reading.

use std::cell::Cell;
use std::rc::Rc;

use hx711_loadcell::{
    Attributes, GainMode, LoadCellDriver, Pins, Platform, SensorHandle, COUNTS_PER_KG,
};
use log::{error, info, LevelFilter};
use serde_json::{json, Value};

#[derive(Debug)]
enum SimError {
    Disconnected,
}

#[derive(Clone, Default)]
struct Bench {
    load_kg: Rc<Cell<f32>>,
    unplugged: Rc<Cell<bool>>,
}

struct SimHandle {
    bench: Bench,
    seed: u32,
}

impl SensorHandle for SimHandle {
    type Error = SimError;

    fn reset(&mut self) -> Result<(), SimError> {
        info!("hx711 reset");
        Ok(())
    }

    fn read_samples(&mut self, count: usize) -> Result<Vec<i32>, SimError> {
        if self.bench.unplugged.get() {
            return Err(SimError::Disconnected);
        }
        let base = (self.bench.load_kg.get() * COUNTS_PER_KG) as i32;
        Ok((0..count)
            .map(|_| {
                self.seed = self.seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                base + (self.seed >> 24) as i32 - 128
            })
            .collect())
    }
}

struct SimPlatform {
    bench: Bench,
}

impl Platform for SimPlatform {
    type Handle = SimHandle;
    type Error = SimError;

    fn open(&mut self, pins: Pins, gain: GainMode) -> Result<SimHandle, SimError> {
        info!("open dout={} sck={} gain={}", pins.data, pins.clock, gain.factor());
        Ok(SimHandle {
            bench: self.bench.clone(),
            seed: 7,
        })
    }

    fn cleanup(&mut self, pins: &[u8]) -> Result<(), SimError> {
        info!("cleanup {pins:?}");
        Ok(())
    }
}

fn attributes(value: Value) -> Attributes {
    match value {
        Value::Object(map) => map,
        _ => Attributes::new(),
    }
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Debug)
        .format_timestamp_millis()
        .init();

    let bench = Bench::default();
    let platform = SimPlatform {
        bench: bench.clone(),
    };
    let config = attributes(json!({ "gain": 128, "doutPin": 5, "sckPin": 6, "numberOfReadings": 10 }));

    let mut load_cell = match LoadCellDriver::new(&config, platform) {
        Ok(load_cell) => load_cell,
        Err(e) => {
            error!("bad config: {e}");
            return;
        }
    };

    bench.load_kg.set(2.5);
    match load_cell.get_readings() {
        Ok(readings) => info!("Reading = {:?}", readings.into_attributes()),
        Err(e) => error!("read failed: {e}"),
    }

    match load_cell.do_command(&attributes(json!({ "tare": [], "calibrate": [] }))) {
        Ok(result) => info!("Command = {:?}", result),
        Err(e) => error!("tare failed: {e}"),
    }

    bench.load_kg.set(3.5);
    if let Ok(readings) = load_cell.get_readings() {
        info!("Weight after tare = {:.3}kg", readings.weight);
    }

    bench.unplugged.set(true);
    if let Err(e) = load_cell.get_readings() {
        error!("read failed: {e}, handle kept: {}", load_cell.has_handle());
    }

    bench.unplugged.set(false);
    if let Ok(readings) = load_cell.get_readings() {
        info!("Recovered weight = {:.3}kg", readings.weight);
    }

    load_cell.close();
}
