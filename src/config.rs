//! Compile-time configuration of a sweep run.
//!
//! There is no configuration file and no runtime flag for any of these: the bench setup
//! changes rarely enough that editing this module and rebuilding is the intended workflow.

use std::time::Duration;

/// First voltage point of the sweep, volts
pub const V_START: f64 = 0.0;
/// Last voltage point of the sweep (inclusive when reachable by whole steps), volts
pub const V_STOP: f64 = 10.0;
/// Distance between voltage points, volts
pub const V_STEP: f64 = 0.1;
/// Settling delay between programming a point and reading it back
pub const DWELL_TIME: Duration = Duration::from_millis(300);
/// Expected current of the source near its maximum power point, amperes
pub const ESTIMATED_CURRENT: f64 = 5.0;

/// Resistance sweep: first set-point (open circuit), ohms
pub const R_START: f64 = 15_000.0;
/// Resistance sweep: lowest set-point, ohms
pub const R_STOP: f64 = 0.08;
/// Resistance sweep: decrement between set-points, ohms
pub const R_STEP: f64 = 100.0;
/// Resistance sweep: voltage limit programmed into the load, volts
pub const R_SWEEP_VOLTAGE_LIMIT: f64 = 10.0;
/// Resistance sweep: a reading below this voltage means the source is shorted, volts
pub const SHORT_CIRCUIT_VOLTAGE: f64 = 0.05;

/// The sweep stops once a reading exceeds this current, amperes
pub const MAX_CURRENT: f64 = 20.0;
/// The sweep stops once a reading exceeds this power, watts
pub const MAX_POWER: f64 = 50.0;

/// Lowest resistance the load is ever programmed with, ohms
pub const MIN_RESISTANCE: f64 = 0.08;
/// Upper bound on the number of points a single sweep may program
pub const MAX_POINTS: usize = 100_000;

/// Highest resistance the load is ever programmed with, ohms
pub const MAX_RESISTANCE: f64 = 15_000.0;
/// Upper end of the DL3031 low resistance range, ohms
pub const LOW_RANGE_MAX: f64 = 15.0;

/// Raw SCPI socket of the electronic load
pub const RESOURCE_ADDRESS: &str = "192.168.1.50:5555";
pub const IO_TIMEOUT: Duration = Duration::from_secs(5);

/// Saved sweeps are named `<prefix>_<YYYYmmdd_HHMMSS>.csv`
pub const OUTPUT_FILE_PREFIX: &str = "iv_pv_data";
pub const R_SWEEP_FILE_PREFIX: &str = "dl3031_mppt_data";

pub const PLOT_WIDTH: i32 = 1200;
pub const PLOT_HEIGHT: i32 = 600;

/// Plot-time filter: samples at or below these are dropped
pub const PLOT_MIN_VOLTAGE: f64 = 0.05;
pub const PLOT_MIN_CURRENT: f64 = 0.001;
