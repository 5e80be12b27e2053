#[cfg_attr(feature = "plot", macro_use)]
extern crate lazy_static;
#[macro_use]
extern crate log;
#[macro_use]
extern crate measure_time;
#[macro_use]
extern crate serde_derive;

pub mod app;
pub mod backend;
pub mod config;
pub mod error;
pub mod mpp;
pub mod options;
pub mod report;
pub mod sample;
pub mod sweep;
pub mod util;

pub type Result<T> = std::result::Result<T, failure::Error>;

pub use crate::error::SweepError;
pub use crate::mpp::locate_mpp;
pub use crate::sample::{Sample, SweepTable};
pub use crate::sweep::{
    run_resistance_sweep, run_sweep, ResistanceSweepConfig, SweepConfig, SweepOutcome,
    Termination,
};
