mod dl3031;
pub mod scpi;
mod sim;

use std::fmt::{Display, Formatter};

use crate::Result;

/// Operating mode of an electronic load
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    ConstantCurrent,
    ConstantVoltage,
    ConstantResistance,
    ConstantPower,
}

impl Mode {
    pub fn scpi_name(self) -> &'static str {
        match self {
            Mode::ConstantCurrent => "CURR",
            Mode::ConstantVoltage => "VOLT",
            Mode::ConstantResistance => "RES",
            Mode::ConstantPower => "POW",
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::ConstantCurrent => f.write_str("CC"),
            Mode::ConstantVoltage => f.write_str("CV"),
            Mode::ConstantResistance => f.write_str("CR"),
            Mode::ConstantPower => f.write_str("CP"),
        }
    }
}

/// An open session to an electronic load with the source under test connected to its input
///
/// Any error returned from these methods is a communication failure and ends the run.
pub trait Load {
    fn identify(&mut self) -> Result<String>;
    fn set_mode(&mut self, mode: Mode) -> Result<()>;
    fn set_input(&mut self, enabled: bool) -> Result<()>;
    fn set_voltage_limit(&mut self, volts: f64) -> Result<()>;
    fn set_current_limit(&mut self, amperes: f64) -> Result<()>;
    fn set_resistance(&mut self, ohms: f64) -> Result<()>;
    fn set_voltage(&mut self, volts: f64) -> Result<()>;
    fn read_voltage(&mut self) -> Result<f64>;
    fn read_current(&mut self) -> Result<f64>;
}

pub use self::dl3031::DL3031;
pub use self::sim::SimulatedCell;
