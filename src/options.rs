use std::path::PathBuf;

use log::LevelFilter;
use simplelog::{Config, TermLogger, TerminalMode};
use structopt::StructOpt;

use crate::app::{replot, resistance_sweep_and_report, sweep_and_report, ReportOptions};
use crate::backend::{Load, SimulatedCell, DL3031};
use crate::config;
use crate::sweep::{ResistanceSweepConfig, SweepConfig};
use crate::Result;

#[derive(StructOpt, Clone, Debug, Default, PartialEq)]
pub struct OutputFlags {
    /// Don't write the sweep to a CSV file
    #[structopt(long = "no-save")]
    no_save: bool,
    /// Don't render the I-V/P-V plot
    #[structopt(long = "no-plot")]
    no_plot: bool,
}

#[derive(StructOpt, Clone, Debug, PartialEq)]
pub enum Command {
    /// Sweep the source connected to the electronic load
    #[structopt(name = "sweep")]
    Sweep(OutputFlags),
    /// Sweep a simulated photovoltaic module instead of real hardware
    #[structopt(name = "simulate")]
    Simulate(OutputFlags),
    /// Step the load resistance down from open circuit to find the maximum power point
    #[structopt(name = "resistance-sweep")]
    ResistanceSweep {
        /// Use a simulated photovoltaic module instead of real hardware
        #[structopt(long = "simulate")]
        simulate: bool,
        #[structopt(flatten)]
        output: OutputFlags,
    },
    /// Plot a previously saved sweep
    #[structopt(name = "plot")]
    Plot {
        #[structopt(parse(from_os_str))]
        file: PathBuf,
        /// Drop samples whose power z-score reaches this value
        #[structopt(long = "z-threshold")]
        z_threshold: Option<f64>,
    },
}

#[derive(StructOpt, Debug)]
#[structopt(name = "pv-curve-tracer")]
pub struct CliOpt {
    /// Log every instrument exchange
    #[structopt(short = "v", long = "verbose")]
    verbose: bool,
    #[structopt(subcommand)]
    command: Option<Command>,
}

impl CliOpt {
    pub fn initialize_logging(&self) -> Result<()> {
        let level = if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        };
        TermLogger::init(level, Config::default(), TerminalMode::Mixed)?;
        Ok(())
    }

    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Sweep(OutputFlags::default()))
    }

    pub fn run(&self) -> Result<()> {
        match self.command() {
            Command::Sweep(flags) => {
                let mut load = DL3031::connect(config::RESOURCE_ADDRESS, config::IO_TIMEOUT)?;
                sweep(&mut load, &flags)
            }
            Command::Simulate(flags) => sweep(&mut SimulatedCell::default(), &flags),
            Command::ResistanceSweep { simulate, output } => {
                if simulate {
                    resistance_sweep(&mut SimulatedCell::default(), &output)
                } else {
                    let mut load = DL3031::connect(config::RESOURCE_ADDRESS, config::IO_TIMEOUT)?;
                    resistance_sweep(&mut load, &output)
                }
            }
            Command::Plot { file, z_threshold } => {
                replot(&file, z_threshold)?;
                Ok(())
            }
        }
    }
}

impl OutputFlags {
    fn report_options(&self) -> ReportOptions {
        ReportOptions {
            save: !self.no_save,
            plot: !self.no_plot,
            ..ReportOptions::default()
        }
    }
}

fn sweep<L: Load>(load: &mut L, flags: &OutputFlags) -> Result<()> {
    sweep_and_report(load, &SweepConfig::default(), &flags.report_options())?;
    Ok(())
}

fn resistance_sweep<L: Load>(load: &mut L, flags: &OutputFlags) -> Result<()> {
    resistance_sweep_and_report(
        load,
        &ResistanceSweepConfig::default(),
        &flags.report_options(),
    )?;
    Ok(())
}
