use std::fmt::{Display, Formatter};
use std::time::Duration;

use crate::backend::{Load, Mode};
use crate::config;
use crate::error::SweepError;
use crate::sample::{Sample, SweepTable};
use crate::util::Engineering;
use crate::Result;

/// Slack for voltage ranges that are whole multiples of the step only up to rounding
const STEP_COUNT_EPSILON: f64 = 1e-9;

fn whole_steps(span: f64, step: f64) -> f64 {
    (span / step + STEP_COUNT_EPSILON).floor()
}

fn point_count(steps: f64) -> usize {
    steps.max(0.0).min(config::MAX_POINTS as f64) as usize + 1
}

fn check_point_count(steps: f64) -> std::result::Result<(), SweepError> {
    if steps + 1.0 > config::MAX_POINTS as f64 {
        Err(SweepError::InvalidRange(format!(
            "{} points requested, at most {} allowed",
            steps + 1.0,
            config::MAX_POINTS
        )))
    } else {
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SafetyLimits {
    pub max_current: f64,
    pub max_power: f64,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        SafetyLimits {
            max_current: config::MAX_CURRENT,
            max_power: config::MAX_POWER,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SweepConfig {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
    pub dwell: Duration,
    pub estimated_current: f64,
    pub limits: SafetyLimits,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            start: config::V_START,
            stop: config::V_STOP,
            step: config::V_STEP,
            dwell: config::DWELL_TIME,
            estimated_current: config::ESTIMATED_CURRENT,
            limits: SafetyLimits::default(),
        }
    }
}

impl SweepConfig {
    pub fn validate(&self) -> std::result::Result<(), SweepError> {
        let finite = [
            self.start,
            self.stop,
            self.step,
            self.estimated_current,
            self.limits.max_current,
            self.limits.max_power,
        ]
        .iter()
        .all(|x| x.is_finite());

        if !finite {
            Err(SweepError::InvalidRange("all parameters must be finite".into()))
        } else if self.step <= 0.0 {
            Err(SweepError::InvalidRange(format!(
                "step must be positive, got {}",
                self.step
            )))
        } else if self.stop < self.start {
            Err(SweepError::InvalidRange(format!(
                "stop {} is below start {}",
                self.stop, self.start
            )))
        } else if self.estimated_current <= 0.0 {
            Err(SweepError::InvalidRange(format!(
                "estimated current must be positive, got {}",
                self.estimated_current
            )))
        } else {
            check_point_count(whole_steps(self.stop - self.start, self.step))
        }
    }

    /// Number of voltage points, `stop` included when it is a whole number of steps away
    ///
    /// Saturates at `config::MAX_POINTS`; [`SweepConfig::validate`] rejects such ranges.
    pub fn point_count(&self) -> usize {
        point_count(whole_steps(self.stop - self.start, self.step))
    }

    /// Target voltages in sweep order, none above `stop`
    pub fn points(&self) -> std::result::Result<Vec<f64>, SweepError> {
        self.validate()?;
        Ok((0..self.point_count())
            .map(|k| (self.start + k as f64 * self.step).min(self.stop))
            .collect())
    }

    /// Resistance that draws roughly the estimated current at voltage `v`
    pub fn target_resistance(&self, v: f64) -> f64 {
        let ohms = if v > 0.0 {
            v / self.estimated_current
        } else {
            config::MIN_RESISTANCE
        };
        ohms.max(config::MIN_RESISTANCE).min(config::MAX_RESISTANCE)
    }
}

/// Why the sweep loop ended
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Termination {
    Completed,
    CurrentLimit { current: f64 },
    PowerLimit { power: f64 },
    ShortCircuit { voltage: f64 },
}

impl Display for Termination {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Completed => f.write_str("sweep completed"),
            Termination::CurrentLimit { current } => {
                write!(f, "current limit exceeded ({}A)", Engineering(*current))
            }
            Termination::PowerLimit { power } => {
                write!(f, "power limit exceeded ({}W)", Engineering(*power))
            }
            Termination::ShortCircuit { voltage } => {
                write!(f, "short circuit reached ({}V)", Engineering(*voltage))
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct SweepOutcome {
    pub table: SweepTable,
    /// Resistance programmed for each recorded sample, parallel to `table`
    pub resistances: Vec<f64>,
    pub points_programmed: usize,
    pub termination: Termination,
}

/// Resistance-stepped search for the maximum power point
///
/// Walks the load from high resistance (open circuit) down towards a short, stopping early once
/// the terminal voltage collapses below `short_circuit_voltage`.
#[derive(Clone, Debug, PartialEq)]
pub struct ResistanceSweepConfig {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
    pub dwell: Duration,
    pub voltage_limit: f64,
    pub short_circuit_voltage: f64,
    pub limits: SafetyLimits,
}

impl Default for ResistanceSweepConfig {
    fn default() -> Self {
        ResistanceSweepConfig {
            start: config::R_START,
            stop: config::R_STOP,
            step: config::R_STEP,
            dwell: config::DWELL_TIME,
            voltage_limit: config::R_SWEEP_VOLTAGE_LIMIT,
            short_circuit_voltage: config::SHORT_CIRCUIT_VOLTAGE,
            limits: SafetyLimits::default(),
        }
    }
}

impl ResistanceSweepConfig {
    pub fn validate(&self) -> std::result::Result<(), SweepError> {
        let finite = [
            self.start,
            self.stop,
            self.step,
            self.voltage_limit,
            self.short_circuit_voltage,
            self.limits.max_current,
            self.limits.max_power,
        ]
        .iter()
        .all(|x| x.is_finite());

        if !finite {
            Err(SweepError::InvalidRange("all parameters must be finite".into()))
        } else if self.step <= 0.0 {
            Err(SweepError::InvalidRange(format!(
                "step must be positive, got {}",
                self.step
            )))
        } else if self.stop <= 0.0 || self.start < self.stop {
            Err(SweepError::InvalidRange(format!(
                "resistance must fall from {} to a positive {}",
                self.start, self.stop
            )))
        } else {
            check_point_count(whole_steps(self.start - self.stop, self.step))
        }
    }

    pub fn point_count(&self) -> usize {
        point_count(whole_steps(self.start - self.stop, self.step))
    }

    /// Resistance set-points in sweep order, falling from `start` and none below `stop`
    pub fn points(&self) -> std::result::Result<Vec<f64>, SweepError> {
        self.validate()?;
        Ok((0..self.point_count())
            .map(|k| (self.start - k as f64 * self.step).max(self.stop))
            .collect())
    }
}

/// Steps `load` through the configured voltage range in constant-resistance mode
///
/// The load input is switched off before returning, also when a step fails. Readings that are
/// not finite are skipped; a reading past the safety limits ends the sweep and is not recorded.
pub fn run_sweep<L: Load + ?Sized>(load: &mut L, config: &SweepConfig) -> Result<SweepOutcome> {
    let setpoints = config
        .points()?
        .into_iter()
        .map(|v| config.target_resistance(v))
        .collect::<Vec<_>>();
    let plan = Plan {
        setpoints: &setpoints,
        dwell: config.dwell,
        voltage_limit: config.stop,
        short_circuit_voltage: None,
        limits: config.limits,
    };
    run_plan(load, &plan)
}

/// Steps `load` down the configured resistance range in constant-resistance mode
///
/// Same input handling as [`run_sweep`]; the sample that shows a collapsed voltage is recorded
/// and ends the sweep.
pub fn run_resistance_sweep<L: Load + ?Sized>(
    load: &mut L,
    config: &ResistanceSweepConfig,
) -> Result<SweepOutcome> {
    let setpoints = config
        .points()?
        .into_iter()
        .map(|ohms| ohms.max(config::MIN_RESISTANCE).min(config::MAX_RESISTANCE))
        .collect::<Vec<_>>();
    let plan = Plan {
        setpoints: &setpoints,
        dwell: config.dwell,
        voltage_limit: config.voltage_limit,
        short_circuit_voltage: Some(config.short_circuit_voltage),
        limits: config.limits,
    };
    run_plan(load, &plan)
}

struct Plan<'a> {
    setpoints: &'a [f64],
    dwell: Duration,
    voltage_limit: f64,
    short_circuit_voltage: Option<f64>,
    limits: SafetyLimits,
}

fn run_plan<L: Load + ?Sized>(load: &mut L, plan: &Plan<'_>) -> Result<SweepOutcome> {
    info!("Instrument: {}", load.identify()?);
    load.set_mode(Mode::ConstantResistance)?;
    load.set_input(true)?;

    let result = load
        .set_voltage_limit(plan.voltage_limit)
        .and_then(|()| load.set_current_limit(plan.limits.max_current))
        .and_then(|()| step_through(load, plan));

    let disabled = load.set_input(false);
    let outcome = result?;
    disabled?;

    info!(
        "{}: {} sample(-s) from {} programmed point(-s)",
        outcome.termination,
        outcome.table.len(),
        outcome.points_programmed
    );
    Ok(outcome)
}

fn step_through<L: Load + ?Sized>(load: &mut L, plan: &Plan<'_>) -> Result<SweepOutcome> {
    info_time!("Sweep of {} points", plan.setpoints.len());

    let mut outcome = SweepOutcome {
        table: SweepTable::new(),
        resistances: Vec::new(),
        points_programmed: 0,
        termination: Termination::Completed,
    };

    for &ohms in plan.setpoints {
        debug!("Programming {}Ω", Engineering(ohms));
        load.set_resistance(ohms)?;
        outcome.points_programmed += 1;

        std::thread::sleep(plan.dwell);

        let voltage = load.read_voltage()?;
        let current = load.read_current()?;
        let sample = Sample::new(voltage, current);

        if !sample.is_finite() {
            warn!(
                "Skipping non-finite reading V={} I={} at {}Ω",
                voltage,
                current,
                Engineering(ohms)
            );
            continue;
        }

        info!(
            "R={}Ω V={}V I={}A P={}W",
            Engineering(ohms),
            Engineering(sample.voltage()),
            Engineering(sample.current()),
            Engineering(sample.power())
        );

        if sample.current() > plan.limits.max_current {
            warn!("Current limit exceeded, stopping sweep");
            outcome.termination = Termination::CurrentLimit {
                current: sample.current(),
            };
            break;
        }
        if sample.power() > plan.limits.max_power {
            warn!("Power limit exceeded, stopping sweep");
            outcome.termination = Termination::PowerLimit {
                power: sample.power(),
            };
            break;
        }

        outcome.table.push(sample);
        outcome.resistances.push(ohms);

        if let Some(threshold) = plan.short_circuit_voltage {
            if sample.voltage() < threshold {
                info!("Voltage near zero, short circuit reached");
                outcome.termination = Termination::ShortCircuit {
                    voltage: sample.voltage(),
                };
                break;
            }
        }
    }

    Ok(outcome)
}
