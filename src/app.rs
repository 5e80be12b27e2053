use std::path::{Path, PathBuf};

use crate::backend::Load;
use crate::config;
use crate::mpp::locate_mpp;
use crate::report;
use crate::sample::{Sample, SweepTable};
use crate::sweep::{
    run_resistance_sweep, run_sweep, ResistanceSweepConfig, SweepConfig, SweepOutcome,
};
use crate::util::{timestamp, Engineering};
use crate::Result;

/// What to do with a sweep once it has been taken
#[derive(Clone, Debug)]
pub struct ReportOptions {
    pub save: bool,
    pub plot: bool,
    pub output_dir: PathBuf,
    pub timestamp: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            save: true,
            plot: true,
            output_dir: PathBuf::from("."),
            timestamp: timestamp(),
        }
    }
}

/// Where the outputs of a run ended up
#[derive(Clone, Debug, Default)]
pub struct RunReport {
    pub csv: Option<PathBuf>,
    pub plot: Option<PathBuf>,
}

/// Sweeps `load`, reports the maximum power point, then saves and plots as requested
///
/// A failed save or plot is logged and does not fail the run.
pub fn sweep_and_report<L: Load + ?Sized>(
    load: &mut L,
    sweep: &SweepConfig,
    options: &ReportOptions,
) -> Result<(SweepOutcome, RunReport)> {
    let outcome = run_sweep(load, sweep)?;
    let run = report_outcome(&outcome, None, config::OUTPUT_FILE_PREFIX, options)?;
    Ok((outcome, run))
}

/// Steps the load resistance down from open circuit and reports the maximum power point
///
/// The saved file carries the programmed resistance of every row in front of the readings.
pub fn resistance_sweep_and_report<L: Load + ?Sized>(
    load: &mut L,
    sweep: &ResistanceSweepConfig,
    options: &ReportOptions,
) -> Result<(SweepOutcome, RunReport)> {
    let outcome = run_resistance_sweep(load, sweep)?;
    info!("Resistance sweep ended: {}", outcome.termination);
    let run = report_outcome(
        &outcome,
        Some(&outcome.resistances),
        config::R_SWEEP_FILE_PREFIX,
        options,
    )?;
    Ok((outcome, run))
}

fn report_outcome(
    outcome: &SweepOutcome,
    resistances: Option<&[f64]>,
    prefix: &str,
    options: &ReportOptions,
) -> Result<RunReport> {
    let mpp = *locate_mpp(&outcome.table)?;
    log_mpp(&mpp);
    if let Some(resistances) = resistances {
        if let Some(ix) = outcome.table.iter().position(|s| *s == mpp) {
            info!("Optimal load: {}Ω", Engineering(resistances[ix]));
        }
    }

    let csv_path = report::default_csv_path(&options.output_dir, prefix, &options.timestamp);
    let mut run = RunReport::default();

    if options.save {
        let saved = match resistances {
            Some(resistances) => {
                report::csv::save_with_resistance(resistances, &outcome.table, &csv_path)
            }
            None => report::csv::save(&outcome.table, &csv_path),
        };
        match saved {
            Ok(()) => {
                info!("Data saved to {}", csv_path.display());
                run.csv = Some(csv_path.clone());
            }
            Err(e) => error!("Can't save {}: {}", csv_path.display(), e),
        }
    } else {
        info!("CSV not saved");
    }

    if options.plot {
        let title = format!("I-V / P-V sweep ({})", options.timestamp);
        let plot_path = report::plot_path_for(&csv_path);
        match plot(&outcome.table, &mpp, &title, &plot_path) {
            Ok(path) => run.plot = path,
            Err(e) => error!("Can't plot {}: {}", plot_path.display(), e),
        }
    }

    Ok(run)
}

/// Loads a saved sweep, filters it for display, reports its maximum power point and plots it
pub fn replot(path: &Path, z_threshold: Option<f64>) -> Result<Option<PathBuf>> {
    let table = report::csv::load_lenient(path)?;
    let mut table = report::filter::positive_only(
        &table,
        config::PLOT_MIN_VOLTAGE,
        config::PLOT_MIN_CURRENT,
    );
    if let Some(threshold) = z_threshold {
        table = report::filter::power_outliers(&table, threshold);
    }
    info!("{} sample(-s) left after filtering", table.len());

    let mpp = *locate_mpp(&table)?;
    log_mpp(&mpp);

    let title = format!("I-V / P-V sweep ({})", path.display());
    plot(&table, &mpp, &title, &report::plot_path_for(path))
}

fn log_mpp(mpp: &Sample) {
    info!(
        "Maximum Power Point: {}W at {}V, {}A",
        Engineering(mpp.power()),
        Engineering(mpp.voltage()),
        Engineering(mpp.current())
    );
}

#[cfg(feature = "plot")]
fn plot(table: &SweepTable, mpp: &Sample, title: &str, path: &Path) -> Result<Option<PathBuf>> {
    report::plot::save_png(table, mpp, title, path)?;
    info!("Plot saved to {}", path.display());
    Ok(Some(path.to_path_buf()))
}

#[cfg(not(feature = "plot"))]
fn plot(_: &SweepTable, _: &Sample, _: &str, _: &Path) -> Result<Option<PathBuf>> {
    warn!("Built without the `plot` feature, skipping plots");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{replot, resistance_sweep_and_report, sweep_and_report, ReportOptions};
    use crate::backend::SimulatedCell;
    use crate::error::SweepError;
    use crate::report;
    use crate::sweep::{ResistanceSweepConfig, SweepConfig, Termination};

    fn quick_sweep() -> SweepConfig {
        SweepConfig {
            step: 0.5,
            dwell: Duration::from_millis(0),
            ..SweepConfig::default()
        }
    }

    #[test]
    fn saved_file_matches_the_sweep() {
        let dir = tempfile::tempdir().unwrap();
        let options = ReportOptions {
            plot: false,
            output_dir: dir.path().to_path_buf(),
            timestamp: "20250101_000000".into(),
            ..ReportOptions::default()
        };

        let (outcome, run) =
            sweep_and_report(&mut SimulatedCell::default(), &quick_sweep(), &options).unwrap();

        let csv = run.csv.unwrap();
        assert!(csv.ends_with("iv_pv_data_20250101_000000.csv"));
        assert_eq!(report::csv::load(&csv).unwrap(), outcome.table);
        assert!(run.plot.is_none());
    }

    #[test]
    fn failed_save_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let options = ReportOptions {
            plot: false,
            output_dir: dir.path().join("does-not-exist"),
            ..ReportOptions::default()
        };

        let (_, run) =
            sweep_and_report(&mut SimulatedCell::default(), &quick_sweep(), &options).unwrap();
        assert!(run.csv.is_none());
    }

    #[test]
    fn empty_sweep_is_reported() {
        let sweep = SweepConfig {
            limits: crate::sweep::SafetyLimits {
                max_current: 0.1,
                max_power: 50.0,
            },
            ..quick_sweep()
        };
        let options = ReportOptions {
            save: false,
            plot: false,
            ..ReportOptions::default()
        };

        let err = sweep_and_report(&mut SimulatedCell::default(), &sweep, &options).unwrap_err();
        assert_eq!(err.downcast_ref::<SweepError>(), Some(&SweepError::EmptyTable));
    }

    #[test]
    fn failed_plot_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let options = ReportOptions {
            plot: true,
            output_dir: dir.path().join("does-not-exist"),
            ..ReportOptions::default()
        };

        let (outcome, run) =
            sweep_and_report(&mut SimulatedCell::default(), &quick_sweep(), &options).unwrap();
        assert!(!outcome.table.is_empty());
        assert!(run.csv.is_none());
        assert!(run.plot.is_none());
    }

    #[test]
    fn resistance_sweep_is_saved_with_resistances() {
        let dir = tempfile::tempdir().unwrap();
        let options = ReportOptions {
            plot: false,
            output_dir: dir.path().to_path_buf(),
            timestamp: "20250101_000000".into(),
            ..ReportOptions::default()
        };
        let sweep = ResistanceSweepConfig {
            step: 500.0,
            dwell: Duration::from_millis(0),
            ..ResistanceSweepConfig::default()
        };

        let (outcome, run) =
            resistance_sweep_and_report(&mut SimulatedCell::default(), &sweep, &options).unwrap();

        let csv = run.csv.unwrap();
        assert!(csv.ends_with("dl3031_mppt_data_20250101_000000.csv"));
        let text = std::fs::read_to_string(&csv).unwrap();
        assert!(text.starts_with("resistance,voltage,current,power\n15000,"));
        assert_eq!(text.lines().count(), outcome.table.len() + 1);
        assert_eq!(report::csv::load(&csv).unwrap(), outcome.table);
        assert_eq!(outcome.termination, Termination::Completed);
    }

    #[test]
    fn replot_skips_unparseable_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cv_mode.csv");
        std::fs::write(
            &path,
            "Voltage (V),Current (A),Power (W)\n1,2,2\n--,--,--\n2,2.5,5\n3,1,3\n",
        )
        .unwrap();

        // Without the plot feature there is no image, but the file must still load
        let plotted = replot(&path, None).unwrap();
        if cfg!(feature = "plot") {
            assert_eq!(plotted, Some(dir.path().join("cv_mode.png")));
        } else {
            assert_eq!(plotted, None);
        }
    }
}
