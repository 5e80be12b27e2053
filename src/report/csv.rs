use std::ffi::OsStr;
use std::fs::File;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::sample::{Sample, SweepTable};
use crate::Result;

const HEADER: [&str; 3] = ["voltage", "current", "power"];
const POWER_MISMATCH_TOLERANCE: f64 = 1e-9;

#[derive(Deserialize)]
struct Record {
    #[serde(alias = "Voltage (V)")]
    voltage: f64,
    #[serde(alias = "Current (A)")]
    current: f64,
    #[serde(alias = "Power (W)")]
    power: Option<f64>,
}

trait CsvWriter {
    fn write_record(&mut self, record: &[&str]) -> Result<()>;
    fn close(self: Box<Self>) -> Result<()>;
}

impl<W: std::io::Write> CsvWriter for csv::Writer<libflate::gzip::Encoder<W>> {
    fn write_record(&mut self, record: &[&str]) -> Result<()> {
        csv::Writer::write_record(self, record)?;
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.into_inner()
            .map_err(|_| failure::err_msg("Error writing the file"))?
            .finish()
            .into_result()?;
        Ok(())
    }
}

impl CsvWriter for csv::Writer<File> {
    fn write_record(&mut self, record: &[&str]) -> Result<()> {
        csv::Writer::write_record(self, record)?;
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.into_inner()
            .map_err(|_| failure::err_msg("Error writing the file"))?
            .sync_all()?;
        Ok(())
    }
}

fn is_gz(path: &Path) -> bool {
    path.extension().and_then(OsStr::to_str) == Some("gz")
}

fn csv_writer_from_path(path: &Path) -> Result<Box<dyn CsvWriter>> {
    let builder = csv::WriterBuilder::new();
    Ok(if is_gz(path) {
        Box::new(builder.from_writer(libflate::gzip::Encoder::new(File::create(path)?)?))
    } else {
        Box::new(builder.from_path(path)?)
    })
}

fn csv_reader_from_path<D: DeserializeOwned + 'static>(
    path: &Path,
) -> Result<Box<dyn Iterator<Item = csv::Result<D>>>> {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).trim(csv::Trim::All);
    Ok(if is_gz(path) {
        Box::new(
            builder
                .from_reader(libflate::gzip::Decoder::new(File::open(path)?)?)
                .into_deserialize(),
        )
    } else {
        Box::new(builder.from_path(path)?.into_deserialize())
    })
}

/// Writes one `voltage,current,power` row per sample after a header row
///
/// Values are written in their shortest exact decimal form, so [`load`] gives back the same
/// numbers. A `.gz` extension selects gzip compression.
pub fn save(samples: &[Sample], path: &Path) -> Result<()> {
    let mut out = csv_writer_from_path(path)?;

    out.write_record(&HEADER)?;
    for s in samples {
        let v_str = s.voltage().to_string();
        let i_str = s.current().to_string();
        let p_str = s.power().to_string();
        out.write_record(&[v_str.as_str(), i_str.as_str(), p_str.as_str()])?;
    }
    out.close()?;
    debug!("Wrote {} row(-s) to {}", samples.len(), path.display());
    Ok(())
}

/// Like [`save`], with the programmed load resistance in a leading `resistance` column
pub fn save_with_resistance(resistances: &[f64], samples: &[Sample], path: &Path) -> Result<()> {
    if resistances.len() != samples.len() {
        return Err(failure::format_err!(
            "{} resistance(-s) for {} sample(-s)",
            resistances.len(),
            samples.len()
        ));
    }
    let mut out = csv_writer_from_path(path)?;

    out.write_record(&["resistance", HEADER[0], HEADER[1], HEADER[2]])?;
    for (r, s) in resistances.iter().zip(samples) {
        let r_str = r.to_string();
        let v_str = s.voltage().to_string();
        let i_str = s.current().to_string();
        let p_str = s.power().to_string();
        out.write_record(&[
            r_str.as_str(),
            v_str.as_str(),
            i_str.as_str(),
            p_str.as_str(),
        ])?;
    }
    out.close()?;
    debug!("Wrote {} row(-s) to {}", samples.len(), path.display());
    Ok(())
}

/// Reads a saved sweep back, recomputing power from voltage and current
///
/// Any malformed or non-finite row is an error.
pub fn load(path: &Path) -> Result<SweepTable> {
    read_table(path, false)
}

/// Reads a saved sweep for display, skipping rows that don't parse or aren't finite
pub fn load_lenient(path: &Path) -> Result<SweepTable> {
    read_table(path, true)
}

fn read_table(path: &Path, skip_bad_rows: bool) -> Result<SweepTable> {
    let mut table = SweepTable::new();

    for (row, result) in csv_reader_from_path(path)?.enumerate() {
        let record: Record = match result {
            Ok(record) => record,
            Err(e) => match e.kind() {
                csv::ErrorKind::Deserialize { .. } | csv::ErrorKind::UnequalLengths { .. }
                    if skip_bad_rows =>
                {
                    warn!("{}: skipping row {}: {}", path.display(), row + 1, e);
                    continue;
                }
                _ => return Err(e.into()),
            },
        };
        let sample = Sample::new(record.voltage, record.current);
        if !sample.is_finite() {
            if skip_bad_rows {
                warn!(
                    "{}: skipping row {} with a non-finite value",
                    path.display(),
                    row + 1
                );
                continue;
            }
            return Err(failure::format_err!(
                "{}: row {} has a non-finite value",
                path.display(),
                row + 1
            ));
        }
        if let Some(power) = record.power {
            let scale = power.abs().max(sample.power().abs()).max(1.0);
            if (power - sample.power()).abs() > POWER_MISMATCH_TOLERANCE * scale {
                warn!(
                    "{}: row {} stores power {} but V×I is {}",
                    path.display(),
                    row + 1,
                    power,
                    sample.power()
                );
            }
        }
        table.push(sample);
    }

    debug!("Read {} row(-s) from {}", table.len(), path.display());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{load, load_lenient, save, save_with_resistance};
    use crate::sample::Sample;

    fn sweep() -> Vec<Sample> {
        vec![
            Sample::new(0.0, 5.43),
            Sample::new(0.1, 5.4299999),
            Sample::new(3.3, 5.1),
            Sample::new(6.83, 5.2017),
            Sample::new(7.999, 1.0e-4),
        ]
    }

    #[test]
    fn file_has_header_and_one_row_per_sample() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.csv");
        save(&[Sample::new(1.0, 2.0), Sample::new(2.0, 3.0)], &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            vec!["voltage,current,power", "1,2,2", "2,3,6"]
        );
    }

    #[test]
    fn saved_values_read_back_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.csv");
        save(&sweep(), &path).unwrap();

        assert_eq!(&*load(&path).unwrap(), &sweep()[..]);
    }

    #[test]
    fn gzip_is_selected_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.csv.gz");
        save(&sweep(), &path).unwrap();

        let raw = fs::read(&path).unwrap();
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);
        assert_eq!(&*load(&path).unwrap(), &sweep()[..]);
    }

    #[test]
    fn legacy_header_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.csv");
        fs::write(
            &path,
            "Voltage (V),Current (A),Power (W)\n1.5,2.0,3.0\n2.5,1.0,2.5\n",
        )
        .unwrap();

        let table = load(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0], Sample::new(1.5, 2.0));
    }

    #[test]
    fn non_finite_rows_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "voltage,current,power\n1,NaN,NaN\n").unwrap();
        assert!(load(&path).is_err());
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("sweep.csv");
        assert!(save(&sweep(), &path).is_err());
    }

    #[test]
    fn bad_rows_are_skipped_when_lenient() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noisy.csv");
        fs::write(
            &path,
            "voltage,current,power\n1,2,2\nOVERLOAD,1,1\n2,NaN,NaN\n3,1,3\n",
        )
        .unwrap();

        assert!(load(&path).is_err());
        let table = load_lenient(&path).unwrap();
        assert_eq!(&*table, &[Sample::new(1.0, 2.0), Sample::new(3.0, 1.0)][..]);
    }

    #[test]
    fn resistance_column_leads_and_is_ignored_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.csv");
        save_with_resistance(&[15_000.0, 14_900.0], &sweep()[..2], &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "resistance,voltage,current,power");
        assert!(lines[1].starts_with("15000,0,5.43,"));
        assert_eq!(&*load(&path).unwrap(), &sweep()[..2]);
    }

    #[test]
    fn mismatched_resistances_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.csv");
        assert!(save_with_resistance(&[1.0], &sweep(), &path).is_err());
    }
}
