pub mod aoi;
pub mod csv;
pub mod filter;
#[cfg(feature = "plot")]
pub mod plot;

use std::path::{Path, PathBuf};

/// `<dir>/<prefix>_<timestamp>.csv`
pub fn default_csv_path<P: AsRef<Path>>(dir: P, prefix: &str, timestamp: &str) -> PathBuf {
    dir.as_ref().join(format!("{}_{}.csv", prefix, timestamp))
}

/// The plot sits next to the data it was drawn from: `x.csv` and `x.csv.gz` both become `x.png`
pub fn plot_path_for(csv_path: &Path) -> PathBuf {
    let mut path = csv_path.to_path_buf();
    if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        path.set_extension("");
    }
    path.set_extension("png");
    path
}
