use crate::sample::{Sample, SweepTable};

/// Drops samples at or below the given voltage and current, and any with non-positive power
pub fn positive_only(samples: &[Sample], min_voltage: f64, min_current: f64) -> SweepTable {
    samples
        .iter()
        .filter(|s| s.voltage() > min_voltage && s.current() > min_current && s.power() > 0.0)
        .cloned()
        .collect()
}

/// Drops samples whose power z-score reaches `threshold`
///
/// One-sided: only samples far above the mean power are cut.
pub fn power_outliers(samples: &[Sample], threshold: f64) -> SweepTable {
    if samples.len() < 2 {
        return samples.iter().cloned().collect();
    }

    let n = samples.len() as f64;
    let mean = samples.iter().map(Sample::power).sum::<f64>() / n;
    let variance = samples
        .iter()
        .map(|s| (s.power() - mean).powi(2))
        .sum::<f64>()
        / n;
    let sd = variance.sqrt();
    if sd == 0.0 {
        return samples.iter().cloned().collect();
    }

    samples
        .iter()
        .filter(|s| (s.power() - mean) / sd < threshold)
        .cloned()
        .collect()
}
