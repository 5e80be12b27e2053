use noisy_float::prelude::r64;

use crate::error::SweepError;
use crate::sample::Sample;

/// Finds the maximum power point of a sweep
///
/// On ties the earliest sample wins. Samples with a non-finite value, such as a power that
/// overflowed, are passed over; a table with nothing else is treated as empty.
pub fn locate_mpp(samples: &[Sample]) -> Result<&Sample, SweepError> {
    // `max_by_key` keeps the last of equal maxima, so walk backwards to keep the first
    samples
        .iter()
        .rev()
        .filter(|s| s.is_finite())
        .max_by_key(|s| r64(s.power()))
        .ok_or(SweepError::EmptyTable)
}

#[cfg(test)]
mod tests {
    use super::locate_mpp;
    use crate::error::SweepError;
    use crate::sample::Sample;

    fn table(points: &[(f64, f64)]) -> Vec<Sample> {
        points.iter().map(|&(v, i)| Sample::new(v, i)).collect()
    }

    #[test]
    fn finds_global_maximum() {
        let samples = table(&[(0.0, 0.0), (1.0, 2.0), (2.0, 3.0), (3.0, 1.0)]);
        let mpp = locate_mpp(&samples).unwrap();
        assert_eq!(*mpp, Sample::new(2.0, 3.0));
        assert_eq!(mpp.power(), 6.0);
    }

    #[test]
    fn ties_resolve_to_first_sample() {
        let samples = table(&[(1.0, 1.0), (2.0, 3.0), (3.0, 2.0), (6.0, 1.0)]);
        let mpp = locate_mpp(&samples).unwrap();
        assert_eq!(mpp.voltage(), 2.0);
    }

    #[test]
    fn maximum_at_either_end() {
        let rising = table(&[(1.0, 1.0), (2.0, 1.0), (3.0, 1.0)]);
        assert_eq!(locate_mpp(&rising).unwrap().voltage(), 3.0);

        let falling = table(&[(1.0, 5.0), (2.0, 2.0), (3.0, 1.0)]);
        assert_eq!(locate_mpp(&falling).unwrap().voltage(), 1.0);
    }

    #[test]
    fn negative_powers_are_compared_too() {
        let samples = table(&[(1.0, -3.0), (2.0, -1.0), (3.0, -2.0)]);
        assert_eq!(locate_mpp(&samples).unwrap().voltage(), 2.0);
    }

    #[test]
    fn empty_table_is_an_error() {
        assert_eq!(locate_mpp(&[]), Err(SweepError::EmptyTable));
    }

    #[test]
    fn overflowing_power_is_passed_over() {
        let samples = vec![Sample::new(1.0, 2.0), Sample::new(1e200, 1e200)];
        assert!(samples[1].power().is_infinite());
        assert_eq!(*locate_mpp(&samples).unwrap(), Sample::new(1.0, 2.0));

        let samples = vec![Sample::new(std::f64::NAN, 1.0), Sample::new(1e200, -1e200)];
        assert_eq!(locate_mpp(&samples), Err(SweepError::EmptyTable));
    }
}
