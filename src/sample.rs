use std::ops::Deref;

/// One measured operating point of the source
///
/// `power` is always the product of the paired voltage and current; the only way to get a
/// `Sample` is through [`Sample::new`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    voltage: f64,
    current: f64,
    power: f64,
}

impl Sample {
    pub fn new(voltage: f64, current: f64) -> Self {
        Sample {
            voltage,
            current,
            power: voltage * current,
        }
    }

    pub fn voltage(&self) -> f64 {
        self.voltage
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn power(&self) -> f64 {
        self.power
    }

    pub fn is_finite(&self) -> bool {
        self.voltage.is_finite() && self.current.is_finite() && self.power.is_finite()
    }
}

/// Samples of one sweep in measurement order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SweepTable {
    samples: Vec<Sample>,
}

impl SweepTable {
    pub fn new() -> Self {
        SweepTable::default()
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn voltages<'a>(&'a self) -> impl Iterator<Item = f64> + 'a {
        self.samples.iter().map(Sample::voltage)
    }

    pub fn currents<'a>(&'a self) -> impl Iterator<Item = f64> + 'a {
        self.samples.iter().map(Sample::current)
    }

    pub fn powers<'a>(&'a self) -> impl Iterator<Item = f64> + 'a {
        self.samples.iter().map(Sample::power)
    }
}

impl Deref for SweepTable {
    type Target = [Sample];

    fn deref(&self) -> &[Sample] {
        &self.samples
    }
}

impl From<Vec<Sample>> for SweepTable {
    fn from(samples: Vec<Sample>) -> Self {
        SweepTable { samples }
    }
}

impl std::iter::FromIterator<Sample> for SweepTable {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        SweepTable {
            samples: iter.into_iter().collect(),
        }
    }
}
