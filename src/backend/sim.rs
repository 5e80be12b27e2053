use crate::backend::{Load, Mode};
use crate::Result;

const THERMAL_VOLTAGE: f64 = 0.025_85;
const BISECTION_STEPS: usize = 100;

/// Photovoltaic module behind an ideal electronic load
///
/// Single-diode model without series or shunt resistance:
/// `I(V) = Isc - I0 * (exp(V / (n * Vt * Ns)) - 1)`, with `I0` chosen so that `I(Voc) = 0`.
#[derive(Clone, Debug)]
pub struct SimulatedCell {
    isc: f64,
    voc: f64,
    n_vt: f64,
    i0: f64,
    mode: Mode,
    enabled: bool,
    setpoint: f64,
}

impl SimulatedCell {
    pub fn new(isc: f64, voc: f64, ideality: f64, cells_in_series: u32) -> Self {
        let n_vt = ideality * THERMAL_VOLTAGE * f64::from(cells_in_series);
        SimulatedCell {
            isc,
            voc,
            n_vt,
            i0: isc / ((voc / n_vt).exp() - 1.0),
            mode: Mode::ConstantResistance,
            enabled: false,
            setpoint: 0.0,
        }
    }

    pub fn isc(&self) -> f64 {
        self.isc
    }

    pub fn voc(&self) -> f64 {
        self.voc
    }

    /// Current delivered at terminal voltage `v`
    pub fn current_at(&self, v: f64) -> f64 {
        self.isc - self.i0 * ((v / self.n_vt).exp() - 1.0)
    }

    /// Terminal voltage with a resistor across the output
    fn voltage_across(&self, ohms: f64) -> f64 {
        let mut lo = 0.0;
        let mut hi = self.voc;
        for _ in 0..BISECTION_STEPS {
            let mid = (lo + hi) / 2.0;
            if self.current_at(mid) - mid / ohms > 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        (lo + hi) / 2.0
    }

    fn operating_point(&self) -> (f64, f64) {
        if !self.enabled {
            return (self.voc, 0.0);
        }
        let v = match self.mode {
            Mode::ConstantVoltage => self.setpoint.max(0.0).min(self.voc),
            _ => self.voltage_across(self.setpoint),
        };
        (v, self.current_at(v).max(0.0))
    }
}

impl Default for SimulatedCell {
    /// Small 36-cell module: 5.5 A short circuit, 8 V open circuit
    fn default() -> Self {
        SimulatedCell::new(5.5, 8.0, 1.3, 12)
    }
}

impl Load for SimulatedCell {
    fn identify(&mut self) -> Result<String> {
        Ok(format!(
            "SIMULATED,PV-MODULE,Isc={:.2}A,Voc={:.2}V",
            self.isc, self.voc
        ))
    }

    fn set_mode(&mut self, mode: Mode) -> Result<()> {
        match mode {
            Mode::ConstantResistance | Mode::ConstantVoltage => {
                self.mode = mode;
                Ok(())
            }
            mode => Err(failure::format_err!("Simulated load can't do {} mode", mode)),
        }
    }

    fn set_input(&mut self, enabled: bool) -> Result<()> {
        self.enabled = enabled;
        Ok(())
    }

    fn set_voltage_limit(&mut self, _volts: f64) -> Result<()> {
        Ok(())
    }

    fn set_current_limit(&mut self, _amperes: f64) -> Result<()> {
        Ok(())
    }

    fn set_resistance(&mut self, ohms: f64) -> Result<()> {
        if ohms.is_nan() || ohms <= 0.0 {
            return Err(failure::format_err!("Invalid resistance {}", ohms));
        }
        self.setpoint = ohms;
        Ok(())
    }

    fn set_voltage(&mut self, volts: f64) -> Result<()> {
        self.setpoint = volts;
        Ok(())
    }

    fn read_voltage(&mut self) -> Result<f64> {
        Ok(self.operating_point().0)
    }

    fn read_current(&mut self) -> Result<f64> {
        Ok(self.operating_point().1)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::SimulatedCell;
    use crate::backend::{Load, Mode};

    #[test]
    fn endpoints_of_the_curve() {
        let cell = SimulatedCell::default();
        assert_abs_diff_eq!(cell.current_at(0.0), 5.5, epsilon = 1e-12);
        assert_abs_diff_eq!(cell.current_at(8.0), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn disabled_input_reads_open_circuit() {
        let mut cell = SimulatedCell::default();
        assert_abs_diff_eq!(cell.read_voltage().unwrap(), 8.0);
        assert_abs_diff_eq!(cell.read_current().unwrap(), 0.0);
    }

    #[test]
    fn resistive_load_satisfies_ohms_law() {
        let mut cell = SimulatedCell::default();
        cell.set_mode(Mode::ConstantResistance).unwrap();
        cell.set_input(true).unwrap();

        for &r in &[0.08, 0.5, 1.3, 2.0, 100.0] {
            cell.set_resistance(r).unwrap();
            let v = cell.read_voltage().unwrap();
            let i = cell.read_current().unwrap();
            assert_abs_diff_eq!(v / r, i, epsilon = 1e-6);
        }
    }

    #[test]
    fn voltage_mode_follows_setpoint() {
        let mut cell = SimulatedCell::default();
        cell.set_mode(Mode::ConstantVoltage).unwrap();
        cell.set_input(true).unwrap();

        cell.set_voltage(4.0).unwrap();
        assert_abs_diff_eq!(cell.read_voltage().unwrap(), 4.0);
        cell.set_voltage(12.0).unwrap();
        assert_abs_diff_eq!(cell.read_voltage().unwrap(), 8.0);
    }

    #[test]
    fn current_mode_is_not_simulated() {
        let mut cell = SimulatedCell::default();
        assert!(cell.set_mode(Mode::ConstantCurrent).is_err());
        assert!(cell.set_mode(Mode::ConstantPower).is_err());
    }

    #[test]
    fn zero_resistance_is_rejected() {
        let mut cell = SimulatedCell::default();
        assert!(cell.set_resistance(0.0).is_err());
    }
}
