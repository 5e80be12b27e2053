use num_traits::Float;
use std::fmt::Display;
use std::fmt::Error;
use std::fmt::Formatter;
use std::fmt::Write;

/// Formats a value with an SI prefix and three decimals, e.g. `12.300m`
pub struct Engineering<N: Float>(pub N);

impl<N: Float> Display for Engineering<N> {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        let value = match self.0.to_f64() {
            Some(value) => value,
            None => return f.write_str("NaN"),
        };
        if value == 0.0 || !value.is_finite() {
            write!(f, "{}", value)
        } else {
            let exp = (value.abs().log10() / 3.0).floor() as i32 * 3;
            let mantissa = value / 10f64.powi(exp);
            write!(f, "{:.3}", mantissa)?;
            match exp {
                0 => {}
                -3 => f.write_char('m')?,
                -6 => f.write_char('µ')?,
                -9 => f.write_char('n')?,
                -12 => f.write_char('p')?,
                3 => f.write_char('k')?,
                6 => f.write_char('M')?,
                9 => f.write_char('G')?,
                exp => write!(f, "e{}", exp)?,
            }
            Ok(())
        }
    }
}

/// Local wall clock as `YYYYmmdd_HHMMSS`, used to name and title a run
pub fn timestamp() -> String {
    time::strftime("%Y%m%d_%H%M%S", &time::now()).unwrap_or_else(|_| String::from("unknown"))
}
