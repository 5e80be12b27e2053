use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::backend::scpi::ScpiSession;
use crate::backend::{Load, Mode};
use crate::config::LOW_RANGE_MAX;
use crate::Result;

/// Rigol DL3031 electronic load speaking SCPI
///
/// The input is switched off when the handle is dropped, whatever state the sweep ended in.
pub struct DL3031<T: Read + Write = TcpStream> {
    session: ScpiSession<T>,
}

impl DL3031<TcpStream> {
    /// Connects to the raw SCPI socket at `address` (`host:port`)
    pub fn connect(address: &str, timeout: Duration) -> Result<Self> {
        let addr = address
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| failure::format_err!("Can't resolve instrument address {}", address))?;

        info!("Connecting to {}", addr);
        let stream = TcpStream::connect_timeout(&addr, timeout)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;

        Ok(DL3031::from_stream(stream))
    }
}

impl<T: Read + Write> DL3031<T> {
    pub fn from_stream(stream: T) -> Self {
        DL3031 {
            session: ScpiSession::new(stream),
        }
    }

    #[cfg(test)]
    fn session(&self) -> &ScpiSession<T> {
        &self.session
    }
}

impl<T: Read + Write> Load for DL3031<T> {
    fn identify(&mut self) -> Result<String> {
        self.session.query("*IDN?")
    }

    fn set_mode(&mut self, mode: Mode) -> Result<()> {
        self.session.write(&format!(":FUNC {}", mode.scpi_name()))
    }

    fn set_input(&mut self, enabled: bool) -> Result<()> {
        self.session
            .write(if enabled { ":INPUT ON" } else { ":INPUT OFF" })
    }

    fn set_voltage_limit(&mut self, volts: f64) -> Result<()> {
        self.session.write(&format!(":VOLT:LIM {:.2}", volts))
    }

    fn set_current_limit(&mut self, amperes: f64) -> Result<()> {
        self.session.write(&format!(":CURR:LIM {:.2}", amperes))
    }

    fn set_resistance(&mut self, ohms: f64) -> Result<()> {
        self.session.write(if ohms <= LOW_RANGE_MAX {
            ":RANGE LOW"
        } else {
            ":RANGE HIGH"
        })?;
        self.session.write(&format!(":RES {:.3}", ohms))
    }

    fn set_voltage(&mut self, volts: f64) -> Result<()> {
        self.session.write(&format!(":VOLT {:.3}", volts))
    }

    fn read_voltage(&mut self) -> Result<f64> {
        self.session.query_f64(":MEAS:VOLT?")
    }

    fn read_current(&mut self) -> Result<f64> {
        self.session.query_f64(":MEAS:CURR?")
    }
}

impl<T: Read + Write> Drop for DL3031<T> {
    fn drop(&mut self) {
        match self.set_input(false) {
            Ok(()) => info!("Load input disabled"),
            Err(e) => error!("Can't disable the load input: {}", e),
        }
    }
}
