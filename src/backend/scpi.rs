use std::io::{BufRead, BufReader, Read, Write};

use crate::error::SweepError;
use crate::Result;

/// Newline-terminated command/query exchange over a byte stream
pub struct ScpiSession<T: Read + Write> {
    stream: BufReader<T>,
}

impl<T: Read + Write> ScpiSession<T> {
    pub fn new(stream: T) -> Self {
        ScpiSession {
            stream: BufReader::new(stream),
        }
    }

    pub fn write(&mut self, command: &str) -> Result<()> {
        trace!("> {}", command);
        let out = self.stream.get_mut();
        out.write_all(command.as_bytes())?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(())
    }

    pub fn query(&mut self, query: &str) -> Result<String> {
        self.write(query)?;

        let mut response = String::new();
        if self.stream.read_line(&mut response)? == 0 {
            return Err(failure::format_err!(
                "Connection closed while waiting for a response to {}",
                query
            ));
        }
        let response = response.trim().to_owned();
        trace!("< {}", response);
        Ok(response)
    }

    pub fn query_f64(&mut self, query: &str) -> Result<f64> {
        let response = self.query(query)?;
        response.parse::<f64>().map_err(|_| {
            SweepError::BadResponse {
                query: query.to_owned(),
                response,
            }
            .into()
        })
    }

    pub fn get_ref(&self) -> &T {
        self.stream.get_ref()
    }
}
