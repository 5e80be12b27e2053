use failure::Fail;

/// Errors caused by how the tracer was set up or used rather than by the instrument
#[derive(Debug, Fail, PartialEq)]
pub enum SweepError {
    #[fail(display = "No samples collected, check sweep limits and setup")]
    EmptyTable,
    #[fail(display = "Invalid sweep range: {}", _0)]
    InvalidRange(String),
    #[fail(display = "Unparseable instrument response to {}: {:?}", query, response)]
    BadResponse { query: String, response: String },
}
