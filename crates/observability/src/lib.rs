//! Tracing/logging setup shared by the binaries and tests.

mod logging;

pub use logging::{LogFormat, ParseLogFormatError, init};
