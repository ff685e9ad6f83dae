use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while building a simulator.
///
/// All variants surface from the constructors; a simulator that exists has a
/// fully loaded dataset.
#[derive(Error, Debug)]
pub enum SimulatorError {
    #[error("{} is not a {expected} file", .path.display())]
    FormatMismatch { path: PathBuf, expected: &'static str },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("malformed input in {}: {reason}", .path.display())]
    MalformedInput { path: PathBuf, reason: String },
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SimulatorError>;
