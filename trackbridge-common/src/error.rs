// ================================================================
// File: trackbridge-common/src/error.rs
// ================================================================

use thiserror::Error;

/// Failures raised by the tracking device driver.
///
/// Kept `Clone` so a fault captured on the acquisition thread can be
/// handed back to the consumer on every later call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeviceError {
    #[error("Device connection error: {0}")]
    Connection(String),

    #[error("Device receive error: {0}")]
    Receive(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Tracker device fault: {0}")]
    Device(#[from] DeviceError),

    #[error(
        "Unsupported motion configuration for geometry {geometry_id}: \
         moving objects other than those being measured and the tracker base itself \
         is not supported (frame handle {frame}, tracker base handle {base})"
    )]
    UnsupportedConfiguration {
        geometry_id: u32,
        frame: i32,
        base: i32,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Handle resolution error: {0}")]
    HandleResolution(String),

    #[error("Target update error: {0}")]
    TargetUpdate(String),

    #[error("Save error: {0}")]
    Save(String),

    #[error("Log format error: {0}")]
    Log(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Controller is already running")]
    AlreadyStarted,
}

impl From<std::num::ParseIntError> for Error {
    fn from(err: std::num::ParseIntError) -> Self {
        Error::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
