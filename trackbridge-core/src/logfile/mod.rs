//! trackbridge-core/src/logfile/mod.rs
//!
//! Binary container for recorded tracker frames.
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! header   : b"FTLK" | u16 version | u16 reserved | u32 message_count
//! table    : message_count x (u32 offset, u32 len), offsets relative to the body
//! body     : the encoded frames, back to back, in append order
//! ```

mod builder;
mod message;
mod verify;

use std::path::PathBuf;

pub use builder::{RecordRef, RecordingBuffer};
pub use message::{decode_frame, encode_frame};
pub use verify::{decode_log, read_log, verify_log_buffer, LogSummary};

/// Identifies a finished tracker log.
pub const LOG_IDENTIFIER: [u8; 4] = *b"FTLK";
pub const LOG_FORMAT_VERSION: u16 = 1;
pub const LOG_FILE_EXTENSION: &str = "flik";

pub(crate) const HEADER_SIZE: usize = 12;
pub(crate) const TABLE_ENTRY_SIZE: usize = 8;

/// `<local timestamp>FusionTrack.flik`, used when a save has no destination.
pub fn default_log_filename() -> PathBuf {
    let stamp = chrono::Local::now().format("%Y_%m_%d_%H_%M_%S");
    PathBuf::from(format!("{stamp}FusionTrack.{LOG_FILE_EXTENSION}"))
}
