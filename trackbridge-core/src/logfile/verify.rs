// File: trackbridge-core/src/logfile/verify.rs

use std::io::{Cursor, Read};
use std::path::Path;
use byteorder::{LittleEndian, ReadBytesExt};
use trackbridge_common::models::Frame;
use trackbridge_common::{Error, Result};
use super::message::decode_frame;
use super::{HEADER_SIZE, LOG_FORMAT_VERSION, LOG_IDENTIFIER, TABLE_ENTRY_SIZE};

/// What a successful verification found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSummary {
    pub message_count: usize,
    pub byte_len: usize,
}

/// Walk the header and message table, returning each message's bytes.
/// Every bounds check happens here; callers only decode.
fn message_slices(bytes: &[u8]) -> Result<Vec<&[u8]>> {
    if bytes.len() < HEADER_SIZE {
        return Err(Error::Log(format!("log too short: {} bytes", bytes.len())));
    }
    let mut r = Cursor::new(bytes);
    let mut identifier = [0u8; 4];
    r.read_exact(&mut identifier)?;
    if identifier != LOG_IDENTIFIER {
        return Err(Error::Log(format!(
            "bad log identifier {identifier:?}, expected {LOG_IDENTIFIER:?}"
        )));
    }
    let version = r.read_u16::<LittleEndian>()?;
    if version != LOG_FORMAT_VERSION {
        return Err(Error::Log(format!("unsupported log version {version}")));
    }
    let _reserved = r.read_u16::<LittleEndian>()?;
    let count = r.read_u32::<LittleEndian>()? as usize;

    let body_start = count
        .checked_mul(TABLE_ENTRY_SIZE)
        .and_then(|n| n.checked_add(HEADER_SIZE))
        .filter(|&n| n <= bytes.len())
        .ok_or_else(|| Error::Log(format!("message table for {count} entries overruns the log")))?;
    let body = &bytes[body_start..];

    let mut out = Vec::with_capacity(count);
    let mut expected_offset = 0usize;
    for i in 0..count {
        let offset = r.read_u32::<LittleEndian>()? as usize;
        let len = r.read_u32::<LittleEndian>()? as usize;
        if offset != expected_offset {
            return Err(Error::Log(format!(
                "message {i} starts at {offset}, expected {expected_offset}"
            )));
        }
        let end = offset + len;
        if end > body.len() {
            return Err(Error::Log(format!(
                "message {i} ({offset}..{end}) overruns body of {} bytes",
                body.len()
            )));
        }
        out.push(&body[offset..end]);
        expected_offset = end;
    }
    if expected_offset != body.len() {
        return Err(Error::Log(format!(
            "{} trailing bytes after the last message",
            body.len() - expected_offset
        )));
    }
    Ok(out)
}

/// Structural verification of a finished log held in memory.
pub fn verify_log_buffer(bytes: &[u8]) -> Result<LogSummary> {
    let messages = message_slices(bytes)?;
    for (i, msg) in messages.iter().enumerate() {
        decode_frame(msg).map_err(|e| Error::Log(format!("message {i}: {e}")))?;
    }
    Ok(LogSummary {
        message_count: messages.len(),
        byte_len: bytes.len(),
    })
}

/// Verify and decode every frame, in append order.
pub fn decode_log(bytes: &[u8]) -> Result<Vec<Frame>> {
    message_slices(bytes)?
        .into_iter()
        .enumerate()
        .map(|(i, msg)| decode_frame(msg).map_err(|e| Error::Log(format!("message {i}: {e}"))))
        .collect()
}

pub fn read_log(path: impl AsRef<Path>) -> Result<Vec<Frame>> {
    let bytes = std::fs::read(path)?;
    decode_log(&bytes)
}
