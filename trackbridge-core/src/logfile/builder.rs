// File: trackbridge-core/src/logfile/builder.rs

use std::io::{self, Write};
use byteorder::{LittleEndian, WriteBytesExt};
use trackbridge_common::models::Frame;
use trackbridge_common::{Error, Result};
use super::message::encode_frame;
use super::{HEADER_SIZE, LOG_FORMAT_VERSION, LOG_IDENTIFIER, TABLE_ENTRY_SIZE};

/// Location of one encoded message inside a [`RecordingBuffer`] body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordRef {
    pub offset: u32,
    pub len: u32,
}

/// An in-progress log: the encoded message bytes plus the ordered list of
/// messages written so far. Appending never does I/O.
#[derive(Debug, Default)]
pub struct RecordingBuffer {
    body: Vec<u8>,
    records: Vec<RecordRef>,
}

impl RecordingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode `frame` and append it as the next message.
    ///
    /// On failure the buffer is left exactly as it was.
    pub fn append(&mut self, frame: &Frame) -> Result<()> {
        let start = self.body.len();
        if let Err(e) = encode_frame(&mut self.body, frame) {
            self.body.truncate(start);
            return Err(e.into());
        }
        let end = self.body.len();
        match (u32::try_from(start), u32::try_from(end - start)) {
            (Ok(offset), Ok(len)) if u32::try_from(end).is_ok() => {
                self.records.push(RecordRef { offset, len });
                Ok(())
            }
            _ => {
                self.body.truncate(start);
                Err(Error::Log(
                    "recording buffer exceeds the 4 GiB container limit".into(),
                ))
            }
        }
    }

    /// Number of messages recorded.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    pub fn records(&self) -> &[RecordRef] {
        &self.records
    }

    /// Wrap the recorded messages into one finished container.
    pub fn finish(self) -> Result<Vec<u8>> {
        let table_len = self.records.len() * TABLE_ENTRY_SIZE;
        let mut out = Vec::with_capacity(HEADER_SIZE + table_len + self.body.len());
        self.write_container(&mut out)?;
        Ok(out)
    }

    fn write_container<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let count = u32::try_from(self.records.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "too many messages"))?;
        w.write_all(&LOG_IDENTIFIER)?;
        w.write_u16::<LittleEndian>(LOG_FORMAT_VERSION)?;
        w.write_u16::<LittleEndian>(0)?;
        w.write_u32::<LittleEndian>(count)?;
        for r in &self.records {
            w.write_u32::<LittleEndian>(r.offset)?;
            w.write_u32::<LittleEndian>(r.len)?;
        }
        w.write_all(&self.body)
    }
}
