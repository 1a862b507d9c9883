// File: trackbridge-core/src/logfile/message.rs

use std::io::{Cursor, Write};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use trackbridge_common::models::{Frame, Marker};
use trackbridge_common::{Error, Result};

/// serial, counter, device timestamp, receive time, marker count
pub(crate) const FRAME_HEADER_SIZE: usize = 8 + 4 + 8 + 8 + 4;
/// index, geometry, presence, error, translation, rotation
pub(crate) const MARKER_SIZE: usize = 4 * 4 + 3 * 4 + 9 * 4;

/// Append one frame message to `w`.
pub fn encode_frame<W: Write>(w: &mut W, frame: &Frame) -> std::io::Result<()> {
    w.write_u64::<LittleEndian>(frame.device_serial)?;
    w.write_u32::<LittleEndian>(frame.frame_counter)?;
    w.write_u64::<LittleEndian>(frame.device_timestamp_us)?;
    w.write_i64::<LittleEndian>(frame.received_at_us)?;
    w.write_u32::<LittleEndian>(frame.markers.len() as u32)?;
    for m in &frame.markers {
        w.write_u32::<LittleEndian>(m.index)?;
        w.write_u32::<LittleEndian>(m.geometry_id)?;
        w.write_u32::<LittleEndian>(m.presence_mask)?;
        w.write_f32::<LittleEndian>(m.registration_error_mm)?;
        for v in m.translation_mm {
            w.write_f32::<LittleEndian>(v)?;
        }
        for row in m.rotation {
            for v in row {
                w.write_f32::<LittleEndian>(v)?;
            }
        }
    }
    Ok(())
}

/// Decode exactly one frame message. Trailing bytes are an error.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame> {
    if bytes.len() < FRAME_HEADER_SIZE {
        return Err(Error::Log(format!(
            "frame message too short: {} bytes",
            bytes.len()
        )));
    }
    let mut r = Cursor::new(bytes);
    let device_serial = r.read_u64::<LittleEndian>()?;
    let frame_counter = r.read_u32::<LittleEndian>()?;
    let device_timestamp_us = r.read_u64::<LittleEndian>()?;
    let received_at_us = r.read_i64::<LittleEndian>()?;
    let count = r.read_u32::<LittleEndian>()? as usize;

    let expected = count
        .checked_mul(MARKER_SIZE)
        .and_then(|n| n.checked_add(FRAME_HEADER_SIZE));
    if expected != Some(bytes.len()) {
        return Err(Error::Log(format!(
            "frame message declares {count} markers but holds {} bytes",
            bytes.len()
        )));
    }

    let mut markers = Vec::with_capacity(count);
    for _ in 0..count {
        let index = r.read_u32::<LittleEndian>()?;
        let geometry_id = r.read_u32::<LittleEndian>()?;
        let presence_mask = r.read_u32::<LittleEndian>()?;
        let registration_error_mm = r.read_f32::<LittleEndian>()?;
        let mut translation_mm = [0.0f32; 3];
        for v in &mut translation_mm {
            *v = r.read_f32::<LittleEndian>()?;
        }
        let mut rotation = [[0.0f32; 3]; 3];
        for row in &mut rotation {
            for v in row.iter_mut() {
                *v = r.read_f32::<LittleEndian>()?;
            }
        }
        markers.push(Marker {
            index,
            geometry_id,
            presence_mask,
            registration_error_mm,
            translation_mm,
            rotation,
        });
    }

    Ok(Frame {
        device_serial,
        frame_counter,
        device_timestamp_us,
        received_at_us,
        markers,
    })
}
