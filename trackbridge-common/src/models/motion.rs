// File: trackbridge-common/src/models/motion.rs

use std::fmt;
use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};

/// Integer handle of a scene object, as returned by a [`HandleResolver`].
///
/// [`HandleResolver`]: crate::traits::HandleResolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectHandle(pub i32);

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A geometry identifier as supplied by a caller: either already numeric
/// or a string that still has to be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeometryKey {
    Id(u32),
    Name(String),
}

impl GeometryKey {
    pub fn parse(&self) -> Result<u32> {
        match self {
            GeometryKey::Id(id) => Ok(*id),
            GeometryKey::Name(s) => s.trim().parse::<u32>().map_err(|e| {
                Error::Parse(format!("invalid geometry id '{s}': {e}"))
            }),
        }
    }
}

impl From<u32> for GeometryKey {
    fn from(id: u32) -> Self {
        GeometryKey::Id(id)
    }
}

impl From<&str> for GeometryKey {
    fn from(s: &str) -> Self {
        GeometryKey::Name(s.to_string())
    }
}

impl From<String> for GeometryKey {
    fn from(s: String) -> Self {
        GeometryKey::Name(s)
    }
}

impl fmt::Display for GeometryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryKey::Id(id) => write!(f, "{id}"),
            GeometryKey::Name(s) => f.write_str(s),
        }
    }
}

/// Names of the scene objects a tracked geometry drives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionConfigParams {
    /// The object whose pose is written.
    pub object_to_move: String,
    /// The frame the pose is expressed in.
    pub frame_in_which_to_move_object: String,
    /// The object the tracker is actually measuring.
    pub object_being_measured: String,
    pub geometry_id: GeometryKey,
}

impl MotionConfigParams {
    pub fn new(
        object_to_move: impl Into<String>,
        frame_in_which_to_move_object: impl Into<String>,
        object_being_measured: impl Into<String>,
        geometry_id: impl Into<GeometryKey>,
    ) -> Self {
        Self {
            object_to_move: object_to_move.into(),
            frame_in_which_to_move_object: frame_in_which_to_move_object.into(),
            object_being_measured: object_being_measured.into(),
            geometry_id: geometry_id.into(),
        }
    }
}

/// Resolved form of [`MotionConfigParams`], keyed by geometry id in the target map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionConfig {
    pub object_to_move: ObjectHandle,
    pub frame_in_which_to_move_object: ObjectHandle,
    pub object_being_measured: ObjectHandle,
}
