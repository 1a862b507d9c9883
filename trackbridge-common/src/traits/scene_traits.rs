// File: trackbridge-common/src/traits/scene_traits.rs

use glam::Affine3A;
use crate::error::Result;
use crate::models::ObjectHandle;

/// Looks up scene objects by name.
pub trait HandleResolver: Send + Sync {
    /// Fails with [`Error::HandleResolution`](crate::Error::HandleResolution)
    /// when no object has that name.
    fn resolve_handle(&self, name: &str) -> Result<ObjectHandle>;
}

/// Receives the poses produced by each update step.
pub trait TargetSink: Send {
    /// Set the pose of `target` expressed in `reference`.
    fn set_transform(
        &mut self,
        target: ObjectHandle,
        reference: ObjectHandle,
        transform: &Affine3A,
    ) -> Result<()>;
}
