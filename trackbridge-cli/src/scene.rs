// File: trackbridge-cli/src/scene.rs
//! In-process stand-in for a simulator scene: named objects and their last pose.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use glam::Affine3A;
use tracing::debug;
use trackbridge_common::models::{ControllerParams, ObjectHandle};
use trackbridge_common::traits::{HandleResolver, TargetSink};
use trackbridge_common::{Error, Result};

#[derive(Debug, Clone, Copy)]
pub struct Placement {
    pub reference: ObjectHandle,
    pub transform: Affine3A,
    pub updates: u64,
}

#[derive(Debug, Default)]
pub struct Scene {
    handles: HashMap<String, ObjectHandle>,
    placements: Mutex<HashMap<ObjectHandle, Placement>>,
}

impl Scene {
    /// A scene holding every object the parameters refer to.
    pub fn for_params(params: &ControllerParams) -> Self {
        let mut scene = Scene::default();
        scene.add_object(&params.optical_tracker_base);
        for c in &params.motion_configs {
            scene.add_object(&c.object_to_move);
            scene.add_object(&c.frame_in_which_to_move_object);
            scene.add_object(&c.object_being_measured);
        }
        scene
    }

    pub fn add_object(&mut self, name: &str) -> ObjectHandle {
        let next = ObjectHandle(self.handles.len() as i32 + 1);
        *self.handles.entry(name.to_string()).or_insert(next)
    }

    pub fn name_of(&self, handle: ObjectHandle) -> Option<&str> {
        self.handles
            .iter()
            .find(|(_, h)| **h == handle)
            .map(|(n, _)| n.as_str())
    }

    /// Every object that has been moved, with its last placement.
    pub fn placements(&self) -> Vec<(ObjectHandle, Placement)> {
        let mut all: Vec<_> = self
            .placements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(h, p)| (*h, *p))
            .collect();
        all.sort_by_key(|(h, _)| *h);
        all
    }
}

impl HandleResolver for Scene {
    fn resolve_handle(&self, name: &str) -> Result<ObjectHandle> {
        self.handles
            .get(name)
            .copied()
            .ok_or_else(|| Error::HandleResolution(format!("scene has no object named '{name}'")))
    }
}

/// Writes poses into a shared [`Scene`].
pub struct SceneSink(pub Arc<Scene>);

impl TargetSink for SceneSink {
    fn set_transform(
        &mut self,
        target: ObjectHandle,
        reference: ObjectHandle,
        transform: &Affine3A,
    ) -> Result<()> {
        let mut placements = self.0.placements.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = placements.entry(target).or_insert(Placement {
            reference,
            transform: *transform,
            updates: 0,
        });
        entry.reference = reference;
        entry.transform = *transform;
        entry.updates += 1;
        debug!("{} <- {:?} in {}", target, transform.translation, reference);
        Ok(())
    }
}
