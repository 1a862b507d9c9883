// File: trackbridge-core/src/targets.rs
//! Geometry id to scene-target mapping consulted by every update step.

use std::collections::BTreeMap;
use trackbridge_common::models::{MotionConfig, MotionConfigParams};
use trackbridge_common::traits::HandleResolver;
use trackbridge_common::Result;

/// At most one [`MotionConfig`] per geometry id; later inserts replace earlier ones.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TargetMap {
    configs: BTreeMap<u32, MotionConfig>,
}

impl TargetMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the geometry id and resolve the three object names.
    ///
    /// Nothing is inserted; resolution can be done before taking the shared lock.
    pub fn resolve(
        params: &MotionConfigParams,
        resolver: &dyn HandleResolver,
    ) -> Result<(u32, MotionConfig)> {
        let geometry_id = params.geometry_id.parse()?;
        let config = MotionConfig {
            object_to_move: resolver.resolve_handle(&params.object_to_move)?,
            frame_in_which_to_move_object: resolver
                .resolve_handle(&params.frame_in_which_to_move_object)?,
            object_being_measured: resolver.resolve_handle(&params.object_being_measured)?,
        };
        Ok((geometry_id, config))
    }

    /// Returns the configuration that was replaced, if any.
    pub fn insert(&mut self, geometry_id: u32, config: MotionConfig) -> Option<MotionConfig> {
        self.configs.insert(geometry_id, config)
    }

    pub fn remove(&mut self, geometry_id: u32) -> Option<MotionConfig> {
        self.configs.remove(&geometry_id)
    }

    pub fn clear(&mut self) {
        self.configs.clear();
    }

    pub fn get(&self, geometry_id: u32) -> Option<&MotionConfig> {
        self.configs.get(&geometry_id)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &MotionConfig)> {
        self.configs.iter().map(|(id, c)| (*id, c))
    }
}
