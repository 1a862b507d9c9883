// File: trackbridge-core/src/test_utils/mod.rs
//! Scripted collaborators for exercising the controller without hardware or a scene.

pub mod helpers;

pub use helpers::*;
