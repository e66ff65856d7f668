// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! glTF decoding and headless adapters for vista-scene-port.
//!
//! This crate provides:
//! - `GltfDecoder`: glTF 2.0 JSON / GLB buffers to `SceneNode` trees
//! - `SceneSummary`: node/mesh/vertex counts for status surfaces
//! - Headless adapters for exercising the viewer lifecycle without a GPU
//! - GLB fixtures (feature `test-utils`)
//!
//! # Design
//!
//! Decoding is deliberately separated from the port contract.
//! This keeps vista-scene-port free of format dependencies.

mod gltf_decoder;
mod headless;
mod summary;

#[cfg(any(test, feature = "test-utils"))]
pub mod fixtures;

pub use gltf_decoder::{decode_scene, is_supported_asset, GltfDecoder, SUPPORTED_EXTENSIONS};
pub use headless::{
    HeadlessBackend, HeadlessHost, HeadlessLedger, HeadlessRenderer, HeadlessScene, HostState,
    ScriptedDecoder,
};
pub use summary::SceneSummary;
