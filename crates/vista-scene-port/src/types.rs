// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Core scene and handle types for the port contract.
//!
//! These are pure domain objects; decoding lives in vista-scene-codec.

/// RGBA color with 8-bit components.
pub type ColorRgba8 = [u8; 4];

/// Column-major identity transform.
pub const IDENTITY: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Key of a node attached to a [`crate::SceneGraph`].
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeKey(pub u64);

/// Handle of a drawable render surface created by a [`crate::Renderer`].
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurfaceId(pub u64);

/// Handle of a pending animation-frame request.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameHandle(pub u64);

/// Handle of a registered host listener.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerHandle(pub u64);

/// Kind of host-level listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    /// Window-level key presses.
    KeyDown,
    /// Window resize notifications.
    Resize,
}

/// Current drawable area of the host window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Width in physical pixels.
    pub width: u32,
    /// Height in physical pixels.
    pub height: u32,
    /// Device pixel ratio.
    pub scale_factor: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            scale_factor: 1.0,
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: [f32; 3],
    /// Maximum corner.
    pub max: [f32; 3],
}

impl Aabb {
    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &Self) -> Self {
        let mut out = *self;
        for i in 0..3 {
            out.min[i] = out.min[i].min(other.min[i]);
            out.max[i] = out.max[i].max(other.max[i]);
        }
        out
    }

    /// Box center.
    pub fn center(&self) -> [f32; 3] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }
}

/// Geometry summary of one decoded mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshSummary {
    /// Mesh name, when the asset provides one.
    pub name: Option<String>,
    /// Number of primitives.
    pub primitives: usize,
    /// Total vertex count over all primitives.
    pub vertices: usize,
    /// Local-space bounds, when position accessors declare min/max.
    pub bounds: Option<Aabb>,
}

/// Payload of a scene node.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// Transform-only grouping node.
    Group,
    /// Renderable mesh.
    Mesh(MeshSummary),
    /// Uniform ambient light.
    AmbientLight {
        /// Light color.
        color: ColorRgba8,
        /// Light intensity.
        intensity: f32,
    },
    /// Directional light shining from `position` towards the origin.
    DirectionalLight {
        /// Light color.
        color: ColorRgba8,
        /// Light intensity.
        intensity: f32,
        /// Light position in world space.
        position: [f32; 3],
    },
}

/// Node of an in-memory scene graph.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
    /// Node name, when the asset provides one.
    pub name: Option<String>,
    /// Node payload.
    pub kind: NodeKind,
    /// Column-major local transform.
    pub transform: [[f32; 4]; 4],
    /// Child nodes.
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Empty group node with an identity transform.
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            kind: NodeKind::Group,
            transform: IDENTITY,
            children: Vec::new(),
        }
    }

    /// Leaf node with `kind` and an identity transform.
    pub fn leaf(kind: NodeKind) -> Self {
        Self {
            name: None,
            kind,
            transform: IDENTITY,
            children: Vec::new(),
        }
    }

    /// Depth-first iterator over this node and all descendants.
    pub fn walk(&self) -> impl Iterator<Item = &SceneNode> {
        let mut stack = vec![self];
        core::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        self.walk().count()
    }

    /// Meshes in this subtree.
    pub fn meshes(&self) -> impl Iterator<Item = &MeshSummary> {
        self.walk().filter_map(|n| match &n.kind {
            NodeKind::Mesh(m) => Some(m),
            _ => None,
        })
    }
}
