// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Aggregate counts for a decoded scene tree.

use vista_scene_port::{Aabb, NodeKind, SceneNode};

/// Node, mesh and vertex totals for one decoded scene.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneSummary {
    /// Nodes in the tree, root included.
    pub nodes: usize,
    /// Mesh nodes.
    pub meshes: usize,
    /// Primitives over all meshes.
    pub primitives: usize,
    /// Vertices over all meshes.
    pub vertices: usize,
    /// Union of mesh bounds in local space (transforms are not applied).
    pub bounds: Option<Aabb>,
}

impl SceneSummary {
    /// Summarize `root` and its descendants.
    pub fn of(root: &SceneNode) -> Self {
        root.walk().fold(Self::default(), |mut acc, node| {
            acc.nodes += 1;
            if let NodeKind::Mesh(mesh) = &node.kind {
                acc.meshes += 1;
                acc.primitives += mesh.primitives;
                acc.vertices += mesh.vertices;
                if let Some(b) = mesh.bounds {
                    acc.bounds = Some(acc.bounds.map_or(b, |prev| prev.union(&b)));
                }
            }
            acc
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{decode_scene, fixtures};

    #[test]
    fn summarizes_triangle_fixture() {
        let root = decode_scene(&fixtures::triangle_glb("city")).expect("decode");
        let summary = SceneSummary::of(&root);
        assert_eq!(summary.nodes, 2);
        assert_eq!(summary.meshes, 1);
        assert_eq!(summary.primitives, 1);
        assert_eq!(summary.vertices, 3);
        assert!(summary.bounds.is_some());
    }

    #[test]
    fn empty_group_has_no_bounds() {
        let summary = SceneSummary::of(&SceneNode::group("empty"));
        assert_eq!(summary.nodes, 1);
        assert_eq!(summary.meshes, 0);
        assert!(summary.bounds.is_none());
    }
}
