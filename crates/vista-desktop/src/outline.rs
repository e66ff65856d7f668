// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Camera matrices and mesh bounding-box line lists.

use glam::{Mat4, Vec3};
use vista_scene_port::{Aabb, CameraState, ColorRgba8, NodeKind, SceneGraph, SceneNode};

/// One end of a line segment.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub pos: [f32; 3],
    pub color: [f32; 3],
}

const BOX_COLOR: [f32; 3] = [0.55, 0.85, 1.0];

/// Corner index pairs differing in exactly one axis bit.
const BOX_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (2, 3),
    (4, 5),
    (6, 7),
    (0, 2),
    (1, 3),
    (4, 6),
    (5, 7),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// Right-handed projection * view for `camera`.
pub fn view_proj(camera: &CameraState) -> Mat4 {
    let aspect = if camera.aspect.is_finite() && camera.aspect > 0.0 {
        camera.aspect
    } else {
        1.0
    };
    let proj = Mat4::perspective_rh(camera.fov_y_radians, aspect, camera.near, camera.far);
    let view = Mat4::look_at_rh(
        Vec3::from(camera.position),
        Vec3::from(camera.target),
        Vec3::from(camera.up),
    );
    proj * view
}

/// Line list outlining every mesh with declared bounds, in world space.
pub fn bounding_box_lines(scene: &dyn SceneGraph) -> Vec<LineVertex> {
    let mut out = Vec::new();
    scene.visit(&mut |_, node| collect(node, Mat4::IDENTITY, &mut out));
    out
}

fn collect(node: &SceneNode, parent: Mat4, out: &mut Vec<LineVertex>) {
    let world = parent * Mat4::from_cols_array_2d(&node.transform);
    if let NodeKind::Mesh(mesh) = &node.kind {
        if let Some(bounds) = &mesh.bounds {
            push_box(bounds, world, out);
        }
    }
    for child in &node.children {
        collect(child, world, out);
    }
}

fn push_box(b: &Aabb, world: Mat4, out: &mut Vec<LineVertex>) {
    let corner = |i: usize| {
        let pick = |axis: usize| {
            if i & (1 << axis) == 0 {
                b.min[axis]
            } else {
                b.max[axis]
            }
        };
        world.transform_point3(Vec3::new(pick(0), pick(1), pick(2)))
    };
    for (a, z) in BOX_EDGES {
        for p in [corner(a), corner(z)] {
            out.push(LineVertex {
                pos: p.to_array(),
                color: BOX_COLOR,
            });
        }
    }
}

/// sRGB background to the linear clear color wgpu expects.
pub fn clear_color(c: ColorRgba8) -> [f64; 4] {
    let lin = |v: u8| {
        let s = f64::from(v) / 255.0;
        if s <= 0.04045 {
            s / 12.92
        } else {
            ((s + 0.055) / 1.055).powf(2.4)
        }
    };
    [lin(c[0]), lin(c[1]), lin(c[2]), f64::from(c[3]) / 255.0]
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::BTreeMap;
    use vista_scene_port::{MeshSummary, NodeKey, PortError};

    struct Flat(BTreeMap<NodeKey, SceneNode>);

    impl SceneGraph for Flat {
        fn background(&self) -> ColorRgba8 {
            [0, 0, 0, 255]
        }
        fn add(&mut self, node: SceneNode) -> NodeKey {
            let key = NodeKey(self.0.len() as u64);
            self.0.insert(key, node);
            key
        }
        fn remove(&mut self, key: NodeKey) -> Result<SceneNode, PortError> {
            self.0
                .remove(&key)
                .ok_or_else(|| PortError::UnknownHandle(format!("node {}", key.0)))
        }
        fn len(&self) -> usize {
            self.0.len()
        }
        fn visit(&self, visitor: &mut dyn FnMut(NodeKey, &SceneNode)) {
            for (k, n) in &self.0 {
                visitor(*k, n);
            }
        }
    }

    fn unit_mesh() -> SceneNode {
        SceneNode::leaf(NodeKind::Mesh(MeshSummary {
            name: None,
            primitives: 1,
            vertices: 8,
            bounds: Some(Aabb {
                min: [0.0; 3],
                max: [1.0; 3],
            }),
        }))
    }

    #[test]
    fn a_box_is_twelve_segments() {
        let mut scene = Flat(BTreeMap::new());
        scene.add(unit_mesh());
        scene.add(SceneNode::group("no geometry"));
        let lines = bounding_box_lines(&scene);
        assert_eq!(lines.len(), 24);
        for pair in lines.chunks(2) {
            let d = Vec3::from(pair[1].pos) - Vec3::from(pair[0].pos);
            assert_relative_eq!(d.length(), 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn parent_transforms_apply_to_children() {
        let mut parent = SceneNode::group("offset");
        parent.transform = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)).to_cols_array_2d();
        parent.children.push(unit_mesh());
        let mut scene = Flat(BTreeMap::new());
        scene.add(parent);
        let lines = bounding_box_lines(&scene);
        assert!(lines.iter().all(|v| v.pos[0] >= 10.0 && v.pos[0] <= 11.0));
    }

    #[test]
    fn target_projects_to_screen_center() {
        let camera = CameraState {
            target: [0.0, 1.0, 0.0],
            ..CameraState::default()
        };
        let clip = view_proj(&camera) * Vec3::from(camera.target).extend(1.0);
        assert_relative_eq!(clip.x / clip.w, 0.0, epsilon = 1e-5);
        assert_relative_eq!(clip.y / clip.w, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn clear_color_is_linearized() {
        let [r, g, b, a] = clear_color([255, 0, 188, 255]);
        assert_relative_eq!(r, 1.0);
        assert_relative_eq!(g, 0.0);
        assert_relative_eq!(b, 0.5029, epsilon = 1e-3);
        assert_relative_eq!(a, 1.0);
    }
}
