// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! glTF 2.0 decoder (JSON `.gltf` and binary `.glb` containers).
//!
//! Only the document is read: node hierarchy, transforms and per-mesh
//! geometry summaries. Buffer payloads stay with the rendering backend.

use std::collections::BTreeSet;

use bytes::Bytes;
use futures_util::FutureExt;
use gltf::{Gltf, Semantic};
use tracing::debug;
use vista_scene_port::{
    Aabb, DecodeError, DecodeFuture, MeshSummary, NodeKind, SceneDecoder, SceneNode,
};

/// File extensions the decoder accepts (lowercase, no dot).
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["gltf", "glb"];

/// Node hierarchies deeper than this are rejected.
const MAX_DEPTH: usize = 256;

/// True when `name` carries a glTF/GLB extension (case-insensitive).
pub fn is_supported_asset(name: &str) -> bool {
    name.rsplit_once('.').is_some_and(|(_, ext)| {
        SUPPORTED_EXTENSIONS
            .iter()
            .any(|s| s.eq_ignore_ascii_case(ext))
    })
}

/// Decode a glTF/GLB buffer into a scene tree rooted at a group node.
///
/// Uses the document's default scene, falling back to the first scene.
pub fn decode_scene(buffer: &[u8]) -> Result<SceneNode, DecodeError> {
    if buffer.is_empty() {
        return Err(DecodeError::Malformed("empty buffer".into()));
    }
    let gltf = Gltf::from_slice(buffer).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    let doc = &gltf.document;
    let scene = doc
        .default_scene()
        .or_else(|| doc.scenes().next())
        .ok_or_else(|| DecodeError::Unsupported("asset contains no scenes".into()))?;

    let mut root = SceneNode::group(scene.name().unwrap_or("scene"));
    let mut seen = BTreeSet::new();
    for node in scene.nodes() {
        root.children.push(convert_node(&node, 0, &mut seen)?);
    }
    debug!(
        nodes = root.node_count(),
        meshes = doc.meshes().len(),
        "decoded glTF scene"
    );
    Ok(root)
}

/// Nodes must form strict trees: a node reached twice (shared child or
/// cycle) makes the document malformed.
fn convert_node(
    node: &gltf::Node<'_>,
    depth: usize,
    seen: &mut BTreeSet<usize>,
) -> Result<SceneNode, DecodeError> {
    if !seen.insert(node.index()) {
        return Err(DecodeError::Malformed(format!(
            "node {} has more than one parent",
            node.index()
        )));
    }
    if depth >= MAX_DEPTH {
        return Err(DecodeError::Unsupported(format!(
            "node hierarchy deeper than {MAX_DEPTH}"
        )));
    }
    let kind = node
        .mesh()
        .map_or(NodeKind::Group, |mesh| NodeKind::Mesh(summarize_mesh(&mesh)));
    let children = node
        .children()
        .map(|child| convert_node(&child, depth + 1, seen))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SceneNode {
        name: node.name().map(str::to_owned),
        kind,
        transform: node.transform().matrix(),
        children,
    })
}

fn summarize_mesh(mesh: &gltf::Mesh<'_>) -> MeshSummary {
    let mut primitives = 0;
    let mut vertices = 0;
    let mut bounds: Option<Aabb> = None;
    for prim in mesh.primitives() {
        primitives += 1;
        let Some(positions) = prim.get(&Semantic::Positions) else {
            continue;
        };
        vertices += positions.count();
        if let Some(b) = accessor_bounds(&positions) {
            bounds = Some(bounds.map_or(b, |acc| acc.union(&b)));
        }
    }
    MeshSummary {
        name: mesh.name().map(str::to_owned),
        primitives,
        vertices,
        bounds,
    }
}

fn accessor_bounds(accessor: &gltf::Accessor<'_>) -> Option<Aabb> {
    Some(Aabb {
        min: vec3(&accessor.min()?)?,
        max: vec3(&accessor.max()?)?,
    })
}

fn vec3(value: &gltf::json::Value) -> Option<[f32; 3]> {
    match value.as_array()?.as_slice() {
        [x, y, z] => Some([x.as_f64()? as f32, y.as_f64()? as f32, z.as_f64()? as f32]),
        _ => None,
    }
}

/// [`SceneDecoder`] backed by the `gltf` crate.
///
/// Parsing runs on tokio's blocking pool so large assets never stall the
/// cooperative loop; must be polled inside a tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct GltfDecoder;

impl GltfDecoder {
    /// Create a decoder.
    pub fn new() -> Self {
        Self
    }
}

impl SceneDecoder for GltfDecoder {
    fn parse(&self, buffer: Bytes) -> DecodeFuture {
        async move {
            tokio::task::spawn_blocking(move || decode_scene(&buffer))
                .await
                .map_err(|e| DecodeError::Task(e.to_string()))?
        }
        .boxed_local()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(is_supported_asset("city.glb"));
        assert!(is_supported_asset("Park.GLTF"));
        assert!(!is_supported_asset("notes.txt"));
        assert!(!is_supported_asset("glb"));
    }

    #[test]
    fn decodes_binary_triangle() {
        let root = decode_scene(&fixtures::triangle_glb("city")).expect("decode");
        assert_eq!(root.name.as_deref(), Some("city"));
        assert_eq!(root.children.len(), 1);

        let node = &root.children[0];
        assert_eq!(node.name.as_deref(), Some("block"));
        // translation [0, 1, 0] lands in the last column
        assert_eq!(node.transform[3], [0.0, 1.0, 0.0, 1.0]);

        let mesh = root.meshes().next().expect("mesh");
        assert_eq!(mesh.primitives, 1);
        assert_eq!(mesh.vertices, 3);
        let bounds = mesh.bounds.expect("bounds");
        assert_eq!(bounds.min, [0.0, 0.0, 0.0]);
        assert_eq!(bounds.max, [1.0, 1.0, 0.0]);
    }

    #[test]
    fn decodes_json_container() {
        let json = fixtures::triangle_gltf_json("park");
        let root = decode_scene(json.as_bytes()).expect("decode");
        assert_eq!(root.name.as_deref(), Some("park"));
        assert_eq!(root.meshes().count(), 1);
    }

    #[test]
    fn garbage_is_malformed() {
        let err = decode_scene(b"definitely not a scene").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    fn nodes_json(nodes: &str) -> String {
        format!(
            r#"{{"asset":{{"version":"2.0"}},"scene":0,"scenes":[{{"nodes":[0]}}],"nodes":{nodes}}}"#
        )
    }

    #[test]
    fn shared_child_is_malformed() {
        // node 1 listed twice under node 0; a chain of these doubles per level
        let json = nodes_json(r#"[{"children":[1,1]},{"children":[2,2]},{}]"#);
        let err = decode_scene(json.as_bytes()).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)), "{err:?}");
    }

    #[test]
    fn cycle_is_malformed() {
        let json = nodes_json(r#"[{"children":[1]},{"children":[0]}]"#);
        let err = decode_scene(json.as_bytes()).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)), "{err:?}");
    }

    #[test]
    fn sibling_subtrees_decode() {
        let json = nodes_json(r#"[{"name":"hub","children":[1,2]},{"children":[3]},{},{}]"#);
        let root = decode_scene(json.as_bytes()).expect("decode");
        assert_eq!(root.node_count(), 5);
        assert_eq!(root.children[0].children.len(), 2);
    }

    #[test]
    fn empty_buffer_is_malformed() {
        assert!(matches!(decode_scene(&[]), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn sceneless_document_is_unsupported() {
        let err = decode_scene(&fixtures::sceneless_glb()).unwrap_err();
        assert!(matches!(err, DecodeError::Unsupported(_)));
    }

    #[tokio::test]
    async fn async_decoder_runs_on_blocking_pool() {
        let decoder = GltfDecoder::new();
        let root = decoder
            .parse(Bytes::from(fixtures::triangle_glb("city")))
            .await
            .expect("decode");
        assert_eq!(root.node_count(), 2);
    }
}
