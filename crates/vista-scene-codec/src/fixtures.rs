// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Minimal glTF/GLB assets for tests.

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

/// Three vertices: (0,0,0), (1,0,0), (0,1,0).
fn triangle_positions() -> Vec<u8> {
    [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
        .iter()
        .flat_map(|f| f.to_le_bytes())
        .collect()
}

fn triangle_document(scene_name: &str, buffer_uri: Option<&str>) -> String {
    let uri = buffer_uri.map_or(String::new(), |u| format!(r#","uri":"{u}""#));
    format!(
        r#"{{"asset":{{"version":"2.0"}},"scene":0,"scenes":[{{"name":"{scene_name}","nodes":[0]}}],"nodes":[{{"name":"block","mesh":0,"translation":[0.0,1.0,0.0]}}],"meshes":[{{"name":"tri","primitives":[{{"attributes":{{"POSITION":0}}}}]}}],"buffers":[{{"byteLength":36{uri}}}],"bufferViews":[{{"buffer":0,"byteOffset":0,"byteLength":36}}],"accessors":[{{"bufferView":0,"componentType":5126,"count":3,"type":"VEC3","min":[0.0,0.0,0.0],"max":[1.0,1.0,0.0]}}]}}"#
    )
}

/// Wrap a JSON document and optional binary payload in a GLB container.
pub fn glb_from_parts(json: &str, bin: &[u8]) -> Vec<u8> {
    let mut json_chunk = json.as_bytes().to_vec();
    while json_chunk.len() % 4 != 0 {
        json_chunk.push(b' ');
    }
    let mut bin_chunk = bin.to_vec();
    while bin_chunk.len() % 4 != 0 {
        bin_chunk.push(0);
    }

    let mut total = 12 + 8 + json_chunk.len();
    if !bin_chunk.is_empty() {
        total += 8 + bin_chunk.len();
    }

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(GLB_MAGIC);
    out.extend_from_slice(&GLB_VERSION.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json_chunk.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&json_chunk);
    if !bin_chunk.is_empty() {
        out.extend_from_slice(&(bin_chunk.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        out.extend_from_slice(&bin_chunk);
    }
    out
}

/// GLB with one scene named `scene_name` holding a single triangle mesh.
pub fn triangle_glb(scene_name: &str) -> Vec<u8> {
    glb_from_parts(&triangle_document(scene_name, None), &triangle_positions())
}

/// The triangle scene as a `.gltf` JSON document (external buffer uri).
pub fn triangle_gltf_json(scene_name: &str) -> String {
    triangle_document(scene_name, Some("triangle.bin"))
}

/// Valid GLB whose document declares no scenes.
pub fn sceneless_glb() -> Vec<u8> {
    glb_from_parts(r#"{"asset":{"version":"2.0"}}"#, &[])
}
