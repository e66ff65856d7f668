// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `vista inspect`: decode an asset and tabulate what it contains.

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use vista_scene_codec::{decode_scene, is_supported_asset, SceneSummary};
use vista_scene_port::{Aabb, SceneNode};

/// Display name of an asset path (its file name).
pub(crate) fn asset_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |n| n.to_string_lossy().into_owned(),
    )
}

/// Read, validate and decode `path`.
pub(crate) fn read_asset(path: &Path) -> Result<(String, Vec<u8>)> {
    let name = asset_name(path);
    if !is_supported_asset(&name) {
        bail!("{name}: unsupported file type (expected .gltf or .glb)");
    }
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok((name, bytes))
}

/// Run `vista inspect`.
pub fn run(path: &Path, out: &mut impl Write) -> Result<()> {
    let (name, bytes) = read_asset(path)?;
    let root = decode_scene(&bytes).with_context(|| format!("failed to decode {name}"))?;
    let summary = SceneSummary::of(&root);
    writeln!(out, "{}", summary_table(&name, bytes.len(), &root, &summary))?;
    Ok(())
}

fn summary_table(name: &str, size: usize, root: &SceneNode, summary: &SceneSummary) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Field", "Value"]);
    table.add_row(vec!["asset".to_owned(), name.to_owned()]);
    table.add_row(vec!["bytes".to_owned(), size.to_string()]);
    table.add_row(vec![
        "scene".to_owned(),
        root.name.clone().unwrap_or_else(|| "(unnamed)".to_owned()),
    ]);
    table.add_row(vec!["nodes".to_owned(), summary.nodes.to_string()]);
    table.add_row(vec!["meshes".to_owned(), summary.meshes.to_string()]);
    table.add_row(vec!["primitives".to_owned(), summary.primitives.to_string()]);
    table.add_row(vec!["vertices".to_owned(), summary.vertices.to_string()]);
    table.add_row(vec![
        "bounds".to_owned(),
        summary.bounds.as_ref().map_or_else(|| "n/a".to_owned(), fmt_bounds),
    ]);
    table
}

fn fmt_bounds(b: &Aabb) -> String {
    format!(
        "[{:.3}, {:.3}, {:.3}] .. [{:.3}, {:.3}, {:.3}]",
        b.min[0], b.min[1], b.min[2], b.max[0], b.max[1], b.max[2]
    )
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn asset_name_is_the_file_name() {
        assert_eq!(asset_name(Path::new("/tmp/models/city.glb")), "city.glb");
    }

    #[test]
    fn bounds_are_formatted_with_three_decimals() {
        let b = Aabb {
            min: [0.0, -1.0, 0.5],
            max: [1.0, 2.0, 0.5],
        };
        assert_eq!(
            fmt_bounds(&b),
            "[0.000, -1.000, 0.500] .. [1.000, 2.000, 0.500]"
        );
    }

    #[test]
    fn rejects_unknown_extensions_before_reading() {
        let err = read_asset(Path::new("/does/not/exist.obj")).unwrap_err();
        assert!(err.to_string().contains("unsupported file type"));
    }
}
