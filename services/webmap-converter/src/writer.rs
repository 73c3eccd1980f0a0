//! Static output: one `{id}.json` per layer plus `index.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;
use webmap_common::LayerConfig;

pub const INDEX_FILE: &str = "index.json";

/// Write every layer and the full sorted array to `output_dir`.
///
/// Returns the paths written, index last.
pub async fn write_layer_files(output_dir: &Path, layers: &[LayerConfig]) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let mut written = Vec::with_capacity(layers.len() + 1);
    for layer in layers {
        let path = output_dir.join(format!("{}.json", layer.id));
        write_json(&path, layer).await?;
        debug!(layer = %layer.id, path = %path.display(), "Wrote layer config");
        written.push(path);
    }

    let index = output_dir.join(INDEX_FILE);
    write_json(&index, layers).await?;
    written.push(index);

    Ok(written)
}

async fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    bytes.push(b'\n');
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer_service::{transform_embedded, ConverterConfig};
    use serde_json::Value;
    use test_utils::{colors, layers, renderers, symbols, webmaps};

    #[tokio::test]
    async fn test_writes_layer_files_and_index() {
        let doc = webmaps::webmap(vec![
            layers::land_use(),
            layers::with_renderer(
                "Transit_Bus Routes",
                "https://svc/bus",
                renderers::simple(symbols::line(colors::RED, 2.0)),
            ),
        ]);
        let configs = transform_embedded(&doc, &ConverterConfig::default()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("layers");
        let written = write_layer_files(&out, &configs).await.unwrap();

        assert_eq!(written.len(), 3);
        assert!(out.join("land-use.json").exists());
        assert!(out.join("bus-routes.json").exists());

        let index: Value =
            serde_json::from_str(&std::fs::read_to_string(out.join(INDEX_FILE)).unwrap()).unwrap();
        let ids: Vec<&str> = index
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["bus-routes", "land-use"]);

        let single: LayerConfig =
            serde_json::from_str(&std::fs::read_to_string(out.join("land-use.json")).unwrap())
                .unwrap();
        assert_eq!(single, configs[1]);
    }

    #[tokio::test]
    async fn test_empty_webmap_writes_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_layer_files(dir.path(), &[]).await.unwrap();
        assert_eq!(written, vec![dir.path().join(INDEX_FILE)]);
        assert_eq!(
            std::fs::read_to_string(dir.path().join(INDEX_FILE)).unwrap().trim(),
            "[]"
        );
    }
}
