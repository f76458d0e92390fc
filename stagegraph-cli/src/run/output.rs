//! Writes the final state's artifacts to disk as pretty-printed JSON.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

/// Writes each artifact to `dir/<name>`, creating `dir` if needed. Returns the written paths
/// in artifact-name order.
pub fn write_artifacts(
    dir: &Path,
    artifacts: &BTreeMap<String, Value>,
) -> std::io::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(artifacts.len());
    for (name, content) in artifacts {
        let path = dir.join(name);
        let body = serde_json::to_string_pretty(content)?;
        std::fs::write(&path, body + "\n")?;
        tracing::info!(path = %path.display(), "Saved artifact");
        written.push(path);
    }
    Ok(written)
}
