//! Show artifact metadata and contents

use anyhow::Result;
use embedport_artifact::ArtifactLayout;
use std::path::Path;

use super::common::resolve_artifact_dir;

pub fn inspect(artifact_dir: &Path) -> Result<()> {
    let artifact_dir = resolve_artifact_dir(artifact_dir)?;
    let layout = ArtifactLayout::new(&artifact_dir);
    layout.ensure_exists()?;

    println!("Artifact");
    println!("========");
    println!("Directory: {:?}", artifact_dir);
    println!();

    match layout.read_metadata()? {
        Some(metadata) => {
            println!("Metadata:");
            println!("  Model: {}", metadata.model_name);
            println!("  Version: {}", metadata.version);
            println!("  Dimensions: {}", metadata.dimensions);
            println!("  Max tokens: {}", metadata.max_tokens);
            println!("  Format: {}", metadata.format);
            println!("  Description: {}", metadata.description);
            println!("  vec2text compatible: {}", metadata.vec2text_compatible);
        }
        None => println!("Metadata: (missing metadata.json)"),
    }

    println!();
    println!("Files:");
    for name in layout.files()? {
        let size = std::fs::metadata(artifact_dir.join(&name))?.len();
        println!("  {} ({:.1} MB)", name, size as f64 / (1024.0 * 1024.0));
    }

    let missing: Vec<_> = [layout.graph_path(), layout.tokenizer_path()]
        .into_iter()
        .filter(|p| !p.exists())
        .collect();
    if !missing.is_empty() {
        println!();
        for path in missing {
            println!("Warning: {:?} is missing", path);
        }
    }

    Ok(())
}
