//! Distribution archive.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use wfgen_artifact_model::artifact::{Artifact, ArtifactKind, ArtifactSet};
use wfgen_common::config::RenderConfig;
use wfgen_common::error::{WfgenError, WfgenResult};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const PACKAGE_STAGE: &str = "ZIP package";

/// Deflate level for archive entries.
const COMPRESSION_LEVEL: i64 = 9;

/// Write `workflow-package.zip` containing every packageable artifact that exists.
///
/// Entries are stored flat under their canonical file names. Fails only if
/// nothing is packageable or the archive cannot be written.
pub async fn package(artifacts: &ArtifactSet, config: &RenderConfig) -> WfgenResult<Artifact> {
    let members: Vec<(&'static str, PathBuf)> = artifacts
        .packageable()
        .into_iter()
        .map(|a| (a.file_name(), a.path().to_path_buf()))
        .collect();
    if members.is_empty() {
        return Err(WfgenError::packaging("no artifacts to package"));
    }

    tracing::info!(entries = members.len(), "Creating ZIP package...");
    let output = config.output_path(ArtifactKind::Archive.file_name());

    let archive_path = output.clone();
    tokio::task::spawn_blocking(move || write_archive(&archive_path, &members))
        .await
        .map_err(|e| WfgenError::packaging(format!("archive task failed: {e}")))??;

    let artifact = Artifact::verify(ArtifactKind::Archive, output, PACKAGE_STAGE)
        .map_err(|e| WfgenError::packaging(e.to_string()))?;
    tracing::info!(
        path = %artifact.path().display(),
        size_kb = %format!("{:.2}", artifact.size_bytes() as f64 / 1024.0),
        "ZIP package created"
    );
    Ok(artifact)
}

fn write_archive(output: &Path, members: &[(&'static str, PathBuf)]) -> WfgenResult<()> {
    let file = File::create(output).map_err(|e| {
        WfgenError::packaging(format!("cannot create {}: {e}", output.display()))
    })?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL));

    for (name, path) in members {
        let mut source = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping vanished artifact");
                continue;
            }
        };
        zip.start_file(*name, options)?;
        std::io::copy(&mut source, &mut zip)?;
        tracing::debug!(entry = *name, "Added to ZIP");
    }

    let mut writer = zip.finish()?;
    writer.flush()?;
    Ok(())
}
