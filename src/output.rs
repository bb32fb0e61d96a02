use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::{error, info, warn};

use crate::parser::HymnMapping;

pub const OUTPUT_PATH: &str = "hymns.json";

/// What happened to the mapping at the end of a run.
#[derive(Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Written { path: PathBuf, entries: usize },
    SkippedEmpty,
    Failed,
}

/// Overwrite `path` with the mapping as a JSON object, 4-space indented.
pub fn write_mapping(path: &Path, mapping: &HymnMapping) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    let mut ser = serde_json::Serializer::with_formatter(
        &mut writer,
        PrettyFormatter::with_indent(b"    "),
    );
    mapping
        .serialize(&mut ser)
        .with_context(|| format!("Failed to serialize hymns to {}", path.display()))?;

    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(())
}

/// Persist the mapping, logging instead of failing.
pub fn save_mapping(path: &Path, mapping: &HymnMapping) -> SaveOutcome {
    if mapping.is_empty() {
        warn!("Hymn mapping is empty! Skipping JSON file save.");
        return SaveOutcome::SkippedEmpty;
    }

    info!("Saving {} hymns to {}...", mapping.len(), path.display());
    match write_mapping(path, mapping) {
        Ok(()) => {
            info!("Hymn data successfully saved to {}", path.display());
            SaveOutcome::Written {
                path: path.to_path_buf(),
                entries: mapping.len(),
            }
        }
        Err(e) => {
            error!("Error while writing JSON: {:?}", e);
            SaveOutcome::Failed
        }
    }
}

// ── Tests ──
