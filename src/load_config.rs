//! Loads the sources definition file into typed [`SourceSpec`] records.
//!
//! This is the only place where the untrusted JSON configuration is parsed
//! and validated. All errors use `anyhow` for context-rich diagnostics and
//! are surfaced at the CLI boundary before any fetch starts.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::Result;
use tracing::{error, info};

use crate::config::SourceSpec;

/// Loads and validates the sources definition file (a JSON array of source
/// records). Duplicate source names or duplicate tags within one source are
/// configuration errors: `name` partitions the output tree and each tag owns
/// its own snapshot folder.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Vec<SourceSpec>> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading sources definition file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read sources definition file");
            return Err(anyhow::anyhow!(
                "Failed to read sources definition file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let sources: Vec<SourceSpec> = match serde_json::from_str(&config_content) {
        Ok(sources) => sources,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse sources definition JSON");
            return Err(anyhow::anyhow!(
                "Failed to parse sources definition JSON: {e}"
            ));
        }
    };

    let mut seen_names = HashSet::new();
    for source in &sources {
        if !seen_names.insert(source.name.as_str()) {
            anyhow::bail!("Duplicate source name in configuration: {}", source.name);
        }
        let mut seen_tags = HashSet::new();
        for tag in &source.tags {
            if !seen_tags.insert(tag.as_str()) {
                anyhow::bail!(
                    "Duplicate tag '{}' configured for source {}",
                    tag,
                    source.name
                );
            }
        }
    }

    info!(sources = sources.len(), "Parsed sources definition");
    Ok(sources)
}
