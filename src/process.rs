//! Per-ref source processing: fetch-or-skip decision plus front-matter
//! annotation of fetched index files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use minijinja::context;
use tracing::{error, info, warn};

use crate::config::SourceSpec;
use crate::contract::{FetchError, TreeFetcher};
use crate::render::{TemplateRenderer, INDEX_HEADER_TEMPLATE};

/// Delimiter of the front matter consumed by the downstream site generator.
const FRONT_MATTER_DELIMITER: &str = "+++";

/// Downloads one ref of one source into the docs tree and annotates its
/// index files. Holds no state across refs; the filesystem is the only
/// shared resource, and each (source, ref) pair owns a disjoint subtree.
pub struct SourceProcessor<'a> {
    docs_root: &'a Path,
    fetcher: &'a dyn TreeFetcher,
    renderer: &'a TemplateRenderer,
}

impl<'a> SourceProcessor<'a> {
    pub fn new(
        docs_root: &'a Path,
        fetcher: &'a dyn TreeFetcher,
        renderer: &'a TemplateRenderer,
    ) -> Self {
        Self {
            docs_root,
            fetcher,
            renderer,
        }
    }

    /// Fetch one ref of `source` unless its output folder already satisfies
    /// it. Tags pass `skip_if_exists = true` (immutable snapshots); the
    /// development branch passes `false` and is refetched every run.
    ///
    /// A `NotFound` from the fetcher is logged and absorbed so one bad tag
    /// does not halt other refs or sources; every other failure propagates.
    ///
    /// The ref folder only ever appears as a fully downloaded, annotated
    /// staging copy promoted by rename, so a fetch that fails partway leaves
    /// no partial snapshot for a later run to mistake for a complete one.
    pub async fn process_ref(
        &self,
        source: &SourceSpec,
        reference: &str,
        skip_if_exists: bool,
    ) -> Result<()> {
        info!(source = %source.name, reference, "Downloading documentation");

        let output_dir = self.ref_dir(source, reference);
        if skip_if_exists && output_dir.exists() {
            info!(
                source = %source.name,
                reference,
                "Output folder already exists, download skipped"
            );
            return Ok(());
        }

        // Staged next to the output folder so the final rename stays on one
        // filesystem. Dropped (and cleaned up) on any failure below.
        let source_dir = self.docs_root.join(&source.name);
        fs::create_dir_all(&source_dir)
            .with_context(|| format!("Cannot create {}", source_dir.display()))?;
        let staging = tempfile::tempdir_in(&source_dir).with_context(|| {
            format!("Cannot create staging folder in {}", source_dir.display())
        })?;

        match self
            .fetcher
            .fetch(
                &source.source_owner,
                &source.source_repository,
                reference,
                &source.docs_folder_path,
                staging.path(),
            )
            .await
        {
            Ok(()) => {
                self.annotate_index_files(staging.path(), source, reference)?;
                promote(staging, &output_dir)
            }
            Err(FetchError::NotFound { .. }) => {
                error!(
                    source = %source.name,
                    reference,
                    "Unable to download folder. Is the version string valid?"
                );
                Ok(())
            }
            Err(e) => Err(e).with_context(|| {
                format!(
                    "Download failed for {} at ref '{}'",
                    source.name, reference
                )
            }),
        }
    }

    fn ref_dir(&self, source: &SourceSpec, reference: &str) -> PathBuf {
        self.docs_root.join(&source.name).join(reference)
    }

    /// Prepend the rendered front-matter header to every index file directly
    /// under `dir` that does not already carry one. Zero index files is a
    /// logged warning; authors are expected to supply exactly one.
    fn annotate_index_files(
        &self,
        dir: &Path,
        source: &SourceSpec,
        reference: &str,
    ) -> Result<()> {
        info!(
            source = %source.name,
            dir = %dir.display(),
            "Adding front-matter header to index files"
        );
        let index_files = find_index_files(dir)?;
        if index_files.is_empty() {
            warn!(dir = %dir.display(), "Found no index files in docs folder");
            return Ok(());
        }

        let header = self.renderer.render(
            INDEX_HEADER_TEMPLATE,
            context! { version => reference, name => source.name.as_str() },
        )?;

        for index_file in index_files {
            if has_front_matter(&index_file)? {
                info!(
                    file = %index_file.display(),
                    "Index file already has front matter, skipped"
                );
            } else {
                prepend_to_file(&index_file, &header)?;
            }
        }
        Ok(())
    }
}

/// Replace `output_dir` with the fully fetched staging folder.
fn promote(staging: tempfile::TempDir, output_dir: &Path) -> Result<()> {
    if output_dir.exists() {
        fs::remove_dir_all(output_dir)
            .with_context(|| format!("Cannot remove {}", output_dir.display()))?;
    }
    // Branch names may contain separators, so the parent is not always the
    // source folder the staging dir was created in.
    if let Some(parent) = output_dir.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create {}", parent.display()))?;
    }
    fs::rename(staging.keep(), output_dir)
        .with_context(|| format!("Cannot move staging folder to {}", output_dir.display()))
}

/// Direct children of `dir` whose name ends in `index.adoc` or `index.md`,
/// in file-name order.
pub fn find_index_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Cannot list folder {}", dir.display()))?;
    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Cannot list folder {}", dir.display()))?;
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.ends_with("index.adoc") || name.ends_with("index.md") {
            found.push(entry.path());
        }
    }
    found.sort();
    Ok(found)
}

/// True when any line of the file contains the front-matter delimiter.
pub fn has_front_matter(path: &Path) -> Result<bool> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    Ok(content
        .lines()
        .any(|line| line.contains(FRONT_MATTER_DELIMITER)))
}

pub fn prepend_to_file(path: &Path, text: &str) -> Result<()> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    fs::write(path, format!("{text}{content}"))
        .with_context(|| format!("Cannot write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn finds_only_index_files_in_name_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("index.md"), "").unwrap();
        fs::write(dir.path().join("api-index.adoc"), "").unwrap();
        fs::write(dir.path().join("readme.md"), "").unwrap();
        fs::write(dir.path().join("indexes.md"), "").unwrap();
        fs::create_dir(dir.path().join("index.md.d")).unwrap();

        let names: Vec<String> = find_index_files(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["api-index.adoc", "index.md"]);
    }

    #[test]
    fn nested_index_files_are_not_picked_up() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("guide")).unwrap();
        fs::write(dir.path().join("guide").join("index.md"), "").unwrap();
        assert!(find_index_files(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn detects_front_matter_anywhere_in_file() {
        let dir = tempdir().unwrap();
        let with = dir.path().join("with.md");
        let without = dir.path().join("without.md");
        fs::write(&with, "some intro\n+++\ntitle = \"x\"\n+++\nbody\n").unwrap();
        fs::write(&without, "# Title\n\nbody\n").unwrap();
        assert!(has_front_matter(&with).unwrap());
        assert!(!has_front_matter(&without).unwrap());
    }

    #[test]
    fn prepend_keeps_existing_content() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("index.md");
        fs::write(&file, "# Guide\n").unwrap();
        prepend_to_file(&file, "+++\nversion = \"v1\"\n+++\n").unwrap();
        assert_eq!(
            fs::read_to_string(&file).unwrap(),
            "+++\nversion = \"v1\"\n+++\n# Guide\n"
        );
    }
}
