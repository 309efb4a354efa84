//! Per-source contents page generation.
//!
//! Runs once per source after every ref fetch has settled, locating each
//! ref's index file and rendering a landing page linking to all of them.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use minijinja::context;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::SourceSpec;
use crate::process::find_index_files;
use crate::render::{TemplateRenderer, CONTENTS_TEMPLATE};

/// File name of the generated landing page, directly under the source folder.
const CONTENTS_FILE_NAME: &str = "_index.md";

#[derive(Debug, Serialize)]
struct TagEntry {
    name: String,
    #[serde(rename = "indexFile")]
    index_file: String,
}

pub struct ContentsPageBuilder<'a> {
    docs_root: &'a Path,
    renderer: &'a TemplateRenderer,
}

impl<'a> ContentsPageBuilder<'a> {
    pub fn new(docs_root: &'a Path, renderer: &'a TemplateRenderer) -> Self {
        Self {
            docs_root,
            renderer,
        }
    }

    /// Regenerate the contents page for `source` from scratch.
    ///
    /// The development branch must resolve to an index file or the whole
    /// build fails. A tag that cannot be resolved is logged as an error and
    /// left out of the page rather than failing the build; a tag folder may
    /// legitimately be missing when its fetch was absorbed as not-found.
    pub fn build(&self, source: &SourceSpec) -> Result<()> {
        if source.skip_contents_page_creation {
            info!(
                source = %source.name,
                "Skipping contents page creation as skipContentsPageCreation is set"
            );
            return Ok(());
        }

        let contents_file = self.docs_root.join(&source.name).join(CONTENTS_FILE_NAME);
        if contents_file.exists() {
            info!(
                file = %contents_file.display(),
                "Contents file already exists and will be overwritten"
            );
            fs::remove_file(&contents_file)
                .with_context(|| format!("Cannot remove {}", contents_file.display()))?;
        }

        info!(source = %source.name, file = %contents_file.display(), "Creating contents file");
        if let Some(parent) = contents_file.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create {}", parent.display()))?;
        }

        let development_branch_index = self
            .relative_index_link(source, &source.development_branch)
            .with_context(|| {
                format!(
                    "No index file for development branch '{}' of source {}",
                    source.development_branch, source.name
                )
            })?;

        // Descending lexicographic order of the ref string, not semantic
        // version order.
        let mut sorted_tags = source.tags.clone();
        sorted_tags.sort_by(|a, b| b.cmp(a));

        let mut tags = Vec::new();
        for tag in sorted_tags {
            match self.relative_index_link(source, &tag) {
                Ok(index_file) => tags.push(TagEntry {
                    name: tag,
                    index_file,
                }),
                Err(e) => error!(
                    source = %source.name,
                    tag,
                    error = %e,
                    "No index file for tag, left out of the contents page"
                ),
            }
        }

        let rendered = self.renderer.render(
            CONTENTS_TEMPLATE,
            context! {
                sourceName => source.name.as_str(),
                developmentBranchName => source.development_branch.as_str(),
                developmentBranchIndexFile => development_branch_index,
                tags => tags,
            },
        )?;
        fs::write(&contents_file, rendered)
            .with_context(|| format!("Cannot write {}", contents_file.display()))
    }

    /// Link to a ref's index file, relative to the contents page: the ref
    /// folder name joined with the index file name. Both share the same
    /// source-level parent, so two segments are enough.
    fn relative_index_link(&self, source: &SourceSpec, reference: &str) -> Result<String> {
        let ref_dir = self.docs_root.join(&source.name).join(reference);
        if !ref_dir.is_dir() {
            anyhow::bail!("Missing ref folder: {}", ref_dir.display());
        }

        let index_files = find_index_files(&ref_dir)?;
        let index_file = match index_files.as_slice() {
            [] => anyhow::bail!("No index files found in ref folder: {}", ref_dir.display()),
            [only] => only,
            [first, ..] => {
                warn!(
                    folder = %ref_dir.display(),
                    used = %first.display(),
                    "Multiple index files found in ref folder, only the first one will be used"
                );
                first
            }
        };

        Ok(format!(
            "{}/{}",
            component_name(&ref_dir)?,
            component_name(index_file)?
        ))
    }
}

fn component_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow::anyhow!("Path has no final component: {}", path.display()))
}
