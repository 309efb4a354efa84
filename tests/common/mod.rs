#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use docs_mirror::config::SourceSpec;
use docs_mirror::contract::{FetchError, TreeFetcher};
use docs_mirror::render::TemplateRenderer;

/// Test fetcher that materialises a canned file tree per `(repo, ref)` pair
/// and records which pairs were fetched. Unknown pairs behave like a 404.
pub struct FakeFetcher {
    trees: HashMap<String, Vec<(String, String)>>,
    broken: HashSet<String>,
    partial: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
}

fn key(repo: &str, reference: &str) -> String {
    format!("{repo}@{reference}")
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self {
            trees: HashMap::new(),
            broken: HashSet::new(),
            partial: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Register the files served for one ref: `(relative path, content)`.
    pub fn with_tree(mut self, repo: &str, reference: &str, files: &[(&str, &str)]) -> Self {
        self.trees.insert(
            key(repo, reference),
            files
                .iter()
                .map(|(path, content)| (path.to_string(), content.to_string()))
                .collect(),
        );
        self
    }

    /// Make one ref fail with a local IO error instead of not-found.
    pub fn with_broken_ref(mut self, repo: &str, reference: &str) -> Self {
        self.broken.insert(key(repo, reference));
        self
    }

    /// Make one ref write its files and then fail, like a download that broke
    /// partway through the tree.
    pub fn with_partial_ref(
        mut self,
        repo: &str,
        reference: &str,
        files: &[(&str, &str)],
    ) -> Self {
        self.partial.insert(key(repo, reference));
        self.with_tree(repo, reference, files)
    }

    pub fn fetched(&self, repo: &str, reference: &str) -> usize {
        let wanted = key(repo, reference);
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| **call == wanted)
            .count()
    }
}

#[async_trait]
impl TreeFetcher for FakeFetcher {
    async fn fetch(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
        remote_path: &str,
        dest: &Path,
    ) -> Result<(), FetchError> {
        self.calls.lock().unwrap().push(key(repo, reference));

        if self.broken.contains(&key(repo, reference)) {
            return Err(FetchError::LocalIo {
                path: dest.to_path_buf(),
                source: std::io::Error::other("disk full"),
            });
        }

        let Some(files) = self.trees.get(&key(repo, reference)) else {
            return Err(FetchError::NotFound {
                owner: owner.to_string(),
                repo: repo.to_string(),
                reference: reference.to_string(),
                path: remote_path.to_string(),
            });
        };

        std::fs::create_dir_all(dest).unwrap();
        for (relative, content) in files {
            let local = dest.join(relative);
            if let Some(parent) = local.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(&local, content).unwrap();
        }

        if self.partial.contains(&key(repo, reference)) {
            return Err(FetchError::Incomplete {
                dir: dest.to_path_buf(),
                failures: vec![FetchError::LocalIo {
                    path: dest.join("missing.md"),
                    source: std::io::Error::other("connection reset"),
                }],
            });
        }
        Ok(())
    }
}

pub fn source(name: &str, repo: &str, development_branch: &str, tags: &[&str]) -> SourceSpec {
    SourceSpec {
        name: name.to_string(),
        source_owner: "acme".to_string(),
        source_repository: repo.to_string(),
        development_branch: development_branch.to_string(),
        docs_folder_path: "docs".to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        skip_contents_page_creation: false,
    }
}

/// Write the two required templates into `dir` and build a renderer on it.
pub fn renderer_with_templates(dir: &Path) -> TemplateRenderer {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(
        dir.join("indexHeader.txt"),
        "+++\ntitle = \"{{ name }} ({{ version }})\"\nversion = \"{{ version }}\"\n+++\n\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("contents.md"),
        "# {{ sourceName }}\n\n* [{{ developmentBranchName }}]({{ developmentBranchIndexFile }})\n{% for tag in tags %}* [{{ tag.name }}]({{ tag.indexFile }})\n{% endfor %}",
    )
    .unwrap();
    TemplateRenderer::new(dir).expect("templates just written")
}
