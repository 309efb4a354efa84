use serde::Deserialize;

/// One external documentation-bearing repository configured for mirroring.
///
/// Deserialised from the camelCase JSON records in the sources definition
/// file. Immutable once loaded; `name` is the partition key for the local
/// output tree (`<docs root>/<name>/<ref>/...`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSpec {
    /// The name of the top level folder for this source.
    pub name: String,
    /// The GitHub repository owner org/user for this source.
    pub source_owner: String,
    /// The GitHub repository for this source.
    pub source_repository: String,
    /// The branch that is always pulled on every build, so should be the
    /// main development branch.
    pub development_branch: String,
    /// The path, from the repository root, to the folder containing the docs
    /// source.
    pub docs_folder_path: String,
    /// Git tags, one for each released version of the docs that should be
    /// pulled. Tag output folders are treated as immutable snapshots.
    #[serde(default)]
    pub tags: Vec<String>,
    /// If true, no contents page is created for this source. Useful when the
    /// source does not do releases and only the development branch is pulled.
    #[serde(default)]
    pub skip_contents_page_creation: bool,
}
