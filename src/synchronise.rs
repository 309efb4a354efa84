//! Orchestrates a full mirror run.
//!
//! Every (source, ref) pair is dispatched concurrently; once all refs of a
//! source have settled, its contents page is built. Sources share no state
//! besides the filesystem, and each (source, ref) pair owns a disjoint
//! subtree, so sources proceed fully independently: a failure in one is
//! collected and reported at the end instead of aborting the others.

use std::path::Path;

use anyhow::Result;
use futures::future::join_all;
use tracing::{error, info};

use crate::config::SourceSpec;
use crate::contents::ContentsPageBuilder;
use crate::contract::TreeFetcher;
use crate::process::SourceProcessor;
use crate::render::TemplateRenderer;

/// Mirror every configured source into `docs_root` and generate contents
/// pages. Returns an error only when at least one source ended in a
/// propagated fatal condition; skipped fetches and absorbed not-founds still
/// count as success.
pub async fn synchronise(
    docs_root: &Path,
    sources: &[SourceSpec],
    fetcher: &dyn TreeFetcher,
    renderer: &TemplateRenderer,
) -> Result<()> {
    let processor = SourceProcessor::new(docs_root, fetcher, renderer);
    let builder = ContentsPageBuilder::new(docs_root, renderer);

    let outcomes = join_all(sources.iter().map(|source| {
        let processor = &processor;
        let builder = &builder;
        async move {
            info!(source = %source.name, "Processing source");

            // The development branch is always refetched; tags are immutable
            // snapshots and skipped when already present.
            let mut jobs = vec![processor.process_ref(source, &source.development_branch, false)];
            jobs.extend(
                source
                    .tags
                    .iter()
                    .map(|tag| processor.process_ref(source, tag, true)),
            );

            let failures: Vec<anyhow::Error> = join_all(jobs)
                .await
                .into_iter()
                .filter_map(Result::err)
                .collect();
            if !failures.is_empty() {
                for failure in &failures {
                    error!(source = %source.name, error = ?failure, "Ref fetch failed");
                }
                anyhow::bail!(
                    "{} ref fetch(es) failed for source {}",
                    failures.len(),
                    source.name
                );
            }

            // Only built once every ref fetch for this source has reached a
            // terminal state.
            builder.build(source)
        }
    }))
    .await;

    let failed: Vec<&str> = outcomes
        .iter()
        .zip(sources)
        .filter_map(|(outcome, source)| outcome.is_err().then_some(source.name.as_str()))
        .collect();

    if failed.is_empty() {
        info!(sources = sources.len(), "All sources processed");
        Ok(())
    } else {
        for (outcome, source) in outcomes.iter().zip(sources) {
            if let Err(e) = outcome {
                error!(source = %source.name, error = ?e, "Source failed");
            }
        }
        anyhow::bail!(
            "{} of {} source(s) failed: {}",
            failed.len(),
            sources.len(),
            failed.join(", ")
        )
    }
}
