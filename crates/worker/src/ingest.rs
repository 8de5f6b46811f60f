use std::path::Path;

use apollo_core::config::Settings;
use apollo_core::domain::{normalize, DateRange, ProposalRecord};
use apollo_core::ingest::{FileProposalSource, HttpProposalSource, ProposalSource};

/// Fetches the proposals sold within `range` and normalizes them.
///
/// A local `input` file takes precedence over the configured API.
pub async fn load_records(
    settings: &Settings,
    input: Option<&Path>,
    range: &DateRange,
) -> anyhow::Result<Vec<ProposalRecord>> {
    let source: Box<dyn ProposalSource> = match input {
        Some(path) => Box::new(FileProposalSource::new(path)),
        None => Box::new(HttpProposalSource::from_settings(settings)?),
    };

    let t0 = std::time::Instant::now();
    let raws = source.fetch_proposals(range).await?;
    let records = normalize(raws);

    tracing::debug!(
        source = source.source_name(),
        %range,
        records = records.len(),
        elapsed_ms = t0.elapsed().as_millis(),
        "proposals loaded"
    );

    Ok(records)
}
