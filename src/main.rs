mod batch;
mod client;
mod config;
mod decoder;
mod errors;
mod export;
mod ids;
mod models;
mod query;
mod storage;

use std::collections::HashMap;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::batch::{run_batches, CancelToken};
use crate::client::ProfileApiClient;
use crate::config::Config;
use crate::models::{CompanyRecord, FetchOutcome};
use crate::query::{build_query, Fragments, IdentifierBinding};

/// Main entry point for the batch pipeline.
///
/// Stages: configuration, identifier input, query construction, batched
/// fetch, summary, CSV export and (when configured) Postgres storage.
/// Ctrl-C cancels the run at the next group boundary; outcomes accumulated
/// up to that point are still exported.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "company_harvest=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Read identifiers; a domain binding drops anything that is not a domain
    let mut identifiers = ids::read_ids_from_csv(&config.ids_file, &config.id_column)?;
    if config.id_binding == IdentifierBinding::DomainName {
        identifiers = ids::retain_valid_domains(identifiers);
    }
    if identifiers.is_empty() {
        anyhow::bail!("no usable identifiers in {}", config.ids_file);
    }

    // Build the query document from the fragment table
    let fragments = match &config.fragments_file {
        Some(path) => Fragments::load_from_file(path)?,
        None => Fragments::company_profile(),
    };
    let query = build_query(&fragments, config.id_binding);
    tracing::debug!("Query document is {} characters", query.len());

    // Shared read-only client for every concurrent call in the run
    let client = Arc::new(ProfileApiClient::new(&config, query)?);

    // Cancel at the next group boundary on ctrl-c
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, cancelling after the current group");
                cancel.cancel();
            }
        });
    }

    tracing::info!(
        "Fetching {} profiles in groups of {}",
        identifiers.len(),
        config.batch_size
    );

    let per_item = {
        let client = Arc::clone(&client);
        move |id: models::Identifier| {
            let client = Arc::clone(&client);
            async move { client.fetch_profile(id).await }
        }
    };
    let outcomes = run_batches(&identifiers, per_item, config.batch_size, None, &cancel).await;

    summarize(&outcomes);

    let records: Vec<CompanyRecord> = outcomes
        .into_iter()
        .filter_map(FetchOutcome::into_record)
        .collect();

    if records.is_empty() {
        tracing::warn!("No successful records; nothing to export");
        return Ok(());
    }

    let written = export::write_csv(&records, &config.csv_output)?;
    tracing::info!("Exported {} records to {}", written, config.csv_output);

    if let Some(ref database_url) = config.database_url {
        let storage = storage::ProfileStorage::connect(database_url).await?;
        storage.ensure_schema().await?;
        let stored = storage.store_run(&records).await?;
        tracing::info!("Stored {} rows under run {}", stored.rows, stored.run_id);
    }

    Ok(())
}

/// Log success/failure counts, with failures broken down by kind.
fn summarize(outcomes: &[FetchOutcome]) {
    let successes = outcomes.iter().filter(|o| o.is_success()).count();
    let mut failures_by_kind: HashMap<String, usize> = HashMap::new();
    for outcome in outcomes {
        if let FetchOutcome::Failure { kind, .. } = outcome {
            *failures_by_kind.entry(kind.to_string()).or_insert(0) += 1;
        }
    }

    tracing::info!(
        "Run complete: {} outcomes, {} successes, {} failures",
        outcomes.len(),
        successes,
        outcomes.len() - successes
    );
    for (kind, count) in &failures_by_kind {
        tracing::info!("  {} failures: {}", kind, count);
    }
}
