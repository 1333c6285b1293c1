use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use harvest_logging::{harvest_error, harvest_info};
use harvester_core::SessionStatus;
use harvester_engine::{
    run_author_plan, run_keywords, HttpSearchClient, SessionRunner, ShardWriter,
};
use tokio_util::sync::CancellationToken;

use crate::authors::{collect_author_ids, load_author_list, write_author_list};
use crate::config::{load_app_config, AppConfig};
use crate::credentials::load_credentials;

/// Whether every session ran to completion.
pub type Completed = bool;

fn build_runner(
    config: &AppConfig,
    cancel: CancellationToken,
) -> Result<SessionRunner<HttpSearchClient>> {
    let credentials = load_credentials(&config.credentials_dir)?;
    let client = HttpSearchClient::new(credentials, config.client_settings())
        .context("cannot create search client")?;
    Ok(SessionRunner::new(client, ShardWriter::new(config.output_dir.clone())).cancellation(cancel))
}

pub async fn harvest_authors(
    config_path: &Path,
    authors_path: &Path,
    cancel: CancellationToken,
) -> Result<Completed> {
    let config = load_app_config(config_path)?;
    let settings = config
        .settings(Utc::now())
        .with_context(|| format!("invalid session settings in {}", config_path.display()))?;
    let authors = load_author_list(authors_path)?;
    let runner = build_runner(&config, cancel)?;
    harvest_info!(
        "harvesting {} to {} into {}",
        settings.global_start,
        settings.global_end,
        config.output_dir.display()
    );

    let report = run_author_plan(&runner, &settings, authors).await?;
    harvest_info!(
        "author plan finished: {} sessions, {} posts, {} shards",
        report.sessions.len(),
        report.records_pulled(),
        report.shards().count()
    );
    for (batch_index, reason) in report.aborts() {
        harvest_error!("batch {batch_index:?} aborted: {reason}");
    }
    Ok(report.is_complete())
}

pub async fn harvest_keywords(config_path: &Path, cancel: CancellationToken) -> Result<Completed> {
    let config = load_app_config(config_path)?;
    let settings = config
        .settings(Utc::now())
        .with_context(|| format!("invalid session settings in {}", config_path.display()))?;
    let runner = build_runner(&config, cancel)?;

    let report = run_keywords(&runner, &settings, config.keywords.clone())
        .await
        .with_context(|| format!("invalid keyword session in {}", config_path.display()))?;
    harvest_info!(
        "keyword session finished: {} posts, {} shards",
        report.records_pulled,
        report.shards.len()
    );
    Ok(report.status == SessionStatus::Completed)
}

pub fn collect_authors(input: &Path, output: &Path) -> Result<Completed> {
    let ids = collect_author_ids(input)?;
    let written = write_author_list(output, &ids)?;
    harvest_info!("wrote {} author ids to {}", ids.len(), written.display());
    Ok(true)
}
