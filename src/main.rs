mod cli;
mod ui;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use jobtrack::tracker::STATUS_SUCCESS;
use jobtrack::{HttpJobClient, JobClient, JobScope, TaskTracker, TrackerConfig};
use ui::WaitProgress;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => TrackerConfig::load_from(path)?,
        None => TrackerConfig::load()?,
    };
    apply_overrides(&mut config, &cli);
    config.wait.validate().context("invalid wait policy")?;

    if config.project_id.is_empty() {
        bail!("project_id is not configured; set it in jobtrack.toml");
    }
    if config.base_url.is_none() && (config.region.is_empty() || config.endpoint_domain.is_empty()) {
        bail!("region and endpoint_domain are required unless base_url is set");
    }

    let mut client = HttpJobClient::new(
        config.token.clone(),
        config.project_id.clone(),
        config.endpoint_domain.clone(),
    )
    .context("failed to build HTTP client")?
    .with_api_version(config.api_version.clone());
    if let Some(base_url) = config.base_url.clone() {
        client = client.with_base_url(base_url);
    }

    let tracker = TaskTracker::new(client, JobScope::new(config.service, config.region))
        .with_policy(config.wait);

    let cancel = tracker.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling wait");
            cancel.cancel();
        }
    });

    run(&tracker, cli.command).await
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "jobtrack=debug" } else { "jobtrack=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn apply_overrides(config: &mut TrackerConfig, cli: &Cli) {
    if let Some(service) = &cli.service {
        config.service = service.clone();
    }
    if let Some(region) = &cli.region {
        config.region = region.clone();
    }
    if let Some(interval) = cli.interval {
        config.wait.poll_interval_secs = interval;
    }
    if let Some(timeout) = cli.timeout {
        config.wait.timeout_secs = timeout;
    }
    if let Some(retries) = cli.retries {
        config.wait.transport_retries = retries;
    }
}

async fn run<C: JobClient>(tracker: &TaskTracker<C>, command: Command) -> Result<()> {
    match command {
        Command::Status { job_id } => {
            let status = tracker.job_status(&job_id).await?;
            println!("{status}");
        }
        Command::Wait { job_id, target } => {
            let progress = WaitProgress::start(&job_id, &target);
            match tracker.wait_for(&job_id, &target).await {
                Ok(report) => {
                    progress.done(&format!("job {job_id} reached {target}"));
                    ui::print_report(&report);
                }
                Err(err) => {
                    progress.failed(&err);
                    return Err(err.into());
                }
            }
        }
        Command::Entity { job_id, field } => {
            let progress = WaitProgress::start(&job_id, STATUS_SUCCESS);
            match tracker.get_single_entity_id(&job_id, &field).await {
                Ok(id) => {
                    progress.done(&format!("job {job_id} succeeded"));
                    println!("{id}");
                }
                Err(err) => {
                    progress.failed(&err);
                    return Err(err.into());
                }
            }
        }
        Command::SubEntities { job_id, field } => {
            let progress = WaitProgress::start(&job_id, STATUS_SUCCESS);
            match tracker.get_all_sub_entity_ids(&job_id, &field).await {
                Ok(ids) => {
                    progress.done(&format!("job {job_id} succeeded with {} sub-jobs", ids.len()));
                    for id in ids {
                        println!("{id}");
                    }
                }
                Err(err) => {
                    progress.failed(&err);
                    return Err(err.into());
                }
            }
        }
    }
    Ok(())
}
