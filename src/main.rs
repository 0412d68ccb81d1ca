use std::sync::Arc;

use chrono::Utc;
use clap::Parser;

use blockprobe::cli::Args;
use blockprobe::config::{load_config, setup_resolver};
use blockprobe::http_probe::{error_chain, prelude::*};
use blockprobe::logging::init_logging;
use blockprobe::report::{RunSummary, render_line, render_summary, write_summary_json};
use blockprobe::targets::loader::load_targets;
use blockprobe::{Result, Runner};

async fn run(args: Args) -> Result<()> {
    let app = load_config(&args)?;
    let config = &app.config;
    init_logging(&config.log_level)?;

    match &app.source {
        Some(path) => log::info!("Using config file: {}", path.display()),
        None => log::debug!("No config file found, using defaults"),
    }

    let run_settings = config.run_settings()?;
    let probe_settings = config.probe_settings()?;
    let targets = load_targets(&config.dataset_file, &config.url_column, &config.label_column)?;

    let resolver = setup_resolver(&config.dns_hosts, probe_settings.timeout)?;
    if !config.dns_hosts.is_empty() {
        log::info!("Using DNS hosts: {:?}", config.dns_hosts);
    }
    let transport = HttpTransport::with_resolver(
        &probe_settings,
        TrustDnsResolver::new(resolver, lookup_timeout(probe_settings.timeout)),
    )?;

    log::info!(
        "🚀 Starting Stress Test: {} threads, {} loops",
        run_settings.concurrency(),
        run_settings.loops()
    );

    let started_at = Utc::now();
    let statistics = Runner::new(Arc::new(transport), run_settings)
        .run(&targets, |target, outcome| {
            println!("{}", render_line(target, outcome));
        })
        .await;
    let finished_at = Utc::now();

    println!("{}", render_summary(&statistics));

    if let Some(path) = &app.summary_json {
        let summary = RunSummary {
            started_at,
            finished_at,
            concurrency: run_settings.concurrency(),
            loops: run_settings.loops(),
            batch_size: run_settings.batch_size(),
            timeout_seconds: probe_settings.timeout.as_secs_f64(),
            statistics,
        };
        write_summary_json(path, &summary)?;
        log::info!("Wrote run summary to {}", path.display());
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("CRITICAL: {}", error_chain(&e));
        std::process::exit(1);
    }
}
