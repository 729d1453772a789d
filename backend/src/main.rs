use clap::Parser;
use cluster_stats::config::Config;
use cluster_stats::models::{ClusterSnapshot, IdentifierFormat};
use cluster_stats::services::{SnapshotSource, StatsCollector, StatsService};
use cluster_stats::services::stats::StatsParser;
use cluster_stats::utils::{StatsErrorResponse, init_logging, with_bootstrap_logging};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Render cluster stats reports from a captured cluster snapshot
#[derive(Debug, Parser)]
#[command(name = "cluster-stats", version, about)]
struct Args {
    /// Snapshot file with topology metadata and per-server stats documents
    #[arg(long)]
    snapshot: PathBuf,

    /// Configuration file (defaults to conf/cluster-stats.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Request descriptor, e.g. '["table", "<uuid>"]' (default: '["cluster"]')
    #[arg(long, conflicts_with = "all")]
    request: Option<String>,

    /// Report every cluster, table, server and table-on-server row
    #[arg(long)]
    all: bool,

    /// Render identity fields as `name` or `uuid`
    #[arg(long)]
    format: Option<IdentifierFormat>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = with_bootstrap_logging(|| Config::load(args.config.as_deref()))?;
    let _log_guard = init_logging(&config.logging);

    tracing::info!("Loading snapshot from {}", args.snapshot.display());
    let snapshot = ClusterSnapshot::load(&args.snapshot)?;
    let directory = snapshot.directory();

    let source = SnapshotSource::new(snapshot.documents());
    let collector = StatsCollector::new(Arc::new(source), config.collection.timeout());
    let parser = StatsParser::with_extent_size(config.stats.extent_size);
    let format = args.format.unwrap_or(config.stats.identifier_format);
    let service = StatsService::new(collector, parser, format);

    let outcome = if args.all {
        service
            .report_all(&directory, &snapshot.metadata)
            .await
            .map(Value::from)
    } else {
        let descriptor: Value =
            serde_json::from_str(args.request.as_deref().unwrap_or(r#"["cluster"]"#))?;
        service.report(&descriptor, &directory, &snapshot.metadata).await
    };

    match outcome {
        Ok(report) => {
            print_json(&report, args.pretty)?;
            Ok(ExitCode::SUCCESS)
        },
        Err(e) => {
            if e.is_user_error() {
                tracing::warn!("Stats request rejected: {}", e);
            } else {
                tracing::error!("Stats report failed: {}", e);
            }
            print_json(&StatsErrorResponse::from(&e), args.pretty)?;
            Ok(ExitCode::FAILURE)
        },
    }
}

fn print_json(value: &impl Serialize, pretty: bool) -> anyhow::Result<()> {
    let text =
        if pretty { serde_json::to_string_pretty(value)? } else { serde_json::to_string(value)? };
    println!("{}", text);
    Ok(())
}
