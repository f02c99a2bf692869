//! Infra Resizer
//!
//! Command-line entry point: `infra-resizer resize infra --cluster-id <id>`.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::{filter::Directive, fmt, prelude::*, EnvFilter};

use infra_resizer::{
    client_for_context, InstanceSizeCatalog, KubeNodeInventory, KubePoolStore,
    NotificationOutcome, OsdctlNotifier, PollSettings, ResizeConfig, ResizeOrchestrator,
    ResizeOutcome, ResizeReport, ResizeRequest, StdinConfirmer,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Infra Resizer - zero-downtime infra node resize for managed clusters
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON", global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resize cluster node pools
    #[command(subcommand)]
    Resize(ResizeCommand),
}

#[derive(Subcommand, Debug)]
enum ResizeCommand {
    /// Resize the infra nodes of a cluster
    Infra(InfraArgs),
}

#[derive(Args, Debug)]
struct InfraArgs {
    /// Internal ID of the cluster to resize
    #[arg(short = 'C', long, env = "INFRA_RESIZER_CLUSTER_ID")]
    cluster_id: String,

    /// Instance type to move to instead of the next catalog size
    #[arg(long, env = "INFRA_RESIZER_INSTANCE_TYPE")]
    instance_type: Option<String>,

    /// YAML file replacing the built-in sizing catalog
    #[arg(long, env = "INFRA_RESIZER_CATALOG")]
    catalog: Option<PathBuf>,

    /// Kubeconfig context of the managed cluster
    #[arg(long, env = "INFRA_RESIZER_CLUSTER_CONTEXT")]
    cluster_context: Option<String>,

    /// Kubeconfig context of the Hive management cluster
    #[arg(long, env = "INFRA_RESIZER_HIVE_CONTEXT")]
    hive_context: Option<String>,

    /// Kubeconfig context used for MachinePool changes (defaults to --hive-context)
    #[arg(long, env = "INFRA_RESIZER_HIVE_ADMIN_CONTEXT")]
    hive_admin_context: Option<String>,

    /// Seconds between cluster polls
    #[arg(
        long,
        env = "INFRA_RESIZER_POLL_INTERVAL_SECS",
        default_value = "20",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    poll_interval_secs: u64,

    /// Seconds each wait may take before the resize is abandoned
    #[arg(long, env = "INFRA_RESIZER_WAIT_TIMEOUT_SECS", default_value = "1200")]
    wait_timeout_secs: u64,

    /// osdctl binary used to post the customer service log
    #[arg(long, env = "INFRA_RESIZER_OSDCTL", default_value = "osdctl")]
    osdctl: String,

    /// Print the final report as JSON
    #[arg(long, env = "INFRA_RESIZER_JSON_REPORT")]
    json_report: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.log_json);

    info!("Starting {} {}", infra_resizer::NAME, infra_resizer::VERSION);

    match cli.command {
        Command::Resize(ResizeCommand::Infra(args)) => resize_infra(args).await?,
    }

    Ok(())
}

async fn resize_infra(args: InfraArgs) -> anyhow::Result<()> {
    let catalog = match &args.catalog {
        Some(path) => InstanceSizeCatalog::from_file(path)
            .with_context(|| format!("failed to load catalog {}", path.display()))?,
        None => InstanceSizeCatalog::default(),
    };

    let config = ResizeConfig {
        poll: PollSettings {
            interval: Duration::from_secs(args.poll_interval_secs),
            timeout: Duration::from_secs(args.wait_timeout_secs),
        },
        ..Default::default()
    };

    let cluster = client_for_context(args.cluster_context.as_deref())
        .await
        .context("failed to create managed cluster client")?;
    let hive = client_for_context(args.hive_context.as_deref())
        .await
        .context("failed to create hive client")?;
    let hive_admin = match args.hive_admin_context.as_deref() {
        Some(context) => client_for_context(Some(context))
            .await
            .context("failed to create hive admin client")?,
        None => hive.clone(),
    };

    let orchestrator = ResizeOrchestrator::new(
        config,
        catalog,
        Arc::new(KubePoolStore::new(hive, hive_admin)),
        Arc::new(KubeNodeInventory::new(cluster)),
        Arc::new(StdinConfirmer::stdio()),
        Arc::new(OsdctlNotifier::new(args.osdctl)),
    );

    let mut request = ResizeRequest::new(args.cluster_id);
    if let Some(instance_type) = args.instance_type {
        request = request.with_instance_type(instance_type);
    }

    let outcome = match orchestrator.run(&request).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(
                category = %e.category(),
                phase = e.phase().unwrap_or("init"),
                fatal = e.is_fatal(),
                "Infra resize failed: {}",
                e.root()
            );
            return Err(e.into());
        }
    };

    match outcome {
        ResizeOutcome::Declined => println!("Resize cancelled, no changes were made."),
        ResizeOutcome::Completed(report) if args.json_report => {
            println!("{}", serde_json::to_string_pretty(&report)?)
        }
        ResizeOutcome::Completed(report) => print_report(&report),
    }

    Ok(())
}

fn print_report(report: &ResizeReport) {
    println!(
        "Resized infra machinepool {} from {} to {} ({} replicas) in {}s",
        report.pool,
        report.from_instance_type,
        report.to_instance_type,
        report.replicas,
        (report.finished_at - report.started_at).num_seconds()
    );

    if let NotificationOutcome::Failed { manual_command, .. } = &report.notification {
        println!(
            "Failed to generate service log. Please manually send a service log to the customer with:\n{}",
            manual_command
        );
    }
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(log_level: &str, json: bool) {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "kube=info", "tower=warn"] {
        if let Ok(directive) = directive.parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}
