mod stdio;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use relay_core::app::{AdapterConfig, AppBuilder};
use relay_core::handlers::{ActionHandler, ActionTriggered, GetSliHandler, GetSliTriggered, StaticMetrics};
use relay_core::impls::LocalResourceStore;
use relay_core::observability::{LogFormat, init_tracing};
use relay_core::ports::TokioWaiter;
use tokio::io::BufReader;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::stdio::{LineSink, LineSource};

/// Answer triggered envelopes read from stdin with started/finished
/// envelopes written to stdout, one JSON document per line.
#[derive(Debug, Parser)]
#[command(name = "relay", version, about)]
struct Cli {
    /// TOML configuration file; `RELAY_*` environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON on stderr.
    #[arg(long)]
    json_logs: bool,

    /// Action names handled by the `action` task.
    #[arg(long = "action", default_value = "action-xyz")]
    actions: Vec<String>,

    /// Settle time after a remediation action, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    action_settle_ms: u64,

    /// Value reported for every requested SLI.
    #[arg(long, default_value_t = 123.4)]
    sli_value: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(if cli.json_logs { LogFormat::Json } else { LogFormat::Pretty });

    let config = AdapterConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if !config.use_local_filesystem {
        bail!(
            "no configuration service client is available in this binary; \
             set use_local_filesystem = true"
        );
    }
    info!(
        service = %config.service_name,
        namespace = %config.event_namespace,
        resource_dir = %config.resource_dir.display(),
        "starting relay"
    );

    let resources = Arc::new(LocalResourceStore::new(config.resource_dir.clone()));
    let actions = ActionHandler::new(Arc::new(TokioWaiter))
        .with_supported_actions(cli.actions)
        .with_settle_time(Duration::from_millis(cli.action_settle_ms));
    let get_sli = GetSliHandler::new(
        config.service_name.clone(),
        resources,
        Arc::new(StaticMetrics(cli.sli_value)),
    );

    let app = AppBuilder::new(config)
        .register::<ActionTriggered, _>(actions)?
        .register::<GetSliTriggered, _>(get_sli)?
        .expect_tasks(&["action", "get-sli"])
        .with_sink(Arc::new(LineSink::new(tokio::io::stdout())))
        .build()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown requested");
                let _ = shutdown_tx.send(true);
            }
            Err(err) => {
                // keep the sender alive; the service then ends with its input
                warn!(error = %err, "cannot listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        }
    });

    let source = Arc::new(LineSource::new(BufReader::new(tokio::io::stdin())));
    app.service(source).run(shutdown_rx).await?;

    info!("relay stopped");
    Ok(())
}
