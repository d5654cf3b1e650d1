//! Teamflow demo: runs the base pipeline and one client pipeline with mock
//! collaborators and prints both results as JSON.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use teamflow::boundary::{self, ClientRequest};
use teamflow::config::{AgencyConfig, CONFIG_FILE_NAME};
use teamflow::context::Context;
use teamflow::events::LoggingEventSink;
use teamflow::factory::TeamFactory;
use teamflow::observability::{init_tracing, LogFormat};
use teamflow::stages::keys;
use tracing::info;

/// Run the agency's base and client pipelines once.
#[derive(Parser, Debug)]
#[command(name = "teamflow-demo", version, about, long_about = None)]
struct Cli {
    /// Configuration file; defaults are used when it does not exist.
    #[arg(long, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Client to run the client pipeline for.
    #[arg(long, default_value = "Demo Clinic")]
    client: String,

    /// CSV file with `clinic_name,email` rows; overrides `leads.csv_path`.
    #[arg(long, env = "LEADS_CSV_PATH")]
    leads_csv: Option<PathBuf>,

    /// Operating region to pass in the initial context.
    #[arg(long)]
    region: Option<String>,

    /// Log format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Print per-stage run reports instead of boundary responses.
    #[arg(long)]
    report: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let mut config = AgencyConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(path) = cli.leads_csv.clone() {
        config = config.with_leads_csv(path);
    }

    let factory = TeamFactory::with_mocks(config)
        .context("building team factory")?
        .with_event_sink(std::sync::Arc::new(LoggingEventSink::verbose()));

    let output = if cli.report || cli.region.is_some() {
        let initial = cli
            .region
            .as_deref()
            .map(|region| Context::new().with(keys::REGION, region));

        let base = factory.create_base_team().run_with_report(initial.clone()).await;
        let client = factory
            .create_client_team(&cli.client)
            .context("creating client team")?
            .run_with_report(initial)
            .await;
        serde_json::json!({ "base": base.to_json(), "client": client.to_json() })
    } else {
        let base = boundary::run_base(&factory).await;
        let client = boundary::run_client(&factory, ClientRequest::new(cli.client.clone())).await;
        serde_json::json!({ "base": base, "client": client })
    };

    info!(
        messages_sent = factory.messages_sent_today(),
        client = %cli.client,
        "demo finished"
    );
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
