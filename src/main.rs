use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use visitor_beacon::config::{ConfigSource, EndpointConfig, DEFAULT_ENV_FILE, DEFAULT_IP_LOOKUP_URL};
use visitor_beacon::consent::{ConsentStore, LocalStorage, DEFAULT_STORAGE_PATH};
use visitor_beacon::telemetry::TelemetrySubmitter;
use visitor_beacon::visitor::{ClientEnvironment, Dimensions, IpifyLookup, VisitorCollector};
use visitor_beacon::{http_client, run_page_load};

#[derive(Parser)]
#[command(name = "visitor-beacon")]
#[command(about = "Collect visitor info once and post it to the telemetry backend", long_about = None)]
struct Cli {
    /// Environment file with SUPABASE_URL and SUPABASE_ANON_KEY
    #[arg(long, global = true, default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,

    /// Fetch the environment file over HTTP instead of reading it from disk
    #[arg(long, global = true, conflicts_with = "env_file")]
    env_url: Option<String>,

    /// IP echo service returning {"ip": "..."}
    #[arg(long, global = true, default_value = DEFAULT_IP_LOOKUP_URL)]
    ip_lookup_url: String,

    /// Local key/value storage file
    #[arg(long, global = true, default_value = DEFAULT_STORAGE_PATH)]
    storage: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a page load: collect, submit, check the privacy notice (default)
    Visit(ClientArgs),
    /// Collect and print the record without submitting it
    Preview(ClientArgs),
    /// Record privacy notice acceptance
    AcceptPrivacy,
}

#[derive(Args, Default)]
struct ClientArgs {
    /// JSON snapshot of the client environment
    #[arg(long)]
    client: Option<PathBuf>,
    #[arg(long)]
    user_agent: Option<String>,
    #[arg(long)]
    language: Option<String>,
    #[arg(long)]
    platform: Option<String>,
    /// Screen resolution, WxH
    #[arg(long)]
    screen: Option<Dimensions>,
    /// Viewport size, WxH
    #[arg(long)]
    window: Option<Dimensions>,
    /// IANA timezone name
    #[arg(long)]
    timezone: Option<String>,
    #[arg(long)]
    referrer: Option<String>,
    /// Page URL being visited
    #[arg(long)]
    page_url: Option<String>,
}

impl ClientArgs {
    async fn into_environment(self) -> Result<ClientEnvironment> {
        let mut env = match &self.client {
            Some(path) => ClientEnvironment::load_snapshot(path).await?,
            None => ClientEnvironment::from_host(),
        };

        override_with(&mut env.user_agent, self.user_agent);
        override_with(&mut env.language, self.language);
        override_with(&mut env.platform, self.platform);
        override_with(&mut env.screen, self.screen);
        override_with(&mut env.window, self.window);
        override_with(&mut env.timezone, self.timezone);
        override_with(&mut env.referrer, self.referrer);
        override_with(&mut env.url, self.page_url);

        Ok(env)
    }
}

fn override_with<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let consent = ConsentStore::new(LocalStorage::new(&cli.storage));

    let command = cli
        .command
        .unwrap_or_else(|| Commands::Visit(ClientArgs::default()));

    match command {
        Commands::AcceptPrivacy => {
            consent.accept_privacy().await?;
            println!(
                "✓ Privacy notice accepted ({})",
                consent.storage().path().display()
            );
        }
        Commands::Preview(args) => {
            let client = http_client().context("failed to build HTTP client")?;
            let env = args.into_environment().await?;
            let collector =
                VisitorCollector::new(Arc::new(IpifyLookup::new(client, cli.ip_lookup_url)));

            let record = collector.collect(&env).await;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Visit(args) => {
            let client = http_client().context("failed to build HTTP client")?;
            let env = args.into_environment().await?;

            let source = match cli.env_url {
                Some(url) => ConfigSource::Remote(url),
                None => ConfigSource::File(cli.env_file),
            };
            let endpoint = EndpointConfig::load(&source, &client).await;

            let collector = VisitorCollector::new(Arc::new(IpifyLookup::new(
                client.clone(),
                cli.ip_lookup_url,
            )));
            let submitter = TelemetrySubmitter::new(client, endpoint);

            run_page_load(&collector, &submitter, &env).await;

            // Tracking runs regardless of consent; the flag only hides the notice.
            match consent.privacy_accepted().await {
                Ok(true) => info!("Privacy notice already accepted, hiding notice"),
                Ok(false) => info!(
                    "Privacy notice shown; run `visitor-beacon accept-privacy` to dismiss it"
                ),
                Err(err) => {
                    let error = format!("{err:#}");
                    warn!(%error, "Could not read privacy consent flag");
                }
            }
        }
    }

    Ok(())
}
