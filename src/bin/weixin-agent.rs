use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use weixin_agent::api::client::WeixinClient;
use weixin_agent::server;
use weixin_agent::utils::config_loader;
use weixin_agent::utils::logging;
use weixin_agent::utils::logging::LogLevel;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "weixin-agent.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // -------------------------------
    // 1. Load YAML config
    // -------------------------------

    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level).await?;

    // -------------------------------
    // 2. Resolve account credentials
    // -------------------------------

    let account = service_config
        .account
        .resolve()
        .context("cannot resolve account credentials")?;
    info!(app_id = %account.identity.app_id, "account resolved");

    // -------------------------------
    // 3. Create api client and warm the access token
    // -------------------------------

    let client = WeixinClient::from_settings(&service_config.settings, account.identity)?;
    match client.access_token().await {
        Ok(credential) => info!(expires_in = credential.expires_in, "access token ready"),
        Err(err) => warn!(error = %err, "access token not available yet, will retry on first use"),
    }

    // -------------------------------
    // 4. Serve webhook, metrics and health
    // -------------------------------

    info!("Service starting...");
    server::server::start(
        &service_config.settings,
        &service_config.webhook,
        client,
        account.token,
    )
    .await
}
