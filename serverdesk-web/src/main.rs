//! Serverdesk Web Server
//!
//! Settings pages and administrator tasks for managed servers.

use anyhow::Context;
use clap::Parser;
use serverdesk_web::{auth::JwtService, init_logging, ServerdeskServer, WebConfig};
use std::path::PathBuf;
use tracing::info;

/// Serverdesk Web Server - per-server settings and administrator tasks
#[derive(Parser)]
#[command(name = "serverdesk-web")]
#[command(about = "A web interface for Serverdesk")]
#[command(version)]
struct Args {
    /// Server host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable development mode
    #[arg(long)]
    dev: bool,

    /// SQLite database URL; in-memory storage when omitted
    #[arg(long)]
    database_url: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Print a session token for NAME and exit
    #[arg(long, value_name = "NAME")]
    issue_token: Option<String>,
}

impl Args {
    /// Command line flags take precedence over file and environment
    fn apply(&self, config: &mut WebConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.dev {
            config.dev_mode = true;
        }
        if let Some(database_url) = &self.database_url {
            config.database_url = Some(database_url.clone());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    let mut config =
        WebConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    args.apply(&mut config);

    init_logging(config.dev_mode, args.log_level.as_deref());

    if let Some(name) = &args.issue_token {
        let jwt = JwtService::new(&config.jwt_secret, config.token_ttl_secs);
        let token = jwt.issue(name).context("failed to issue session token")?;
        println!("{}", token);
        return Ok(());
    }

    if let Some(db_url) = &config.database_url {
        info!("Database: {}", db_url);
    }

    let server = ServerdeskServer::new(config)
        .await
        .context("failed to build server")?;

    server.start().await.context("server failed")?;

    info!("Server shut down gracefully");
    Ok(())
}
