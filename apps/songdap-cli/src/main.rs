use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use albums::client::AlbumsApi;
use albums::domain::service::AlbumListService;
use albums::error::AlbumsError;
use albums::gateways::AlbumsLocalClient;
use albums::infra::HttpAlbumsClient;
use albums::model::{AlbumId, AlbumPage, AlbumSort};
use albums::AlbumsConfig;
use runtime::{AppConfig, CliArgs};
use songdap_http::{AuthRefreshGate, ClientOptions, GateOptions, SessionState, TracedClient};

/// Songdap client - browse and manage albums from the terminal
#[derive(Parser)]
#[command(name = "songdap-cli")]
#[command(about = "Songdap client - browse and manage albums from the terminal")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides config)
    #[arg(long)]
    base_url: Option<String>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show one page of albums
    List {
        /// LATEST, OLDEST or POPULAR (defaults to modules.albums.default_sort)
        #[arg(long)]
        sort: Option<AlbumSort>,
        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an album and show the page it leaves you on
    Delete {
        id: String,
        #[arg(long)]
        sort: Option<AlbumSort>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        json: bool,
    },
    /// Sign out of the current session
    Logout,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        base_url: cli.base_url.clone(),
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.home_dir));
    tracing::info!(base_url = %config.api.base_url, "songdap-cli starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Check) {
        Commands::List { sort, page, json } => {
            let api = albums_api(&config, sort)?;
            let shown = api.set_page(page).await.map_err(explain)?;
            print_page(&shown, json)
        }
        Commands::Delete {
            id,
            sort,
            page,
            json,
        } => {
            let api = albums_api(&config, sort)?;
            api.set_page(page).await.map_err(explain)?;
            let shown = api
                .delete_album(&AlbumId::new(id))
                .await
                .map_err(explain)?;
            print_page(&shown, json)
        }
        Commands::Logout => {
            let (gate, _) = build_gate(&config)?;
            gate.logout().await.context("logout failed")?;
            println!("Signed out");
            Ok(())
        }
        Commands::Check => check_config(&config),
    }
}

fn build_gate(config: &AppConfig) -> Result<(Arc<AuthRefreshGate>, Arc<SessionState>)> {
    let client = TracedClient::from_options(&ClientOptions {
        base_url: config.api.base_url.clone(),
        timeout: Duration::from_secs(config.api.timeout_sec),
        cookies: config.api.cookies.clone(),
        user_agent: config.api.user_agent.clone(),
    })
    .context("failed to build HTTP client")?;

    let session = Arc::new(SessionState::new());
    let gate = AuthRefreshGate::new(
        Arc::new(client),
        session.clone(),
        GateOptions {
            reissue_path: config.auth.reissue_path.clone(),
            logout_path: config.auth.logout_path.clone(),
            forbidden_signals_session_expiry: config.auth.forbidden_signals_session_expiry,
        },
    );
    Ok((Arc::new(gate), session))
}

fn albums_config(config: &AppConfig, sort: Option<AlbumSort>) -> Result<AlbumsConfig> {
    let mut albums_cfg: AlbumsConfig = if config.modules.contains_key("albums") {
        config.module_config_required("albums")?
    } else {
        AlbumsConfig::default()
    };
    if let Some(sort) = sort {
        albums_cfg.default_sort = sort;
    }
    albums_cfg.validate()?;
    Ok(albums_cfg)
}

fn albums_api(config: &AppConfig, sort: Option<AlbumSort>) -> Result<AlbumsLocalClient> {
    let albums_cfg = albums_config(config, sort)?;
    let (gate, _) = build_gate(config)?;
    let backend = Arc::new(HttpAlbumsClient::new(gate));
    let service = Arc::new(AlbumListService::new(backend, &albums_cfg));
    Ok(AlbumsLocalClient::new(service))
}

fn explain(err: AlbumsError) -> anyhow::Error {
    match err {
        AlbumsError::SessionExpired => {
            anyhow::anyhow!("{err}; refresh the cookies in api.cookies and try again")
        }
        other => other.into(),
    }
}

fn print_page(page: &AlbumPage, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(page)?);
        return Ok(());
    }

    println!(
        "Albums by {} - page {}/{} ({} total)",
        page.sort,
        page.current_page,
        page.total_pages.max(1),
        page.total_elements
    );
    for row in &page.rows {
        let title = row.title().unwrap_or("(untitled)");
        let mut line = format!("  {:>8}  {title}", row.id().as_str());
        if row.is_private() {
            line.push_str("  [private]");
        } else if let Some(count) = row.detail.as_ref().and_then(|d| d.song_count) {
            line.push_str(&format!("  ({count} songs)"));
        }
        println!("{line}");
    }
    Ok(())
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    // AppConfig::load_* already normalized & created home_dir
    build_gate(config)?;
    albums_config(config, None)?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}
