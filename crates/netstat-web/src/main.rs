//! FreeMobile Netstat dashboard server and renderer

#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};
use netstat_core::{
    Config, DateRange, context_error,
    context_error::{Result, ResultExt},
    init_logging,
    utils::today_in,
};
use netstat_web::{
    Dashboard, HttpUsageFetcher, RangeEdit, RangeSelector, build_app,
    view::{InstantAnimator, TimedAnimator},
};
use std::{
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Command line interface of the dashboard
#[derive(Parser)]
#[command(
    name = "netstat-web-server",
    version = env!("CARGO_PKG_VERSION"),
    about = "Network usage dashboard for FreeMobile Netstat"
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable structured JSON logging
    #[arg(long)]
    json: bool,

    /// Subcommand, `serve` when omitted
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard over HTTP
    Serve {
        /// Listen address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Listen port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Fetch usage once and write the charts and page to a directory
    Render {
        /// First day, DD/MM/YYYY
        #[arg(long)]
        start: Option<String>,

        /// Last day, DD/MM/YYYY
        #[arg(long)]
        end: Option<String>,

        /// Output directory
        #[arg(short, long, default_value = "dashboard")]
        out: PathBuf,
    },

    /// Read `DD/MM/YYYY - DD/MM/YYYY` ranges from stdin and refresh on each
    Watch {
        /// Directory the final page is written to
        #[arg(short, long, default_value = "dashboard")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (for development convenience)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Note: .env file not loaded: {e}");
    }

    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_else(|err| {
        eprintln!("Failed to load config ({err}), using defaults");
        Config::default()
    });
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if cli.json {
        config.logging.format = "json".to_string();
    }
    init_logging(&config.logging)?;

    match cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
    }) {
        Commands::Serve { host, port } => serve(config, host, port).await,
        Commands::Render { start, end, out } => render(&config, start, end, &out).await,
        Commands::Watch { out } => watch(&config, &out).await,
    }
}

async fn serve(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.webserver.host = host;
    }
    if let Some(port) = port {
        config.webserver.port = port;
    }

    let host: IpAddr = config.webserver.host.parse().map_err(|e| {
        context_error!("Invalid web server host '{}': {}", config.webserver.host, e)
    })?;
    let addr = SocketAddr::new(host, config.webserver.port);
    let api_base_url = config.webserver.api_base_url.clone();

    let app = build_app(config)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        %api_base_url,
        "Starting FreeMobile Netstat dashboard on {}", addr
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Received Ctrl+C, shutting down gracefully...");
        })
        .await
        .with_context(|| "Server error")?;

    Ok(())
}

fn fetcher(config: &Config) -> Result<Arc<HttpUsageFetcher>> {
    let fetcher = HttpUsageFetcher::new(
        config.webserver.api_base_url.clone(),
        Duration::from_secs(config.webserver.fetch_timeout),
    )
    .with_context(|| "Failed to create API client")?;
    Ok(Arc::new(fetcher))
}

async fn render(
    config: &Config,
    start: Option<String>,
    end: Option<String>,
    out: &Path,
) -> Result<()> {
    let today = today_in(&config.stats.tz()?);
    let range = match (start, end) {
        (Some(start), Some(end)) => RangeEdit::new(start, end).parse()?,
        (None, None) => DateRange::ending_at(today, config.dashboard.default_window_days),
        _ => return Err(context_error!("--start and --end must be given together")),
    };

    let mut dashboard = Dashboard::new(fetcher(config)?, InstantAnimator);
    dashboard.refresh(range).await;
    let page = dashboard.into_page();
    page.write_to(out)
        .await
        .with_context(|| format!("Failed to write {}", out.display()))?;

    if page.global_chart().is_none() {
        return Err(context_error!(
            "Usage data unavailable for {}; see {}",
            range.cache_key(),
            out.join("index.html").display()
        ));
    }
    info!(out = %out.display(), "Dashboard written");
    Ok(())
}

async fn watch(config: &Config, out: &Path) -> Result<()> {
    let today = today_in(&config.stats.tz()?);
    let mut selector = RangeSelector::new(today, config.dashboard.default_window_days);
    let changes = selector.subscribe();
    let mut dashboard = Dashboard::new(fetcher(config)?, TimedAnimator::new(&config.dashboard));

    let reader = tokio::spawn(async move {
        selector.set_range(selector.range());
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            match selector.commit(&RangeEdit::from_display(&line)) {
                Ok(range) => info!(range = %selector.display(), days = range.day_count(), "Range selected"),
                Err(e) => warn!("Ignoring range {:?}: {}", line, e),
            }
        }
    });

    dashboard.run(changes).await;
    reader.await.with_context(|| "Range reader failed")?;

    dashboard
        .page()
        .write_to(out)
        .await
        .with_context(|| format!("Failed to write {}", out.display()))?;
    info!(out = %out.display(), "Dashboard written");
    Ok(())
}
