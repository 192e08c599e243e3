use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notes_viewer::{api, config::Config, publish::Publisher};

#[derive(Parser)]
#[command(name = "notes-viewer")]
#[command(about = "Publish a directory of HTML notes as a browsable collection")]
struct Cli {
    #[command(flatten)]
    paths: PathArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Directory overrides shared by every subcommand.
#[derive(Args)]
struct PathArgs {
    /// Project root containing the notes directory
    #[arg(long, global = true)]
    project_root: Option<PathBuf>,

    /// Notes root (skips the default candidate search)
    #[arg(long, global = true)]
    notes_dir: Option<PathBuf>,

    /// Directory holding index.html, viewer.js and viewer.css
    #[arg(long, global = true)]
    viewer_dir: Option<PathBuf>,

    /// Publish directory
    #[arg(long, global = true)]
    public_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Stage notes into the publish directory and write files.json
    Build {
        /// Delete staged notes that no longer exist in the source tree
        #[arg(long)]
        prune: bool,
    },
    /// Serve notes with live change detection
    Serve {
        /// Port for HTTP
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind
        #[arg(long)]
        host: Option<String>,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "notes_viewer=info,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config(paths: PathArgs) -> Config {
    let mut config = Config::from_env();
    if paths.project_root.is_some() {
        config.project_root = paths.project_root;
    }
    if paths.notes_dir.is_some() {
        config.notes_dir = paths.notes_dir;
    }
    if paths.viewer_dir.is_some() {
        config.viewer_dir = paths.viewer_dir;
    }
    if paths.public_dir.is_some() {
        config.public_dir = paths.public_dir;
    }
    config
}

fn build(config: &Config, prune: bool) -> anyhow::Result<()> {
    let layout = config.resolve()?;
    let report = Publisher::from_layout(&layout).with_prune(prune).build()?;

    tracing::info!(
        "Build complete: {} documents, {} assets, {} failed, {} pruned",
        report.manifest.len(),
        report.assets.len(),
        report.failed.len(),
        report.pruned.len()
    );
    Ok(())
}

async fn serve(config: &Config) -> anyhow::Result<()> {
    let layout = config.resolve()?;

    // Static fallback serves relative to the notes root.
    std::env::set_current_dir(&layout.notes_dir)?;

    let state = api::AppState::from_layout(&layout);
    let tracked = state.establish_baseline();
    tracing::info!("Watching {} documents in {}", tracked, layout.notes_dir.display());

    let app = api::create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Notes viewer listening on http://{}", addr);
    tracing::info!("Open http://localhost:{}/index.html", config.port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = load_config(cli.paths);

    match cli.command {
        Some(Commands::Build { prune }) => build(&config, prune)?,
        Some(Commands::Serve { port, host }) => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(host) = host {
                config.host = host;
            }
            serve(&config).await?;
        }
        None => serve(&config).await?,
    }

    Ok(())
}
