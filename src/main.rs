use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dance_vocab_uploader::config::{AppConfig, CliConfig, FileConfig};
use dance_vocab_uploader::entry_store::{FsBlobStore, LocalEntryStore, SqliteEntryStore};
use dance_vocab_uploader::media::{MAX_THUMBNAIL_SIZE, MAX_VIDEO_SIZE};
use dance_vocab_uploader::server::{run_server, RequestsLoggingLevel, ServerConfig};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Its values override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory holding entries.db.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Root directory of stored videos and thumbnails. Defaults to <db-dir>/media.
    #[clap(long, value_parser = parse_path)]
    pub media_path: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Largest accepted video, in bytes.
    #[clap(long, default_value_t = MAX_VIDEO_SIZE)]
    pub max_video_size: u64,

    /// Largest accepted thumbnail, in bytes.
    #[clap(long, default_value_t = MAX_THUMBNAIL_SIZE)]
    pub max_thumbnail_size: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let cli_config = CliConfig {
        db_dir: cli_args.db_dir,
        media_path: cli_args.media_path,
        port: cli_args.port,
        logging_level: cli_args.logging_level,
        frontend_dir_path: cli_args.frontend_dir_path,
        max_video_size: cli_args.max_video_size,
        max_thumbnail_size: cli_args.max_thumbnail_size,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    let records = SqliteEntryStore::new(config.entries_db_path())?;
    info!(
        "Entries database ready with {} entries, media under {:?}",
        records.count()?,
        config.media_path
    );
    let entry_store = LocalEntryStore::new(records, FsBlobStore::new(&config.media_path));

    let server_config = ServerConfig {
        requests_logging_level: config.logging_level,
        port: config.port,
        frontend_dir_path: config.frontend_dir_path,
        limits: config.limits,
    };
    info!("Starting server on port {}...", server_config.port);
    run_server(server_config, entry_store).await
}
