//! TileStitch CLI - Command-line interface
//!
//! Downloads every tile of a IIIF image and saves the reassembled picture.
//!
//! ```text
//! tilestitch https://www.artic.edu/iiif/2/831a05de-d3f6-f4fa-a460-23008dd58dda
//! tilestitch <BASE> --width 4000 --height 3000 --workers 4 --format png
//! ```

mod error;
mod output;
mod progress;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tilestitch::config::{ConfigFile, StitchConfig};
use tilestitch::coordinator::{RunCoordinator, StitchRequest};
use tilestitch::locator::{ImageFormat, ResourceId};
use tilestitch::logging::{default_log_dir, default_log_file, init_logging};
use tilestitch::provider::{fetch_image_info, AsyncReqwestClient, ReqwestClientFactory};
use tilestitch::tile::tile_count;
use tilestitch::StitchError;

use error::CliError;

#[derive(Parser, Debug)]
#[command(name = "tilestitch")]
#[command(version, about = "Reassemble full-resolution images from IIIF tile servers")]
struct Args {
    /// Base identifier of the image, e.g. https://www.artic.edu/iiif/2/<id>
    base: ResourceId,

    /// Full image width in pixels (looked up from info.json if omitted)
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Full image height in pixels (looked up from info.json if omitted)
    #[arg(long, requires = "width")]
    height: Option<u32>,

    /// Number of concurrent download workers
    #[arg(long)]
    workers: Option<usize>,

    /// Tile encoding to request and save (jpg or png)
    #[arg(long)]
    format: Option<ImageFormat>,

    /// Edge length of each tile in pixels
    #[arg(long)]
    tile_size: Option<u32>,

    /// Seconds to wait before retrying a refused tile
    #[arg(long, value_name = "SECS")]
    retry_delay: Option<u64>,

    /// Give up after this many attempts per tile (default: retry forever)
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Make every worker pause when any of them is throttled
    #[arg(long)]
    shared_backoff: bool,

    /// Output file (default: <output dir>/<image id>.<format>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (default: <config dir>/tilestitch/config.ini)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        e.exit();
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let _logging = init_logging(Path::new(default_log_dir()), default_log_file(), args.verbose)
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

    let file = load_config_file(args.config.as_deref())?;
    let config = resolve_config(&args, &file);
    config
        .validate()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))?;

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("Received interrupt, stopping workers...");
        handler_token.cancel();
    })
    .map_err(|e| CliError::Runtime(format!("failed to install Ctrl-C handler: {}", e)))?;

    let (width, height) = match (args.width, args.height) {
        (Some(width), Some(height)) => (width, height),
        _ => runtime.block_on(lookup_dimensions(&args.base, config.timeout, &cancel))?,
    };

    let format = config.format;
    let path = output::resolve_output_path(
        args.output.as_deref(),
        &file.output.directory,
        &args.base,
        format,
    );
    info!(
        resource = %args.base,
        width,
        height,
        output = %path.display(),
        "Starting download"
    );

    let bar = progress::tile_bar(tile_count(width, height, config.tile_size) as u64);
    let factory = ReqwestClientFactory::new(config.timeout.as_secs().max(1));
    let coordinator =
        RunCoordinator::new(config, factory).with_observer(progress::bar_observer(bar.clone()));

    let result = runtime.block_on(coordinator.run(
        StitchRequest::new(args.base.clone(), width, height),
        cancel,
    ));
    bar.finish_and_clear();
    let outcome = result.map_err(CliError::Stitch)?;

    output::persist(&outcome.canvas.into_image(), &path)?;

    let report = outcome.report;
    println!(
        "Saved {} ({}x{}, {} tiles, {} throttled responses, {:.1} MB) in {:.1}s",
        path.display(),
        width,
        height,
        report.tiles,
        report.throttled,
        report.bytes as f64 / 1_048_576.0,
        report.elapsed.as_secs_f64()
    );
    Ok(())
}

/// Loads the explicit config file, or the default one if it exists.
fn load_config_file(explicit: Option<&Path>) -> Result<ConfigFile, CliError> {
    match explicit {
        Some(path) if !path.exists() => Err(CliError::Config(format!(
            "config file '{}' not found",
            path.display()
        ))),
        Some(path) => Ok(ConfigFile::load(path)?),
        None => Ok(ConfigFile::load_default()?),
    }
}

/// Layers CLI flags over the config file over built-in defaults.
fn resolve_config(args: &Args, file: &ConfigFile) -> StitchConfig {
    let mut config = StitchConfig::from_config_file(file);

    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    if let Some(format) = args.format {
        config = config.with_format(format);
    }
    if let Some(tile_size) = args.tile_size {
        config = config.with_tile_size(tile_size);
    }
    if let Some(secs) = args.retry_delay {
        config.retry.delay = Duration::from_secs(secs);
    }
    if let Some(max) = args.max_attempts {
        config.retry = config.retry.with_max_attempts(max);
    }
    if args.shared_backoff {
        config = config.with_shared_backoff(true);
    }

    config
}

async fn lookup_dimensions(
    resource: &ResourceId,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<(u32, u32), CliError> {
    let client = AsyncReqwestClient::with_timeout(timeout.as_secs().max(1))
        .map_err(|e| CliError::Metadata(e.into()))?;

    let info = tokio::select! {
        _ = cancel.cancelled() => return Err(CliError::Stitch(StitchError::Cancelled)),
        info = fetch_image_info(&client, resource) => info.map_err(CliError::Metadata)?,
    };

    if !info.formats.is_empty() {
        info!(formats = ?info.formats, "Server advertises extra formats");
    }
    if info.width == 0 || info.height == 0 {
        warn!(width = info.width, height = info.height, "Server reported an empty image");
    }
    Ok((info.width, info.height))
}
