use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use tierscale::process::{BatchFailure, ItemOutput, ProcessEvent};
use tierscale::scan::MediaKind;
use tierscale::types::Dimensions;
use tierscale::{config, output, process, scan};
use tracing_subscriber::EnvFilter;

/// Flags shared by the processing commands.
#[derive(clap::Args)]
struct BatchArgs {
    /// Source files or directories (directories are walked recursively)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    out: PathBuf,

    /// Output format, repeatable (overrides the config file)
    #[arg(short, long = "format", value_name = "FORMAT")]
    formats: Vec<String>,

    /// Print the result sets as JSON instead of the listing
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
#[command(name = "tierscale")]
#[command(version)]
#[command(about = "Resize images and videos into S/M/L/XL size tiers")]
#[command(long_about = "\
Resize images and videos into S/M/L/XL size tiers

Every source is compared against an ascending list of size caps. Each tier
that needs scaling is written once per output format, named after the source
with the tier label in front of the extension:

  beach.jpg (2000x1000), caps 200/500/1000, formats jpg + webp

    out/beach.S.jpg   out/beach.S.webp     200x100
    out/beach.M.jpg   out/beach.M.webp     500x250
    out/beach.L.jpg   out/beach.L.webp     1000x500

Images stop after the first cap they already fit and always get their own
format too. Videos are transcoded with ffmpeg for every tier.

Settings are read from ./tierscale.toml (or --config FILE).
Run 'tierscale gen-config' to generate a documented config file.")]
struct Cli {
    /// Config file (default: ./tierscale.toml if present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log diagnostics to stderr (silent otherwise, unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resize images into tiers and formats
    Images {
        #[command(flatten)]
        batch: BatchArgs,

        /// Encoder quality (above 100 clamps, negative = codec default)
        #[arg(short, long, allow_negative_numbers = true)]
        quality: Option<i32>,
    },
    /// Transcode videos into tiers and containers
    Videos {
        #[command(flatten)]
        batch: BatchArgs,

        /// Video bitrate in kbit/s (0 or negative = encoder default)
        #[arg(short, long, allow_negative_numbers = true)]
        bitrate: Option<i32>,
    },
    /// Show the tiers a source of the given size would produce
    Plan {
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        /// Plan as a video (every tier, even sizes)
        #[arg(long)]
        video: bool,
    },
    /// Check that ffprobe and ffmpeg are available
    Check,
    /// Print a stock tierscale.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Images { batch, quality } => {
            let mut config = load_config(cli.config.as_deref())?;
            if !batch.formats.is_empty() {
                config.images.formats = batch.formats.clone();
            }
            if let Some(q) = quality {
                config.images.quality = q;
            }
            config.validate()?;
            let settings = config.image_settings()?;

            let inputs = scan::collect_inputs(&batch.inputs, MediaKind::Image)?;
            let items = scan::batch_items(&inputs, &batch.out)?;
            let result = run_with_printer(batch.json, |tx| {
                process::process_images(&items, &settings, tx)
            });
            finish(result, batch.json)?;
        }
        Command::Videos { batch, bitrate } => {
            let mut config = load_config(cli.config.as_deref())?;
            if !batch.formats.is_empty() {
                config.videos.formats = batch.formats.clone();
            }
            if let Some(b) = bitrate {
                config.videos.bitrate = b;
            }
            config.validate()?;
            let settings = config.video_settings();
            let tool = config.media_tool();

            let inputs = scan::collect_inputs(&batch.inputs, MediaKind::Video)?;
            let items = scan::batch_items(&inputs, &batch.out)?;
            let result = run_with_printer(batch.json, |tx| {
                process::process_videos(&tool, &items, &settings, tx)
            });
            finish(result, batch.json)?;
        }
        Command::Plan {
            width,
            height,
            video,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let source = Dimensions::new(width, height);
            let plan = if video {
                process::video_plan(source, &config.tiers)
            } else {
                process::image_plan(source, &config.tiers)
            };
            output::print_plan(source, &plan);
        }
        Command::Check => {
            let config = load_config(cli.config.as_deref())?;
            let statuses = config.media_tool().check();
            output::print_tool_check(&statuses);
            if statuses.iter().any(|s| !s.available()) {
                return Err("video processing needs both ffprobe and ffmpeg".into());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log filter used when `RUST_LOG` is not set. Without `--verbose` nothing
/// is logged; failures reach the user through the command's own output.
fn default_filter(verbose: bool) -> &'static str {
    if verbose { "warn,tierscale=debug" } else { "off" }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(explicit: Option<&Path>) -> Result<config::TierscaleConfig, config::ConfigError> {
    config::load_config(explicit, &std::env::current_dir()?)
}

/// Run a batch while a printer thread lists each item as it completes.
/// In JSON mode nothing is printed until the end.
fn run_with_printer(
    json: bool,
    run: impl FnOnce(Option<Sender<ProcessEvent>>) -> Result<Vec<ItemOutput>, BatchFailure>,
) -> Result<Vec<ItemOutput>, BatchFailure> {
    if json {
        return run(None);
    }

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_process_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = run(Some(tx));
    // The sender is gone once `run` returns, so the printer drains and exits.
    if printer.join().is_err() {
        eprintln!("warning: output thread panicked");
    }
    result
}

fn finish(
    result: Result<Vec<ItemOutput>, BatchFailure>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    match result {
        Ok(outputs) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&outputs)?);
            } else {
                output::print_summary(&outputs);
            }
            Ok(())
        }
        Err(failure) => {
            let mut produced = failure.completed.clone();
            produced.push(failure.failure.partial.clone());
            if json {
                println!("{}", serde_json::to_string_pretty(&produced)?);
            } else {
                output::print_summary(&produced);
            }
            Err(failure.to_string().into())
        }
    }
}
