use std::{io, path::PathBuf, sync::Arc};

use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use colored::Colorize;
use framegrab::{
    ExtractOptions, ExtractionReport, FfmpegLogLevel, FrameOutcome, ImageFormat, PixelFormat,
    ProgressCallback, ProgressInfo,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  framegrab input.mp4 --out extracted_frames\n  framegrab input.mp4 --out thumbs --count 12 --format png --width 320 --progress\n  framegrab input.mkv --out frames --json\n  framegrab --completions zsh > _framegrab";

#[derive(Debug, Parser)]
#[command(
    name = "framegrab",
    version,
    about = "Extract evenly spaced still frames from a video",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Input video path.
    #[arg(required_unless_present = "completions")]
    input: Option<PathBuf>,

    /// Output directory (created if missing).
    #[arg(long, default_value = "extracted_frames")]
    out: PathBuf,

    /// Number of evenly spaced frames to extract.
    #[arg(long, short = 'n', default_value_t = framegrab::DEFAULT_IMAGE_COUNT)]
    count: u32,

    /// Output image extension (jpg, png, bmp, tiff, webp).
    #[arg(long, default_value = "jpg")]
    format: String,

    /// File name prefix.
    #[arg(long, default_value = framegrab::DEFAULT_FILE_PREFIX)]
    prefix: String,

    /// Output width in pixels (height follows the aspect ratio unless given).
    #[arg(long)]
    width: Option<u32>,

    /// Output height in pixels.
    #[arg(long)]
    height: Option<u32>,

    /// Write grayscale images.
    #[arg(long)]
    gray: bool,

    /// Show a progress bar.
    #[arg(long)]
    progress: bool,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,

    /// Show library log output on stderr.
    #[arg(long)]
    verbose: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long)]
    log_level: Option<FfmpegLogLevel>,

    /// Print a shell completion script and exit.
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,
}

struct BarProgress {
    bar: ProgressBar,
}

impl ProgressCallback for BarProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_position(info.current);
        self.bar.set_message(format!("{} saved", info.saved));
        if info.current_timestamp.is_none() {
            self.bar.finish();
        }
    }
}

fn build_options(
    cli: &Cli,
) -> Result<(ExtractOptions, Option<ProgressBar>), Box<dyn std::error::Error>> {
    let format = ImageFormat::from_extension(&cli.format)
        .ok_or_else(|| format!("unsupported --format: {}", cli.format))?;

    let mut options = ExtractOptions::new()
        .with_count(cli.count)
        .with_image_format(format)
        .with_file_prefix(cli.prefix.as_str())
        .with_resolution(cli.width, cli.height);

    if cli.gray {
        options = options.with_pixel_format(PixelFormat::Gray8);
    }

    let bar = if cli.progress && !cli.json {
        let bar = ProgressBar::new(u64::from(cli.count));
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        options = options.with_progress(Arc::new(BarProgress { bar: bar.clone() }));
        Some(bar)
    } else {
        None
    };

    Ok((options, bar))
}

fn report_to_json(report: &ExtractionReport) -> serde_json::Value {
    let outcomes: Vec<_> = report
        .outcomes
        .iter()
        .map(|outcome| match outcome {
            FrameOutcome::Saved(saved) => json!({
                "timestamp_seconds": saved.timestamp.as_secs_f64(),
                "status": "saved",
                "index": saved.index,
                "path": saved.path.display().to_string(),
            }),
            FrameOutcome::Failed(failure) => json!({
                "timestamp_seconds": failure.timestamp.as_secs_f64(),
                "status": "failed",
                "stage": failure.kind.to_string(),
                "message": failure.message,
            }),
        })
        .collect();

    json!({
        "requested": report.requested,
        "saved": report.saved_count(),
        "duration_seconds": report.duration.as_secs_f64(),
        "destination": report.destination.display().to_string(),
        "frames": outcomes,
    })
}

fn print_report(report: &ExtractionReport) {
    for outcome in &report.outcomes {
        match outcome {
            FrameOutcome::Saved(saved) => {
                println!("{} {}", "Saved:".green().bold(), saved.path.display());
            }
            FrameOutcome::Failed(failure) => {
                eprintln!("{} {}", "error:".red().bold(), failure);
            }
        }
    }

    let summary = report.to_string();
    if report.is_complete() {
        println!("{}", summary.green());
    } else {
        println!("{}", summary.yellow());
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut command = Cli::command();
        clap_complete::generate(shell, &mut command, "framegrab", &mut io::stdout());
        return Ok(());
    }

    if cli.verbose {
        env_logger::Builder::new()
            .filter_module("framegrab", log::LevelFilter::Debug)
            .init();
    }

    if let Some(level) = cli.log_level {
        framegrab::set_ffmpeg_log_level(level);
    }

    let input = cli.input.as_ref().ok_or("missing input video path")?;
    let (options, bar) = build_options(&cli)?;

    let result = framegrab::extract_with_options(input, &cli.out, &options);
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    let report = result?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report_to_json(&report))?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
