//! lapwing: highlight edges in a batch of raster images.
//!
//! Every input is convolved with a 3x3 Laplacian and written as a PNG
//! named after the input into the output directory (`output/` by
//! default). Inputs that cannot be read, decoded or written are
//! reported and skipped; the run still succeeds with whatever it
//! managed to produce.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin lapwing -- [OPTIONS] <INPUT>...
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use lapwing_engine::{BatchRunner, EngineConfig, KernelKind};
use lapwing_io::{DEFAULT_OUTPUT_DIR, FileSource, PngDirSink, derive_output_name, ensure_output_dir};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

/// Highlight edges in raster images with a Laplacian filter.
///
/// Each input is written to `<OUTPUT_DIR>/<name>.png`, where `<name>` is
/// the input file name up to its first dot.
#[derive(Parser)]
#[command(name = "lapwing", version)]
struct Cli {
    /// Input images (PNG, JPEG, GIF, BMP, WebP).
    #[arg(required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Directory outputs are written to. Created if missing.
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Convolution kernel.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_KERNEL)]
    kernel: KernelArg,

    /// Row bands per image [default: number of CPUs].
    #[arg(long)]
    band_workers: Option<NonZeroUsize>,

    /// Images processed at once [default: number of CPUs].
    #[arg(long)]
    image_workers: Option<NonZeroUsize>,

    /// Full engine config as a JSON string.
    ///
    /// When provided, `--band-workers` and `--image-workers` are ignored.
    /// Missing fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Print the batch report as JSON on stdout instead of a summary.
    #[arg(long)]
    json: bool,

    /// Log level for progress and diagnostics on stderr.
    #[arg(long, default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,
}

/// Kernel selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum KernelArg {
    /// 8-neighbor Laplacian (diagonals included).
    Laplacian8,
    /// 4-neighbor Laplacian.
    Laplacian4,
}

/// Maps a [`KernelKind`] to the local CLI [`KernelArg`] enum.
const fn kernel_arg_from_kind(kind: KernelKind) -> KernelArg {
    match kind {
        KernelKind::Laplacian8 => KernelArg::Laplacian8,
        KernelKind::Laplacian4 => KernelArg::Laplacian4,
    }
}

/// The CLI default kernel, derived from the engine's default so the two
/// cannot silently diverge.
const CLI_DEFAULT_KERNEL: KernelArg = kernel_arg_from_kind(KernelKind::Laplacian8);

impl From<KernelArg> for KernelKind {
    fn from(arg: KernelArg) -> Self {
        match arg {
            KernelArg::Laplacian8 => Self::Laplacian8,
            KernelArg::Laplacian4 => Self::Laplacian4,
        }
    }
}

/// Build an [`EngineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual worker flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<EngineConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    let defaults = EngineConfig::default();
    Ok(EngineConfig {
        band_workers: cli.band_workers.unwrap_or(defaults.band_workers),
        image_workers: cli.image_workers.unwrap_or(defaults.image_workers),
    })
}

/// Inputs that would overwrite each other's output, keyed by output name.
fn colliding_outputs(inputs: &[PathBuf]) -> BTreeMap<String, Vec<&PathBuf>> {
    let mut by_name: BTreeMap<String, Vec<&PathBuf>> = BTreeMap::new();
    for input in inputs {
        by_name.entry(derive_output_name(input)).or_default().push(input);
    }
    by_name.retain(|_, paths| paths.len() > 1);
    by_name
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = TermLogger::init(
        cli.log_level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        eprintln!("Cannot initialize logging: {e}");
    }

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            log::error!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = ensure_output_dir(&cli.output_dir) {
        log::error!("{e}");
        return ExitCode::FAILURE;
    }

    let kernel = KernelKind::from(cli.kernel).kernel();
    let runner = match BatchRunner::new(kernel, &config) {
        Ok(r) => r,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    for (name, paths) in colliding_outputs(&cli.inputs) {
        log::warn!(
            "{} inputs share the output name {name}.png; only one will survive",
            paths.len(),
        );
    }

    let sources: Vec<FileSource> = cli.inputs.iter().map(FileSource::new).collect();
    let sink = PngDirSink::new(&cli.output_dir);

    // Files are opened lazily on the workers; each one logs "Opened ..."
    // before it is convolved and "Saved ..." once written.
    log::info!("Opening images...");
    log::info!("Processing images...");
    log::debug!(
        "{} inputs, {} at a time, {} bands each",
        sources.len(),
        config.image_workers,
        config.band_workers,
    );
    let report = runner.run(&sources, &sink);

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                log::error!("Error serializing report: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{}", report.summary());
    }

    log::info!("Done.");
    ExitCode::SUCCESS
}
