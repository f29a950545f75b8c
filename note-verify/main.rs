//! notecheck: check banknote photos against known-genuine references.

use clap::{Args, Parser, Subcommand, ValueEnum};
use note_verify::{
    JsonLinesSink, LogSink, NoteExtractor, NoteVerifier, ReportSink, VerifyConfig, init_thread_pool, loader,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "notecheck")]
#[command(about = "Score banknote images against genuine reference notes of the same denomination")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every image in a directory against the reference notes.
    Check(CheckArgs),

    /// Print keypoint statistics for a single image.
    Extract(ExtractArgs),

    /// Print the default configuration.
    DefaultConfig {
        #[arg(long, value_enum, default_value_t = ConfigFormat::Toml)]
        format: ConfigFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConfigFormat {
    Toml,
    Json,
}

#[derive(Debug, Clone, Args)]
struct CheckArgs {
    /// Directory of genuine reference notes (filename carries the denomination).
    #[arg(long)]
    references: PathBuf,

    /// Directory of notes to check.
    #[arg(long)]
    candidates: PathBuf,

    /// Configuration file (.toml or .json); flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minimum match percentage for a genuine verdict.
    #[arg(long)]
    threshold: Option<f64>,

    /// Maximum Hamming distance of a kept match.
    #[arg(long)]
    max_distance: Option<u32>,

    /// Write one JSON report per line to this file.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Write reference/candidate composites into this directory.
    #[arg(long)]
    annotate: Option<PathBuf>,

    /// Process candidates one at a time.
    #[arg(long)]
    sequential: bool,

    /// Worker threads (default: number of CPUs).
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Debug, Clone, Args)]
struct ExtractArgs {
    /// Path to the input image.
    #[arg(long)]
    image: PathBuf,

    /// Configuration file (.toml or .json).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check(args) => run_check(&args),
        Commands::Extract(args) => run_extract(&args),
        Commands::DefaultConfig { format } => run_default_config(format),
    }
}

fn load_config(path: Option<&PathBuf>) -> CliResult<VerifyConfig> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration: {}", path.display());
            Ok(VerifyConfig::load(path)?)
        }
        None => Ok(VerifyConfig::default()),
    }
}

// ── check ─────────────────────────────────────────────────────────────

fn run_check(args: &CheckArgs) -> CliResult<()> {
    let mut cfg = load_config(args.config.as_ref())?;
    if let Some(threshold) = args.threshold {
        cfg.min_match_percent = threshold;
    }
    if let Some(max_distance) = args.max_distance {
        cfg.max_match_distance = max_distance;
    }
    if let Some(threads) = args.threads {
        cfg.extractor.n_threads = threads;
    }
    if args.sequential {
        cfg.parallel = false;
    }
    cfg.validate()?;
    init_thread_pool(cfg.extractor.n_threads)?;
    tracing::info!("{}", cfg.summary());

    let t0 = Instant::now();
    let mut verifier = NoteVerifier::from_reference_dir(&cfg, &args.references)?;
    tracing::info!(
        "Catalog built from {} in {:.2?}",
        args.references.display(),
        t0.elapsed()
    );
    if let Some(dir) = &args.annotate {
        verifier = verifier.with_annotate_dir(dir);
    }

    let t1 = Instant::now();
    let reports = verifier.verify_dir(&args.candidates, &mut LogSink)?;
    tracing::info!("Checked {} candidates in {:.2?}", reports.len(), t1.elapsed());

    if let Some(path) = &args.json {
        let mut sink = JsonLinesSink::new(BufWriter::new(File::create(path)?));
        for report in &reports {
            sink.report(report)?;
        }
        sink.finish()?;
        tracing::info!("Reports written to {}", path.display());
    }

    Ok(())
}

// ── extract ───────────────────────────────────────────────────────────

fn run_extract(args: &ExtractArgs) -> CliResult<()> {
    let cfg = load_config(args.config.as_ref())?;
    let extractor = NoteExtractor::new(cfg.extractor.clone())?;

    let img = loader::load_gray(&args.image)?;
    println!("Image: {} ({}x{})", args.image.display(), img.width(), img.height());

    let t0 = Instant::now();
    let set = extractor.extract(&img)?;
    let elapsed = t0.elapsed();

    println!("Time taken: {:.2?}", elapsed);
    println!("Detected {} keypoints", set.len());
    for level in 0..cfg.extractor.n_levels {
        let count = set.keypoints().iter().filter(|kp| kp.octave as usize == level).count();
        if count > 0 {
            println!("  level {level}: {count}");
        }
    }
    if let (Some(first), Some(last)) = (set.keypoints().first(), set.keypoints().last()) {
        println!("Response range: {:.1} .. {:.1}", last.response, first.response);
    }

    Ok(())
}

// ── default-config ────────────────────────────────────────────────────

fn run_default_config(format: ConfigFormat) -> CliResult<()> {
    let cfg = VerifyConfig::default();
    let text = match format {
        ConfigFormat::Toml => cfg.to_toml()?,
        ConfigFormat::Json => cfg.to_json()?,
    };
    println!("{text}");
    Ok(())
}
