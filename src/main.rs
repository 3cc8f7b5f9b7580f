//! treesum - Parallel content checksums for whole directory trees.
//!
//! Usage:
//!   treesum scan <LOCATION>             Print a checksum for every file
//!   treesum write <LOCATION> -o FILE    Stream checksums to a JSON-lines file
//!   treesum bench <LOCATION> --runs N   Time repeated scans
//!   treesum --help                      Show help
//!
//! LOCATION is a local directory or an smb://host/share/path URL.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::thread;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail, eyre};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use treesum_core::{
    ChecksumConfig, ChecksumReport, DEFAULT_MAX_BATCH_BYTES, HashAlgorithm, SplitPolicy,
};
use treesum_scan::Checksummer;
use treesum_storage::{
    Backend, Location, MountedShareClient, SHARE_SCHEME, ShareCredential, ShareStorage,
};

/// File count threshold used when `--policy count` is given without `--threshold`.
const DEFAULT_MAX_FILES: usize = 64;

#[derive(Parser)]
#[command(
    name = "treesum",
    version,
    about = "Parallel content checksums for whole directory trees",
    long_about = "treesum computes a digest for every regular file below a directory, \
                  on local disk or on a network share, splitting large batches of files \
                  across all cores."
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute checksums and print them sorted by path
    Scan {
        #[command(flatten)]
        target: Target,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Stream checksums to a JSON-lines file as they are computed
    Write {
        #[command(flatten)]
        target: Target,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Run the same scan several times and report timing
    Bench {
        #[command(flatten)]
        target: Target,

        /// Number of runs
        #[arg(short = 'n', long, default_value = "5")]
        runs: usize,
    },
}

/// Where to scan and how.
#[derive(Args)]
struct Target {
    /// Directory path or smb://host/share/path URL
    location: String,

    /// TOML configuration file; command-line options override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Digest algorithm (md5, sha1, sha256, blake3)
    #[arg(short, long, value_parser = HashAlgorithm::parse)]
    algorithm: Option<HashAlgorithm>,

    /// Read chunk size in bytes
    #[arg(long)]
    buffer_size: Option<usize>,

    /// Batch splitting policy
    #[arg(long)]
    policy: Option<PolicyKind>,

    /// Split threshold: a file count, or a size such as "8MB"
    #[arg(long)]
    threshold: Option<String>,

    /// Number of groups an oversized batch is split into
    #[arg(long)]
    branch_factor: Option<usize>,

    /// Worker threads (0 = one per core)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Mount point of the share, for smb:// locations
    #[arg(long)]
    mount: Option<PathBuf>,

    /// File holding a `[DOMAIN;]user[:password]` share credential
    #[arg(long)]
    credentials: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyKind {
    Count,
    Size,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Command::Scan { target, format } => run_scan(&target, format),
        Command::Write { target, output } => run_write(&target, &output),
        Command::Bench { target, runs } => run_bench(&target, runs),
    }
}

fn setup_logging(verbose: bool) {
    let default = if verbose {
        "treesum=debug,treesum_scan=debug,treesum_storage=debug,warn"
    } else {
        "treesum=info,treesum_scan=info,treesum_storage=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// Compute checksums and print them.
fn run_scan(target: &Target, format: OutputFormat) -> Result<()> {
    let (checksummer, backend) = prepare(target)?;

    let report = checksummer
        .checksums(&backend, &backend.root_entry())
        .context("Scan failed")?;

    match format {
        OutputFormat::Text => {
            for record in report.sorted_records() {
                println!(
                    "{}  {:>12}  {}",
                    record.digest, record.file_size, record.relative_path
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report.sorted_records())?);
        }
    }

    print_summary(&report);
    finish(&report)
}

/// Stream checksums to a file.
fn run_write(target: &Target, output: &Path) -> Result<()> {
    let (checksummer, backend) = prepare(target)?;

    let file = File::create(output)
        .with_context(|| format!("Cannot create {}", output.display()))?;
    let report = checksummer
        .write_checksums(&backend, &backend.root_entry(), file)
        .context("Scan failed")?;

    print_summary(&report);
    eprintln!("Wrote {}", output.display());
    finish(&report)
}

/// Time repeated scans.
fn run_bench(target: &Target, runs: usize) -> Result<()> {
    let (checksummer, backend) = prepare(target)?;

    eprintln!(
        "Benchmarking {} ({} runs, {}, {} threads)...",
        backend.root_entry().path(),
        runs,
        checksummer.config().algorithm,
        checksummer.num_threads()
    );

    let bench = checksummer
        .benchmark(&backend, &backend.root_entry(), runs)
        .context("Benchmark failed")?;
    let timing = bench.timing;

    println!();
    println!("{}", "─".repeat(60));
    println!(
        " {} files, {}",
        bench.last.stats.files_hashed,
        format_size(bench.last.stats.bytes_hashed)
    );
    println!(
        " mean {:.3}s  std dev {:.3}s  min {:.3}s  max {:.3}s",
        timing.mean.as_secs_f64(),
        timing.std_dev.as_secs_f64(),
        timing.min.as_secs_f64(),
        timing.max.as_secs_f64()
    );
    let mean = timing.mean.as_secs_f64();
    if mean > 0.0 {
        println!(
            " {}/s",
            format_size((bench.last.stats.bytes_hashed as f64 / mean) as u64)
        );
    }
    println!("{}", "─".repeat(60));

    for (i, sample) in bench.samples.iter().enumerate() {
        debug!(run = i + 1, secs = sample.as_secs_f64(), "Run time");
    }

    finish(&bench.last)
}

/// Build the checksummer and open the backend named by the target.
fn prepare(target: &Target) -> Result<(Checksummer, Backend)> {
    let config = build_config(target)?;
    let checksummer = Checksummer::new(config).context("Invalid configuration")?;
    let backend = open_backend(target)?;

    let mut progress_rx = checksummer.subscribe();
    thread::spawn(move || {
        loop {
            match progress_rx.blocking_recv() {
                Ok(progress) if !progress.current_path.is_empty() => info!(
                    files = progress.files_hashed,
                    bytes = %format_size(progress.bytes_hashed),
                    errors = progress.errors_count,
                    "Hashing..."
                ),
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }
    });

    Ok((checksummer, backend))
}

/// Load the config file, then apply command-line overrides.
fn build_config(target: &Target) -> Result<ChecksumConfig> {
    let mut config = match &target.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Cannot read config {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => ChecksumConfig::default(),
    };

    if let Some(algorithm) = target.algorithm {
        config.algorithm = algorithm;
    }
    if let Some(buffer_size) = target.buffer_size {
        config.buffer_size = buffer_size;
    }
    if let Some(branch_factor) = target.branch_factor {
        config.branch_factor = branch_factor;
    }
    if let Some(threads) = target.threads {
        config.threads = threads;
    }

    if target.policy.is_some() || target.threshold.is_some() {
        let kind = target.policy.unwrap_or(match config.split_policy {
            SplitPolicy::Count { .. } => PolicyKind::Count,
            SplitPolicy::Size { .. } => PolicyKind::Size,
        });
        let threshold = target.threshold.as_deref();
        config.split_policy = match kind {
            PolicyKind::Count => SplitPolicy::Count {
                max_files: match threshold {
                    Some(t) => t
                        .trim()
                        .parse()
                        .with_context(|| format!("Invalid file count: {t}"))?,
                    None => DEFAULT_MAX_FILES,
                },
            },
            PolicyKind::Size => SplitPolicy::Size {
                max_bytes: match threshold {
                    Some(t) => parse_size(t)?,
                    None => DEFAULT_MAX_BATCH_BYTES,
                },
            },
        };
    }

    debug!(?config, "Resolved configuration");
    Ok(config)
}

fn open_backend(target: &Target) -> Result<Backend> {
    match Location::parse(&target.location)? {
        Location::Local(path) => {
            let path = path
                .canonicalize()
                .with_context(|| format!("Invalid path: {}", path.display()))?;
            Ok(Backend::local(path))
        }
        Location::Share(url) => {
            let mount = target.mount.as_ref().ok_or_else(|| {
                eyre!("--mount is required for {SHARE_SCHEME}:// locations")
            })?;
            let credential = target
                .credentials
                .as_ref()
                .map(ShareCredential::from_file)
                .transpose()?;
            let client = MountedShareClient::new(mount);
            let storage = ShareStorage::connect(url, credential.as_ref(), Box::new(client))?;
            Ok(Backend::share(storage))
        }
    }
}

fn print_summary(report: &ChecksumReport) {
    let stats = &report.stats;
    eprintln!();
    eprintln!(
        "{} files, {} in {:.2}s",
        stats.files_hashed,
        format_size(stats.bytes_hashed),
        report.scan_duration.as_secs_f64()
    );

    if report.has_errors() {
        eprintln!("{} entries failed:", report.failed_count());
        for error in &report.errors {
            eprintln!("  {}: {}", error.path, error.message);
        }
    }
    if report.cancelled {
        eprintln!("Scan was cancelled before completion");
    }
}

/// Turn a partial result into a non-zero exit.
fn finish(report: &ChecksumReport) -> Result<()> {
    if report.cancelled {
        bail!("scan cancelled");
    }
    if report.has_errors() {
        bail!("{} entries could not be checksummed", report.failed_count());
    }
    Ok(())
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Parse a size string (e.g., "512", "64KB", "8MB", "1GB").
fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();
    let digits_end = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());
    let (num, unit) = s.split_at(digits_end);

    let num: f64 = num
        .parse()
        .with_context(|| format!("Invalid size: {s}"))?;
    let multiplier: u64 = match unit.trim() {
        "" | "B" => 1,
        "K" | "KB" => 1024,
        "M" | "MB" => 1024 * 1024,
        "G" | "GB" => 1024 * 1024 * 1024,
        other => bail!("Unknown size unit: {other}"),
    };

    Ok((num * multiplier as f64) as u64)
}
