//! Repeated-run timing of collect-mode scans.

use std::time::{Duration, Instant};

use tracing::debug;

use treesum_core::{ChecksumError, ChecksumReport, Entry, Storage};

use crate::checksummer::Checksummer;

/// Summary statistics over a set of run durations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingStats {
    /// Number of samples.
    pub runs: usize,
    pub mean: Duration,
    /// Population standard deviation.
    pub std_dev: Duration,
    pub min: Duration,
    pub max: Duration,
}

impl TimingStats {
    /// Compute statistics over `samples`. Returns `None` when empty.
    pub fn from_samples(samples: &[Duration]) -> Option<Self> {
        let min = *samples.iter().min()?;
        let max = *samples.iter().max()?;

        let n = samples.len() as f64;
        let secs: Vec<f64> = samples.iter().map(Duration::as_secs_f64).collect();
        let mean = secs.iter().sum::<f64>() / n;
        let variance = secs.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;

        Some(Self {
            runs: samples.len(),
            mean: Duration::from_secs_f64(mean),
            std_dev: Duration::from_secs_f64(variance.sqrt()),
            min,
            max,
        })
    }
}

/// Outcome of [`Checksummer::benchmark`].
#[derive(Debug, Clone)]
pub struct BenchmarkReport {
    pub timing: TimingStats,
    /// Wall-clock time of every run, in order.
    pub samples: Vec<Duration>,
    /// Report of the final run.
    pub last: ChecksumReport,
}

impl Checksummer {
    /// Run collect mode `runs` times over the same tree and time each run.
    pub fn benchmark<S>(
        &self,
        storage: &S,
        root: &Entry,
        runs: usize,
    ) -> Result<BenchmarkReport, ChecksumError>
    where
        S: Storage + ?Sized,
    {
        if runs == 0 {
            return Err(ChecksumError::InvalidConfig {
                message: "benchmark needs at least one run".to_string(),
            });
        }

        let mut samples = Vec::with_capacity(runs);
        let mut last = None;
        for run in 0..runs {
            let start = Instant::now();
            let report = self.checksums(storage, root)?;
            let elapsed = start.elapsed();
            debug!(run, elapsed_ms = elapsed.as_millis() as u64, "Benchmark run finished");
            samples.push(elapsed);
            last = Some(report);
        }

        match (TimingStats::from_samples(&samples), last) {
            (Some(timing), Some(last)) => Ok(BenchmarkReport {
                timing,
                samples,
                last,
            }),
            _ => Err(ChecksumError::InvalidConfig {
                message: "benchmark produced no samples".to_string(),
            }),
        }
    }
}
