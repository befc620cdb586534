use clap::{Parser, ValueEnum};
use core::time::Duration;
use jobwatch::{DistributorConfig, Partition};

/// Command line arguments, each with an environment fallback.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "jobwatch",
    version,
    about = "Distribute simulated jobs over worker threads and report their status"
)]
pub struct CliArgs {
    /// Number of jobs in the queue
    #[arg(long, env = "JOBWATCH_JOBS", default_value_t = 20)]
    pub jobs: u64,

    /// Number of worker threads
    #[arg(long, env = "JOBWATCH_WORKERS", default_value_t = 4)]
    pub workers: usize,

    /// Smallest simulated job duration, in time units
    #[arg(long, env = "JOBWATCH_MIN_DELAY", default_value_t = 1)]
    pub min_delay: u64,

    /// Largest simulated job duration, in time units
    #[arg(long, env = "JOBWATCH_MAX_DELAY", default_value_t = 10)]
    pub max_delay: u64,

    /// Length of one time unit in milliseconds
    #[arg(long, env = "JOBWATCH_TIME_UNIT_MS", default_value_t = 1000)]
    pub time_unit_ms: u64,

    /// Time between two reports, in time units
    #[arg(long, env = "JOBWATCH_REPORT_INTERVAL", default_value_t = 2)]
    pub report_interval: u64,

    /// How leftover jobs are handled when the queue does not divide evenly
    #[arg(long, env = "JOBWATCH_PARTITION", value_enum, default_value_t = PartitionArg::Truncate)]
    pub partition: PartitionArg,

    /// Report output format
    #[arg(long, env = "JOBWATCH_FORMAT", value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Seed for the workload generator, for reproducible runs
    #[arg(long, env = "JOBWATCH_SEED")]
    pub seed: Option<u64>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionArg {
    /// Drop the trailing jobs that do not fill a segment
    Truncate,
    /// Hand the trailing jobs to the first workers
    Spread,
}

impl From<PartitionArg> for Partition {
    fn from(arg: PartitionArg) -> Self {
        match arg {
            PartitionArg::Truncate => Self::Truncate,
            PartitionArg::Spread => Self::Spread,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Console block per report
    Text,
    /// One JSON object per report
    Json,
}

/// Validated run configuration.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub jobs: u64,
    pub workers: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub report_interval: Duration,
    pub partition: Partition,
    pub format: Format,
    pub seed: Option<u64>,
}

impl RunConfig {
    /// Distributor settings for this run. The cancellation token is supplied
    /// by the caller.
    pub fn distributor_config(&self) -> DistributorConfig {
        DistributorConfig::default()
            .with_threads(self.workers)
            .with_report_interval(self.report_interval)
            .with_partition(self.partition)
    }
}

impl TryFrom<CliArgs> for RunConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        anyhow::ensure!(args.workers > 0, "--workers must be greater than zero");
        anyhow::ensure!(args.time_unit_ms > 0, "--time-unit-ms must be greater than zero");
        anyhow::ensure!(
            args.report_interval > 0,
            "--report-interval must be greater than zero"
        );
        anyhow::ensure!(
            args.min_delay <= args.max_delay,
            "--min-delay ({}) must not exceed --max-delay ({})",
            args.min_delay,
            args.max_delay
        );

        let unit = |units: u64| -> anyhow::Result<Duration> {
            let millis = units.checked_mul(args.time_unit_ms).ok_or_else(|| {
                anyhow::anyhow!("{units} time units of {}ms overflow", args.time_unit_ms)
            })?;
            Ok(Duration::from_millis(millis))
        };

        Ok(Self {
            jobs: args.jobs,
            workers: args.workers,
            min_delay: unit(args.min_delay)?,
            max_delay: unit(args.max_delay)?,
            report_interval: unit(args.report_interval)?,
            partition: args.partition.into(),
            format: args.format,
            seed: args.seed,
        })
    }
}
