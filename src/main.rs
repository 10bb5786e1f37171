//! Command-line entry point: evaluate one job file and print the outcome.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use bus_planner::advisor::{AdvisorConfig, ChatAdvisor};
use bus_planner::arcgis::{ArcGisConfig, ArcGisGeocoder};
use bus_planner::model::Job;
use bus_planner::solver::{PlanEvaluator, SolveOptions};

#[derive(Debug, Parser)]
#[command(name = "bus-planner", about = "Assign students to buses and pick the shortest plan")]
struct Cli {
    /// Job JSON file, or `-` for stdin.
    job: PathBuf,

    /// Partitions evaluated per job.
    #[arg(long, env = "BUS_PLANNER_MAX_PARTITIONS", default_value_t = 25)]
    max_partitions: usize,

    /// Largest group searched exhaustively.
    #[arg(long, env = "BUS_PLANNER_MAX_GROUP_SIZE", default_value_t = 8)]
    max_group_size: usize,

    /// Abort the search after this many seconds.
    #[arg(long, env = "BUS_PLANNER_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Evaluate on a single thread.
    #[arg(long)]
    sequential: bool,

    /// Geocoding service root.
    #[arg(long, env = "BUS_PLANNER_GEOCODER_URL")]
    geocoder_url: Option<String>,

    #[arg(long, env = "BUS_PLANNER_GEOCODER_TIMEOUT_SECS", default_value_t = 10)]
    geocoder_timeout_secs: u64,

    /// Chat completions server for plan commentary. Commentary is skipped
    /// when unset.
    #[arg(long, env = "BUS_PLANNER_ADVISOR_URL")]
    advisor_url: Option<String>,

    #[arg(long, env = "BUS_PLANNER_ADVISOR_MODEL")]
    advisor_model: Option<String>,

    #[arg(long, env = "BUS_PLANNER_ADVISOR_API_KEY", hide_env_values = true)]
    advisor_api_key: Option<String>,

    /// Never call the advisor, even if configured.
    #[arg(long)]
    skip_advisor: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bus_planner=info")),
        )
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let job = Job::from_json(&read_job(&cli.job)?)?;

    let mut geocoder_config = ArcGisConfig {
        timeout_secs: cli.geocoder_timeout_secs,
        ..ArcGisConfig::default()
    };
    if let Some(url) = cli.geocoder_url {
        geocoder_config.base_url = url;
    }
    let geocoder = ArcGisGeocoder::new(geocoder_config)?;

    let advisor = match cli.advisor_url {
        Some(base_url) if !cli.skip_advisor => {
            let defaults = AdvisorConfig::default();
            Some(ChatAdvisor::new(AdvisorConfig {
                base_url,
                model: cli.advisor_model.unwrap_or(defaults.model),
                api_key: cli.advisor_api_key,
                ..defaults
            })?)
        }
        _ => None,
    };

    let options = SolveOptions {
        max_partitions: cli.max_partitions,
        max_group_size: cli.max_group_size,
        timeout: cli.timeout_secs.map(Duration::from_secs),
        skip_advisor: cli.skip_advisor,
        parallel: !cli.sequential,
    };
    let mut evaluator = PlanEvaluator::new(&geocoder, options);
    if let Some(advisor) = &advisor {
        evaluator = evaluator.with_advisor(advisor);
    }
    let outcome = evaluator.evaluate(&job)?;

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &outcome)?;
    writeln!(stdout)?;
    Ok(())
}

fn read_job(path: &Path) -> io::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        fs::read_to_string(path)
    }
}
