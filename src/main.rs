use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use u_statcalc::interval::{interval_plot, mean_interval, proportion_interval};
use u_statcalc::normality;
use u_statcalc::random::{create_rng, entropy_rng, generate};
use u_statcalc::significance::{evaluate, test_plot, SignificanceTest, Tail};
use u_statcalc::{ConfigLoader, EngineConfig, Sample};

#[derive(Parser)]
#[command(name = "statcalc")]
#[command(about = "Statistics calculator: sampling, normality, significance and confidence intervals", long_about = None)]
struct Cli {
    /// Config file path (TOML)
    #[arg(short, long, global = true, env = "STATCALC_CONFIG")]
    config: Option<PathBuf>,
    /// Include plot descriptions in the JSON output
    #[arg(long, global = true)]
    plot: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate normally distributed data
    Generate {
        #[arg(long, allow_hyphen_values = true)]
        mean: f64,
        #[arg(long)]
        std_dev: f64,
        /// Number of values (1 to 5000)
        #[arg(long)]
        size: usize,
        /// RNG seed; overrides the configured seed
        #[arg(long)]
        seed: Option<u64>,
        /// Print CSV with a `Values` header instead of JSON
        #[arg(long)]
        csv: bool,
    },
    /// Check whether a dataset looks normally distributed
    Check {
        /// CSV file; the first column is used
        #[arg(long, conflicts_with = "data", required_unless_present = "data")]
        file: Option<PathBuf>,
        /// Values separated by commas or newlines
        #[arg(long)]
        data: Option<String>,
    },
    /// Z test against the standard Normal
    ZTest {
        #[arg(long, allow_hyphen_values = true)]
        statistic: f64,
        /// two, left or right
        #[arg(long, default_value = "two")]
        tail: Tail,
        #[arg(long, default_value_t = 0.05)]
        alpha: f64,
    },
    /// T test against Student's t
    TTest {
        #[arg(long, allow_hyphen_values = true)]
        statistic: f64,
        #[arg(long)]
        df: u32,
        /// two, left or right
        #[arg(long, default_value = "two")]
        tail: Tail,
        #[arg(long, default_value_t = 0.05)]
        alpha: f64,
    },
    /// Right-tailed chi-square test
    ChiSquare {
        #[arg(long)]
        statistic: f64,
        #[arg(long)]
        df: u32,
        #[arg(long, default_value_t = 0.05)]
        alpha: f64,
    },
    /// Confidence interval for a mean
    MeanInterval {
        #[arg(long, allow_hyphen_values = true)]
        mean: f64,
        #[arg(long)]
        std_dev: f64,
        #[arg(long)]
        size: usize,
        /// Confidence level in percent
        #[arg(long, default_value_t = 95.0)]
        confidence: f64,
        /// Value to check against the interval
        #[arg(long, allow_hyphen_values = true)]
        probe: Option<f64>,
    },
    /// Confidence interval for a proportion
    ProportionInterval {
        #[arg(long)]
        successes: u64,
        #[arg(long)]
        trials: u64,
        /// Confidence level in percent
        #[arg(long, default_value_t = 95.0)]
        confidence: f64,
        /// Proportion to check against the interval
        #[arg(long)]
        probe: Option<f64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ConfigLoader::load(cli.config.as_deref()).context("failed to load configuration")?;

    let output = match cli.command {
        Commands::Generate {
            mean,
            std_dev,
            size,
            seed,
            csv,
        } => {
            let sample = match seed.or(config.seed) {
                Some(seed) => generate(mean, std_dev, size, &mut create_rng(seed)),
                None => generate(mean, std_dev, size, &mut entropy_rng()),
            }
            .context("failed to generate data")?;
            if csv {
                print!("{}", sample.to_csv()?);
                return Ok(());
            }
            json!({ "values": sample, "text": sample.to_text() })
        }
        Commands::Check { file, data } => {
            let sample = load_sample(file, data)?;
            check(&sample, &config, cli.plot)?
        }
        Commands::ZTest {
            statistic,
            tail,
            alpha,
        } => significance(SignificanceTest::Z { statistic, tail }, alpha, &config, cli.plot)?,
        Commands::TTest {
            statistic,
            df,
            tail,
            alpha,
        } => significance(
            SignificanceTest::T {
                statistic,
                df,
                tail,
            },
            alpha,
            &config,
            cli.plot,
        )?,
        Commands::ChiSquare {
            statistic,
            df,
            alpha,
        } => significance(
            SignificanceTest::ChiSquare { statistic, df },
            alpha,
            &config,
            cli.plot,
        )?,
        Commands::MeanInterval {
            mean,
            std_dev,
            size,
            confidence,
            probe,
        } => {
            let estimate = mean_interval(mean, std_dev, size, confidence, probe)
                .context("failed to compute confidence interval")?;
            with_plot(json!({ "result": estimate }), cli.plot, || {
                interval_plot(&estimate, &config)
            })?
        }
        Commands::ProportionInterval {
            successes,
            trials,
            confidence,
            probe,
        } => {
            let estimate = proportion_interval(successes, trials, confidence, probe)
                .context("failed to compute confidence interval")?;
            with_plot(json!({ "result": estimate }), cli.plot, || {
                interval_plot(&estimate, &config)
            })?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_sample(file: Option<PathBuf>, data: Option<String>) -> Result<Sample> {
    match (file, data) {
        (Some(path), _) => {
            let reader =
                File::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
            Sample::from_csv_reader(reader)
                .with_context(|| format!("failed to read data from {}", path.display()))
        }
        (None, Some(text)) => Sample::from_text(&text).context("failed to parse data"),
        (None, None) => anyhow::bail!("either --file or --data is required"),
    }
}

fn check(sample: &Sample, config: &EngineConfig, plot: bool) -> Result<Value> {
    let report = normality::check(sample, config).context("normality check failed")?;
    if plot {
        return Ok(serde_json::to_value(&report)?);
    }
    Ok(json!({
        "size": report.size,
        "mean": report.mean,
        "std_dev": report.std_dev,
        "shapiro_wilk": report.shapiro_wilk,
        "looks_normal": report.looks_normal,
        "warnings": report.warnings,
    }))
}

fn significance(
    test: SignificanceTest,
    alpha: f64,
    config: &EngineConfig,
    plot: bool,
) -> Result<Value> {
    let result = evaluate(&test, alpha).context("significance test failed")?;
    with_plot(json!({ "test": test, "result": result }), plot, || {
        test_plot(&test, &result, config)
    })
}

fn with_plot<P, F>(mut output: Value, plot: bool, describe: F) -> Result<Value>
where
    P: serde::Serialize,
    F: FnOnce() -> u_statcalc::Result<P>,
{
    if plot {
        output["plot"] = serde_json::to_value(describe()?)?;
    }
    Ok(output)
}
