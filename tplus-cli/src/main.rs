//! tplus CLI: T+1 basket backtests and prompt payloads.
//!
//! Commands:
//! - `run`: simulate a business-day range with the demo or LLM ensemble
//! - `payload`: build the market payload LLM agents see for one date

mod obs;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tplus_core::data::{BarSource, CsvBarSource, Universe};
use tplus_core::indicators::IndicatorSuite;
use tplus_runner::{
    prepare_payload, save_artifacts, BacktestResult, Backtester, BarFormat, Ensemble,
    HttpModelClient, MarketFeed, PerformanceSummary, RunArtifact, RunConfig, SyntheticBarSource,
    DEFAULT_MINIMUM_ROWS,
};

#[derive(Parser)]
#[command(name = "tplus", about = "tplus: T+1 A-share basket backtest simulator")]
struct Cli {
    /// Log filter when TPLUS_LOG is unset (e.g. info, tplus_runner=debug).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format: text or json.
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// One rule-based momentum agent.
    Demo,
    /// One chat-completions agent per configured `[[agents]]` entry.
    Llm,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a backtest over every business day between --start and --end.
    Run {
        /// First date (YYYY-MM-DD). Falls back to `[backtest].start`.
        #[arg(long)]
        start: Option<String>,

        /// Last date (YYYY-MM-DD). Falls back to `[backtest].end`.
        #[arg(long)]
        end: Option<String>,

        /// Path to a TOML run config.
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = Mode::Demo)]
        mode: Mode,

        /// Directory holding `<symbol>/<YYYY-MM-DD>.csv` files.
        #[arg(long)]
        data_root: Option<PathBuf>,

        /// Universe JSON file. Defaults to the built-in sample basket.
        #[arg(long)]
        universe: Option<PathBuf>,

        /// Generate deterministic synthetic bars instead of reading files.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        #[arg(long)]
        initial_cash: Option<f64>,

        /// Write result.json, equity.csv and orders.csv under <dir>/<run_id>/.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Build the prompt payload for one trade date.
    Payload {
        /// Trade date (YYYY-MM-DD).
        #[arg(long)]
        date: String,

        #[arg(long)]
        data_root: Option<PathBuf>,

        #[arg(long)]
        universe: Option<PathBuf>,

        /// Bar encoding: json or markdown.
        #[arg(long, default_value = "json")]
        bar_format: BarFormat,

        /// Symbols with fewer bars than this are an error.
        #[arg(long, default_value_t = DEFAULT_MINIMUM_ROWS)]
        minimum_rows: usize,

        /// Write the payload here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    obs::init_tracing(&cli.log_level, &cli.log_format)?;

    match cli.command {
        Commands::Run {
            start,
            end,
            config,
            mode,
            data_root,
            universe,
            synthetic,
            initial_cash,
            output_dir,
        } => {
            let mut run_config = match &config {
                Some(path) => RunConfig::from_file(path)?,
                None => RunConfig::default(),
            };
            if let Some(start) = start.as_deref() {
                run_config.backtest.start = Some(parse_date(start)?);
            }
            if let Some(end) = end.as_deref() {
                run_config.backtest.end = Some(parse_date(end)?);
            }
            if data_root.is_some() {
                run_config.data.root = data_root;
            }
            if universe.is_some() {
                run_config.data.universe = universe;
            }
            run_config.data.synthetic |= synthetic;
            if let Some(cash) = initial_cash {
                run_config.backtest.initial_cash = cash;
            }
            run_backtest_cmd(&run_config, mode, output_dir)
        }
        Commands::Payload {
            date,
            data_root,
            universe,
            bar_format,
            minimum_rows,
            output,
        } => run_payload_cmd(
            parse_date(&date)?,
            data_root,
            universe,
            bar_format,
            minimum_rows,
            output,
        ),
    }
}

fn run_backtest_cmd(config: &RunConfig, mode: Mode, output_dir: Option<PathBuf>) -> Result<()> {
    config.validate()?;
    let (Some(start), Some(end)) = (config.backtest.start, config.backtest.end) else {
        bail!("a date range is required: pass --start and --end or set them in [backtest]");
    };
    let dates = business_days(start, end);
    if dates.len() < 2 {
        bail!("need at least two business days between {start} and {end}");
    }

    let source: Box<dyn BarSource> = if config.data.synthetic {
        Box::new(SyntheticBarSource::new())
    } else {
        match &config.data.root {
            Some(root) => Box::new(CsvBarSource::new(root)),
            None => bail!("no bar data: pass --data-root or --synthetic"),
        }
    };
    let universe = load_universe(config.data.universe.as_ref())?;
    let feed = MarketFeed::new(
        source,
        universe,
        IndicatorSuite::new(config.indicators.clone()),
    );

    let planner = match mode {
        Mode::Demo => Ensemble::demo(config.risk),
        Mode::Llm => {
            let client = HttpModelClient::new(&config.model)
                .context("failed to build model client")?;
            Ensemble::from_config(config, Arc::new(client))?
        }
    };

    tracing::info!(
        start = %start,
        end = %end,
        days = dates.len(),
        agents = planner.len(),
        source = feed.source().name(),
        "starting backtest"
    );
    let result = Backtester::new(&feed, config.backtest.initial_cash).run(&dates, &planner)?;
    let summary = PerformanceSummary::compute(&result.equity_curve);

    print_result(&result, &summary)?;

    if let Some(dir) = output_dir {
        let artifact = RunArtifact::new(config.run_id()?, &result, summary);
        let run_dir = save_artifacts(&artifact, &dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn run_payload_cmd(
    date: NaiveDate,
    data_root: Option<PathBuf>,
    universe: Option<PathBuf>,
    bar_format: BarFormat,
    minimum_rows: usize,
    output: Option<PathBuf>,
) -> Result<()> {
    let source: Box<dyn BarSource> = match data_root {
        Some(root) => Box::new(CsvBarSource::new(root)),
        None => Box::new(SyntheticBarSource::new()),
    };
    let universe = load_universe(universe.as_ref())?;
    let payload = prepare_payload(
        date,
        source.as_ref(),
        &universe,
        &IndicatorSuite::default(),
        bar_format,
        minimum_rows,
    )?;
    let json = payload.to_json_pretty()?;

    match output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("failed to write payload to {}", path.display()))?;
            println!("Payload written to: {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn load_universe(path: Option<&PathBuf>) -> Result<Universe> {
    match path {
        Some(path) => Universe::from_file(path)
            .with_context(|| format!("failed to load universe {}", path.display())),
        None => Ok(Universe::default_sample()),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
}

/// Every Monday-to-Friday date in `[start, end]`.
fn business_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

fn print_result(result: &BacktestResult, summary: &PerformanceSummary) -> Result<()> {
    println!("Equity curve:");
    for snapshot in &result.equity_curve {
        println!(
            "  {}  equity {:>16.2}  cash {:>16.2}",
            snapshot.date, snapshot.equity, snapshot.cash
        );
    }

    println!();
    println!("Performance summary:");
    println!("{}", serde_json::to_string_pretty(summary)?);

    println!();
    println!("Orders executed: {}", result.orders.len());
    for order in &result.orders {
        println!(
            "  {}  {:<4} {:<8} {:>14.2} @ {:>10.4}  notional {:>16.2}",
            order.date,
            order.side.as_str(),
            order.symbol,
            order.quantity,
            order.price,
            order.notional
        );
    }
    Ok(())
}
