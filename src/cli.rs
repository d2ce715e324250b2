//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{self, validate_config};
use crate::domain::error::StocksimError;
use crate::domain::ledger::{DEFAULT_CAPITAL_GAINS_TAX_RATE, LedgerConfig};
use crate::domain::simulator::{SimulationResult, Simulator};
use crate::domain::strategy::{StrategyKind, StrategyOptions};
use crate::domain::universe::{load_universe, parse_instruments};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::{DataPort, DateRange};
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "stocksim", about = "Daily backtester for simple trading strategies")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one strategy and print its result
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Overrides [strategy] name
        #[arg(short, long)]
        strategy: Option<String>,
        /// Write the capital curve as CSV; overrides [report] output
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run every built-in strategy over the same data
    Compare {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List instruments available in a CSV data directory
    ListInstruments {
        #[arg(short, long)]
        dir: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            strategy,
            output,
        } => run_single(&config, strategy.as_deref(), output.as_deref()),
        Command::Compare { config } => run_compare(&config),
        Command::Validate { config } => run_validate(&config),
        Command::ListInstruments { dir } => run_list_instruments(&dir),
    }
}

fn fail(err: &StocksimError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    eprintln!("Loading config from {}", path.display());
    let adapter = FileConfigAdapter::from_file(path).map_err(|e| fail(&e))?;
    validate_config(&adapter).map_err(|e| fail(&e))?;
    Ok(adapter)
}

pub fn build_ledger_config(config: &dyn ConfigPort) -> Result<LedgerConfig, StocksimError> {
    let defaults = LedgerConfig::default();
    Ok(LedgerConfig {
        initial_capital: config_validation::number(config, "simulation", "initial_capital")?
            .unwrap_or(defaults.initial_capital),
        fee_per_trade: config_validation::number(config, "simulation", "fee_per_trade")?
            .unwrap_or(defaults.fee_per_trade),
        capital_gains_tax_rate: config_validation::number(
            config,
            "simulation",
            "capital_gains_tax_rate",
        )?
        .unwrap_or(DEFAULT_CAPITAL_GAINS_TAX_RATE),
    })
}

pub fn build_strategy_options(config: &dyn ConfigPort) -> Result<StrategyOptions, StocksimError> {
    config_validation::validate_strategy_config(config)?;
    let defaults = StrategyOptions::default();
    Ok(StrategyOptions {
        lookback: config_validation::integer(config, "strategy", "lookback")?
            .map_or(defaults.lookback, |v| v as usize),
        seed: config_validation::integer(config, "strategy", "seed")?
            .map_or(defaults.seed, |v| v as u64),
    })
}

pub fn build_date_range(config: &dyn ConfigPort) -> Result<DateRange, StocksimError> {
    Ok(DateRange {
        start: config_validation::date(config, "simulation", "start_date")?,
        end: config_validation::date(config, "simulation", "end_date")?,
    })
}

pub fn resolve_strategy(
    name_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<StrategyKind, StocksimError> {
    match name_override {
        Some(name) => name.parse(),
        None => match config.get_string("strategy", "name") {
            Some(name) => name.parse(),
            None => Ok(StrategyKind::InterDayEven),
        },
    }
}

pub fn resolve_instruments(config: &dyn ConfigPort) -> Result<Vec<String>, StocksimError> {
    let raw = config
        .get_string("data", "instruments")
        .ok_or_else(|| StocksimError::ConfigMissing {
            section: "data".into(),
            key: "instruments".into(),
        })?;
    parse_instruments(&raw).map_err(|e| StocksimError::ConfigInvalid {
        section: "data".into(),
        key: "instruments".into(),
        reason: e.to_string(),
    })
}

/// Everything a run needs, resolved from a validated configuration.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub instruments: Vec<String>,
    pub range: DateRange,
    pub ledger: LedgerConfig,
    pub options: StrategyOptions,
}

impl RunPlan {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, StocksimError> {
        Ok(RunPlan {
            instruments: resolve_instruments(config)?,
            range: build_date_range(config)?,
            ledger: build_ledger_config(config)?,
            options: build_strategy_options(config)?,
        })
    }
}

/// Load the universe and run the given strategies, each from a fresh ledger.
pub fn simulate(
    data_port: &dyn DataPort,
    plan: &RunPlan,
    kinds: &[StrategyKind],
) -> Result<Vec<(StrategyKind, SimulationResult)>, StocksimError> {
    let universe = load_universe(data_port, &plan.instruments, plan.range, true)?;
    for skipped in &universe.skipped {
        eprintln!("warning: skipping {} ({:?})", skipped.instrument, skipped.reason);
    }

    let simulator = Simulator::new(&universe.market);
    eprintln!(
        "Simulating {} instruments over {} trading days",
        universe.market.instruments().count(),
        simulator.dates().len()
    );
    simulator.compare(kinds, &plan.ledger, &plan.options)
}

fn print_summary(kind: StrategyKind, result: &SimulationResult) {
    eprintln!("\n=== {} ===", kind);
    eprintln!("Final Capital:    {:.2}", result.final_capital());
    eprintln!("Total Return:     {:.2}%", result.total_return() * 100.0);
    eprintln!("Peak Capital:     {:.2}", result.peak_capital());
    eprintln!("Fills:            {}", result.ledger.fills().len());
    eprintln!("Fees Paid:        {:.2}", result.fees_paid());
    eprintln!("Taxes Paid:       {:.2}", result.taxes_paid());
}

fn data_port(config: &dyn ConfigPort) -> CsvAdapter {
    let dir = config.get_string("data", "directory").unwrap_or_default();
    CsvAdapter::new(PathBuf::from(dir))
}

fn run_single(config_path: &Path, strategy: Option<&str>, output: Option<&Path>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let outcome = resolve_strategy(strategy, &config).and_then(|kind| {
        let plan = RunPlan::from_config(&config)?;
        eprintln!("Strategy: {}", kind);
        simulate(&data_port(&config), &plan, &[kind])
    });
    let results = match outcome {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    let output = output
        .map(Path::to_path_buf)
        .or_else(|| config.get_string("report", "output").map(PathBuf::from));

    for (kind, result) in &results {
        print_summary(*kind, result);
        for point in &result.capital_curve {
            println!("{},{:.2}", point.date, point.capital);
        }
        if let Some(path) = &output {
            if let Err(e) = CsvReportAdapter.write(result, path) {
                return fail(&e);
            }
            eprintln!("\nCapital curve written to: {}", path.display());
        }
    }
    ExitCode::SUCCESS
}

fn run_compare(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let outcome = RunPlan::from_config(&config)
        .and_then(|plan| simulate(&data_port(&config), &plan, &StrategyKind::ALL));
    let results = match outcome {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    println!("strategy,final_capital,total_return_pct,fills");
    for (kind, result) in &results {
        println!(
            "{},{:.2},{:.2},{}",
            kind,
            result.final_capital(),
            result.total_return() * 100.0,
            result.ledger.fills().len()
        );
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let plan = match RunPlan::from_config(&config) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };
    let strategy = match resolve_strategy(None, &config) {
        Ok(k) => k,
        Err(e) => return fail(&e),
    };

    eprintln!("\nSimulation:");
    eprintln!("  initial_capital:        {}", plan.ledger.initial_capital);
    eprintln!("  fee_per_trade:          {}", plan.ledger.fee_per_trade);
    eprintln!("  capital_gains_tax_rate: {}", plan.ledger.capital_gains_tax_rate);
    eprintln!(
        "\nStrategy: {} (lookback {}, seed {})",
        strategy, plan.options.lookback, plan.options.seed
    );
    eprintln!("Instruments: {}", plan.instruments.join(", "));
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_list_instruments(dir: &Path) -> ExitCode {
    let adapter = CsvAdapter::new(dir.to_path_buf());
    let instruments = match adapter.list_instruments() {
        Ok(i) => i,
        Err(e) => return fail(&e),
    };

    if instruments.is_empty() {
        eprintln!("No instruments found in {}", dir.display());
    } else {
        for instrument in &instruments {
            println!("{}", instrument);
        }
        eprintln!("{} instruments found", instruments.len());
    }
    ExitCode::SUCCESS
}
