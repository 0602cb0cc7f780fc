//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{BacktestConfig, BacktestEngine, BacktestResult};
use crate::domain::error::StratbenchError;
use crate::domain::optimizer::{ParameterGrid, grid_search};
use crate::domain::signal::Signal;
use crate::domain::strategy::{Parameters, Strategy, StrategyKind};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "stratbench", about = "Trading strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest for one symbol
    Backtest {
        /// Directory containing <SYMBOL>.csv files
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        symbol: String,
        /// Strategy name (overrides [strategy] name in the config)
        #[arg(short, long)]
        strategy: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Strategy parameter override, e.g. --set short_window=10
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
    /// Grid-search strategy parameters
    Optimize {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(short, long)]
        strategy: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
        /// Metric to maximize (default total_return)
        #[arg(short, long)]
        metric: Option<String>,
        /// Parameter axis, e.g. --grid short_window=5,10,20
        #[arg(long = "grid", value_name = "KEY=V1,V2,...")]
        grid: Vec<String>,
    },
    /// Print the signal series for a symbol
    Signals {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(short, long)]
        strategy: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
    /// List built-in strategies and their default parameters
    ListStrategies,
}

pub fn run(cli: Cli) -> ExitCode {
    init_tracing();

    match cli.command {
        Command::Backtest {
            data,
            symbol,
            strategy,
            config,
            set,
        } => run_backtest(&data, &symbol, strategy.as_deref(), config.as_ref(), &set),
        Command::Optimize {
            data,
            symbol,
            strategy,
            config,
            set,
            metric,
            grid,
        } => run_optimize(
            &data,
            &symbol,
            strategy.as_deref(),
            config.as_ref(),
            &set,
            metric.as_deref(),
            &grid,
        ),
        Command::Signals {
            data,
            symbol,
            strategy,
            config,
            set,
        } => run_signals(&data, &symbol, strategy.as_deref(), config.as_ref(), &set),
        Command::ListStrategies => run_list_strategies(),
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("STRATBENCH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = StratbenchError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn load_optional_config(path: Option<&PathBuf>) -> Result<Option<FileConfigAdapter>, ExitCode> {
    match path {
        Some(p) => {
            eprintln!("Loading config from {}", p.display());
            load_config(p).map(Some)
        }
        None => Ok(None),
    }
}

pub fn build_backtest_config(config: Option<&dyn ConfigPort>) -> BacktestConfig {
    let defaults = BacktestConfig::default();
    match config {
        Some(c) => BacktestConfig {
            initial_capital: c.get_double("backtest", "initial_capital", defaults.initial_capital),
            commission_pct: c.get_double("backtest", "commission_pct", defaults.commission_pct),
            position_size: c.get_double("backtest", "position_size", defaults.position_size),
            allow_shorting: c.get_bool("backtest", "allow_shorting", defaults.allow_shorting),
        },
        None => defaults,
    }
}

/// Builds a strategy from the CLI name override, falling back to
/// `[strategy] name` in the config. Numeric keys in `[strategy]` matching the
/// strategy's own parameters are applied on top of its defaults.
pub fn build_strategy(
    name_override: Option<&str>,
    config: Option<&dyn ConfigPort>,
) -> Result<Box<dyn Strategy>, StratbenchError> {
    let name = match name_override {
        Some(n) => n.to_string(),
        None => config
            .and_then(|c| c.get_string("strategy", "name"))
            .ok_or_else(|| StratbenchError::ConfigMissing {
                section: "strategy".into(),
                key: "name".into(),
            })?,
    };

    let kind: StrategyKind = name.parse()?;
    let mut strategy = kind.create();

    if let Some(c) = config {
        let keys: Vec<String> = strategy
            .parameters()
            .iter()
            .map(|(k, _)| k.to_string())
            .collect();
        let mut overrides = Parameters::new();
        for key in keys {
            if let Some(raw) = c.get_string("strategy", &key) {
                let value: f64 =
                    raw.trim()
                        .parse()
                        .map_err(|_| StratbenchError::ConfigInvalid {
                            section: "strategy".into(),
                            key: key.clone(),
                            reason: format!("'{}' is not a number", raw.trim()),
                        })?;
                overrides.set(&key, value);
            }
        }
        strategy.set_parameters(&overrides);
    }

    Ok(strategy)
}

pub fn parse_set_pairs(pairs: &[String]) -> Result<Parameters, StratbenchError> {
    let mut params = Parameters::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| StratbenchError::InvalidParameter {
                name: pair.clone(),
                reason: "expected key=value".into(),
            })?;
        let value: f64 = raw
            .trim()
            .parse()
            .map_err(|_| StratbenchError::InvalidParameter {
                name: key.trim().to_string(),
                reason: format!("'{}' is not a number", raw.trim()),
            })?;
        params.set(key.trim(), value);
    }
    Ok(params)
}

pub fn parse_grid_axes(axes: &[String]) -> Result<ParameterGrid, StratbenchError> {
    let mut grid = ParameterGrid::new();
    for axis in axes {
        let (key, raw_values) =
            axis.split_once('=')
                .ok_or_else(|| StratbenchError::InvalidParameter {
                    name: axis.clone(),
                    reason: "expected key=v1,v2,...".into(),
                })?;
        let mut values = Vec::new();
        for raw in raw_values.split(',') {
            let value: f64 = raw
                .trim()
                .parse()
                .map_err(|_| StratbenchError::InvalidParameter {
                    name: key.trim().to_string(),
                    reason: format!("'{}' is not a number", raw.trim()),
                })?;
            values.push(value);
        }
        grid.add(key.trim(), values);
    }
    Ok(grid)
}

struct Session {
    config: Option<FileConfigAdapter>,
    strategy: Box<dyn Strategy>,
    series: crate::domain::series::PriceSeries,
    bt_config: BacktestConfig,
}

/// Shared setup for the data-driven commands: config, strategy with
/// overrides, and the symbol's price series.
fn prepare_session(
    data_dir: &PathBuf,
    symbol: &str,
    strategy_name: Option<&str>,
    config_path: Option<&PathBuf>,
    set: &[String],
) -> Result<Session, ExitCode> {
    // Stage 1: Load config
    let config = load_optional_config(config_path)?;
    let config_port = config.as_ref().map(|c| c as &dyn ConfigPort);

    // Stage 2: Build strategy and apply CLI overrides
    let mut strategy = build_strategy(strategy_name, config_port).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    let overrides = parse_set_pairs(set).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    strategy.set_parameters(&overrides);
    eprintln!(
        "Strategy: {} ({})",
        strategy.name(),
        strategy.parameters()
    );

    // Stage 3: Load price data
    eprintln!("Loading {} from {}", symbol, data_dir.display());
    let adapter = CsvAdapter::new(data_dir.clone());
    let series = adapter.fetch_series(symbol).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    eprintln!("  {} bars", series.len());

    let bt_config = build_backtest_config(config_port);

    Ok(Session {
        config,
        strategy,
        series,
        bt_config,
    })
}

pub fn run_backtest(
    data_dir: &PathBuf,
    symbol: &str,
    strategy_name: Option<&str>,
    config_path: Option<&PathBuf>,
    set: &[String],
) -> ExitCode {
    let session = match prepare_session(data_dir, symbol, strategy_name, config_path, set) {
        Ok(s) => s,
        Err(code) => return code,
    };

    // Stage 4: Run the engine
    eprintln!(
        "Running backtest: capital {:.2}, commission {:.4}, size {:.2}",
        session.bt_config.initial_capital,
        session.bt_config.commission_pct,
        session.bt_config.position_size,
    );
    let engine = BacktestEngine::new(session.bt_config);
    let result = match engine.run(&session.series, session.strategy.as_ref()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 5: Trade ledger to stdout, summary to stderr
    for trade in &result.trades {
        println!(
            "{} {} {:.4} @ {:.2} -> {} @ {:.2} pnl {:+.2} ({:+.2}%) [{}]",
            trade.entry_date,
            trade.direction,
            trade.quantity,
            trade.entry_price,
            trade.exit_date,
            trade.exit_price,
            trade.profit,
            trade.profit_pct * 100.0,
            trade.exit_reason,
        );
    }
    print_summary(&result);

    ExitCode::SUCCESS
}

fn print_summary(result: &BacktestResult) {
    let m = &result.metrics;
    eprintln!("\n=== {} ===", result.strategy_name);
    eprintln!("Total Return:     {:.2}%", m.total_return * 100.0);
    eprintln!("Annual Return:    {:.2}%", m.annual_return * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", m.sharpe_ratio);
    eprintln!("Max Drawdown:     {:.1}%", m.max_drawdown * 100.0);
    eprintln!("Total Trades:     {}", m.total_trades);
    eprintln!("Win Rate:         {:.1}%", m.win_rate * 100.0);
    eprintln!("Profit Factor:    {:.2}", m.profit_factor);
    eprintln!("Avg Profit:       {:.2}", m.avg_profit);
    eprintln!("Avg Hold Days:    {:.1}", m.avg_hold_days);
    eprintln!("Final Capital:    {:.2}", m.final_capital);
}

pub fn run_optimize(
    data_dir: &PathBuf,
    symbol: &str,
    strategy_name: Option<&str>,
    config_path: Option<&PathBuf>,
    set: &[String],
    metric_flag: Option<&str>,
    grid_axes: &[String],
) -> ExitCode {
    let mut session = match prepare_session(data_dir, symbol, strategy_name, config_path, set) {
        Ok(s) => s,
        Err(code) => return code,
    };

    // Metric resolution: flag, then [optimize] metric, then total_return.
    let metric = metric_flag
        .map(str::to_string)
        .or_else(|| {
            session
                .config
                .as_ref()
                .and_then(|c| c.get_string("optimize", "metric"))
        })
        .unwrap_or_else(|| "total_return".to_string());

    let grid = match parse_grid_axes(grid_axes) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 4: Grid search
    eprintln!(
        "Optimizing {} over {} axes, maximizing {}",
        session.strategy.name(),
        grid.axes().len(),
        metric,
    );
    let outcome = match grid_search(
        session.strategy.as_mut(),
        &session.series,
        &grid,
        &metric,
        &session.bt_config,
    ) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 5: Per-combination table to stdout, winner to stderr
    for record in &outcome.records {
        let value = record
            .metrics
            .metric_value(&outcome.metric)
            .unwrap_or(f64::NAN);
        println!("{}: {} = {:.6}", record.parameters, outcome.metric, value);
    }

    eprintln!(
        "\nBest {}: {:.6} with {}",
        outcome.metric, outcome.best_metric, outcome.best_parameters
    );

    ExitCode::SUCCESS
}

pub fn run_signals(
    data_dir: &PathBuf,
    symbol: &str,
    strategy_name: Option<&str>,
    config_path: Option<&PathBuf>,
    set: &[String],
) -> ExitCode {
    let session = match prepare_session(data_dir, symbol, strategy_name, config_path, set) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let signals = match session.strategy.generate_signals(&session.series) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    for (bar, signal) in session.series.bars().iter().zip(&signals) {
        println!("{} {}", bar.date, signal);
    }

    let buys = signals.iter().filter(|s| **s == Signal::Buy).count();
    let sells = signals.iter().filter(|s| **s == Signal::Sell).count();
    eprintln!(
        "\n{} bars: {} buy, {} sell, {} hold",
        signals.len(),
        buys,
        sells,
        signals.len() - buys - sells,
    );

    ExitCode::SUCCESS
}

pub fn run_list_strategies() -> ExitCode {
    for kind in StrategyKind::ALL {
        let strategy = kind.create();
        println!(
            "{:<14} {} ({})",
            kind.id(),
            strategy.name(),
            strategy.parameters()
        );
    }
    ExitCode::SUCCESS
}
