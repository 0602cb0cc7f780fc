//! Integration tests.
//!
//! Tests cover:
//! - Full pipeline: CSV file -> CsvAdapter -> strategy -> engine -> metrics
//! - Engine scenarios with hand-computed trades and equity curves
//! - Config-driven runs through the cli builder helpers
//! - Grid-search optimization over a real strategy
//! - Mock data port behaviour shared by the test suite

mod common;

use approx::assert_relative_eq;
use common::*;
use stratbench::adapters::csv_adapter::CsvAdapter;
use stratbench::adapters::file_config_adapter::FileConfigAdapter;
use stratbench::cli;
use stratbench::domain::backtest::{BacktestConfig, BacktestEngine};
use stratbench::domain::error::StratbenchError;
use stratbench::domain::optimizer::ParameterGrid;
use stratbench::domain::strategy::{MovingAverageCrossover, Strategy};
use stratbench::domain::trade::{ExitReason, TradeDirection};
use stratbench::ports::data_port::DataPort;

/// Flat at 10 for four bars, jumps to 20, then drifts back down. With 2/4
/// moving averages this buys at the jump (index 4) and sells on the first
/// down-cross (index 8, close 19.5).
const CROSSOVER_CLOSES: [f64; 12] = [
    10.0, 10.0, 10.0, 10.0, 20.0, 20.0, 20.0, 20.0, 19.5, 19.0, 18.5, 18.0,
];

mod csv_pipeline {
    use super::*;

    #[test]
    fn full_pipeline_from_csv_file() {
        let dir = tempfile::TempDir::new().unwrap();
        write_symbol_csv(dir.path(), "ACME", &CROSSOVER_CLOSES);

        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let series = adapter.fetch_series("ACME").unwrap();
        assert_eq!(series.len(), 12);

        let strategy = MovingAverageCrossover::new(2, 4);
        let engine = BacktestEngine::new(zero_cost_config(1000.0));
        let result = engine.run(&series, &strategy).unwrap();

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.direction, TradeDirection::Long);
        assert_eq!(trade.entry_date, date(2024, 1, 5));
        assert!((trade.entry_price - 20.0).abs() < f64::EPSILON);
        assert_eq!(trade.exit_date, date(2024, 1, 9));
        assert!((trade.exit_price - 19.5).abs() < f64::EPSILON);
        assert_eq!(trade.exit_reason, ExitReason::Signal);
        // 1000 / 20 with no commission.
        assert!((trade.quantity - 50.0).abs() < 1e-9);
        assert!((trade.profit - -25.0).abs() < 1e-9);

        assert_eq!(result.metrics.total_trades, 1);
        assert_eq!(result.metrics.losing_trades, 1);
        assert!((result.metrics.total_return + 0.025).abs() < 1e-12);
        assert!((result.metrics.final_capital - 975.0).abs() < 1e-9);

        assert_eq!(result.equity_curve.len(), 12);
        assert!((result.equity_curve[11].equity - 975.0).abs() < 1e-9);
    }

    #[test]
    fn list_symbols_sees_written_files() {
        let dir = tempfile::TempDir::new().unwrap();
        write_symbol_csv(dir.path(), "BBB", &[100.0, 101.0]);
        write_symbol_csv(dir.path(), "AAA", &[50.0, 51.0]);

        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        assert_eq!(adapter.list_symbols().unwrap(), vec!["AAA", "BBB"]);
    }
}

mod engine_scenarios {
    use super::*;

    #[test]
    fn short_history_produces_no_trades() {
        // Six bars cannot seed 20/50 moving averages, so every signal is Hold.
        let series = make_flat_series(&[100.0; 6]);
        let strategy = MovingAverageCrossover::default();
        let engine = BacktestEngine::new(BacktestConfig::default());

        let result = engine.run(&series, &strategy).unwrap();

        assert!(result.trades.is_empty());
        assert_eq!(result.equity_curve.len(), 6);
        for point in &result.equity_curve {
            assert!((point.equity - 50_000.0).abs() < f64::EPSILON);
        }
        assert_eq!(result.metrics.total_return, 0.0);
    }

    #[test]
    fn flat_market_stays_flat() {
        let series = make_flat_series(&[100.0; 100]);
        let strategy = MovingAverageCrossover::default();
        let engine = BacktestEngine::new(zero_cost_config(10_000.0));

        let result = engine.run(&series, &strategy).unwrap();

        assert!(result.trades.is_empty());
        for point in &result.equity_curve {
            assert!((point.equity - 10_000.0).abs() < f64::EPSILON);
        }

        let m = &result.metrics;
        assert_eq!(m.total_return, 0.0);
        assert_eq!(m.annual_return, 0.0);
        assert_eq!(m.sharpe_ratio, 0.0);
        assert_eq!(m.max_drawdown, 0.0);
        assert_eq!(m.profit_factor, 0.0);
        assert_eq!(m.total_trades, 0);
    }

    #[test]
    fn zero_cost_equity_matches_trade_profits() {
        // Six-bar square wave: repeated entries and protective or signal
        // exits. Whatever the exit mix, cash conservation must hold.
        let closes: Vec<f64> = (0..48)
            .map(|i| if (i / 6) % 2 == 0 { 10.0 } else { 20.0 })
            .collect();
        let series = make_flat_series(&closes);

        let strategy = MovingAverageCrossover::new(2, 4);
        let engine = BacktestEngine::new(zero_cost_config(1000.0));
        let result = engine.run(&series, &strategy).unwrap();

        assert!(result.trades.len() >= 2);
        assert_eq!(result.equity_curve.len(), 48);

        let total_profit: f64 = result.trades.iter().map(|t| t.profit).sum();
        let last_equity = result.equity_curve.last().unwrap().equity;
        assert_relative_eq!(last_equity, 1000.0 + total_profit, max_relative = 1e-9);
        assert_relative_eq!(
            result.metrics.final_capital,
            1000.0 + total_profit,
            max_relative = 1e-9
        );
    }
}

mod config_driven {
    use super::*;

    const INI: &str = "\
[backtest]
initial_capital = 1000
commission_pct = 0
position_size = 1.0

[strategy]
name = ma-crossover
short_window = 2
long_window = 4
";

    #[test]
    fn ini_configures_strategy_and_engine() {
        let adapter = FileConfigAdapter::from_string(INI).unwrap();
        let config: Option<&dyn stratbench::ports::config_port::ConfigPort> = Some(&adapter);

        let strategy = cli::build_strategy(None, config).unwrap();
        assert_eq!(strategy.name(), "MA Crossover");
        assert_eq!(strategy.parameters().get("short_window"), Some(2.0));
        assert_eq!(strategy.parameters().get("long_window"), Some(4.0));

        let bt_config = cli::build_backtest_config(config);
        assert!((bt_config.initial_capital - 1000.0).abs() < f64::EPSILON);
        assert_eq!(bt_config.commission_pct, 0.0);
        assert!((bt_config.position_size - 1.0).abs() < f64::EPSILON);

        let series = make_flat_series(&CROSSOVER_CLOSES);
        let engine = BacktestEngine::new(bt_config);
        let result = engine.run(&series, strategy.as_ref()).unwrap();

        assert_eq!(result.trades.len(), 1);
        assert!((result.trades[0].profit - -25.0).abs() < 1e-9);
        assert!((result.metrics.final_capital - 975.0).abs() < 1e-9);
    }
}

mod optimizer_grid {
    use super::*;

    #[test]
    fn grid_search_picks_the_best_combination() {
        // V-shaped market: falls from 60 to 36, then recovers to 58. Short
        // windows catch the turn; an inverted pair never enters.
        let closes: Vec<f64> = (0..24)
            .map(|i| {
                if i < 12 {
                    60.0 - 2.0 * i as f64
                } else {
                    36.0 + 2.0 * (i - 12) as f64
                }
            })
            .collect();
        let series = make_flat_series(&closes);

        let mut grid = ParameterGrid::new();
        grid.add("short_window", vec![2.0, 6.0]);
        grid.add("long_window", vec![4.0, 8.0]);

        let mut strategy = MovingAverageCrossover::default();
        let outcome = strategy
            .optimize(&series, &grid, "total_return", &zero_cost_config(1000.0))
            .unwrap();

        assert_eq!(outcome.records.len(), 4);
        assert_eq!(outcome.metric, "total_return");

        let best_from_records = outcome
            .records
            .iter()
            .map(|r| r.metrics.metric_value("total_return").unwrap())
            .fold(f64::NEG_INFINITY, f64::max);
        assert!((outcome.best_metric - best_from_records).abs() < 1e-12);
        assert!(outcome.best_metric > 0.0);

        // The winning parameters are left applied to the strategy.
        assert_eq!(
            strategy.parameters().get("short_window"),
            outcome.best_parameters.get("short_window")
        );
        assert_eq!(
            strategy.parameters().get("long_window"),
            outcome.best_parameters.get("long_window")
        );
    }

    #[test]
    fn unknown_metric_is_rejected_before_any_run() {
        let series = make_flat_series(&[100.0; 10]);
        let mut grid = ParameterGrid::new();
        grid.add("short_window", vec![2.0]);

        let mut strategy = MovingAverageCrossover::default();
        let err = strategy
            .optimize(&series, &grid, "alpha", &zero_cost_config(1000.0))
            .unwrap_err();
        assert!(matches!(err, StratbenchError::UnknownMetric { name } if name == "alpha"));
    }
}

mod data_ports {
    use super::*;

    #[test]
    fn mock_port_serves_validated_series() {
        let bars = vec![
            make_bar("2024-01-01", 100.0),
            make_bar("2024-01-02", 101.0),
            make_bar("2024-01-03", 102.0),
        ];
        let port = MockDataPort::new().with_bars("ACME", bars);

        let series = port.fetch_series("ACME").unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![100.0, 101.0, 102.0]);
    }

    #[test]
    fn mock_port_propagates_validation_failures() {
        let bars = vec![
            make_bar("2024-01-02", 100.0),
            make_bar("2024-01-01", 101.0),
        ];
        let port = MockDataPort::new().with_bars("BAD", bars);

        let err = port.fetch_series("BAD").unwrap_err();
        assert!(matches!(err, StratbenchError::InvalidSeries { .. }));
    }

    #[test]
    fn mock_port_reports_configured_errors() {
        let port = MockDataPort::new().with_error("GONE", "source offline");
        let err = port.fetch_series("GONE").unwrap_err();
        assert!(matches!(err, StratbenchError::Data { reason } if reason == "source offline"));
    }

    #[test]
    fn mock_port_lists_symbols_sorted() {
        let port = MockDataPort::new()
            .with_bars("ZZZ", vec![])
            .with_bars("AAA", vec![]);
        assert_eq!(port.list_symbols().unwrap(), vec!["AAA", "ZZZ"]);
    }
}
