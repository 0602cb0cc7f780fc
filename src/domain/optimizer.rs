//! Parameter grid search.
//!
//! The grid is an ordered list of axes; combinations are enumerated in
//! row-major order with the last axis varying fastest. Each combination is
//! backtested and scored on a single metric. Higher is better, ties keep the
//! first combination seen, and combinations whose backtest fails are skipped
//! with a warning.

use tracing::warn;

use crate::domain::backtest::{BacktestConfig, BacktestEngine};
use crate::domain::error::StratbenchError;
use crate::domain::metrics::{METRIC_NAMES, Metrics};
use crate::domain::series::PriceSeries;
use crate::domain::strategy::{Parameters, Strategy};

/// Ordered parameter axes for a grid search.
#[derive(Debug, Clone, Default)]
pub struct ParameterGrid {
    axes: Vec<(String, Vec<f64>)>,
}

impl ParameterGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an axis, replacing any earlier axis with the same name.
    pub fn add(&mut self, name: &str, values: Vec<f64>) {
        if let Some(axis) = self.axes.iter_mut().find(|(n, _)| n == name) {
            axis.1 = values;
        } else {
            self.axes.push((name.to_string(), values));
        }
    }

    pub fn axes(&self) -> &[(String, Vec<f64>)] {
        &self.axes
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// Cartesian product of the axes. An empty grid yields one empty
    /// parameter set; an axis with no values yields none at all.
    pub fn combinations(&self) -> Vec<Parameters> {
        let mut combos = vec![Parameters::new()];
        for (name, values) in &self.axes {
            let mut next = Vec::with_capacity(combos.len() * values.len());
            for combo in &combos {
                for value in values {
                    let mut expanded = combo.clone();
                    expanded.set(name, *value);
                    next.push(expanded);
                }
            }
            combos = next;
        }
        combos
    }
}

#[derive(Debug, Clone)]
pub struct OptimizationRecord {
    pub parameters: Parameters,
    pub metrics: Metrics,
}

#[derive(Debug, Clone)]
pub struct OptimizationOutcome {
    pub metric: String,
    pub best_parameters: Parameters,
    pub best_metric: f64,
    pub records: Vec<OptimizationRecord>,
}

/// Scores every grid combination and applies the best one to `strategy`.
pub fn grid_search(
    strategy: &mut dyn Strategy,
    series: &PriceSeries,
    grid: &ParameterGrid,
    metric: &str,
    config: &BacktestConfig,
) -> Result<OptimizationOutcome, StratbenchError> {
    if !METRIC_NAMES.contains(&metric) {
        return Err(StratbenchError::UnknownMetric {
            name: metric.to_string(),
        });
    }

    let combinations = grid.combinations();
    if combinations.is_empty() {
        return Err(StratbenchError::OptimizationFailed {
            reason: "grid has no parameter combinations".into(),
        });
    }

    let engine = BacktestEngine::new(config.clone());
    let mut records = Vec::with_capacity(combinations.len());
    let mut best: Option<(Parameters, f64)> = None;

    for params in combinations {
        strategy.set_parameters(&params);
        let result = match engine.run(series, strategy) {
            Ok(result) => result,
            Err(err) => {
                warn!(parameters = %params, error = %err, "skipping parameter combination");
                continue;
            }
        };
        let value = result.metrics.metric_value(metric)?;

        let improved = !value.is_nan()
            && match &best {
                None => true,
                Some((_, best_value)) => value > *best_value,
            };
        if improved {
            best = Some((params.clone(), value));
        }

        records.push(OptimizationRecord {
            parameters: params,
            metrics: result.metrics,
        });
    }

    let Some((best_parameters, best_metric)) = best else {
        return Err(StratbenchError::OptimizationFailed {
            reason: "no parameter combination produced a usable result".into(),
        });
    };

    strategy.set_parameters(&best_parameters);

    Ok(OptimizationOutcome {
        metric: metric.to_string(),
        best_parameters,
        best_metric,
        records,
    })
}
