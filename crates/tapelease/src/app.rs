//! Application entry point: evaluate the grid in parallel and check it serially.

use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, info};

use tapelease_core::{PoolStats, ResourcePool};
use tapelease_orchestration::{
    analyze_agreement, par_evaluate, serial_evaluate, slot_usage, Evaluation,
};
use tapelease_tape::Tape;

use crate::config::AppConfig;
use crate::errors::AppError;

/// Outcome of one grid run.
#[derive(Debug)]
pub struct Report {
    /// Copies in the parallel pool.
    pub instances: usize,
    /// Worker threads used for the parallel run.
    pub threads: usize,
    /// Grid points and their derivatives, in input order.
    pub gradients: Vec<(f64, f64)>,
    /// Evaluations served by each slot.
    pub usage: Vec<usize>,
    /// Traffic counters of the parallel pool.
    pub stats: PoolStats,
    /// Wall time of the parallel run.
    pub elapsed: Duration,
}

fn gradient(tape: &mut Tape, x: &f64) -> Result<f64, AppError> {
    Ok(tape.jacobian(*x)?)
}

/// Run the grid evaluation described by `config`.
pub fn evaluate_grid(config: &AppConfig) -> Result<Report, AppError> {
    let timeout = config.acquire_timeout().map_err(AppError::Config)?;
    let template = Tape::quadratic(config.coef);
    #[allow(clippy::cast_precision_loss)]
    let inputs: Vec<f64> = (0..config.points).map(|i| i as f64).collect();

    let pool = ResourcePool::new(&template, config.instances)?;
    let workers = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .thread_name(|i| format!("tapelease-worker-{i}"))
        .build()?;
    info!(
        instances = pool.size(),
        threads = workers.current_num_threads(),
        points = inputs.len(),
        "Starting grid evaluation"
    );

    let start = Instant::now();
    let parallel = workers.install(|| par_evaluate(&pool, &inputs, timeout, gradient))?;
    let elapsed = start.elapsed();

    // Same grid through a single copy on this thread.
    let baseline_pool = ResourcePool::new(&template, 1)?;
    let baseline = serial_evaluate(&baseline_pool, &inputs, gradient)?;
    analyze_agreement(&parallel, &baseline)?;
    debug!(points = inputs.len(), "Parallel results match serial baseline");

    Ok(Report {
        instances: pool.size(),
        threads: workers.current_num_threads(),
        usage: slot_usage(&parallel, pool.size()),
        gradients: pairs(&inputs, &parallel),
        stats: pool.stats(),
        elapsed,
    })
}

fn pairs(inputs: &[f64], evaluations: &[Evaluation<f64>]) -> Vec<(f64, f64)> {
    evaluations
        .iter()
        .map(|e| (inputs[e.input_index], e.value))
        .collect()
}

/// Run the application.
pub fn run(config: &AppConfig) -> Result<()> {
    let report = evaluate_grid(config)?;

    if config.quiet {
        println!("ok");
        return Ok(());
    }

    println!(
        "Evaluated {} points with {} copies on {} threads in {:?}",
        report.gradients.len(),
        report.instances,
        report.threads,
        report.elapsed
    );
    for (slot, count) in report.usage.iter().enumerate() {
        println!("  slot {slot}: {count} evaluations");
    }
    println!(
        "Leases: {} granted, {} released, {} waited",
        report.stats.grants, report.stats.releases, report.stats.waits
    );
    if config.verbose {
        for (x, slope) in &report.gradients {
            println!("  f'({x}) = {slope}");
        }
    }
    println!("Parallel results match serial baseline.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn config(args: &[&str]) -> AppConfig {
        AppConfig::try_parse_from(std::iter::once("tapelease").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn grid_of_one_hundred_on_four_copies() {
        let report = evaluate_grid(&config(&["-i", "4", "-p", "100", "--threads", "4"])).unwrap();
        assert_eq!(report.gradients.len(), 100);
        assert_eq!(report.usage.len(), 4);
        assert_eq!(report.usage.iter().sum::<usize>(), 100);
        assert!(report.usage.iter().all(|&n| n > 0));
        assert_eq!(report.stats.grants, 100);
        assert_eq!(report.stats.releases, 100);
        for (x, slope) in &report.gradients {
            assert!((slope - 6.0 * x).abs() < 1e-9);
        }
    }

    #[test]
    fn zero_instances_is_a_config_error() {
        let err = evaluate_grid(&config(&["-i", "0"])).unwrap_err();
        assert!(matches!(
            err,
            AppError::Construction(tapelease_core::ConstructionError::EmptyPool)
        ));
    }

    #[test]
    fn bad_timeout_is_a_config_error() {
        let err = evaluate_grid(&config(&["--timeout", "whenever"])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn empty_grid_succeeds() {
        let report = evaluate_grid(&config(&["-p", "0"])).unwrap();
        assert!(report.gradients.is_empty());
        assert_eq!(report.stats.grants, 0);
    }
}
