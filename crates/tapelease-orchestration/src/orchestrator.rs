//! Grid evaluation: every input runs under its own lease.

use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::debug;

use tapelease_core::{ParallelSection, PoolError, ResourcePool, ScopedLease};

/// Failures of a grid evaluation or of comparing two runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrchestrationError {
    /// The pool refused a lease.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// Two runs disagree on the value for one input.
    #[error("results differ at input {index}")]
    Mismatch {
        /// First input index whose values differ.
        index: usize,
    },

    /// Two runs covered a different number of inputs.
    #[error("runs have different lengths: {left} vs {right}")]
    LengthMismatch {
        /// Length of the first run.
        left: usize,
        /// Length of the second run.
        right: usize,
    },
}

/// Result for one input, tagged with the slot that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation<O> {
    /// Position of the input in the grid.
    pub input_index: usize,
    /// Slot index of the leased instance.
    pub slot: usize,
    /// Value returned by the worker.
    pub value: O,
}

fn evaluate_one<R, I, O, E, F>(
    pool: &ResourcePool<R>,
    input_index: usize,
    input: &I,
    timeout: Option<Duration>,
    f: &F,
) -> Result<Evaluation<O>, E>
where
    R: Send,
    E: From<PoolError>,
    F: Fn(&mut R, &I) -> Result<O, E>,
{
    let mut lease = match timeout {
        Some(timeout) => ScopedLease::acquire_timeout(pool, timeout)?,
        None => ScopedLease::acquire(pool)?,
    };
    let slot = lease.index();
    let value = f(lease.access(), input)?;
    Ok(Evaluation {
        input_index,
        slot,
        value,
    })
}

/// Evaluate `f` on every input in parallel on the current rayon pool.
///
/// Each call holds a lease only for its own input; with a `timeout`, a call
/// that waits longer than that for a lease fails. The pool is marked
/// parallel-active for the duration. Results keep input order; the first
/// error wins.
pub fn par_evaluate<R, I, O, E, F>(
    pool: &ResourcePool<R>,
    inputs: &[I],
    timeout: Option<Duration>,
    f: F,
) -> Result<Vec<Evaluation<O>>, E>
where
    R: Send,
    I: Sync,
    O: Send,
    E: Send + From<PoolError>,
    F: Fn(&mut R, &I) -> Result<O, E> + Sync,
{
    let _section = ParallelSection::enter(pool);
    let start = Instant::now();

    let results = inputs
        .par_iter()
        .enumerate()
        .map(|(i, input)| evaluate_one(pool, i, input, timeout, &f))
        .collect::<Result<Vec<_>, E>>();

    debug!(
        inputs = inputs.len(),
        pool_size = pool.size(),
        threads = rayon::current_num_threads(),
        elapsed = ?start.elapsed(),
        "Parallel evaluation finished"
    );
    results
}

/// Evaluate `f` on every input on the calling thread.
pub fn serial_evaluate<R, I, O, E, F>(
    pool: &ResourcePool<R>,
    inputs: &[I],
    f: F,
) -> Result<Vec<Evaluation<O>>, E>
where
    R: Send,
    E: From<PoolError>,
    F: Fn(&mut R, &I) -> Result<O, E>,
{
    inputs
        .iter()
        .enumerate()
        .map(|(i, input)| evaluate_one(pool, i, input, None, &f))
        .collect()
}

/// Count how many evaluations each slot served.
#[must_use]
pub fn slot_usage<O>(evaluations: &[Evaluation<O>], pool_size: usize) -> Vec<usize> {
    let mut usage = vec![0; pool_size];
    for eval in evaluations {
        if let Some(count) = usage.get_mut(eval.slot) {
            *count += 1;
        }
    }
    usage
}

/// Check that two runs produced the same value for every input.
pub fn analyze_agreement<O: PartialEq>(
    left: &[Evaluation<O>],
    right: &[Evaluation<O>],
) -> Result<(), OrchestrationError> {
    if left.len() != right.len() {
        return Err(OrchestrationError::LengthMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    match left.iter().zip(right).find(|(a, b)| a.value != b.value) {
        Some((a, _)) => Err(OrchestrationError::Mismatch {
            index: a.input_index,
        }),
        None => Ok(()),
    }
}
