//! The core module
pub mod estimators;

use serde::{Deserialize, Serialize};

/// Integrand trait
///
/// Every closure or function pointer `Fn(T) -> T` that can be shared between threads is an
/// integrand, so most users never implement this trait by hand.
pub trait Integrand<T>: Send + Sync {
    /// Evaluate the integrand at the point `x`.
    fn call(&self, x: T) -> T;
}

impl<T, F> Integrand<T> for F
where
    F: Fn(T) -> T + Send + Sync,
{
    fn call(&self, x: T) -> T {
        self(x)
    }
}

/// A checkpoint saves the state of the generator after an iteration.
/// Checkpoints can be used to restart or resume iterations.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Checkpoint<R, E> {
    rng_before: R,
    rng_after: R,
    estimators: E,
}

impl<R, E> Checkpoint<R, E> {
    /// Constructor
    pub(crate) const fn new(rng_before: R, rng_after: R, estimators: E) -> Self {
        Self {
            rng_before,
            rng_after,
            estimators,
        }
    }

    /// Returns the random number generator before generation of this checkpoint.
    pub const fn rng_before(&self) -> &R {
        &self.rng_before
    }

    /// Returns the random number generator after generation of this checkpoint
    pub const fn rng_after(&self) -> &R {
        &self.rng_after
    }

    /// Returns the estimators of this checkpoint.
    pub const fn estimators(&self) -> &E {
        &self.estimators
    }

    /// Destructure the checkpoint and return its components.
    pub fn destructure(self) -> (R, R, E) {
        (self.rng_before, self.rng_after, self.estimators)
    }
}

/// Compute the number of calls on a given core, given the total number of cores
/// `n_cores`, the index `core` (zero-based) of the current thread as well as the
/// total number of calls `total_calls` to perform combined on all cores.
///
/// Trailing cores receive zero calls when there are fewer calls than cores.
pub(crate) fn compute_calls_for_core(core: usize, n_cores: usize, total_calls: usize) -> usize {
    debug_assert!(core < n_cores);
    let calls_per_core = calls_per_core(n_cores, total_calls);

    calls_per_core.min(total_calls.saturating_sub(core * calls_per_core))
}

/// Size of the contiguous block of calls handled by every core but possibly the last one.
pub(crate) const fn calls_per_core(n_cores: usize, total_calls: usize) -> usize {
    (total_calls + n_cores - 1) / n_cores
}
