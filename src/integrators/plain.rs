//! Plain integrator
//!
//! Approximates $\int \mathrm{d}x \, w(x) f(x)$ by the mean of `weight * f(x)` over points
//! generated by a [`Sampler`], one random number per point.
use crate::callbacks::{Callback, SinkCallback};
use crate::core::estimators::*;
use crate::core::*;
use crate::error::{Error, Result};
use crate::sampling::{PhaseSpacePoint, Sampler};

use log::{debug, warn};
use num_traits::{Float, FromPrimitive};
use rand::distributions::{Distribution, Standard};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

use crossbeam as cb;

#[derive(Debug, Clone, Deserialize, Serialize)]
/// Estimators for the plain integrator.
///
/// Non-finite values of the integrand are not filtered: they enter the sums and therefore the
/// mean, and are additionally counted in `non_finite_calls`.
pub struct PlainEstimators<T> {
    sum: T,
    sumsq: T,
    calls: usize,
    non_finite_calls: usize,
    non_zero_calls: usize,
}

impl<T: Float> Default for PlainEstimators<T> {
    fn default() -> Self {
        Self {
            sum: T::zero(),
            sumsq: T::zero(),
            calls: 0,
            non_finite_calls: 0,
            non_zero_calls: 0,
        }
    }
}

impl<T: Float> Add for PlainEstimators<T> {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            sum: self.sum + other.sum,
            sumsq: self.sumsq + other.sumsq,
            calls: self.calls + other.calls,
            non_finite_calls: self.non_finite_calls + other.non_finite_calls,
            non_zero_calls: self.non_zero_calls + other.non_zero_calls,
        }
    }
}

impl<T> BasicEstimators<T> for PlainEstimators<T>
where
    T: Float + FromPrimitive,
{
    fn mean(&self) -> T {
        self.sum / T::from_usize(self.calls).unwrap_or_else(T::nan)
    }

    /// The variance of the mean, undefined (`NaN`) for fewer than two calls.
    fn var(&self) -> T {
        let calls = T::from_usize(self.calls).unwrap_or_else(T::nan);
        (self.sumsq - self.sum * self.sum / calls) / calls / (calls - T::one())
    }
}

impl<T> Estimators<T> for PlainEstimators<T>
where
    T: Float + FromPrimitive,
{
    fn calls(&self) -> usize {
        self.calls
    }

    fn non_finite_calls(&self) -> usize {
        self.non_finite_calls
    }

    fn non_zero_calls(&self) -> usize {
        self.non_zero_calls
    }
}

impl<T> Updateable<T> for PlainEstimators<T>
where
    T: AddAssign + Float,
{
    fn update(&mut self, value: T) {
        self.calls += 1;

        if value != T::zero() {
            self.non_zero_calls += 1;
        }

        if !value.is_finite() {
            self.non_finite_calls += 1;
        }

        self.sum += value;
        self.sumsq += value * value;
    }
}

/// A checkpoint of the plain integrator.
pub type PlainCheckpoint<T, R> = Checkpoint<R, PlainEstimators<T>>;

/// Perform part of the integration of a given iteration on a specific `core`.
///
/// Returns the estimators of this core and its random number generator, positioned right after
/// the last random number this core used.
fn perform_iteration_contribution_from_core<T, R, I, S>(
    integrand: &I,
    sampler: &S,
    mut rng: R,
    calls: usize,
    core: usize,
    n_cores: usize,
) -> (PlainEstimators<T>, R)
where
    I: Integrand<T>,
    S: Sampler<T>,
    T: AddAssign + Float + FromPrimitive,
    R: Rng,
    Standard: Distribution<T>,
{
    // every point consumes exactly one random number, so skip the blocks of the previous cores
    let skip = (calls_per_core(n_cores, calls) * core).min(calls);

    for _ in 0..skip {
        let _: T = rng.gen();
    }

    let actual_calls = compute_calls_for_core(core, n_cores, calls);
    debug!(
        "core {}/{}: skipped {} random numbers, performing {} calls",
        core, n_cores, skip, actual_calls
    );

    let estimators = (0..actual_calls).fold(PlainEstimators::default(), |mut acc, _| {
        let PhaseSpacePoint { x, weight } = sampler.generate_psp(rng.gen());
        acc.update(weight * integrand.call(x));
        acc
    });

    (estimators, rng)
}

/// Perform a single iteration of integrating the `integrand` on `n_cores` cores using `calls`
/// samples.
fn integrate_iteration<T, R, I, S>(
    integrand: &I,
    sampler: &S,
    rng: &R,
    n_cores: usize,
    calls: usize,
) -> Result<PlainCheckpoint<T, R>>
where
    I: Integrand<T>,
    S: Sampler<T>,
    T: AddAssign + Float + FromPrimitive + Send + Sync,
    R: Clone + Rng + Send + Sync,
    Standard: Distribution<T>,
{
    // more cores than calls would only spawn idle threads
    let n_cores = n_cores.min(calls);

    if n_cores == 1 {
        let (estimators, rng_after) =
            perform_iteration_contribution_from_core(integrand, sampler, rng.clone(), calls, 0, 1);

        return Ok(Checkpoint::new(rng.clone(), rng_after, estimators));
    }

    // distribute the workload evenly across the cores
    let collect_results = cb::thread::scope(|s| {
        let handles = (0..n_cores)
            .map(|core| {
                let rng_local = rng.clone();

                s.spawn(move |_| {
                    perform_iteration_contribution_from_core(
                        integrand, sampler, rng_local, calls, core, n_cores,
                    )
                })
            })
            .collect::<Vec<_>>();

        // wait for the threads to finish
        handles
            .into_iter()
            .map(|handle| handle.join().map_err(|_| Error::Worker))
            .collect::<Result<Vec<_>>>()
    })
    .map_err(|_| Error::Worker)??;

    // the last core stops exactly after the last random number of this iteration
    let mut rng_after = rng.clone();
    let mut estimators = PlainEstimators::default();

    for (e, r) in collect_results {
        estimators = estimators + e;
        rng_after = r;
    }

    Ok(Checkpoint::new(rng.clone(), rng_after, estimators))
}

/// Integrate the `integrand` over the domain of `sampler` using `n_cores` cores.
///
/// The random number generator in its initial state is provided in `rng`
/// together with a `callback` function that prints estimates after each
/// iteration.
/// The number of calls of the integrand per iteration is stored in the slice
/// `iterations`. Each iteration continues the random number stream where the previous one
/// stopped, and the results do not depend on `n_cores` apart from the order in which the sums
/// are accumulated.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `n_cores` or any entry of `iterations` is zero, before
/// any integrand evaluation, and [`Error::Worker`] if a worker thread panicked.
pub fn integrate<T, R, I, S>(
    integrand: &I,
    sampler: &S,
    rng: &R,
    callback: &impl Callback<T, R, PlainEstimators<T>>,
    n_cores: usize,
    iterations: &[usize],
) -> Result<Vec<PlainCheckpoint<T, R>>>
where
    I: Integrand<T>,
    S: Sampler<T>,
    T: AddAssign + Float + FromPrimitive + Send + Sync,
    R: Clone + Rng + Send + Sync,
    Standard: Distribution<T>,
{
    if n_cores == 0 {
        return Err(Error::invalid("n_cores", "must be at least one"));
    }

    if iterations.contains(&0) {
        return Err(Error::invalid("calls", "must be at least one"));
    }

    // storage for the results of each iteration
    let mut checkpoints = Vec::with_capacity(iterations.len());

    let mut rng_global = rng.clone();

    // Integration iterations are treated sequentially
    for &calls in iterations {
        let checkpoint = integrate_iteration(integrand, sampler, &rng_global, n_cores, calls)?;
        // synchronize the random number generation
        rng_global = checkpoint.rng_after().clone();

        let non_finite = checkpoint.estimators().non_finite_calls();
        if non_finite > 0 {
            warn!(
                "iteration {}: {} of {} integrand values were not finite",
                checkpoints.len(),
                non_finite,
                calls
            );
        }

        checkpoints.push(checkpoint);
        callback.print(&checkpoints);
    }

    Ok(checkpoints)
}

/// Estimate the integral of `integrand` with `calls` points generated by `sampler`.
///
/// This is a single iteration on a single core. `rng` is advanced by exactly `calls` random
/// numbers, so consecutive calls use fresh samples.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `calls` is zero.
pub fn estimate<T, R, I, S>(integrand: &I, sampler: &S, rng: &mut R, calls: usize) -> Result<T>
where
    I: Integrand<T>,
    S: Sampler<T>,
    T: AddAssign + Float + FromPrimitive + Send + Sync,
    R: Clone + Rng + Send + Sync,
    Standard: Distribution<T>,
{
    let mut checkpoints = integrate(integrand, sampler, &*rng, &SinkCallback {}, 1, &[calls])?;
    let (_, rng_after, estimators) = checkpoints.remove(0).destructure();

    *rng = rng_after;

    Ok(estimators.mean())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::{Exponential, Uniform};
    use assert_approx_eq::assert_approx_eq;
    use rand_pcg::Pcg64;
    use serde::Serialize;

    const TOLERANCE: f64 = 1e-15;

    fn assert_eq_rng<R>(lhs: &R, rhs: &R)
    where
        R: Rng + Serialize,
    {
        assert_eq!(
            serde_json::to_string(lhs).unwrap(),
            serde_json::to_string(rhs).unwrap()
        );
    }

    fn rng() -> Pcg64 {
        Pcg64::new(0xcafef00dd15ea5e5, 0xa02bdbf7bb3c0a7ac28fa16a64abf96)
    }

    // int_0^1 dx |2x-1| = 0.5
    fn abs(x: f64) -> f64 {
        (2.0 * x - 1.0).abs()
    }

    #[test]
    fn test_plain_iteration() {
        let chkpts = integrate(
            &abs,
            &Uniform::unit(),
            &rng(),
            &SinkCallback {},
            1,
            &[1000],
        )
        .unwrap();

        assert_eq!(chkpts.len(), 1);
        assert_eq!(chkpts[0].estimators().calls(), 1000);
        assert_approx_eq!(chkpts[0].estimators().mean(), 4.891001827394124e-1, TOLERANCE);
        assert_approx_eq!(chkpts[0].estimators().var(), 8.704232037144878e-5, TOLERANCE);
        assert_approx_eq!(
            chkpts[0].estimators().std(),
            8.704232037144878e-5_f64.sqrt(),
            TOLERANCE
        );
        assert_eq_rng(chkpts[0].rng_before(), &rng());
    }

    #[test]
    fn test_rng_after_consumes_one_number_per_call() {
        let mut target = rng();
        for _ in 0..250 {
            let _: f64 = target.gen();
        }

        let chkpts = integrate(
            &abs,
            &Exponential::new(1.0).unwrap(),
            &rng(),
            &SinkCallback {},
            1,
            &[250],
        )
        .unwrap();

        assert_eq_rng(chkpts[0].rng_after(), &target);
    }

    #[test]
    fn test_resume_from_checkpoint() {
        let callback = SinkCallback {};
        let iterations = vec![1000, 1000, 1000, 1000];

        let result_4_it =
            integrate(&abs, &Uniform::unit(), &rng(), &callback, 1, &iterations).unwrap();

        // get the random number generator state after the second iteration
        let rng_resume = result_4_it[1].rng_after();

        let result_2_it = integrate(
            &abs,
            &Uniform::unit(),
            rng_resume,
            &callback,
            1,
            &iterations[2..4],
        )
        .unwrap();

        assert_eq_rng(result_4_it[3].rng_after(), result_2_it[1].rng_after());
        assert_eq!(
            result_4_it[3].estimators().mean(),
            result_2_it[1].estimators().mean()
        );
        assert_eq!(
            result_4_it[3].estimators().var(),
            result_2_it[1].estimators().var()
        );
    }

    #[test]
    fn test_result_independent_of_cores() {
        let sampler = Exponential::new(1.0).unwrap();

        for &(n_cores, calls) in &[(2, 1001), (3, 1001), (8, 1001), (16, 5)] {
            let single =
                integrate(&f64::sin, &sampler, &rng(), &SinkCallback {}, 1, &[calls]).unwrap();
            let multi = integrate(
                &f64::sin,
                &sampler,
                &rng(),
                &SinkCallback {},
                n_cores,
                &[calls],
            )
            .unwrap();

            assert_eq!(multi[0].estimators().calls(), calls);
            assert_approx_eq!(
                multi[0].estimators().mean(),
                single[0].estimators().mean(),
                1e-12
            );
            assert_eq_rng(multi[0].rng_after(), single[0].rng_after());
        }
    }

    #[test]
    fn test_estimate_is_reproducible() {
        let mut rng_1 = rng();
        let mut rng_2 = rng();

        let a = estimate(&f64::exp, &Uniform::unit(), &mut rng_1, 500).unwrap();
        let b = estimate(&f64::exp, &Uniform::unit(), &mut rng_2, 500).unwrap();

        assert_eq!(a.to_bits(), b.to_bits());
        assert_eq_rng(&rng_1, &rng_2);

        // the generator moved on, so the next estimate uses fresh samples
        let c = estimate(&f64::exp, &Uniform::unit(), &mut rng_1, 500).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_single_call() {
        let mut rng = rng();
        let mut probe = rng.clone();
        let r: f64 = probe.gen();

        let value = estimate(&f64::exp, &Uniform::unit(), &mut rng, 1).unwrap();

        assert_eq!(value, r.exp());
        assert_eq_rng(&rng, &probe);
    }

    #[test]
    fn test_zero_calls_are_rejected() {
        let mut rng = rng();
        let result = estimate(&f64::exp, &Uniform::unit(), &mut rng, 0);

        assert!(matches!(
            result,
            Err(Error::InvalidArgument { name: "calls", .. })
        ));

        let result = integrate(
            &f64::exp,
            &Uniform::unit(),
            &rng,
            &SinkCallback {},
            1,
            &[10, 0, 10],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_cores_are_rejected() {
        let result = integrate(
            &f64::exp,
            &Uniform::unit(),
            &rng(),
            &SinkCallback {},
            0,
            &[10],
        );

        assert!(matches!(
            result,
            Err(Error::InvalidArgument { name: "n_cores", .. })
        ));
    }

    #[test]
    fn test_non_finite_values_propagate() {
        // ln(x) is NaN for negative x
        let sampler = Uniform::new(-1.0, 1.0).unwrap();
        let chkpts = integrate(
            &f64::ln,
            &sampler,
            &rng(),
            &SinkCallback {},
            1,
            &[100],
        )
        .unwrap();
        let estimators = chkpts[0].estimators();

        assert!(estimators.mean().is_nan());
        assert!(estimators.non_finite_calls() > 0);
        assert!(estimators.non_finite_calls() < 100);
        assert_eq!(estimators.non_zero_calls(), 100);
    }

    #[test]
    fn test_estimators_add() {
        let mut lhs = PlainEstimators::default();
        lhs.update(1.0);
        lhs.update(0.0);
        let mut rhs = PlainEstimators::default();
        rhs.update(f64::INFINITY);

        let sum = lhs + rhs;

        assert_eq!(sum.calls(), 3);
        assert_eq!(sum.non_zero_calls(), 2);
        assert_eq!(sum.non_finite_calls(), 1);
        assert_eq!(sum.mean(), f64::INFINITY);
    }
}
