//! Convergence sweeps: integrate with a logarithmically increasing number of calls and compare
//! every estimate with a known reference value.
//!
//! For integrands with finite variance the error of a PLAIN estimate falls like
//! $1/\sqrt{N}$, which shows up as a straight line of slope $-1/2$ when the errors are plotted
//! against the number of calls on log-log axes. [`SweepResult::series`] returns the two
//! sequences to plot, labelled with [`X_LABEL`] and [`Y_LABEL`].

use crate::callbacks::{Callback, SinkCallback};
use crate::core::estimators::{BasicEstimators, Estimators};
use crate::core::Integrand;
use crate::error::{Error, Result};
use crate::integrators::plain::{self, PlainEstimators};
use crate::sampling::Sampler;

use log::debug;
use num_traits::{Float, FromPrimitive};
use rand::distributions::{Distribution, Standard};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs;
use std::ops::AddAssign;
use std::path::Path;

/// Label of the axis showing the number of calls.
pub const X_LABEL: &str = "N_points";

/// Label of the axis showing the error.
pub const Y_LABEL: &str = "absolute relative error";

/// Largest admissible upper exponent, $10^{18}$ calls still fit into a 64-bit `usize`.
pub const MAX_EXPONENT: i32 = 18;

/// How the distance between estimate and reference is measured.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorMeasure {
    /// $|I - E| / |I|$, undefined for a vanishing reference $I$.
    Relative,
    /// $|I - E|$.
    Absolute,
}

impl Default for ErrorMeasure {
    fn default() -> Self {
        Self::Relative
    }
}

impl ErrorMeasure {
    /// Measure the error of `estimate` with respect to `reference`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DegenerateReference`] for a relative error with respect to zero.
    pub fn error<T: Float>(self, reference: T, estimate: T) -> Result<T> {
        match self {
            Self::Relative => relative_error(reference, estimate),
            Self::Absolute => Ok((reference - estimate).abs()),
        }
    }
}

/// Returns $|I - E| / |I|$ for the reference `reference` $= I$ and the estimate `estimate`
/// $= E$.
///
/// # Errors
///
/// Returns [`Error::DegenerateReference`] if `reference` is zero.
pub fn relative_error<T: Float>(reference: T, estimate: T) -> Result<T> {
    if reference == T::zero() {
        return Err(Error::DegenerateReference);
    }

    Ok((reference - estimate).abs() / reference.abs())
}

/// Generates `trials` numbers of calls, logarithmically spaced between $10^\mathrm{lo}$ and
/// $10^\mathrm{hi}$, both inclusive.
///
/// Each number is rounded to the nearest integer, but is at least one. The sequence is
/// non-decreasing and may contain duplicates, which are kept. A single trial yields
/// $10^\mathrm{lo}$ only.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `trials` is zero, `lo > hi`, or `hi` is larger than
/// [`MAX_EXPONENT`].
pub fn log_spaced_calls(lo: i32, hi: i32, trials: usize) -> Result<Vec<usize>> {
    if trials == 0 {
        return Err(Error::invalid("trials", "must be at least one"));
    }

    if lo > hi {
        return Err(Error::invalid(
            "exponents",
            format!("lower exponent {} is larger than upper exponent {}", lo, hi),
        ));
    }

    if hi > MAX_EXPONENT {
        return Err(Error::invalid(
            "exponents",
            format!("upper exponent {} is larger than {}", hi, MAX_EXPONENT),
        ));
    }

    let lo = f64::from(lo);
    let hi = f64::from(hi);
    let step = if trials > 1 {
        (hi - lo) / (trials - 1) as f64
    } else {
        0.0
    };

    Ok((0..trials)
        .map(|i| {
            // pin the last exponent, `lo + step * (trials - 1)` may miss `hi` by an ulp
            let exponent = if trials > 1 && i == trials - 1 {
                hi
            } else {
                step.mul_add(i as f64, lo)
            };

            (10.0_f64.powf(exponent).round() as usize).max(1)
        })
        .collect())
}

/// Parameters of a convergence sweep.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    /// Decimal logarithm of the smallest number of calls.
    pub lo: i32,
    /// Decimal logarithm of the largest number of calls.
    pub hi: i32,
    /// Number of estimates, one for each number of calls.
    pub trials: usize,
    /// Number of cores every estimate is distributed over.
    pub n_cores: usize,
    /// How estimates are compared with the reference.
    pub measure: ErrorMeasure,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            lo: 1,
            hi: 5,
            trials: 20,
            n_cores: 1,
            measure: ErrorMeasure::Relative,
        }
    }
}

impl SweepConfig {
    /// Parses and validates a configuration in JSON format. Missing fields take their default
    /// values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `json` cannot be parsed and [`Error::InvalidArgument`] if
    /// the parsed configuration is invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration in JSON format from `path`, see [`SweepConfig::from_json`].
    ///
    /// # Errors
    ///
    /// Additionally to the errors of [`SweepConfig::from_json`], returns [`Error::Io`] if the
    /// file cannot be read.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Checks that the configuration describes a sweep that can be run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for invalid exponents, zero trials, or zero cores.
    pub fn validate(&self) -> Result<()> {
        if self.n_cores == 0 {
            return Err(Error::invalid("n_cores", "must be at least one"));
        }

        self.calls().map(|_| ())
    }

    /// The numbers of calls of this sweep, see [`log_spaced_calls`].
    ///
    /// # Errors
    ///
    /// See [`log_spaced_calls`].
    pub fn calls(&self) -> Result<Vec<usize>> {
        log_spaced_calls(self.lo, self.hi, self.trials)
    }
}

/// The outcome of a single estimate of a sweep.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ErrorRecord<T> {
    /// Number of calls of the integrand.
    pub calls: usize,
    /// The estimate of the integral.
    pub estimate: T,
    /// Its error with respect to the reference.
    pub error: T,
}

/// All estimates of a sweep in the order of increasing number of calls.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SweepResult<T> {
    reference: T,
    measure: ErrorMeasure,
    records: Vec<ErrorRecord<T>>,
}

impl<T: Float + FromPrimitive> SweepResult<T> {
    /// Returns the reference value the estimates were compared with.
    pub fn reference(&self) -> T {
        self.reference
    }

    /// Returns how the errors were measured.
    pub fn measure(&self) -> ErrorMeasure {
        self.measure
    }

    /// Returns one record per estimate.
    pub fn records(&self) -> &[ErrorRecord<T>] {
        &self.records
    }

    /// Returns the numbers of calls and the errors as two parallel sequences, ready to be
    /// plotted on log-log axes.
    pub fn series(&self) -> (Vec<usize>, Vec<T>) {
        self.records.iter().map(|r| (r.calls, r.error)).unzip()
    }

    /// Returns the slope of the least-squares line through the points $(\ln N, \ln \epsilon)$,
    /// which is close to $-1/2$ for integrands with finite variance.
    ///
    /// Records with a vanishing or non-finite error are ignored. Returns `None` if fewer than two
    /// points remain or all of them share the same number of calls.
    pub fn convergence_rate(&self) -> Option<T> {
        let points = self
            .records
            .iter()
            .filter(|r| r.error.is_finite() && r.error > T::zero())
            .map(|r| Some((T::from_usize(r.calls)?.ln(), r.error.ln())))
            .collect::<Option<Vec<_>>>()?;

        if points.len() < 2 {
            return None;
        }

        let n = T::from_usize(points.len())?;
        let (sum_x, sum_y) = points
            .iter()
            .fold((T::zero(), T::zero()), |(sx, sy), &(x, y)| (sx + x, sy + y));
        let (mean_x, mean_y) = (sum_x / n, sum_y / n);
        let (sxx, sxy) = points.iter().fold((T::zero(), T::zero()), |(sxx, sxy), &(x, y)| {
            let dx = x - mean_x;
            (sxx + dx * dx, sxy + dx * (y - mean_y))
        });

        if sxx == T::zero() {
            None
        } else {
            Some(sxy / sxx)
        }
    }
}

fn check_reference<T: Float>(reference: T, measure: ErrorMeasure) -> Result<()> {
    if !reference.is_finite() {
        return Err(Error::invalid("reference", "must be finite"));
    }

    if measure == ErrorMeasure::Relative && reference == T::zero() {
        return Err(Error::DegenerateReference);
    }

    Ok(())
}

/// Runs a convergence sweep.
///
/// For every number of calls of `config`, in increasing order, the integral of `integrand` over
/// the domain of `sampler` is estimated once and compared with `reference`. Every estimate uses
/// fresh random numbers from `rng`, which is left positioned after the last one used, and
/// `callback` is invoked after every estimate.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] for an invalid configuration or a non-finite reference
/// and [`Error::DegenerateReference`] if relative errors with respect to a vanishing reference
/// are requested. All checks happen before the integrand is evaluated.
pub fn sweep<T, R, I, S>(
    integrand: &I,
    sampler: &S,
    reference: T,
    config: &SweepConfig,
    rng: &mut R,
    callback: &impl Callback<T, R, PlainEstimators<T>>,
) -> Result<SweepResult<T>>
where
    I: Integrand<T>,
    S: Sampler<T>,
    T: AddAssign + Float + FromPrimitive + Send + Sync,
    R: Clone + Rng + Send + Sync,
    Standard: Distribution<T>,
{
    config.validate()?;
    check_reference(reference, config.measure)?;

    let calls = config.calls()?;
    let checkpoints =
        plain::integrate(integrand, sampler, &*rng, callback, config.n_cores, &calls)?;

    let records = checkpoints
        .iter()
        .map(|chkpt| {
            let estimators = chkpt.estimators();
            let estimate = estimators.mean();
            let error = config.measure.error(reference, estimate)?;

            debug!(
                "N={} estimate={:?} error={:?}",
                estimators.calls(),
                estimate.to_f64(),
                error.to_f64()
            );

            Ok(ErrorRecord {
                calls: estimators.calls(),
                estimate,
                error,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if let Some(last) = checkpoints.last() {
        *rng = last.rng_after().clone();
    }

    Ok(SweepResult {
        reference,
        measure: config.measure,
        records,
    })
}

/// Repeats [`sweep`] `runs` times, each run continuing the random number stream of the previous
/// one, and reports for every number of calls the median estimate and the median error.
///
/// Single sweeps scatter considerably; the medians make the trend towards smaller errors
/// visible with a handful of runs.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `runs` is zero, and otherwise the errors of [`sweep`].
pub fn median_sweep<T, R, I, S>(
    integrand: &I,
    sampler: &S,
    reference: T,
    config: &SweepConfig,
    runs: usize,
    rng: &mut R,
) -> Result<SweepResult<T>>
where
    I: Integrand<T>,
    S: Sampler<T>,
    T: AddAssign + Float + FromPrimitive + Send + Sync,
    R: Clone + Rng + Send + Sync,
    Standard: Distribution<T>,
{
    if runs == 0 {
        return Err(Error::invalid("runs", "must be at least one"));
    }

    let results = (0..runs)
        .map(|run| {
            debug!("median sweep: run {}/{}", run + 1, runs);
            sweep(integrand, sampler, reference, config, &mut *rng, &SinkCallback {})
        })
        .collect::<Result<Vec<_>>>()?;

    let records = (0..config.trials)
        .map(|index| {
            let mut estimates = results
                .iter()
                .map(|r| r.records[index].estimate)
                .collect::<Vec<_>>();
            let mut errors = results
                .iter()
                .map(|r| r.records[index].error)
                .collect::<Vec<_>>();

            ErrorRecord {
                calls: results[0].records[index].calls,
                estimate: median(&mut estimates),
                error: median(&mut errors),
            }
        })
        .collect();

    Ok(SweepResult {
        reference,
        measure: config.measure,
        records,
    })
}

/// Median of a non-empty slice, `NaN` values are sorted last.
fn median<T: Float>(values: &mut [T]) -> T {
    values.sort_by(|a, b| match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
    });

    let mid = values.len() / 2;

    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / (T::one() + T::one())
    } else {
        values[mid]
    }
}
