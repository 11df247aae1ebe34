#![warn(clippy::all, clippy::cargo, clippy::nursery, clippy::pedantic)]
#![warn(missing_docs)]

//! The crate `mcconv` provides one-dimensional [Monte Carlo integration] routines together with
//! the tools to watch them converge. It is meant for expectation values of the kind that appear
//! in Bayesian inference, where an integral over a bounded interval or over a half-line has to be
//! approximated by sampling.
//!
//! # Features
//!
//! - **Generic numeric type**. The numeric type is a generic parameter, so that the integration
//! routines can be used with either `f32`, `f64`, or a custom numeric type that implements the
//! `Float` trait from the `num-traits` crate.
//! - **Generic random number generator**. Every random number generator that implements the `Rng`
//! trait from the `rand` crate can be used. The generator is always passed explicitly, there is no
//! hidden global state.
//! - **Reproducibility**. Every sampled point consumes exactly one random number. Results only
//! depend on the generator and its seed, not on the number of cores an integration was
//! distributed over.
//! - **Importance sampling**. Besides uniform sampling of an interval, points can be drawn from an
//! exponential distribution, either to compute expectation values under it or, reweighted with the
//! inverse density, to integrate over $[0, \infty)$.
//! - **Checkpoints**. The state of the generator before and after every iteration is recorded,
//! and can be serialized, to resume or replay an integration.
//! - **Convergence sweeps**. Estimates for logarithmically spaced numbers of calls are compared
//! with a known reference value, yielding the data for a log-log convergence plot and the fitted
//! convergence rate.
//!
//! # What is ...?
//!
//! This section is a dictionary of terms that are used in this documentation. Given
//!
//! $$ I = \int \mathrm{d}x \, w(x) f(x) $$
//!
//! we approximate $I$ using PLAIN Monte Carlo integration with
//!
//! $$ I \approx \frac{1}{N} \sum_{j=1}^N w \left( x^{(j)} \right) f \left( x^{(j)} \right) $$
//!
//! where the points $x^{(j)}$ are generated by a sampler. We use the following terms:
//!
//! - the number of *calls* or the *sample size* is $N$, which is the number of times the integrand
//! is evaluated,
//! - the *integrand* is the function $f(x)$ that is being integrated,
//! - the *weight* $w(x)$ is supplied by the sampler: the length of the interval for uniform
//! sampling, one for expectation values, the inverse density for importance sampling,
//! - the *reference* is the exact value of $I$, if it is known,
//! - the *relative error* is $|I - E| / |I|$ for an estimate $E$.
//!
//! [Monte Carlo integration]: https://en.wikipedia.org/wiki/Monte_Carlo_integration

pub mod callbacks;
pub mod core;
pub mod error;
pub mod integrators;
pub mod problems;
pub mod sampling;
pub mod sweep;

pub use crate::core::*;
pub use crate::error::{Error, Result};
