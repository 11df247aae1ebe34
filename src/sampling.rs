//! Samplers turn uniform random numbers into points of the integration domain.
//!
//! Every sampler consumes exactly one random number $r \in [0, 1)$ per point, which is what makes
//! an integration reproducible from a seed and lets the PLAIN integrator hand contiguous blocks
//! of the random number stream to different cores.

use crate::error::{Error, Result};
use num_traits::Float;
use serde::Serialize;

/// A point of the integration domain together with its weight.
///
/// The integrator averages `weight * f(x)` over all sampled points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseSpacePoint<T> {
    /// Position in the integration domain.
    pub x: T,
    /// Weight of the point.
    pub weight: T,
}

/// Trait which every sampler must implement.
pub trait Sampler<T>: Send + Sync {
    /// Generate a phase space point from the random number `r`, uniformly distributed in
    /// $[0, 1)$.
    fn generate_psp(&self, r: T) -> PhaseSpacePoint<T>;
}

/// Uniform sampling of the interval $[a, b)$.
///
/// Each point carries the weight $b - a$, so that the average of the weighted integrand
/// approximates $\int_a^b \mathrm{d}x \, f(x)$.
#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct Uniform<T> {
    a: T,
    b: T,
}

impl<T: Float> Uniform<T> {
    /// Uniform sampler of the interval from `a` (inclusive) to `b` (exclusive).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] unless both bounds are finite and `a < b`.
    pub fn new(a: T, b: T) -> Result<Self> {
        if !a.is_finite() || !b.is_finite() {
            return Err(Error::invalid("interval", "bounds must be finite"));
        }

        if a >= b {
            return Err(Error::invalid(
                "interval",
                "lower bound must be smaller than the upper bound",
            ));
        }

        Ok(Self { a, b })
    }

    /// Uniform sampler of the unit interval.
    pub fn unit() -> Self {
        Self {
            a: T::zero(),
            b: T::one(),
        }
    }

    /// Callers guarantee that both bounds are finite and `a < b`.
    pub(crate) fn new_unchecked(a: T, b: T) -> Self {
        Self { a, b }
    }

    /// Returns the lower bound.
    pub fn a(&self) -> T {
        self.a
    }

    /// Returns the upper bound.
    pub fn b(&self) -> T {
        self.b
    }
}

impl<T: Float + Send + Sync> Sampler<T> for Uniform<T> {
    fn generate_psp(&self, r: T) -> PhaseSpacePoint<T> {
        let width = self.b - self.a;

        PhaseSpacePoint {
            x: self.a + width * r,
            weight: width,
        }
    }
}

/// Sampling of $[0, \infty)$ from the exponential density $g(x) = \lambda e^{-\lambda x}$.
///
/// Points are generated by inverting the cumulative distribution function. Constructed with
/// [`Exponential::new`] every point has weight one and the integrator approximates
/// $\int_0^\infty \mathrm{d}x \, f(x) g(x)$. Constructed with [`Exponential::importance`] every
/// point is reweighted by $1 / g(x)$ and the integrator approximates
/// $\int_0^\infty \mathrm{d}x \, f(x)$.
#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct Exponential<T> {
    rate: T,
    reweight: bool,
}

impl<T: Float> Exponential<T> {
    /// Exponential sampler with rate $\lambda$ = `rate`, computing expectation values under
    /// $g$.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] unless `rate` is finite and positive.
    pub fn new(rate: T) -> Result<Self> {
        Self::with_reweighting(rate, false)
    }

    /// Exponential sampler with rate $\lambda$ = `rate` whose points are weighted with the
    /// inverse density.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] unless `rate` is finite and positive.
    pub fn importance(rate: T) -> Result<Self> {
        Self::with_reweighting(rate, true)
    }

    /// Exponential sampler with unit rate.
    pub fn standard() -> Self {
        Self {
            rate: T::one(),
            reweight: false,
        }
    }

    fn with_reweighting(rate: T, reweight: bool) -> Result<Self> {
        if !rate.is_finite() || rate <= T::zero() {
            return Err(Error::invalid("rate", "must be finite and positive"));
        }

        Ok(Self { rate, reweight })
    }

    /// Returns the rate $\lambda$.
    pub fn rate(&self) -> T {
        self.rate
    }

    /// Returns whether points are weighted with the inverse density.
    pub fn reweights(&self) -> bool {
        self.reweight
    }

    /// The density $g(x)$ for $x \geq 0$.
    pub fn density(&self, x: T) -> T {
        self.rate * (-self.rate * x).exp()
    }
}

impl<T: Float + Send + Sync> Sampler<T> for Exponential<T> {
    fn generate_psp(&self, r: T) -> PhaseSpacePoint<T> {
        // `r` is in [0, 1), so the argument of the logarithm never vanishes
        let x = -(-r).ln_1p() / self.rate;
        let weight = if self.reweight {
            self.density(x).recip()
        } else {
            T::one()
        };

        PhaseSpacePoint { x, weight }
    }
}

/// The samplers of this crate, selectable at run time.
#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Domain<T> {
    /// A bounded interval, see [`Uniform`].
    Uniform(Uniform<T>),
    /// The half-line $[0, \infty)$, see [`Exponential`].
    Exponential(Exponential<T>),
}

impl<T: Float + Send + Sync> Sampler<T> for Domain<T> {
    fn generate_psp(&self, r: T) -> PhaseSpacePoint<T> {
        match self {
            Self::Uniform(sampler) => sampler.generate_psp(r),
            Self::Exponential(sampler) => sampler.generate_psp(r),
        }
    }
}

impl<T> From<Uniform<T>> for Domain<T> {
    fn from(sampler: Uniform<T>) -> Self {
        Self::Uniform(sampler)
    }
}

impl<T> From<Exponential<T>> for Domain<T> {
    fn from(sampler: Exponential<T>) -> Self {
        Self::Exponential(sampler)
    }
}
