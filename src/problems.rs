//! Integrals with known closed forms, typical of posterior expectation values, for testing and
//! demonstrating the integrators.

use crate::callbacks::Callback;
use crate::error::Result;
use crate::integrators::plain::{self, PlainEstimators};
use crate::sampling::{Domain, Exponential, Uniform};
use crate::sweep::{self, SweepConfig, SweepResult};

use rand::Rng;
use std::f64::consts::{E, FRAC_PI_2};

/// An integrand together with its domain and the exact value of its integral.
#[derive(Clone, Copy, Debug)]
pub struct Problem {
    /// Short name, used when printing results.
    pub name: &'static str,
    /// The function to integrate.
    pub integrand: fn(f64) -> f64,
    /// The domain the integrand is sampled from.
    pub domain: Domain<f64>,
    /// The exact value of the integral.
    pub reference: f64,
}

impl Problem {
    /// Estimates the integral with `calls` points, see [`plain::estimate`].
    ///
    /// # Errors
    ///
    /// See [`plain::estimate`].
    pub fn estimate<R>(&self, rng: &mut R, calls: usize) -> Result<f64>
    where
        R: Clone + Rng + Send + Sync,
    {
        plain::estimate(&self.integrand, &self.domain, rng, calls)
    }

    /// Runs a convergence sweep of this problem, see [`sweep::sweep`].
    ///
    /// # Errors
    ///
    /// See [`sweep::sweep`].
    pub fn sweep<R>(
        &self,
        config: &SweepConfig,
        rng: &mut R,
        callback: &impl Callback<f64, R, PlainEstimators<f64>>,
    ) -> Result<SweepResult<f64>>
    where
        R: Clone + Rng + Send + Sync,
    {
        sweep::sweep(
            &self.integrand,
            &self.domain,
            self.reference,
            config,
            rng,
            callback,
        )
    }
}

/// $\int_0^1 \mathrm{d}x \, e^x = e - 1$, sampled uniformly.
pub fn exp_unit_interval() -> Problem {
    Problem {
        name: "exp(x) on [0, 1]",
        integrand: f64::exp,
        domain: Uniform::unit().into(),
        reference: E - 1.0,
    }
}

/// $\int_0^\infty \mathrm{d}x \, e^{-x} \sin x = 1/2$, computed as the expectation value of
/// $\sin x$ under the standard exponential distribution.
pub fn damped_sine() -> Problem {
    Problem {
        name: "sin(x) under Exp(1)",
        integrand: f64::sin,
        domain: Exponential::standard().into(),
        reference: 0.5,
    }
}

/// $\int_0^{\pi/2} \mathrm{d}x \, x \sin x = 1$, sampled uniformly.
pub fn x_sin_x() -> Problem {
    Problem {
        name: "x sin(x) on [0, pi/2]",
        integrand: |x| x * x.sin(),
        domain: Uniform::new_unchecked(0.0, FRAC_PI_2).into(),
        reference: 1.0,
    }
}

/// All problems of this module.
pub fn all() -> Vec<Problem> {
    vec![exp_unit_interval(), damped_sine(), x_sin_x()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_pcg::Pcg64;

    #[test]
    fn references_are_the_closed_forms() {
        assert!((exp_unit_interval().reference - 1.718_281_828).abs() < 1e-9);
        assert_eq!(damped_sine().reference, 0.5);
        assert_eq!(x_sin_x().reference, 1.0);
    }

    #[test]
    fn integrands_at_sample_points() {
        assert_eq!((x_sin_x().integrand)(FRAC_PI_2), FRAC_PI_2);
        assert_eq!((damped_sine().integrand)(0.0), 0.0);
        assert_eq!((exp_unit_interval().integrand)(0.0), 1.0);
    }

    #[test]
    fn names_are_unique() {
        let problems = all();

        assert_eq!(problems.len(), 3);
        for (i, a) in problems.iter().enumerate() {
            for b in &problems[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn estimates_are_close() {
        let mut rng = Pcg64::new(0xcafef00dd15ea5e5, 0xa02bdbf7bb3c0a7ac28fa16a64abf96);

        for problem in all() {
            let estimate = problem.estimate(&mut rng, 100_000).unwrap();
            let error = sweep::relative_error(problem.reference, estimate).unwrap();

            assert!(error < 0.02, "{}: {} vs {}", problem.name, estimate, problem.reference);
        }
    }
}
