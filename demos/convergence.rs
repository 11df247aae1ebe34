//! Runs a convergence sweep for every problem of `mcconv::problems` and prints the data of the
//! log-log plots as JSON.
//!
//! An optional first argument names a JSON file with the sweep configuration, for example
//! `{ "lo": 1, "hi": 6, "trials": 30, "n_cores": 4 }`.
use mcconv::callbacks::SinkCallback;
use mcconv::problems;
use mcconv::sweep::{SweepConfig, X_LABEL, Y_LABEL};

use rand_pcg::Pcg64;
use serde_json::json;
use std::env;

fn main() -> mcconv::Result<()> {
    let config = match env::args().nth(1) {
        Some(path) => SweepConfig::from_path(path)?,
        None => SweepConfig::default(),
    };

    // Initialize the random number generator.
    let mut rng = Pcg64::new(0xcafef00dd15ea5e5, 0xa02bdbf7bb3c0a7ac28fa16a64abf96);

    let mut plots = Vec::new();

    for problem in problems::all() {
        let result = problem.sweep(&config, &mut rng, &SinkCallback {})?;
        let (calls, errors) = result.series();

        eprintln!(
            "{}: reference {}, convergence rate {:?}",
            problem.name,
            problem.reference,
            result.convergence_rate()
        );

        plots.push(json!({
            "title": problem.name,
            "x_label": X_LABEL,
            "y_label": Y_LABEL,
            "x": calls,
            "y": errors,
        }));
    }

    println!("{}", serde_json::to_string_pretty(&plots)?);

    Ok(())
}
