//! Implementation of different callback functions.
use crate::core::estimators::Estimators;
use crate::core::Checkpoint;
use num_traits::Float;
use serde::Serialize;
use std::fmt::Display;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Trait for implementing callbacks for iterative MC algorithms
pub trait Callback<T, R, E> {
    /// This method is called after each successfully finished iteration and may print information
    /// about it.
    fn print(&self, chkpts: &[Checkpoint<R, E>]);
}

/// A callback function that does nothing
pub struct SinkCallback {}

impl<T, R, E> Callback<T, R, E> for SinkCallback {
    fn print(&self, _: &[Checkpoint<R, E>]) {}
}

/// A callback function that prints the result of each individual iteration
pub struct SimpleCallback {}

impl<T, R, E> Callback<T, R, E> for SimpleCallback
where
    T: Display + Float,
    E: Estimators<T>,
{
    fn print(&self, chkpts: &[Checkpoint<R, E>]) {
        // Make sure that there is at least one checkpoint
        // otherwise do nothing.
        if let Some(chkpt) = chkpts.last() {
            let estimators = chkpt.estimators();
            println!("iteration {} finished.", chkpts.len() - 1);
            println!(
                "this iteration: N={} E={} \u{b1} {}",
                estimators.calls(),
                estimators.mean(),
                estimators.std()
            );
        }
    }
}

/// Writes all checkpoints produced so far as a JSON array to a file, replacing its previous
/// content after every iteration.
///
/// Failures to write are logged with `log::error!` and do not abort the integration.
pub struct FileWriterCallback {
    path: PathBuf,
}

impl FileWriterCallback {
    /// Constructor.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Returns the path checkpoints are written to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write<R: Serialize, E: Serialize>(
        &self,
        chkpts: &[Checkpoint<R, E>],
    ) -> crate::error::Result<()> {
        let writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer(writer, chkpts)?;
        Ok(())
    }
}

impl<T, R, E> Callback<T, R, E> for FileWriterCallback
where
    R: Serialize,
    E: Serialize,
{
    fn print(&self, chkpts: &[Checkpoint<R, E>]) {
        if let Err(err) = self.write(chkpts) {
            log::error!(
                "could not write checkpoints to {}: {}",
                self.path.display(),
                err
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::estimators::BasicEstimators;
    use crate::integrators::plain::{self, PlainCheckpoint};
    use crate::sampling::Uniform;
    use assert_approx_eq::assert_approx_eq;
    use rand_pcg::Pcg64;
    use std::fs::read_to_string;
    use tempfile::NamedTempFile;

    #[test]
    fn test_write_checkpoint_to_file() {
        let file = NamedTempFile::new().unwrap();
        let callback = FileWriterCallback::new(file.path());
        let rng = Pcg64::new(0xcafef00dd15ea5e5, 0xa02bdbf7bb3c0a7ac28fa16a64abf96);

        let original = plain::integrate(
            &f64::exp,
            &Uniform::unit(),
            &rng,
            &callback,
            1,
            &[1000, 100],
        )
        .unwrap();

        let chkpt_file = read_to_string(callback.path()).unwrap();
        let chkpts: Vec<PlainCheckpoint<f64, Pcg64>> = serde_json::from_str(&chkpt_file).unwrap();

        // make sure all the checkpoints have been written and read
        assert_eq!(original.len(), chkpts.len());

        for (read, written) in chkpts.iter().zip(&original) {
            assert_eq!(read.estimators().calls(), written.estimators().calls());
            assert_approx_eq!(read.estimators().mean(), written.estimators().mean(), 1e-14);
            assert_approx_eq!(read.estimators().var(), written.estimators().var(), 1e-14);
            assert_eq!(
                serde_json::to_string(read.rng_after()).unwrap(),
                serde_json::to_string(written.rng_after()).unwrap()
            );
        }
    }

    #[test]
    fn test_unwritable_path_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // a directory cannot be opened as a file
        let callback = FileWriterCallback::new(dir.path());
        let rng = Pcg64::new(0xcafef00dd15ea5e5, 0xa02bdbf7bb3c0a7ac28fa16a64abf96);

        let result = plain::integrate(&f64::exp, &Uniform::unit(), &rng, &callback, 1, &[10]);

        assert!(result.is_ok());
    }
}
