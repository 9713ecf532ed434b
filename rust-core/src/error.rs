//! Error types for decoding and spectral analysis

use thiserror::Error;

use crate::audio::decoder::DecodeError;

/// Errors produced by the analysis pipeline
///
/// Every variant is fatal for a run: nothing is retried and no partial
/// spectrogram is returned.
#[derive(Error, Debug)]
pub enum HopscanError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Failed to allocate {what} ({requested} elements)")]
    OutOfMemory {
        what: &'static str,
        requested: usize,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, HopscanError>;

/// Allocate a vector of `len` copies of `value`, reporting failure instead of aborting
pub(crate) fn try_filled<T: Clone>(len: usize, value: T, what: &'static str) -> Result<Vec<T>> {
    let mut vec = Vec::new();
    vec.try_reserve_exact(len)
        .map_err(|_| HopscanError::OutOfMemory { what, requested: len })?;
    vec.resize(len, value);
    Ok(vec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_filled() {
        let v = try_filled(8, 1.5f64, "test buffer").unwrap();
        assert_eq!(v.len(), 8);
        assert!(v.iter().all(|&x| x == 1.5));
    }

    #[test]
    fn test_try_filled_reports_oom() {
        let err = try_filled(usize::MAX / 2, 0u64, "huge buffer").unwrap_err();
        match err {
            HopscanError::OutOfMemory { what, requested } => {
                assert_eq!(what, "huge buffer");
                assert_eq!(requested, usize::MAX / 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
