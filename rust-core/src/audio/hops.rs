//! Hop segmentation
//!
//! Splits a mono signal into fixed-length, non-overlapping analysis windows.
//! A trailing remainder shorter than one hop is dropped, never zero-padded.

use crate::error::{HopscanError, Result};

/// Number of complete hops of `hop_size` in `len` samples
pub fn hop_count(len: usize, hop_size: usize) -> usize {
    if hop_size == 0 {
        0
    } else {
        len / hop_size
    }
}

/// Read-only window `[offset, offset + hop_size)` of the mono signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hop<'a> {
    /// Position in the hop sequence
    pub index: usize,

    /// First sample, relative to the start of the signal
    pub offset: usize,

    pub samples: &'a [f64],
}

/// Lazy iterator over the hops of a signal
///
/// Cloning gives an independent iterator from the same position, so a fresh
/// `Hops::new` (or a clone taken before iterating) restarts the sequence.
#[derive(Debug, Clone)]
pub struct Hops<'a> {
    samples: &'a [f64],
    hop_size: usize,
    next: usize,
    count: usize,
}

impl<'a> Hops<'a> {
    pub fn new(samples: &'a [f64], hop_size: usize) -> Result<Self> {
        if hop_size == 0 {
            return Err(HopscanError::InvalidArgument(
                "hop size must be positive".to_string(),
            ));
        }

        Ok(Self {
            samples,
            hop_size,
            next: 0,
            count: hop_count(samples.len(), hop_size),
        })
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }
}

impl<'a> Iterator for Hops<'a> {
    type Item = Hop<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }

        let index = self.next;
        let offset = index * self.hop_size;
        self.next += 1;

        Some(Hop {
            index,
            offset,
            samples: &self.samples[offset..offset + self.hop_size],
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Hops<'_> {}

impl std::iter::FusedIterator for Hops<'_> {}
