use std::num::NonZeroUsize;
use std::slice::Chunks;

use super::model::{Dataset, Record, Row};
use crate::config::OutputShape;

/// Number of windows needed to cover `len` records.
pub fn window_count(len: usize, size: NonZeroUsize) -> usize {
    len.div_ceil(size.get())
}

// ---------------------------------------------------------------------------
// Windows – consecutive, non-overlapping slices of the dataset
// ---------------------------------------------------------------------------

/// Walks a dataset `size` records at a time, shaping each record on the way
/// out. Only the last window may be shorter than `size`.
#[derive(Debug, Clone)]
pub struct Windows<'a> {
    dataset: &'a Dataset,
    chunks: Chunks<'a, Row>,
    shape: OutputShape,
}

impl<'a> Windows<'a> {
    pub fn new(dataset: &'a Dataset, size: NonZeroUsize, shape: OutputShape) -> Self {
        Windows {
            dataset,
            chunks: dataset.rows().chunks(size.get()),
            shape,
        }
    }
}

impl Iterator for Windows<'_> {
    type Item = Vec<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let (dataset, shape) = (self.dataset, self.shape);
        self.chunks
            .next()
            .map(|chunk| chunk.iter().map(|row| dataset.shape(row, shape)).collect())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for Windows<'_> {}
