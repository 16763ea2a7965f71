use std::ops::Range;
use std::sync::Arc;

use ndarray::{
    s, Array2, Array3, ArrayD, ArrayView3, ArrayViewD, Axis, ErrorKind, ShapeError, Slice,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::Result;
use crate::split::SplitPolicy;

// ---------------------------------------------------------------------------
// Dataset trait
// ---------------------------------------------------------------------------

/// Random-access, finite collection of items.
///
/// Iteration is restartable: every call to [`Dataset::iter`] starts again at
/// index 0 and independent iterators do not affect each other.
pub trait Dataset<I>: Send + Sync {
    fn get(&self, index: usize) -> Option<I>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn iter(&self) -> DatasetIterator<'_, I>
    where
        Self: Sized,
    {
        DatasetIterator::new(self)
    }
}

pub struct DatasetIterator<'a, I> {
    dataset: &'a dyn Dataset<I>,
    current: usize,
}

impl<'a, I> DatasetIterator<'a, I> {
    pub fn new<D: Dataset<I>>(dataset: &'a D) -> Self {
        Self {
            dataset,
            current: 0,
        }
    }
}

impl<I> Iterator for DatasetIterator<'_, I> {
    type Item = I;

    fn next(&mut self) -> Option<I> {
        let item = self.dataset.get(self.current)?;
        self.current += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.dataset.len().saturating_sub(self.current);
        (left, Some(left))
    }
}

// ---------------------------------------------------------------------------
// Samples and batches
// ---------------------------------------------------------------------------

/// One window: driving series and the aligned target window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSample {
    /// `(feature_count, T)`
    pub x: Array2<f64>,
    /// `(T,)` for a single target column, `(T, target_count)` otherwise.
    pub y: ArrayD<f64>,
}

/// Consecutive samples stacked along a leading batch axis.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowBatch {
    /// `(batch, feature_count, T)`
    pub x: Array3<f64>,
    /// `(batch, T)` or `(batch, T, target_count)`
    pub y: ArrayD<f64>,
}

impl WindowBatch {
    pub fn len(&self) -> usize {
        self.x.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// WindowedDataset
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct SampleStore {
    x: Array3<f64>,
    y: ArrayD<f64>,
}

/// Ordered window samples over shared storage.
///
/// Cloning, slicing and partitioning only copy an index range; the sample
/// arrays are shared.
#[derive(Debug, Clone)]
pub struct WindowedDataset {
    store: Arc<SampleStore>,
    range: Range<usize>,
}

impl WindowedDataset {
    /// Pair `x[i]` with `y[i]`.  Both must hold the same number of samples.
    pub fn new(x: Array3<f64>, y: ArrayD<f64>) -> Result<Self> {
        let samples = x.len_of(Axis(0));
        if y.ndim() < 2 || y.len_of(Axis(0)) != samples || y.shape()[1] != x.shape()[2] {
            return Err(ShapeError::from_kind(ErrorKind::IncompatibleShape).into());
        }
        Ok(Self {
            store: Arc::new(SampleStore { x, y }),
            range: 0..samples,
        })
    }

    pub fn feature_count(&self) -> usize {
        self.store.x.shape()[1]
    }

    pub fn window_len(&self) -> usize {
        self.store.x.shape()[2]
    }

    pub fn target_count(&self) -> usize {
        self.store.y.shape().get(2).copied().unwrap_or(1)
    }

    /// Feature windows of this dataset, `(samples, feature_count, T)`.
    pub fn features(&self) -> ArrayView3<'_, f64> {
        self.store.x.slice(s![self.range.clone(), .., ..])
    }

    /// Target windows of this dataset, `(samples, T)` or `(samples, T, k)`.
    pub fn targets(&self) -> ArrayViewD<'_, f64> {
        self.store
            .y
            .slice_axis(Axis(0), Slice::from(self.range.clone()))
    }

    /// Sub-dataset over `range`, relative to this dataset.
    ///
    /// # Panics
    /// If `range` reaches past [`Dataset::len`].
    pub fn slice(&self, range: Range<usize>) -> Self {
        assert!(
            range.start <= range.end && range.end <= self.len(),
            "slice {range:?} out of bounds for dataset of length {}",
            self.len()
        );
        Self {
            store: Arc::clone(&self.store),
            range: self.range.start + range.start..self.range.start + range.end,
        }
    }

    /// Split into contiguous train / validation / test datasets.
    pub fn partition(&self, policy: &SplitPolicy) -> Partitions {
        let ranges = policy.ranges(self.len());
        Partitions {
            train: self.slice(ranges.train),
            validation: self.slice(ranges.validation),
            test: self.slice(ranges.test),
        }
    }

    /// Batches of `batch_size` samples in order; the last may be shorter.
    ///
    /// # Panics
    /// If `batch_size` is zero.
    pub fn batches(&self, batch_size: usize) -> Batches<'_> {
        Batches::new(self, self.range.clone().collect(), batch_size)
    }

    /// Like [`WindowedDataset::batches`] over a seeded permutation of the
    /// samples.  The same seed always yields the same batches.
    pub fn shuffled_batches(&self, batch_size: usize, seed: u64) -> Batches<'_> {
        let mut order: Vec<usize> = self.range.clone().collect();
        let mut rng = StdRng::seed_from_u64(seed);
        order.shuffle(&mut rng);
        Batches::new(self, order, batch_size)
    }

    fn gather(&self, indices: &[usize]) -> WindowBatch {
        WindowBatch {
            x: self.store.x.select(Axis(0), indices),
            y: self.store.y.select(Axis(0), indices),
        }
    }
}

impl Dataset<WindowSample> for WindowedDataset {
    fn get(&self, index: usize) -> Option<WindowSample> {
        if index >= self.len() {
            return None;
        }
        let i = self.range.start + index;
        Some(WindowSample {
            x: self.store.x.index_axis(Axis(0), i).to_owned(),
            y: self.store.y.index_axis(Axis(0), i).to_owned(),
        })
    }

    fn len(&self) -> usize {
        self.range.len()
    }
}

/// The three contiguous partitions of a dataset.
#[derive(Debug, Clone)]
pub struct Partitions {
    pub train: WindowedDataset,
    pub validation: WindowedDataset,
    pub test: WindowedDataset,
}

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

/// Iterator over [`WindowBatch`]es of a dataset.
pub struct Batches<'a> {
    dataset: &'a WindowedDataset,
    order: Vec<usize>,
    batch_size: usize,
    position: usize,
}

impl<'a> Batches<'a> {
    fn new(dataset: &'a WindowedDataset, order: Vec<usize>, batch_size: usize) -> Self {
        assert!(batch_size > 0, "batch_size must be positive");
        Self {
            dataset,
            order,
            batch_size,
            position: 0,
        }
    }
}

impl Iterator for Batches<'_> {
    type Item = WindowBatch;

    fn next(&mut self) -> Option<WindowBatch> {
        if self.position >= self.order.len() {
            return None;
        }
        let end = (self.position + self.batch_size).min(self.order.len());
        let batch = self.dataset.gather(&self.order[self.position..end]);
        self.position = end;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.order.len() - self.position).div_ceil(self.batch_size);
        (left, Some(left))
    }
}

impl ExactSizeIterator for Batches<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    /// `samples` samples where every x value of sample i is i and y[i, t] = 10 i + t.
    fn dataset(samples: usize) -> WindowedDataset {
        let x = Array3::from_shape_fn((samples, 2, 3), |(i, _, _)| i as f64);
        let y = Array::from_shape_fn((samples, 3), |(i, t)| (10 * i + t) as f64).into_dyn();
        WindowedDataset::new(x, y).unwrap()
    }

    #[test]
    fn test_get_pairs_samples() {
        let ds = dataset(5);
        let sample = ds.get(3).unwrap();
        assert_eq!(sample.x.shape(), &[2, 3]);
        assert!(sample.x.iter().all(|&v| v == 3.0));
        assert_eq!(sample.y.as_slice().unwrap(), &[30., 31., 32.]);
        assert!(ds.get(5).is_none());
    }

    #[test]
    fn test_iter_is_restartable() {
        let ds = dataset(4);
        let first: Vec<f64> = ds.iter().map(|s| s.x[[0, 0]]).collect();
        let second: Vec<f64> = ds.iter().map(|s| s.x[[0, 0]]).collect();
        assert_eq!(first, vec![0., 1., 2., 3.]);
        assert_eq!(first, second);
        assert_eq!(ds.iter().size_hint(), (4, Some(4)));
    }

    #[test]
    fn test_shape_accessors() {
        let ds = dataset(4);
        assert_eq!(ds.feature_count(), 2);
        assert_eq!(ds.window_len(), 3);
        assert_eq!(ds.target_count(), 1);
        assert_eq!(ds.features().shape(), &[4, 2, 3]);
        assert_eq!(ds.targets().shape(), &[4, 3]);
    }

    #[test]
    fn test_mismatched_lengths() {
        let x = Array3::<f64>::zeros((4, 2, 3));
        let y = ArrayD::<f64>::zeros(vec![5, 3]);
        assert!(WindowedDataset::new(x, y).is_err());
    }

    #[test]
    fn test_batches_keep_order() {
        let ds = dataset(10);
        let batches: Vec<WindowBatch> = ds.batches(4).collect();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].x.shape(), &[4, 2, 3]);
        assert_eq!(batches[0].y.shape(), &[4, 3]);
        assert_eq!(batches[2].len(), 2);
        assert_eq!(batches[1].x[[0, 0, 0]], 4.0);
        assert_eq!(ds.batches(4).len(), 3);
    }

    #[test]
    fn test_shuffled_batches_are_seeded_permutations() {
        let ds = dataset(20);
        let order = |seed| -> Vec<f64> {
            ds.shuffled_batches(6, seed)
                .flat_map(|b| b.x.index_axis(Axis(1), 0).column(0).to_vec())
                .collect()
        };
        let a = order(7);
        assert_eq!(a, order(7));

        let mut sorted = a.clone();
        sorted.sort_by(f64::total_cmp);
        assert_eq!(sorted, (0..20).map(|i| i as f64).collect::<Vec<_>>());
    }

    #[test]
    fn test_partition_is_contiguous() {
        let ds = dataset(100);
        let parts = ds.partition(&SplitPolicy::new(0.8).unwrap());
        assert_eq!(parts.train.len(), 80);
        assert_eq!(parts.validation.len(), 10);
        assert_eq!(parts.test.len(), 10);

        assert_eq!(parts.train.get(0).unwrap().x[[0, 0]], 0.0);
        assert_eq!(parts.validation.get(0).unwrap().x[[0, 0]], 80.0);
        assert_eq!(parts.test.get(9).unwrap().x[[0, 0]], 99.0);
        assert!(parts.test.get(10).is_none());
    }

    #[test]
    fn test_slice_of_slice() {
        let ds = dataset(10).slice(2..8).slice(1..3);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.get(0).unwrap().x[[0, 0]], 3.0);
        assert_eq!(ds.features().shape(), &[2, 2, 3]);
        let batch = ds.batches(8).next().unwrap();
        assert_eq!(batch.x[[1, 0, 0]], 4.0);
    }

    #[test]
    #[should_panic]
    fn test_slice_out_of_bounds() {
        dataset(3).slice(0..4);
    }
}
