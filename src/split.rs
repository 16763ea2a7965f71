// ============================================================
// Train / Validation / Test Splitter
// ============================================================
// Cuts an ordered sample range into three contiguous pieces:
//
//   [0 ............ train) [train .. val) [val .. test)  [rest)
//
// No shuffling: the series is ordered in time, so validation and
// test always come after the training samples.
//
// Sizes for S samples and ratio r:
//   train = floor(S * r)
//   val   = floor(S * (1 - r) / 2)
//   test  = val
// Rounding can leave a few trailing samples in no partition.

use std::ops::Range;

use crate::error::{DataError, Result};

/// Absorbs binary representation error, e.g. `100 * (1 - 0.8) / 2`
/// evaluating to `9.999999999999998`.
const FLOOR_TOLERANCE: f64 = 1e-9;

/// Contiguous three-way split by ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitPolicy {
    /// Fraction of samples for training, in `(0, 1)`.
    pub train_ratio: f64,
}

impl SplitPolicy {
    pub fn new(train_ratio: f64) -> Result<Self> {
        if !(train_ratio > 0.0 && train_ratio < 1.0) {
            return Err(DataError::InvalidConfig(format!(
                "train_ratio must lie in (0, 1), got {train_ratio}"
            )));
        }
        Ok(Self { train_ratio })
    }

    /// Partition sizes for `total` samples.
    pub fn sizes(&self, total: usize) -> SplitSizes {
        let train = floor_fraction(total, self.train_ratio);
        let held_out = floor_fraction(total, (1.0 - self.train_ratio) / 2.0);
        SplitSizes {
            train,
            validation: held_out,
            test: held_out,
        }
    }

    /// Index ranges of the three partitions for `total` samples.
    pub fn ranges(&self, total: usize) -> SplitRanges {
        let sizes = self.sizes(total);
        let val_start = sizes.train;
        let test_start = val_start + sizes.validation;
        let ranges = SplitRanges {
            train: 0..sizes.train,
            validation: val_start..test_start,
            test: test_start..test_start + sizes.test,
        };

        log::debug!(
            "Dataset split: {} training, {} validation, {} test of {} samples",
            sizes.train,
            sizes.validation,
            sizes.test,
            total,
        );
        ranges
    }
}

fn floor_fraction(total: usize, fraction: f64) -> usize {
    let n = ((total as f64) * fraction + FLOOR_TOLERANCE).floor() as usize;
    n.min(total)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitSizes {
    pub train: usize,
    pub validation: usize,
    pub test: usize,
}

impl SplitSizes {
    pub fn total(&self) -> usize {
        self.train + self.validation + self.test
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitRanges {
    pub train: Range<usize>,
    pub validation: Range<usize>,
    pub test: Range<usize>,
}
