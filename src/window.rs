use ndarray::{concatenate, s, Array3, ArrayD, ArrayView3, Axis};

use crate::data::model::Table;
use crate::data::schema::ColumnRoles;
use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// Window policy
// ---------------------------------------------------------------------------

/// Whether several source files are windowed one by one or as one series.
///
/// `PerFile` never lets a window straddle two files.  `Concatenated` joins
/// the tables first, so every boundary between file *k* and *k + 1* yields
/// up to `T - 1` windows mixing the tail of one file with the head of the
/// next; only use it when the files are consecutive pieces of one series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WindowPolicy {
    /// Window every file independently, then stack in file order.
    #[default]
    PerFile,
    /// Concatenate all files in order, then window once.
    Concatenated,
}

impl WindowPolicy {
    /// `cat_before_window` flag of the experiment scripts.
    pub fn from_cat_before_window(cat_before_window: bool) -> Self {
        if cat_before_window {
            WindowPolicy::Concatenated
        } else {
            WindowPolicy::PerFile
        }
    }
}

// ---------------------------------------------------------------------------
// Windows – stacked samples before squeezing
// ---------------------------------------------------------------------------

/// Stacked window samples.
///
/// * `x` – `(samples, feature_count, T)`
/// * `y` – `(samples, T, target_count)`
#[derive(Debug, Clone, PartialEq)]
pub struct Windows {
    pub x: Array3<f64>,
    pub y: Array3<f64>,
}

impl Windows {
    pub fn len(&self) -> usize {
        self.x.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Split into features and targets, dropping the trailing target axis
    /// when there is a single target column: `(samples, T)` instead of
    /// `(samples, T, 1)`.
    pub fn into_parts(self) -> (Array3<f64>, ArrayD<f64>) {
        let y = if self.y.len_of(Axis(2)) == 1 {
            self.y.index_axis_move(Axis(2), 0).into_dyn()
        } else {
            self.y.into_dyn()
        };
        (self.x, y)
    }

    /// Stack per-file windows along the sample axis, in the given order.
    pub fn stack(parts: &[Windows]) -> Result<Windows> {
        let xs: Vec<ArrayView3<'_, f64>> = parts.iter().map(|w| w.x.view()).collect();
        let ys: Vec<ArrayView3<'_, f64>> = parts.iter().map(|w| w.y.view()).collect();
        Ok(Windows {
            x: concatenate(Axis(0), &xs)?,
            y: concatenate(Axis(0), &ys)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Windowing
// ---------------------------------------------------------------------------

/// Slide a window of `window_len` rows over `table` with stride 1.
///
/// Sample `i` holds rows `i..i + window_len`: the driving columns transposed
/// to `(feature_count, window_len)` and the target columns as
/// `(window_len, target_count)`.  A table of `L` rows yields `L - window_len`
/// samples, so at least `window_len + 1` rows are required.
pub fn window_table(table: &Table, roles: &ColumnRoles, window_len: usize) -> Result<Windows> {
    let rows = table.len();
    if rows <= window_len {
        return Err(DataError::InsufficientRows {
            source_name: table.source_name(),
            rows,
            window_len,
            needed: window_len + 1,
        });
    }

    let features = table.select(&roles.driving, "driving")?;
    let targets = table.select(&roles.targets, "target")?;
    let count = rows - window_len;

    let mut x = Array3::<f64>::zeros((count, features.ncols(), window_len));
    let mut y = Array3::<f64>::zeros((count, window_len, targets.ncols()));

    for i in 0..count {
        x.index_axis_mut(Axis(0), i)
            .assign(&features.slice(s![i..i + window_len, ..]).t());
        y.index_axis_mut(Axis(0), i)
            .assign(&targets.slice(s![i..i + window_len, ..]));
    }

    log::debug!("{}: {} windows of length {}", table.source_name(), count, window_len);
    Ok(Windows { x, y })
}

/// Window every table according to `policy`.
pub fn window_tables(
    tables: &[Table],
    roles: &ColumnRoles,
    window_len: usize,
    policy: WindowPolicy,
) -> Result<Windows> {
    match policy {
        WindowPolicy::PerFile => {
            let parts = tables
                .iter()
                .map(|t| window_table(t, roles, window_len))
                .collect::<Result<Vec<_>>>()?;
            Windows::stack(&parts)
        }
        WindowPolicy::Concatenated => {
            let spanning = boundary_windows(tables.iter().map(Table::len), window_len);
            if spanning > 0 {
                log::warn!(
                    "{spanning} windows span a boundary between source files; \
                     use per-file windowing if the files are separate series"
                );
            }
            let all = Table::concat(tables)?;
            window_table(&all, roles, window_len)
        }
    }
}

/// Windows of a concatenation that would start in one table and end in a
/// later one.
pub fn boundary_windows(lengths: impl IntoIterator<Item = usize>, window_len: usize) -> usize {
    let lengths: Vec<usize> = lengths.into_iter().collect();
    let total: usize = lengths.iter().sum();
    let Some(count) = total.checked_sub(window_len) else {
        return 0;
    };

    let mut spanning = 0;
    let mut boundary = 0;
    for len in &lengths[..lengths.len().saturating_sub(1)] {
        boundary += len;
        // starts i with i < boundary < i + window_len
        let first = (boundary + 1).saturating_sub(window_len);
        let last = boundary.min(count);
        spanning += last.saturating_sub(first);
    }
    spanning
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use ndarray::{array, Array2};

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    /// `rows` rows of `a = r`, `b = 100 + r`, `y = 1000 + r` starting at `start`.
    fn table(name: &str, start: usize, rows: usize) -> Table {
        let values = Array2::from_shape_fn((rows, 3), |(r, c)| {
            (start + r) as f64 + [0.0, 100.0, 1000.0][c]
        });
        Table::new(name, cols(&["a", "b", "y"]), values)
    }

    fn roles(targets: &[&str]) -> ColumnRoles {
        ColumnRoles::resolve(Path::new("a.csv"), &cols(&["a", "b", "y"]), &[], &cols(targets))
            .unwrap()
    }

    #[test]
    fn test_sample_count_and_shapes() {
        let w = window_table(&table("a.csv", 0, 20), &roles(&["y"]), 5).unwrap();
        assert_eq!(w.len(), 15);
        assert_eq!(w.x.shape(), &[15, 2, 5]);
        assert_eq!(w.y.shape(), &[15, 5, 1]);
    }

    #[test]
    fn test_feature_window_is_transposed() {
        let w = window_table(&table("a.csv", 0, 6), &roles(&["y"]), 3).unwrap();
        let x1 = w.x.index_axis(Axis(0), 1);
        assert_eq!(x1, array![[1., 2., 3.], [101., 102., 103.]]);
    }

    #[test]
    fn test_targets_are_untransformed() {
        let t = table("a.csv", 0, 12);
        let w = window_table(&t, &roles(&["y", "b"]), 4).unwrap();
        for i in 0..w.len() {
            let expected = t.select(&cols(&["y", "b"]), "target").unwrap();
            assert_eq!(w.y.index_axis(Axis(0), i), expected.slice(s![i..i + 4, ..]));
        }
    }

    #[test]
    fn test_too_few_rows() {
        let err = window_table(&table("a.csv", 0, 3), &roles(&["y"]), 3).unwrap_err();
        match err {
            DataError::InsufficientRows { rows, needed, .. } => {
                assert_eq!(rows, 3);
                assert_eq!(needed, 4);
            }
            other => panic!("expected InsufficientRows, got {other:?}"),
        }
    }

    #[test]
    fn test_per_file_stacks_in_file_order() {
        let tables = [table("a.csv", 0, 10), table("b.csv", 50, 10)];
        let w = window_tables(&tables, &roles(&["y"]), 3, WindowPolicy::PerFile).unwrap();
        assert_eq!(w.len(), 14);
        assert_eq!(w.y[[0, 0, 0]], 1000.0);
        assert_eq!(w.y[[6, 0, 0]], 1006.0);
        assert_eq!(w.y[[7, 0, 0]], 1050.0);
        assert_eq!(w.y[[13, 2, 0]], 1058.0);
    }

    #[test]
    fn test_concatenated_windows_once() {
        let tables = [table("a.csv", 0, 10), table("b.csv", 50, 10)];
        let w = window_tables(&tables, &roles(&["y"]), 3, WindowPolicy::Concatenated).unwrap();
        assert_eq!(w.len(), 17);
        // start 8 spans the boundary: rows 8, 9 of a.csv and row 0 of b.csv
        assert_eq!(
            w.y.index_axis(Axis(0), 8).column(0).to_vec(),
            vec![1008., 1009., 1050.]
        );
    }

    #[test]
    fn test_per_file_checks_every_file_length() {
        let tables = [table("a.csv", 0, 10), table("b.csv", 0, 2)];
        assert!(window_tables(&tables, &roles(&["y"]), 3, WindowPolicy::PerFile).is_err());
        // joined, the short file is fine
        assert!(window_tables(&tables, &roles(&["y"]), 3, WindowPolicy::Concatenated).is_ok());
    }

    #[test]
    fn test_boundary_windows() {
        assert_eq!(boundary_windows([10, 10], 3), 2);
        assert_eq!(boundary_windows([10, 10, 10], 3), 4);
        assert_eq!(boundary_windows([10], 3), 0);
        assert_eq!(boundary_windows([10, 10], 1), 0);
        assert_eq!(boundary_windows([2, 2], 5), 0);
    }

    #[test]
    fn test_squeeze_single_target() {
        let w = window_table(&table("a.csv", 0, 6), &roles(&["y"]), 3).unwrap();
        assert_eq!(w.into_parts().1.shape(), &[3, 3]);

        let w = window_table(&table("a.csv", 0, 6), &roles(&["y", "b"]), 3).unwrap();
        let (x, y) = w.into_parts();
        assert_eq!(x.shape(), &[3, 1, 3]);
        assert_eq!(y.shape(), &[3, 3, 2]);
    }

    #[test]
    fn test_policy_flag() {
        assert_eq!(WindowPolicy::from_cat_before_window(true), WindowPolicy::Concatenated);
        assert_eq!(WindowPolicy::from_cat_before_window(false), WindowPolicy::PerFile);
        assert_eq!(WindowPolicy::default(), WindowPolicy::PerFile);
    }
}
