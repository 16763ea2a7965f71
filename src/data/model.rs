use std::fmt;
use std::path::{Path, PathBuf};

use ndarray::{concatenate, Array2, ArrayView2, Axis};

use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// Table – one source file held in memory
// ---------------------------------------------------------------------------

/// A numeric table loaded from one source file.
///
/// `values` is row-major with shape `(rows, columns.len())`; row order is the
/// file's row order and column order is whatever the loader was asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// File the rows came from (first file for a concatenation).
    pub source: PathBuf,
    /// Column names, one per column of `values`.
    pub columns: Vec<String>,
    pub values: Array2<f64>,
}

impl Table {
    pub fn new(source: impl Into<PathBuf>, columns: Vec<String>, values: Array2<f64>) -> Self {
        debug_assert_eq!(columns.len(), values.ncols());
        Table {
            source: source.into(),
            columns,
            values,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Copy out the given columns, in the given order.
    pub fn select(&self, names: &[String], role: &'static str) -> Result<Array2<f64>> {
        let indices = names
            .iter()
            .map(|name| {
                self.column_index(name).ok_or_else(|| DataError::MissingColumn {
                    path: self.source.clone(),
                    role,
                    column: name.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self.values.select(Axis(1), &indices))
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Stack tables row-wise in the given order.
    ///
    /// All tables must carry the same columns in the same order, which the
    /// loader guarantees once the schemas have been validated.
    pub fn concat(tables: &[Table]) -> Result<Table> {
        let first = tables.first().ok_or_else(|| {
            DataError::InvalidConfig("no tables to concatenate".to_string())
        })?;
        if let Some(other) = tables.iter().find(|t| t.columns != first.columns) {
            return Err(DataError::SchemaMismatch {
                path: other.source.clone(),
                reference: first.source.clone(),
                missing: missing_from(&other.columns, &first.columns),
                unexpected: missing_from(&first.columns, &other.columns),
            });
        }
        let views: Vec<ArrayView2<'_, f64>> = tables.iter().map(Table::view).collect();
        let values = concatenate(Axis(0), &views)?;
        Ok(Table::new(first.source.clone(), first.columns.clone(), values))
    }

    pub fn source_name(&self) -> String {
        display_name(&self.source)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} rows x {} columns)",
            self.source_name(),
            self.len(),
            self.columns.len()
        )
    }
}

/// Names in `wanted` that `have` lacks.
pub(crate) fn missing_from(have: &[String], wanted: &[String]) -> Vec<String> {
    wanted
        .iter()
        .filter(|w| !have.contains(w))
        .cloned()
        .collect()
}

pub(crate) fn display_name(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_reorders_columns() {
        let t = Table::new("a.csv", cols(&["a", "b", "c"]), array![[1., 2., 3.], [4., 5., 6.]]);
        let out = t.select(&cols(&["c", "a"]), "target").unwrap();
        assert_eq!(out, array![[3., 1.], [6., 4.]]);
    }

    #[test]
    fn test_select_missing_column() {
        let t = Table::new("a.csv", cols(&["a"]), array![[1.]]);
        let err = t.select(&cols(&["zzz"]), "target").unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { role: "target", .. }));
    }

    #[test]
    fn test_concat_preserves_order() {
        let a = Table::new("a.csv", cols(&["x"]), array![[1.], [2.]]);
        let b = Table::new("b.csv", cols(&["x"]), array![[3.]]);
        let all = Table::concat(&[a, b]).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all.values.column(0).to_vec(), vec![1., 2., 3.]);
    }

    #[test]
    fn test_concat_rejects_mixed_columns() {
        let a = Table::new("a.csv", cols(&["x"]), array![[1.]]);
        let b = Table::new("b.csv", cols(&["y"]), array![[3.]]);
        assert!(matches!(
            Table::concat(&[a, b]),
            Err(DataError::SchemaMismatch { .. })
        ));
    }
}
