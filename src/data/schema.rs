use std::path::{Path, PathBuf};

use crate::error::{DataError, Result};

use super::model::missing_from;

// ---------------------------------------------------------------------------
// Column roles
// ---------------------------------------------------------------------------

/// How the header columns of the sources are used.
///
/// Derived from the header of the first source file; every later file is
/// checked against it with [`ColumnRoles::check_header`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRoles {
    /// File the roles were derived from.
    pub reference: PathBuf,
    /// Header columns that are not dropped, in header order.
    pub usable: Vec<String>,
    /// Usable columns that are not targets (the driving series), in header order.
    pub driving: Vec<String>,
    /// Target columns, in configuration order.
    pub targets: Vec<String>,
}

impl ColumnRoles {
    /// Split `header` into driving and target columns.
    ///
    /// Every drop and target column must appear in the header.
    pub fn resolve(
        reference: &Path,
        header: &[String],
        drop_cols: &[String],
        target_cols: &[String],
    ) -> Result<Self> {
        if header.is_empty() {
            return Err(DataError::EmptyHeader {
                path: reference.to_path_buf(),
            });
        }
        check_present(reference, header, drop_cols, "drop")?;

        let usable: Vec<String> = header
            .iter()
            .filter(|c| !drop_cols.contains(c))
            .cloned()
            .collect();

        check_present(reference, &usable, target_cols, "target")?;

        let driving: Vec<String> = usable
            .iter()
            .filter(|c| !target_cols.contains(c))
            .cloned()
            .collect();

        if driving.is_empty() {
            log::warn!(
                "'{}': every usable column is a target, feature windows will be empty",
                reference.display()
            );
        }

        Ok(ColumnRoles {
            reference: reference.to_path_buf(),
            usable,
            driving,
            targets: target_cols.to_vec(),
        })
    }

    /// Number of driving (feature) columns, N.
    pub fn feature_count(&self) -> usize {
        self.driving.len()
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Fail unless `header` minus `drop_cols` holds exactly the usable columns.
    ///
    /// Column order may differ between files; columns are matched by name.
    pub fn check_header(&self, path: &Path, header: &[String], drop_cols: &[String]) -> Result<()> {
        let usable: Vec<String> = header
            .iter()
            .filter(|c| !drop_cols.contains(c))
            .cloned()
            .collect();

        let missing = missing_from(&usable, &self.usable);
        let unexpected = missing_from(&self.usable, &usable);
        if missing.is_empty() && unexpected.is_empty() {
            return Ok(());
        }
        Err(DataError::SchemaMismatch {
            path: path.to_path_buf(),
            reference: self.reference.clone(),
            missing,
            unexpected,
        })
    }
}

fn check_present(path: &Path, header: &[String], wanted: &[String], role: &'static str) -> Result<()> {
    match wanted.iter().find(|w| !header.contains(w)) {
        Some(column) => Err(DataError::MissingColumn {
            path: path.to_path_buf(),
            role,
            column: column.clone(),
        }),
        None => Ok(()),
    }
}
