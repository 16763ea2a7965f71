use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use ndarray::Array2;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::{DataError, Result};

use super::model::Table;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// On-disk layout of a source file.  Dispatch is by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// `.parquet` / `.pq` – one numeric Arrow column per series.
    Parquet,
    /// Anything else – delimited text with a header row.
    Delimited,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "parquet" | "pq" => SourceFormat::Parquet,
            _ => SourceFormat::Delimited,
        }
    }
}

/// Read only the column names of a source file.
pub fn read_header(path: &Path, delimiter: u8) -> Result<Vec<String>> {
    let header = match SourceFormat::from_path(path) {
        SourceFormat::Parquet => {
            let builder = parquet_builder(path)?;
            builder
                .schema()
                .fields()
                .iter()
                .map(|f| f.name().clone())
                .collect()
        }
        SourceFormat::Delimited => {
            let mut reader = csv_reader(path, delimiter)?;
            csv_header(&mut reader, path)?
        }
    };

    if header.is_empty() {
        return Err(DataError::EmptyHeader {
            path: path.to_path_buf(),
        });
    }
    Ok(header)
}

/// Load a source file restricted to `usecols`.
///
/// The returned table's columns follow the order of `usecols`, not the
/// file's, so tables from files with reordered headers line up.
pub fn load_table(path: &Path, delimiter: u8, usecols: &[String]) -> Result<Table> {
    let table = match SourceFormat::from_path(path) {
        SourceFormat::Parquet => load_parquet(path, usecols)?,
        SourceFormat::Delimited => load_delimited(path, delimiter, usecols)?,
    };
    log::debug!("loaded {table}");
    Ok(table)
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

fn csv_reader(path: &Path, delimiter: u8) -> Result<csv::Reader<File>> {
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(file))
}

fn csv_header(reader: &mut csv::Reader<File>, path: &Path) -> Result<Vec<String>> {
    let headers = reader.headers().map_err(|source| DataError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(headers.iter().map(|h| h.trim().to_string()).collect())
}

/// Header row with column names, one numeric value per cell afterwards.
/// Empty cells become NaN.
fn load_delimited(path: &Path, delimiter: u8, usecols: &[String]) -> Result<Table> {
    let mut reader = csv_reader(path, delimiter)?;
    let headers = csv_header(&mut reader, path)?;

    let indices = column_indices(path, &headers, usecols)?;

    let mut values = Vec::new();
    let mut rows = 0usize;

    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(|source| DataError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(row_no + 2);

        for (&col_idx, name) in indices.iter().zip(usecols) {
            let cell = record.get(col_idx).unwrap_or("");
            values.push(parse_cell(cell).ok_or_else(|| DataError::NonNumeric {
                path: path.to_path_buf(),
                row: line,
                column: name.clone(),
                value: cell.to_string(),
            })?);
        }
        rows += 1;
    }

    let values = Array2::from_shape_vec((rows, usecols.len()), values)?;
    Ok(Table::new(path, usecols.to_vec(), values))
}

fn parse_cell(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return Some(f64::NAN);
    }
    s.parse::<f64>().ok()
}

fn column_indices(path: &Path, headers: &[String], usecols: &[String]) -> Result<Vec<usize>> {
    usecols
        .iter()
        .map(|name| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| DataError::MissingColumn {
                    path: path.to_path_buf(),
                    role: "usable",
                    column: name.clone(),
                })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

fn parquet_builder(path: &Path) -> Result<ParquetRecordBatchReaderBuilder<File>> {
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ParquetRecordBatchReaderBuilder::try_new(file).map_err(|source| DataError::Parquet {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a Parquet file whose series are flat numeric columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).  Nulls become NaN.
fn load_parquet(path: &Path, usecols: &[String]) -> Result<Table> {
    let builder = parquet_builder(path)?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let indices = column_indices(path, &headers, usecols)?;

    let reader = builder.build().map_err(|source| DataError::Parquet {
        path: path.to_path_buf(),
        source,
    })?;

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); usecols.len()];

    for batch_result in reader {
        let batch = batch_result.map_err(|source| DataError::Arrow {
            path: path.to_path_buf(),
            source,
        })?;
        for ((&col_idx, name), out) in indices.iter().zip(usecols).zip(columns.iter_mut()) {
            extend_f64(batch.column(col_idx), path, name, out)?;
        }
    }

    let rows = columns.first().map_or(0, Vec::len);
    let values = Array2::from_shape_fn((rows, usecols.len()), |(r, c)| columns[c][r]);
    Ok(Table::new(path, usecols.to_vec(), values))
}

/// Append the values of a numeric Arrow column to `out` as `f64`.
fn extend_f64(col: &Arc<dyn Array>, path: &Path, name: &str, out: &mut Vec<f64>) -> Result<()> {
    macro_rules! extend_as {
        ($arr:ty) => {{
            let arr = col
                .as_any()
                .downcast_ref::<$arr>()
                .ok_or_else(|| unsupported(col, path, name))?;
            out.extend(arr.iter().map(|v| v.map_or(f64::NAN, |v| v as f64)));
        }};
    }

    match col.data_type() {
        DataType::Float64 => extend_as!(Float64Array),
        DataType::Float32 => extend_as!(Float32Array),
        DataType::Int64 => extend_as!(Int64Array),
        DataType::Int32 => extend_as!(Int32Array),
        _ => return Err(unsupported(col, path, name)),
    }
    Ok(())
}

fn unsupported(col: &Arc<dyn Array>, path: &Path, name: &str) -> DataError {
    DataError::UnsupportedColumn {
        path: path.to_path_buf(),
        column: name.to_string(),
        dtype: format!("{:?}", col.data_type()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(text.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_read_header_with_separator() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "a.txt", "a;b;NDX\n1;2;3\n");
        assert_eq!(read_header(&path, b';').unwrap(), cols(&["a", "b", "NDX"]));
    }

    #[test]
    fn test_load_follows_usecols_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "a.csv", "date,a,y\n2020,1,10\n2021,2,20\n");
        let table = load_table(&path, b',', &cols(&["y", "a"])).unwrap();
        assert_eq!(table.columns, cols(&["y", "a"]));
        assert_eq!(table.values, ndarray::array![[10., 1.], [20., 2.]]);
    }

    #[test]
    fn test_empty_cell_is_nan() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "a.csv", "a,y\n,1\n");
        let table = load_table(&path, b',', &cols(&["a", "y"])).unwrap();
        assert!(table.values[[0, 0]].is_nan());
    }

    #[test]
    fn test_non_numeric_cell() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "a.csv", "a,y\n1,2\nx,3\n");
        match load_table(&path, b',', &cols(&["a", "y"])) {
            Err(DataError::NonNumeric { row, column, value, .. }) => {
                assert_eq!(row, 3);
                assert_eq!(column, "a");
                assert_eq!(value, "x");
            }
            other => panic!("expected NonNumeric, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = read_header(Path::new("no/such/file.csv"), b',').unwrap_err();
        assert!(matches!(err, DataError::Io { .. }));
    }

    #[test]
    fn test_empty_file_has_no_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "a.csv", "");
        assert!(matches!(
            read_header(&path, b','),
            Err(DataError::EmptyHeader { .. })
        ));
    }

    #[test]
    fn test_parquet_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("ticker", DataType::Utf8, false),
            Field::new("a", DataType::Int64, false),
            Field::new("y", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["x", "x", "x"])),
                Arc::new(Int64Array::from(vec![1, 2, 3])),
                Arc::new(Float64Array::from(vec![Some(0.5), None, Some(1.5)])),
            ],
        )
        .unwrap();
        let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        assert_eq!(read_header(&path, b',').unwrap(), cols(&["ticker", "a", "y"]));

        let table = load_table(&path, b',', &cols(&["a", "y"])).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.values.column(0).to_vec(), vec![1., 2., 3.]);
        assert!(table.values[[1, 1]].is_nan());

        assert!(matches!(
            load_table(&path, b',', &cols(&["ticker"])),
            Err(DataError::UnsupportedColumn { .. })
        ));
    }
}
