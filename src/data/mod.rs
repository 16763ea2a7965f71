/// Data layer: source tables, column roles, and loading.
///
/// Architecture:
/// ```text
///  .csv / .txt / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  schema   │  header → usable / driving / target columns
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table (usable columns only)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  model    │  Table: column names + (rows, columns) values
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod schema;
