//! Sliding-window datasets from multivariate time-series tables.
//!
//! ```text
//!  Config (JSON)
//!        │
//!        ▼
//!   data::schema   header → driving / target columns
//!   data::loader   file   → Table
//!        │
//!        ▼
//!   window         Table(s) → (samples, N, T) features, (samples, T[, k]) targets
//!        │
//!        ▼
//!   dataset        WindowedDataset → batches, iteration
//!   split          contiguous train / validation / test ranges
//! ```
//!
//! [`builder::build`] runs the whole pipeline.

pub mod builder;
pub mod config;
pub mod data;
pub mod dataset;
pub mod error;
pub mod split;
pub mod window;

pub use builder::{build, get_dataset, get_train_val_test, BuildOptions, BuildOutput};
pub use config::Config;
pub use dataset::{Dataset, Partitions, WindowBatch, WindowSample, WindowedDataset};
pub use error::{DataError, Result};
pub use split::SplitPolicy;
pub use window::WindowPolicy;
