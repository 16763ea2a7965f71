use crate::config::Config;
use crate::data::loader::{load_table, read_header};
use crate::data::model::Table;
use crate::data::schema::ColumnRoles;
use crate::dataset::{Dataset, Partitions, WindowedDataset};
use crate::error::{DataError, Result};
use crate::split::SplitPolicy;
use crate::window::{window_tables, WindowPolicy};

// ---------------------------------------------------------------------------
// Build options and output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BuildOptions {
    pub window_policy: WindowPolicy,
    /// Partition the samples after windowing; `None` keeps one dataset.
    pub split: Option<SplitPolicy>,
}

/// Everything a build produces.
///
/// The feature count lives here rather than on the [`Config`], so the same
/// configuration can be reused for any number of builds.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub roles: ColumnRoles,
    /// All samples, in file then row order.
    pub dataset: WindowedDataset,
    /// Present when a split policy was requested.
    pub partitions: Option<Partitions>,
}

impl BuildOutput {
    /// Number of driving columns, N.
    pub fn feature_count(&self) -> usize {
        self.roles.feature_count()
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Read every source, window it and wrap the samples.
///
/// 1. Column roles come from the header of the first source file.
/// 2. Each further file's header must hold the same usable columns.
/// 3. Tables are windowed per file or as one concatenation (`options.window_policy`).
/// 4. The stacked samples are optionally split into contiguous partitions.
pub fn build(config: &Config, options: &BuildOptions) -> Result<BuildOutput> {
    config.validate()?;
    let delimiter = config.delimiter()?;

    let first = config
        .data_paths
        .first()
        .ok_or_else(|| DataError::InvalidConfig("data_paths is empty".to_string()))?;
    let header = read_header(first, delimiter)?;
    let roles = ColumnRoles::resolve(first, &header, &config.drop_cols, &config.target_cols)?;

    let mut tables: Vec<Table> = Vec::with_capacity(config.data_paths.len());
    for (i, path) in config.data_paths.iter().enumerate() {
        if i > 0 {
            let header = read_header(path, delimiter)?;
            roles.check_header(path, &header, &config.drop_cols)?;
        }
        tables.push(load_table(path, delimiter, &roles.usable)?);
    }

    let windows = window_tables(&tables, &roles, config.window_len, options.window_policy)?;
    let (x, y) = windows.into_parts();
    let dataset = WindowedDataset::new(x, y)?;

    let partitions = options.split.map(|policy| dataset.partition(&policy));

    log::info!(
        "Built {} windows (T = {}, N = {}, targets = {}) from {} source file(s), {:?}",
        dataset.len(),
        config.window_len,
        roles.feature_count(),
        roles.target_count(),
        tables.len(),
        options.window_policy,
    );
    if let Some(parts) = &partitions {
        log::info!(
            "Partitions: {} train, {} validation, {} test",
            parts.train.len(),
            parts.validation.len(),
            parts.test.len()
        );
    }

    Ok(BuildOutput {
        roles,
        dataset,
        partitions,
    })
}

/// Single-dataset variant: all samples, no split.
pub fn get_dataset(config: &Config, policy: WindowPolicy) -> Result<BuildOutput> {
    build(
        config,
        &BuildOptions {
            window_policy: policy,
            split: None,
        },
    )
}

/// Three-way variant: split by `config.train_ratio`.
///
/// The returned [`BuildOutput`] holds every sample; its `partitions` field
/// is left empty since the partitions are returned alongside it.
pub fn get_train_val_test(
    config: &Config,
    policy: WindowPolicy,
) -> Result<(BuildOutput, Partitions)> {
    let split = SplitPolicy::new(config.train_ratio)?;
    let output = get_dataset(config, policy)?;
    let partitions = output.dataset.partition(&split);
    log::info!(
        "Partitions: {} train, {} validation, {} test",
        partitions.train.len(),
        partitions.validation.len(),
        partitions.test.len()
    );
    Ok((output, partitions))
}
