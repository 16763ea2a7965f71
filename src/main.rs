use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use series_windows::{
    build, BuildOptions, Config, Dataset, SplitPolicy, WindowPolicy, WindowedDataset,
};

/// Build the windowed dataset described by a JSON config and print a few batches.
#[derive(Debug, Parser)]
#[command(name = "series-windows", version, about)]
struct Cli {
    /// Experiment configuration file
    #[arg(short, long, default_value = "conf/NASDAQ100.json")]
    config: PathBuf,

    /// Concatenate the source files before windowing
    #[arg(long)]
    cat_before_window: bool,

    /// Also split into train / validation / test by `train_ratio`
    #[arg(long)]
    split: bool,

    /// Number of batches to print per dataset
    #[arg(short, long, default_value_t = 1)]
    batches: usize,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let config = Config::from_path(&cli.config)
        .with_context(|| format!("loading config '{}'", cli.config.display()))?;

    let options = BuildOptions {
        window_policy: WindowPolicy::from_cat_before_window(cli.cat_before_window),
        split: if cli.split {
            Some(SplitPolicy::new(config.train_ratio)?)
        } else {
            None
        },
    };

    let output = build(&config, &options).context("building windowed dataset")?;

    println!(
        "{} samples, N = {}, T = {}, targets = {:?}",
        output.dataset.len(),
        output.feature_count(),
        config.window_len,
        output.roles.targets,
    );

    match &output.partitions {
        Some(parts) => {
            print_batches("train", &parts.train, config.batch_size, cli.batches);
            print_batches("validation", &parts.validation, config.batch_size, cli.batches);
            print_batches("test", &parts.test, config.batch_size, cli.batches);
        }
        None => print_batches("all", &output.dataset, config.batch_size, cli.batches),
    }

    Ok(())
}

fn print_batches(name: &str, dataset: &WindowedDataset, batch_size: usize, count: usize) {
    println!("== {name}: {} samples", dataset.len());
    for (i, batch) in dataset.batches(batch_size).take(count).enumerate() {
        println!("-- batch {i}: X {:?}, Y {:?}", batch.x.shape(), batch.y.shape());
        println!("X {:.4}", batch.x);
        println!("Y {:.4}", batch.y);
    }
}
