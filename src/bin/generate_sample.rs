use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use series_windows::Config;

/// Write synthetic stock-price CSVs and a matching config for the demo.
#[derive(Debug, Parser)]
#[command(name = "generate_sample", about)]
struct Args {
    /// Rows per file
    #[arg(long, default_value_t = 500)]
    rows: usize,

    /// Number of driving stock columns
    #[arg(long, default_value_t = 8)]
    stocks: usize,

    /// Number of files the series is cut into
    #[arg(long, default_value_t = 2)]
    files: usize,

    #[arg(long, default_value = "data")]
    out_dir: PathBuf,

    /// Where the config is written
    #[arg(long, default_value = "conf/NASDAQ100.json")]
    config: PathBuf,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Geometric random walks for every stock plus a cap-weighted index.
struct Market {
    prices: Vec<f64>,
    weights: Vec<f64>,
    /// Daily log-return shared by every stock.
    common: Normal<f64>,
    /// Per-stock daily log-return on top of `common`.
    idiosyncratic: Normal<f64>,
}

impl Market {
    fn new(stocks: usize, rng: &mut impl Rng) -> Result<Self> {
        let prices: Vec<f64> = (0..stocks).map(|_| rng.gen_range(20.0..200.0)).collect();
        let raw: Vec<f64> = (0..stocks).map(|_| rng.gen_range(0.5..1.5)).collect();
        let total: f64 = raw.iter().sum();
        let weights = raw.iter().map(|w| w / total).collect();
        Ok(Market {
            prices,
            weights,
            common: Normal::new(0.0002, 0.008)?,
            idiosyncratic: Normal::new(0.0, 0.012)?,
        })
    }

    fn step(&mut self, rng: &mut impl Rng) {
        let common = self.common.sample(rng);
        for p in &mut self.prices {
            *p *= (common + self.idiosyncratic.sample(rng)).exp();
        }
    }

    fn index(&self) -> f64 {
        10.0 * self
            .prices
            .iter()
            .zip(&self.weights)
            .map(|(p, w)| p * w)
            .sum::<f64>()
    }
}

fn write_file(
    path: &Path,
    header: &[String],
    market: &mut Market,
    rows: usize,
    rng: &mut impl Rng,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating '{}'", path.display()))?;
    writer.write_record(header)?;

    for _ in 0..rows {
        market.step(rng);
        let mut record: Vec<String> = market.prices.iter().map(|p| format!("{p:.4}")).collect();
        record.push(format!("{:.4}", market.index()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn header(stocks: usize) -> Vec<String> {
    let mut header: Vec<String> = (0..stocks).map(|i| format!("STOCK{i:03}")).collect();
    header.push("NDX".to_string());
    header
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut rng = StdRng::seed_from_u64(args.seed);

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating '{}'", args.out_dir.display()))?;

    let header = header(args.stocks);
    let mut market = Market::new(args.stocks, &mut rng)?;
    let mut data_paths = Vec::with_capacity(args.files);
    for part in 0..args.files {
        let path = args.out_dir.join(format!("nasdaq100_part{part}.csv"));
        write_file(&path, &header, &mut market, args.rows, &mut rng)?;
        log::info!("wrote {} rows to {}", args.rows, path.display());
        data_paths.push(path);
    }

    let config = Config {
        data_paths,
        sep: ",".to_string(),
        drop_cols: Vec::new(),
        target_cols: vec!["NDX".to_string()],
        window_len: 10,
        batch_size: 128,
        train_ratio: 0.8,
    };
    if let Some(dir) = args.config.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    fs::write(&args.config, serde_json::to_string_pretty(&config)?)
        .with_context(|| format!("writing '{}'", args.config.display()))?;

    println!(
        "Wrote {} file(s) of {} rows ({} stocks + NDX) and {}",
        args.files,
        args.rows,
        args.stocks,
        args.config.display()
    );
    Ok(())
}
