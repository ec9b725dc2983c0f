//! Writes the bundled example dataset to `data/example.csv`.
//!
//! Three production batches with distinct yield levels, measured on two
//! shifts, plus a couple of injected extremes so a fresh checkout has
//! something for the outlier report to show. Deterministic: the generator
//! is seeded, so the file only changes when this program does.

use std::f64::consts::PI;

use rand::Rng;
use rand::SeedableRng as _;
use rand_pcg::Pcg32;

const SEED: u64 = 7;
const ROWS_PER_CELL: usize = 10;

fn gauss(rng: &mut Pcg32, mu: f64, sigma: f64) -> f64 {
    // Box-Muller transform
    let u1: f64 = rng.random_range(f64::EPSILON..1.0);
    let u2: f64 = rng.random_range(0.0..1.0);
    mu + sigma * (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

fn main() -> anyhow::Result<()> {
    let mut rng = Pcg32::seed_from_u64(SEED);

    // (batch, mean yield, spread)
    let batches = [("A", 85.0, 2.0), ("B", 90.0, 1.5), ("C", 78.0, 2.5)];
    let shifts = ["day", "night"];

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path("data/example.csv")?;
    writer.write_record(["batch", "shift", "yield"])?;

    for (batch, mu, sigma) in batches {
        for shift in shifts {
            for _ in 0..ROWS_PER_CELL {
                let value = gauss(&mut rng, mu, sigma);
                writer.write_record([batch, shift, &format!("{value:.2}")])?;
            }
        }
    }

    // Injected extremes, one high and one low.
    writer.write_record(["A", "day", "120.50"])?;
    writer.write_record(["C", "night", "41.20"])?;

    writer.flush()?;
    println!("wrote data/example.csv");
    Ok(())
}
