use std::path::Path;

use anyhow::{Context, Result};
use freqview::data::loader::save_table;
use freqview::data::model::Table;

/// Sub-ranges as (label, start Hz, stop Hz). Neighbouring ranges share their
/// edge frequency, like the rig's sweeps do.
const RANGES: [(&str, f64, f64); 3] = [
    ("500k-5kHz", 500_000.0, 5_000.0),
    ("5k-200Hz", 5_000.0, 200.0),
    ("200-1Hz", 200.0, 1.0),
];

const POINTS_PER_RANGE: usize = 25;

/// Log-spaced sweep from `start` to `stop`, both included.
fn sweep(start: f64, stop: f64, n: usize) -> Vec<f64> {
    let (a, b) = (start.log10(), stop.log10());
    (0..n)
        .map(|i| 10f64.powf(a + (b - a) * i as f64 / (n - 1) as f64))
        .collect()
}

/// First-order low-pass response of a device with corner `fc`.
fn response(freq: f64, fc: f64, amplitude: f64, gain: f64) -> (f64, f64) {
    let ratio = freq / fc;
    let denom = 1.0 + ratio * ratio;
    let rms = amplitude / std::f64::consts::SQRT_2;
    (gain * rms / denom, -gain * rms * ratio / denom)
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Write synthetic split sweeps into `raw_data/` for trying out both tools.
fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    let out_dir = Path::new("raw_data");
    std::fs::create_dir_all(out_dir).context("creating raw_data directory")?;

    // (chemistry, corner frequency, gain)
    let chemistries = [("PEDOT", 2_000.0, 0.9), ("PSS", 300.0, 0.6)];
    let pixels = ["P1", "P2"];
    let amplitudes = ["0.1", "0.5"];
    let dates = ["2023-01-05", "2023-01-06", "2023-01-09"];

    let columns = [
        "Oscilator_frequency (Hz)",
        "Demod_4_X_A (V)",
        "Demod_4_Y_A (V)",
        "Demod_1_R (V)",
    ];

    let mut written = 0;
    for &(chemistry, fc, gain) in &chemistries {
        for (p, pixel) in pixels.iter().enumerate() {
            for amplitude in amplitudes {
                let volts: f64 = amplitude.parse().context("amplitude literal")?;
                for (r, &(range, start, stop)) in RANGES.iter().enumerate() {
                    let mut table = Table::new(columns.iter().map(|c| c.to_string()).collect());
                    for freq in sweep(start, stop, POINTS_PER_RANGE) {
                        let (x, y) = response(freq, fc, volts, gain);
                        let noise = 0.01 * volts;
                        let x = x + rng.gauss(0.0, noise);
                        let y = y + rng.gauss(0.0, noise);
                        table.rows.push(vec![freq, x, y, x.hypot(y)]);
                    }

                    let name = format!(
                        "{}_{chemistry}-{pixel}_2e_ref-config_{}daydeg_{range}_{}p-1s_0V_{amplitude}Vpk.txt",
                        dates[r],
                        p + 1,
                        50 * (r + 1),
                    );
                    save_table(&out_dir.join(&name), &table)
                        .with_context(|| format!("writing {name}"))?;
                    written += 1;
                }
            }
        }
    }

    println!(
        "Wrote {written} sweep files ({POINTS_PER_RANGE} points each) to {}",
        out_dir.display()
    );
    Ok(())
}
