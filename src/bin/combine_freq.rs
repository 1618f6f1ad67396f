use std::path::Path;

use anyhow::Result;

use freqview::config::{Settings, SETTINGS_FILE};
use freqview::data::combine;

/// Combine the split sweeps in `raw_data/` into full `500k-1Hz` files in the
/// working directory.
fn main() -> Result<()> {
    env_logger::init();

    let settings = Settings::load_or_default(Path::new(SETTINGS_FILE))?;
    let stdout = std::io::stdout();
    let report = combine::run(&settings, &mut stdout.lock())?;

    log::info!(
        "{} files parsed, {} combined, {} groups skipped",
        report.parsed,
        report.created.len(),
        report.skipped.len()
    );
    Ok(())
}
