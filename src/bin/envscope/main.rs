//! envscope - Terminal envelope inspector
//!
//! Run with: cargo run --bin envscope

mod app;
mod ui;

use app::EnvScope;
use fm_envelope::EnvelopeParams;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // Brass-like operator: fast attack, overshoot, slow settle
    let params = EnvelopeParams::new([72, 76, 99, 71], [99, 88, 96, 0]);

    let terminal = ratatui::init();
    let result = EnvScope::new(params, 44_100.0).run(terminal);
    ratatui::restore();
    result
}
