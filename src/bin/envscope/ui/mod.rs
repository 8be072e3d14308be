//! TUI module for envscope
//!
//! Plots the envelope level history and shows the state machine at a glance.

mod scope;
mod status;

use fm_envelope::{EnvelopePhase, TimingMode};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

use scope::render_scope;
use status::render_status;

/// Copy of the envelope state taken once per frame
#[derive(Clone, Copy, Debug)]
pub struct ScopeState {
    pub phase: EnvelopePhase,
    pub level: i32,
    pub target: i32,
    pub hold: i32,
    pub gate: bool,
    pub timing: TimingMode,
    pub sample_rate: f64,
}

pub fn render(frame: &mut Frame, state: &ScopeState, history: &[(f64, f64)]) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Status bar
            Constraint::Min(8),    // Level plot
            Constraint::Length(1), // Help bar
        ])
        .split(area);

    render_status(frame, chunks[0], state);
    render_scope(frame, chunks[1], history);

    let help = Paragraph::new(" [Q] Quit  [Space] Gate  [A] Timing mode  [+/-] Sample rate")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[2]);
}
