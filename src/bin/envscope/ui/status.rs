//! Status bar - phase, gate, levels and engine settings

use fm_envelope::{EnvelopePhase, TimingMode};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::ScopeState;

fn phase_name(phase: EnvelopePhase) -> &'static str {
    match phase {
        EnvelopePhase::Attack => "R1 attack",
        EnvelopePhase::Decay1 => "R2 decay",
        EnvelopePhase::Decay2 => "R3 decay",
        EnvelopePhase::Release => "R4 release",
        EnvelopePhase::Idle => "idle",
    }
}

pub fn render_status(frame: &mut Frame, area: Rect, state: &ScopeState) {
    let block = Block::default().title(" envscope ").borders(Borders::ALL);

    let gate_symbol = if state.gate { "●" } else { "○" };
    let timing = match state.timing {
        TimingMode::Fast => "fast",
        TimingMode::Accurate => "accurate",
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} gate  ", gate_symbol),
            Style::default().fg(if state.gate { Color::Green } else { Color::Yellow }),
        ),
        Span::styled(
            format!("{:<11}", phase_name(state.phase)),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("level {:>5} → {:<5} ", state.level >> 16, state.target >> 16),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("hold {:<8}", state.hold),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(
            format!("{:.1}kHz {}", state.sample_rate / 1000.0, timing),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}
