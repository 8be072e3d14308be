//! Simulation loop: drives one envelope in real time and feeds the UI

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::DefaultTerminal;

use fm_envelope::{
    graph::{EnvNode, EnvelopeHandle, RenderCtx, SharedEnvNode},
    synth::voice::operator_output_level,
    EnvelopeParams, SampleRateCalibration, TimingMode,
};

use super::ui::{self, ScopeState};

/// Samples advanced per simulation step
const BLOCK_SIZE: usize = 64;

/// Number of blocks kept in the level history
const HISTORY_LEN: usize = 2048;

const SAMPLE_RATES: [f64; 5] = [22_050.0, 44_100.0, 48_000.0, 88_200.0, 96_000.0];

pub struct EnvScope {
    calibration: Arc<SampleRateCalibration>,
    node: SharedEnvNode,
    handle: EnvelopeHandle,
    rate_index: usize,
    gate: bool,
    history: Vec<(f64, f64)>,
    blocks_rendered: u64,
    should_quit: bool,
}

impl EnvScope {
    pub fn new(params: EnvelopeParams, sample_rate: f64) -> Self {
        let rate_index = SAMPLE_RATES
            .iter()
            .position(|&rate| rate == sample_rate)
            .unwrap_or(1);
        let calibration = Arc::new(SampleRateCalibration::for_sample_rate(
            SAMPLE_RATES[rate_index],
        ));
        let env = EnvNode::new(
            calibration.clone(),
            TimingMode::Fast,
            Arc::new(params),
            operator_output_level(99),
            0,
        );
        let (node, handle) = SharedEnvNode::new(env);

        Self {
            calibration,
            node,
            handle,
            rate_index,
            gate: false,
            history: Vec::with_capacity(HISTORY_LEN),
            blocks_rendered: 0,
            should_quit: false,
        }
    }

    pub fn run(mut self, mut terminal: DefaultTerminal) -> EyreResult<()> {
        let ctx = RenderCtx::new();
        let mut last = Instant::now();
        let mut owed = 0.0f64;

        while !self.should_quit {
            // Render as many blocks as wall-clock time allows
            let now = Instant::now();
            owed += now.duration_since(last).as_secs_f64() * self.sample_rate();
            last = now;
            while owed >= BLOCK_SIZE as f64 {
                self.step(&ctx);
                owed -= BLOCK_SIZE as f64;
            }

            let state = self.snapshot();
            terminal.draw(|frame| ui::render(frame, &state, &self.history))?;

            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        Ok(())
    }

    fn step(&mut self, ctx: &RenderCtx) {
        let level = self.node.process_block(BLOCK_SIZE, ctx);
        self.blocks_rendered += 1;

        if self.history.len() == HISTORY_LEN {
            self.history.remove(0);
        }
        self.history
            .push((self.blocks_rendered as f64, (level >> 16) as f64));
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char(' ') => {
                self.gate = !self.gate;
                if self.gate {
                    self.handle.note_on();
                } else {
                    self.handle.note_off();
                }
            }
            KeyCode::Char('a') | KeyCode::Char('A') => {
                let mode = match self.node.node().envelope().timing_mode() {
                    TimingMode::Fast => TimingMode::Accurate,
                    TimingMode::Accurate => TimingMode::Fast,
                };
                self.node.node_mut().set_timing_mode(mode);
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.set_rate_index((self.rate_index + 1) % SAMPLE_RATES.len());
            }
            KeyCode::Char('-') => {
                let count = SAMPLE_RATES.len();
                self.set_rate_index((self.rate_index + count - 1) % count);
            }
            _ => {}
        }
    }

    // Rendering happens on this thread, so no envelope is mid-step here
    fn set_rate_index(&mut self, index: usize) {
        self.rate_index = index;
        self.calibration.set_sample_rate(SAMPLE_RATES[index]);
    }

    fn sample_rate(&self) -> f64 {
        SAMPLE_RATES[self.rate_index]
    }

    fn snapshot(&self) -> ScopeState {
        let env = self.node.node().envelope();
        ScopeState {
            phase: env.phase(),
            level: env.level(),
            target: env.target_level(),
            hold: env.hold_count(),
            gate: self.gate,
            timing: env.timing_mode(),
            sample_rate: self.sample_rate(),
        }
    }
}
