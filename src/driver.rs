//! Host-side driver
//!
//! Turns variable display-refresh callbacks into fixed simulation ticks and
//! hands one frame per callback to a presenter.

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::input::InputFlags;
use crate::presenter::Presenter;
use crate::sim::{Command, FrameResult, SimulationState, step};

/// Owns one game instance plus the input and timing state around it
pub struct Driver {
    state: SimulationState,
    pub input: InputFlags,
    accumulator: f32,
}

impl Driver {
    pub fn new(state: SimulationState) -> Self {
        Self {
            state,
            input: InputFlags::default(),
            accumulator: 0.0,
        }
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Forward a UI command to the simulation
    pub fn command(&mut self, command: Command) {
        self.state.apply(command);
    }

    /// Key transition from the host; returns whether the key steers
    pub fn key(&mut self, key: &str, pressed: bool) -> bool {
        let running = self.state.is_running();
        self.input.apply_key(key, pressed, running)
    }

    /// Run the ticks owed for `dt` seconds of wall time and present the result.
    /// Returns the number of ticks run.
    pub fn frame<P: Presenter + ?Sized>(&mut self, dt: f32, presenter: &mut P) -> u32 {
        let dt = dt.clamp(0.0, MAX_FRAME_DT);
        let mut events = std::mem::take(&mut self.state.pending);

        let mut substeps = 0;
        if self.state.is_running() {
            self.accumulator += dt;
            let input = self.input.tick_input();
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                step(&mut self.state, &input, &mut events);
                self.accumulator -= SIM_DT;
                substeps += 1;
            }
        }
        if !self.state.is_running() {
            // No catch-up burst after a restart
            self.accumulator = 0.0;
        }

        let frame = FrameResult::capture(&self.state, events);
        presenter.apply_frame(&frame);
        substeps
    }
}
