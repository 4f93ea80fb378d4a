//! Endless Drive - lane-dodging arcade simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entity pool, collisions, scoring, speed ramp)
//! - `settings`: Data-driven gameplay tuning for both game variants
//! - `input`: Steering flags fed by key/touch handlers
//! - `presenter`: Seam between frames and whatever draws them
//! - `driver`: Fixed-timestep host driver

pub mod driver;
pub mod input;
pub mod presenter;
pub mod settings;
pub mod sim;

pub use driver::Driver;
pub use input::InputFlags;
pub use presenter::{LogPresenter, Presenter};
pub use settings::{Tuning, TuningError, Variant};

/// Host timing constants
pub mod consts {
    /// Simulation tick length (one display refresh at 60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum ticks per displayed frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest wall-clock gap honoured per frame (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;
}
