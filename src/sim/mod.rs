//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure and deterministic:
//! - One fixed step per tick, no clock access
//! - Seeded RNG only
//! - Index-stable entity pool (slots are recycled, never removed mid-session)
//! - No rendering or platform dependencies

pub mod collision;
pub mod frame;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{CollisionShape, boxes_overlap, in_window, within_radius};
pub use frame::{EntityTransform, FrameResult, GameEvent, PlayerTransform};
pub use spawn::spawn_interval;
pub use state::{Command, Entity, EntityKind, GamePhase, Player, PoolId, SimulationState};
pub use tick::{TickInput, advance, step};
