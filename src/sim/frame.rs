//! Per-tick output handed to presenters

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::state::{EntityKind, GamePhase, SimulationState};

/// State changes presenters react to (HUD text, overlays)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Left the start screen
    Started,
    /// A new session began
    Restarted,
    ScoreChanged { score: u64 },
    SpeedChanged { speed: f32 },
    /// Crashed; fires once per session
    GameOver { final_score: u64 },
}

/// Where to draw the player's car
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerTransform {
    pub lateral: f32,
    pub forward: f32,
    pub lean: f32,
    pub wheel_rotation: f32,
}

/// Where to draw one pooled entity. `slot` is stable for the whole session,
/// so hosts can keep one scene node or DOM element per slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityTransform {
    pub slot: usize,
    pub kind: EntityKind,
    /// (lateral, height, forward)
    pub position: Vec3,
    pub rotation: f32,
    pub active: bool,
}

/// Everything a presenter needs to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    pub tick: u64,
    pub phase: GamePhase,
    pub running: bool,
    pub score: u64,
    pub speed: f32,
    /// Speed as shown on the HUD
    pub display_speed: u32,
    pub player: PlayerTransform,
    pub entities: Vec<EntityTransform>,
    /// Events raised since the previous frame, oldest first
    pub events: Vec<GameEvent>,
}

impl FrameResult {
    /// Snapshot the state together with the events gathered for this frame
    pub fn capture(state: &SimulationState, events: Vec<GameEvent>) -> Self {
        let player = state.player();
        let entities = state
            .entities()
            .iter()
            .enumerate()
            .map(|(slot, e)| EntityTransform {
                slot,
                kind: e.kind,
                position: Vec3::new(e.lateral, e.height, e.forward),
                rotation: e.rotation,
                active: e.active,
            })
            .collect();

        Self {
            tick: state.time_ticks(),
            phase: state.phase(),
            running: state.is_running(),
            score: state.score(),
            speed: state.speed(),
            display_speed: state.tuning().display_speed(state.speed()),
            player: PlayerTransform {
                lateral: player.lateral,
                forward: player.forward,
                lean: player.lean,
                wheel_rotation: player.wheel_rotation,
            },
            entities,
            events,
        }
    }

    /// Final score if this frame ended the session
    pub fn game_over(&self) -> Option<u64> {
        self.events.iter().find_map(|e| match e {
            GameEvent::GameOver { final_score } => Some(*final_score),
            _ => None,
        })
    }

    /// Transforms of entities currently on the road
    pub fn visible(&self) -> impl Iterator<Item = &EntityTransform> {
        self.entities.iter().filter(|e| e.active)
    }
}
