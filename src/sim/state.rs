//! Simulation state and core entity types
//!
//! The state owns every moving thing on the road. Hosts only read it (or the
//! frames built from it) and send commands; positions are never written from
//! outside the simulation.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::frame::GameEvent;
use super::spawn;
use super::tick::TickInput;
use crate::settings::{PoolTuning, Ramp, SceneryKind, Tuning};

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Start screen, waiting for a start command
    Idle,
    /// Active gameplay
    Running,
    /// Crashed; waiting for a restart command
    GameOver,
}

/// What an entity is, as far as gameplay is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Obstacle,
    Collectible,
    Scenery(SceneryKind),
}

/// Which tuning pool an entity was created from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolId {
    Obstacles,
    Collectibles,
    Scenery(usize),
}

impl PoolId {
    pub fn tuning<'a>(&self, tuning: &'a Tuning) -> &'a PoolTuning {
        match *self {
            PoolId::Obstacles => &tuning.obstacles,
            PoolId::Collectibles => &tuning.collectibles,
            PoolId::Scenery(index) => &tuning.scenery[index].pool,
        }
    }
}

/// A pooled road entity. Slots are never removed during a session; an entity
/// that leaves play is either recycled to the far spawn or marked inactive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub pool: PoolId,
    /// Sideways offset from the road centre
    pub lateral: f32,
    /// Distance along the road; grows as the entity approaches the camera
    pub forward: f32,
    /// Cosmetic height above the road
    pub height: f32,
    /// Fraction of game speed this entity moves at
    pub speed_factor: f32,
    /// Cosmetic spin angle
    pub rotation: f32,
    pub active: bool,
}

/// The player's car
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub lateral: f32,
    pub forward: f32,
    /// Cosmetic tilt; positive while steering left
    pub lean: f32,
    /// Cosmetic wheel angle
    pub wheel_rotation: f32,
}

impl Player {
    pub fn new(lateral: f32, forward: f32) -> Self {
        Self {
            lateral,
            forward,
            lean: 0.0,
            wheel_rotation: 0.0,
        }
    }

    /// Apply one tick of steering input, keeping the car inside `lane_min..=lane_max`.
    ///
    /// Holding both directions cancels out and is treated as no input.
    pub fn steer(&mut self, input: &TickInput, tuning: &Tuning, lane_min: f32, lane_max: f32) {
        match (input.move_left, input.move_right) {
            (true, false) => {
                self.lateral = (self.lateral - tuning.lateral_step).max(lane_min);
                self.lean = (self.lean + tuning.lean_step).min(tuning.lean_max);
            }
            (false, true) => {
                self.lateral = (self.lateral + tuning.lateral_step).min(lane_max);
                self.lean = (self.lean - tuning.lean_step).max(-tuning.lean_max);
            }
            _ => self.lean *= tuning.lean_damping,
        }
        self.lateral = self.lateral.clamp(lane_min, lane_max);
    }
}

/// Commands hosts issue from UI handlers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Start,
    Restart,
    /// Viewport changed; new lane corridor for the player
    Resize { lane_min: f32, lane_max: f32 },
}

/// Complete simulation state for one game instance
pub struct SimulationState {
    pub(crate) tuning: Tuning,
    pub(crate) seed: u64,
    pub(crate) restarts: u64,
    pub(crate) rng: Pcg32,
    pub(crate) phase: GamePhase,
    pub(crate) player: Player,
    /// Entity pool, index-stable for the whole session
    pub(crate) entities: Vec<Entity>,
    /// Inactive obstacle slots waiting for the spawn timer
    pub(crate) parked: Vec<usize>,
    pub(crate) score: u64,
    pub(crate) speed: f32,
    /// Running ticks this session
    pub(crate) time_ticks: u64,
    /// Ticks since the last timed obstacle spawn
    pub(crate) spawn_timer: u32,
    /// Score at which the next discrete speed step applies
    pub(crate) next_ramp_at: u64,
    pub(crate) lane_min: f32,
    pub(crate) lane_max: f32,
    /// Events raised by commands, delivered with the next frame
    pub(crate) pending: Vec<GameEvent>,
}

impl SimulationState {
    /// Create a fresh session. Tuning is assumed valid (see [`Tuning::validate`]).
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let phase = if tuning.start_idle {
            GamePhase::Idle
        } else {
            GamePhase::Running
        };
        let (lane_min, lane_max) = (tuning.lane_min, tuning.lane_max);
        let mut state = Self {
            player: Player::new((lane_min + lane_max) * 0.5, tuning.player_forward),
            speed: tuning.base_speed,
            tuning,
            seed,
            restarts: 0,
            rng: Pcg32::seed_from_u64(seed),
            phase,
            entities: Vec::new(),
            parked: Vec::new(),
            score: 0,
            time_ticks: 0,
            spawn_timer: 0,
            next_ramp_at: 0,
            lane_min,
            lane_max,
            pending: Vec::new(),
        };
        state.reset();
        log::info!(
            "New {} session (seed {}, {} entities)",
            state.tuning.variant.as_str(),
            seed,
            state.entities.len()
        );
        state
    }

    /// Put score, speed, player and pool back to their starting values
    fn reset(&mut self) {
        self.player = Player::new(
            (self.lane_min + self.lane_max) * 0.5,
            self.tuning.player_forward,
        );
        self.score = 0;
        self.speed = self.tuning.base_speed;
        self.time_ticks = 0;
        self.spawn_timer = 0;
        self.next_ramp_at = match self.tuning.ramp {
            Ramp::Discrete { every_points, .. } => every_points,
            Ramp::Continuous { .. } => 0,
        };
        spawn::populate(self);
    }

    /// Leave the start screen. Returns false (and does nothing) outside `Idle`.
    pub fn start(&mut self) -> bool {
        if self.phase != GamePhase::Idle {
            return false;
        }
        self.phase = GamePhase::Running;
        self.pending.push(GameEvent::Started);
        self.pending.push(GameEvent::ScoreChanged { score: self.score });
        self.pending.push(GameEvent::SpeedChanged { speed: self.speed });
        log::info!("Game started");
        true
    }

    /// Begin a new session from any phase
    pub fn restart(&mut self) {
        self.restarts += 1;
        self.rng = Pcg32::seed_from_u64(self.seed.wrapping_add(self.restarts));
        self.reset();
        self.phase = GamePhase::Running;
        self.pending.push(GameEvent::Restarted);
        self.pending.push(GameEvent::ScoreChanged { score: 0 });
        self.pending.push(GameEvent::SpeedChanged { speed: self.speed });
        log::info!("Game restarted (restart #{})", self.restarts);
    }

    /// Change the player's lane corridor, e.g. after a viewport resize
    pub fn set_lane_bounds(&mut self, lane_min: f32, lane_max: f32) {
        let (lane_min, lane_max) = if lane_min <= lane_max {
            (lane_min, lane_max)
        } else {
            (lane_max, lane_min)
        };
        self.lane_min = lane_min;
        self.lane_max = lane_max;
        self.player.lateral = self.player.lateral.clamp(lane_min, lane_max);
        log::debug!("Lane bounds now [{lane_min}, {lane_max}]");
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Start => {
                self.start();
            }
            Command::Restart => self.restart(),
            Command::Resize { lane_min, lane_max } => self.set_lane_bounds(lane_min, lane_max),
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn lane_bounds(&self) -> (f32, f32) {
        (self.lane_min, self.lane_max)
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Active entities of one kind
    pub fn active(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.entities
            .iter()
            .filter(move |e| e.active && e.kind == kind)
    }
}
