//! Gameplay tuning
//!
//! Every constant the simulation reads lives in [`Tuning`]. Two presets exist,
//! one per game variant; hosts may overlay a partial JSON document on top of
//! the preset named by its `variant` field.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::sim::CollisionShape;

/// Which flavour of the game the simulation runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Continuous 3D scene: fixed pools that wrap forever, radius collisions
    #[default]
    Scene,
    /// DOM sprites: start screen, timed obstacle spawns, box collisions
    Sprite,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Scene => "scene",
            Variant::Sprite => "sprite",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "scene" | "3d" => Some(Variant::Scene),
            "sprite" | "dom" => Some(Variant::Sprite),
            _ => None,
        }
    }

    /// Preset tuning for this variant
    pub fn preset(&self) -> Tuning {
        match self {
            Variant::Scene => Tuning::scene(),
            Variant::Sprite => Tuning::sprite(),
        }
    }
}

/// Cosmetic scenery categories (hosts pick a model/sprite per kind)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneryKind {
    Tree,
    Cloud,
    Post,
}

/// Where a pooled entity is placed sideways when it (re)spawns
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LateralSpawn {
    /// Uniform in a fixed range
    Range { min: f32, max: f32 },
    /// Uniform inside the current lane bounds, inset by `margin`
    Lane { margin: f32 },
    /// Either side of the road, `inner..=outer` away from the centre line
    Roadside { inner: f32, outer: f32 },
}

/// Layout and recycling rules for one pool of entities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolTuning {
    /// Entities created at session start
    pub count: usize,
    pub lateral: LateralSpawn,
    pub height_min: f32,
    pub height_max: f32,
    /// Forward distance of the first entity at session start
    pub first_forward: f32,
    /// Gap between consecutive entities at session start
    pub spacing: f32,
    /// Random extra distance (further away) added at session start
    pub jitter: f32,
    /// Forward distance an entity is recycled to
    pub far_spawn: f32,
    /// Random extra distance (further away) added on recycle
    pub far_jitter: f32,
    /// Entities further forward than this are recycled
    pub near_threshold: f32,
    /// Fraction of the game speed this pool moves at (parallax)
    pub speed_factor: f32,
    /// Cosmetic rotation per tick
    pub spin: f32,
    /// Lateral rule on recycle; falls back to `lateral`
    #[serde(default)]
    pub recycle_lateral: Option<LateralSpawn>,
    /// Lay out as left/right pairs, one pair per `spacing` row
    #[serde(default)]
    pub paired: bool,
}

/// A scenery pool with its cosmetic kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneryTuning {
    pub kind: SceneryKind,
    pub pool: PoolTuning,
}

/// How speed grows while running
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Ramp {
    /// Fixed increment every tick
    Continuous { per_tick: f32 },
    /// Larger increment each time the score crosses another multiple of `every_points`
    Discrete { step: f32, every_points: u64 },
}

/// How obstacles enter the road
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ObstacleSpawn {
    /// The whole pool exists from the start and wraps forever
    Pool,
    /// Obstacles are activated one at a time by a tick timer
    Timed {
        /// Upper bound on pooled obstacle slots
        capacity: usize,
        /// Ticks between spawns at score 0
        base_interval: u32,
        /// Ticks the interval never shrinks below
        min_interval: u32,
        /// Ticks removed from the interval per `every_points` scored
        interval_step: u32,
        every_points: u64,
    },
}

/// Full gameplay tuning for one variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    pub variant: Variant,
    /// Sessions begin in `Idle` and wait for a start command
    pub start_idle: bool,

    // === Player ===
    pub lane_min: f32,
    pub lane_max: f32,
    /// Fixed forward position of the player
    pub player_forward: f32,
    /// Lateral movement per tick of held input
    pub lateral_step: f32,
    pub lean_step: f32,
    pub lean_max: f32,
    /// Lean multiplier applied per tick without lateral input
    pub lean_damping: f32,
    /// Wheel rotation per tick per unit of speed
    pub wheel_spin_factor: f32,

    // === Speed ===
    pub base_speed: f32,
    pub max_speed: f32,
    pub ramp: Ramp,
    /// Factor from internal speed to the number shown on the HUD
    pub display_speed_scale: f32,

    // === Scoring ===
    /// Points for every tick survived
    pub distance_points_per_tick: u64,
    /// Points per collectible picked up
    pub pickup_reward: u64,
    /// Points per obstacle passed, multiplied by current speed (0 disables)
    pub pass_reward_factor: f32,

    // === Entities ===
    pub collision: CollisionShape,
    pub obstacles: PoolTuning,
    pub obstacle_spawn: ObstacleSpawn,
    pub collectibles: PoolTuning,
    /// Picked collectibles go straight back to the far spawn instead of vanishing
    pub respawn_collected: bool,
    pub scenery: Vec<SceneryTuning>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self::scene()
    }
}

/// Errors raised while loading or validating tuning
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid tuning `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> TuningError {
    TuningError::Invalid {
        field,
        reason: reason.into(),
    }
}

impl Tuning {
    /// Continuous 3D road: wraps forever, radius collisions, flat coin reward
    pub fn scene() -> Self {
        Self {
            variant: Variant::Scene,
            start_idle: false,

            lane_min: -3.5,
            lane_max: 3.5,
            player_forward: 5.0,
            lateral_step: 0.15,
            lean_step: 0.05,
            lean_max: 0.2,
            lean_damping: 0.9,
            wheel_spin_factor: 10.0,

            base_speed: 0.15,
            max_speed: 0.5,
            ramp: Ramp::Continuous { per_tick: 0.0002 },
            display_speed_scale: 200.0,

            distance_points_per_tick: 1,
            pickup_reward: 10,
            pass_reward_factor: 0.0,

            collision: CollisionShape::Radius { radius: 1.5 },
            obstacles: PoolTuning {
                count: 5,
                lateral: LateralSpawn::Range { min: -3.0, max: 3.0 },
                height_min: 0.5,
                height_max: 0.5,
                first_forward: -30.0,
                spacing: 20.0,
                jitter: 0.0,
                far_spawn: -100.0,
                far_jitter: 0.0,
                near_threshold: 15.0,
                speed_factor: 1.0,
                spin: 0.05,
                recycle_lateral: None,
                paired: false,
            },
            obstacle_spawn: ObstacleSpawn::Pool,
            collectibles: PoolTuning {
                count: 8,
                lateral: LateralSpawn::Range { min: -3.0, max: 3.0 },
                height_min: 1.0,
                height_max: 1.0,
                first_forward: -25.0,
                spacing: 15.0,
                jitter: 0.0,
                far_spawn: -120.0,
                far_jitter: 0.0,
                near_threshold: 15.0,
                speed_factor: 1.0,
                spin: 0.1,
                recycle_lateral: None,
                paired: false,
            },
            respawn_collected: true,
            scenery: vec![
                SceneryTuning {
                    kind: SceneryKind::Tree,
                    pool: PoolTuning {
                        count: 30,
                        lateral: LateralSpawn::Roadside { inner: 4.0, outer: 8.0 },
                        height_min: 0.0,
                        height_max: 0.0,
                        first_forward: 0.0,
                        spacing: 15.0,
                        jitter: 10.0,
                        far_spawn: -200.0,
                        far_jitter: 0.0,
                        near_threshold: 15.0,
                        speed_factor: 1.0,
                        spin: 0.0,
                        recycle_lateral: Some(LateralSpawn::Roadside { inner: 6.0, outer: 10.0 }),
                        paired: true,
                    },
                },
                SceneryTuning {
                    kind: SceneryKind::Cloud,
                    pool: PoolTuning {
                        count: 10,
                        lateral: LateralSpawn::Range { min: -30.0, max: 30.0 },
                        height_min: 15.0,
                        height_max: 23.0,
                        first_forward: 0.0,
                        spacing: 0.0,
                        jitter: 150.0,
                        far_spawn: -150.0,
                        far_jitter: 0.0,
                        near_threshold: 20.0,
                        speed_factor: 0.3,
                        spin: 0.005,
                        recycle_lateral: None,
                        paired: false,
                    },
                },
            ],
        }
    }

    /// DOM sprite road: start screen, timed spawns, box collisions, speed-scaled pass reward
    pub fn sprite() -> Self {
        Self {
            variant: Variant::Sprite,
            start_idle: true,

            lane_min: -120.0,
            lane_max: 120.0,
            player_forward: 0.0,
            lateral_step: 6.0,
            lean_step: 2.0,
            lean_max: 12.0,
            lean_damping: 0.9,
            wheel_spin_factor: 0.0,

            base_speed: 4.0,
            max_speed: 12.0,
            ramp: Ramp::Discrete {
                step: 0.5,
                every_points: 100,
            },
            display_speed_scale: 20.0,

            distance_points_per_tick: 0,
            pickup_reward: 10,
            pass_reward_factor: 2.5,

            collision: CollisionShape::Boxes {
                player: Vec2::new(40.0, 70.0),
                obstacle: Vec2::new(40.0, 40.0),
                collectible: Vec2::new(30.0, 30.0),
                window: 120.0,
            },
            obstacles: PoolTuning {
                count: 0,
                lateral: LateralSpawn::Lane { margin: 20.0 },
                height_min: 0.0,
                height_max: 0.0,
                first_forward: -600.0,
                spacing: 0.0,
                jitter: 0.0,
                far_spawn: -600.0,
                far_jitter: 0.0,
                near_threshold: 80.0,
                speed_factor: 1.0,
                spin: 0.0,
                recycle_lateral: None,
                paired: false,
            },
            obstacle_spawn: ObstacleSpawn::Timed {
                capacity: 12,
                base_interval: 90,
                min_interval: 30,
                interval_step: 5,
                every_points: 100,
            },
            collectibles: PoolTuning {
                count: 6,
                lateral: LateralSpawn::Lane { margin: 15.0 },
                height_min: 0.0,
                height_max: 0.0,
                first_forward: -150.0,
                spacing: 110.0,
                jitter: 0.0,
                far_spawn: -700.0,
                far_jitter: 100.0,
                near_threshold: 80.0,
                speed_factor: 1.0,
                spin: 0.0,
                recycle_lateral: None,
                paired: false,
            },
            respawn_collected: false,
            scenery: vec![SceneryTuning {
                kind: SceneryKind::Post,
                pool: PoolTuning {
                    count: 8,
                    lateral: LateralSpawn::Roadside {
                        inner: 150.0,
                        outer: 190.0,
                    },
                    height_min: 0.0,
                    height_max: 0.0,
                    first_forward: 0.0,
                    spacing: 80.0,
                    jitter: 20.0,
                    far_spawn: -600.0,
                    far_jitter: 40.0,
                    near_threshold: 80.0,
                    speed_factor: 0.5,
                    spin: 0.0,
                    recycle_lateral: None,
                    paired: false,
                },
            }],
        }
    }

    /// Parse a (possibly partial) JSON document over the preset it names.
    ///
    /// The `variant` field picks the base preset (scene when absent); every
    /// other field present in the document replaces the preset's value,
    /// recursing into nested objects.
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let overlay: Value = serde_json::from_str(json)?;
        let variant = match overlay.get("variant").and_then(Value::as_str) {
            Some(name) => Variant::from_str(name)
                .ok_or_else(|| invalid("variant", format!("unknown variant {name:?}")))?,
            None => Variant::default(),
        };

        let mut merged = serde_json::to_value(variant.preset())?;
        merge_json(&mut merged, overlay);
        if let Value::Object(map) = &mut merged {
            map.insert("variant".into(), Value::String(variant.as_str().into()));
        }

        let tuning: Tuning = serde_json::from_value(merged)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file (native hosts)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &std::path::Path) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded {} tuning from {}", tuning.variant.as_str(), path.display());
        Ok(tuning)
    }

    /// Check the relationships the simulation relies on
    pub fn validate(&self) -> Result<(), TuningError> {
        if !(self.lane_min < self.lane_max) {
            return Err(invalid("lane_min", "must be below lane_max"));
        }
        if !(self.base_speed > 0.0) {
            return Err(invalid("base_speed", "must be positive"));
        }
        if !(self.base_speed <= self.max_speed) {
            return Err(invalid("max_speed", "must not be below base_speed"));
        }
        if !(0.0..=1.0).contains(&self.lean_damping) {
            return Err(invalid("lean_damping", "must be within 0..=1"));
        }
        if self.lateral_step < 0.0 || self.lean_step < 0.0 || self.lean_max < 0.0 {
            return Err(invalid("lateral_step", "steps and limits must not be negative"));
        }
        if self.pass_reward_factor < 0.0 {
            return Err(invalid("pass_reward_factor", "must not be negative"));
        }

        match self.ramp {
            Ramp::Continuous { per_tick } if per_tick < 0.0 => {
                return Err(invalid("ramp", "per_tick must not be negative"));
            }
            Ramp::Discrete { step, every_points } if step < 0.0 || every_points == 0 => {
                return Err(invalid("ramp", "step must not be negative and every_points non-zero"));
            }
            _ => {}
        }

        match self.collision {
            CollisionShape::Radius { radius } if !(radius > 0.0) => {
                return Err(invalid("collision", "radius must be positive"));
            }
            CollisionShape::Boxes {
                player,
                obstacle,
                collectible,
                window,
            } if player.min_element() <= 0.0
                || obstacle.min_element() <= 0.0
                || collectible.min_element() <= 0.0
                || !(window > 0.0) =>
            {
                return Err(invalid("collision", "box sizes and window must be positive"));
            }
            _ => {}
        }

        match self.obstacle_spawn {
            ObstacleSpawn::Pool if self.obstacles.count == 0 => {
                return Err(invalid("obstacles", "pooled spawning needs at least one obstacle"));
            }
            ObstacleSpawn::Timed {
                capacity,
                min_interval,
                base_interval,
                every_points,
                ..
            } => {
                if capacity == 0 || capacity < self.obstacles.count {
                    return Err(invalid(
                        "obstacle_spawn",
                        "capacity must be non-zero and hold the initial obstacles",
                    ));
                }
                if min_interval == 0 || min_interval > base_interval || every_points == 0 {
                    return Err(invalid(
                        "obstacle_spawn",
                        "intervals must satisfy 0 < min_interval <= base_interval",
                    ));
                }
            }
            _ => {}
        }

        validate_pool("obstacles", &self.obstacles)?;
        validate_pool("collectibles", &self.collectibles)?;
        for scenery in &self.scenery {
            validate_pool("scenery", &scenery.pool)?;
        }
        Ok(())
    }

    /// Current HUD speed for an internal speed value
    pub fn display_speed(&self, speed: f32) -> u32 {
        (speed * self.display_speed_scale).round().max(0.0) as u32
    }
}

fn validate_pool(field: &'static str, pool: &PoolTuning) -> Result<(), TuningError> {
    if !(pool.far_spawn < pool.near_threshold) {
        return Err(invalid(field, "far_spawn must be below near_threshold"));
    }
    if pool.far_jitter < 0.0 || pool.jitter < 0.0 || pool.speed_factor < 0.0 {
        return Err(invalid(field, "jitter and speed_factor must not be negative"));
    }
    if pool.height_min > pool.height_max {
        return Err(invalid(field, "height_min must not exceed height_max"));
    }
    validate_lateral(field, pool.lateral)?;
    match pool.recycle_lateral {
        Some(spawn) => validate_lateral(field, spawn),
        None => Ok(()),
    }
}

fn validate_lateral(field: &'static str, spawn: LateralSpawn) -> Result<(), TuningError> {
    match spawn {
        LateralSpawn::Range { min, max } if min > max => {
            Err(invalid(field, "lateral range is reversed"))
        }
        LateralSpawn::Roadside { inner, outer } if inner > outer || inner < 0.0 => {
            Err(invalid(field, "roadside needs 0 <= inner <= outer"))
        }
        LateralSpawn::Lane { margin } if margin < 0.0 => {
            Err(invalid(field, "lane margin must not be negative"))
        }
        _ => Ok(()),
    }
}

/// Recursively overlay `patch` onto `base`; non-object values replace
fn merge_json(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
