//! Pool construction and recycling
//!
//! Entities are laid out once per session and then reused: anything that
//! drives past the camera is moved back to the far spawn distance.

use rand::Rng;
use rand_pcg::Pcg32;

use super::state::{Entity, EntityKind, PoolId, SimulationState};
use crate::settings::{LateralSpawn, ObstacleSpawn, PoolTuning, Tuning};

/// Uniform sample in `min..max`, or `min` for an empty range
fn uniform(rng: &mut Pcg32, min: f32, max: f32) -> f32 {
    if max > min {
        min + rng.random::<f32>() * (max - min)
    } else {
        min
    }
}

/// Pick a lateral offset. `side` forces a roadside side (`true` = left);
/// `None` picks one at random.
fn spawn_lateral(
    spawn: LateralSpawn,
    rng: &mut Pcg32,
    lane_min: f32,
    lane_max: f32,
    side: Option<bool>,
) -> f32 {
    match spawn {
        LateralSpawn::Range { min, max } => uniform(rng, min, max),
        LateralSpawn::Lane { margin } => {
            let (min, max) = (lane_min + margin, lane_max - margin);
            if min <= max {
                uniform(rng, min, max)
            } else {
                (lane_min + lane_max) * 0.5
            }
        }
        LateralSpawn::Roadside { inner, outer } => {
            let left = side.unwrap_or_else(|| rng.random_bool(0.5));
            let offset = uniform(rng, inner, outer);
            if left { -offset } else { offset }
        }
    }
}

/// Move an entity back to the far end of the road with a fresh lateral offset.
/// Height is kept from the initial layout.
pub(crate) fn recycle(
    entity: &mut Entity,
    pool: &PoolTuning,
    rng: &mut Pcg32,
    lane_min: f32,
    lane_max: f32,
) {
    let lateral = pool.recycle_lateral.unwrap_or(pool.lateral);
    entity.forward = pool.far_spawn - uniform(rng, 0.0, pool.far_jitter);
    entity.lateral = spawn_lateral(lateral, rng, lane_min, lane_max, None);
}

fn lay_out_pool(
    out: &mut Vec<Entity>,
    kind: EntityKind,
    id: PoolId,
    pool: &PoolTuning,
    rng: &mut Pcg32,
    lane_min: f32,
    lane_max: f32,
) {
    for i in 0..pool.count {
        // Roadside pools alternate sides so both verges start populated
        let side = Some(i % 2 == 0);
        let row = if pool.paired { i / 2 } else { i };
        out.push(Entity {
            kind,
            pool: id,
            lateral: spawn_lateral(pool.lateral, rng, lane_min, lane_max, side),
            forward: pool.first_forward - pool.spacing * row as f32 - uniform(rng, 0.0, pool.jitter),
            height: uniform(rng, pool.height_min, pool.height_max),
            speed_factor: pool.speed_factor,
            rotation: 0.0,
            active: true,
        });
    }
}

/// Rebuild the entity pool for a new session
pub(crate) fn populate(state: &mut SimulationState) {
    let SimulationState {
        tuning,
        rng,
        entities,
        parked,
        lane_min,
        lane_max,
        ..
    } = state;
    let (lane_min, lane_max) = (*lane_min, *lane_max);

    entities.clear();
    parked.clear();

    lay_out_pool(
        entities,
        EntityKind::Obstacle,
        PoolId::Obstacles,
        &tuning.obstacles,
        rng,
        lane_min,
        lane_max,
    );
    lay_out_pool(
        entities,
        EntityKind::Collectible,
        PoolId::Collectibles,
        &tuning.collectibles,
        rng,
        lane_min,
        lane_max,
    );
    for (index, scenery) in tuning.scenery.iter().enumerate() {
        lay_out_pool(
            entities,
            EntityKind::Scenery(scenery.kind),
            PoolId::Scenery(index),
            &scenery.pool,
            rng,
            lane_min,
            lane_max,
        );
    }
}

/// Ticks between timed obstacle spawns at the given score, if spawning is timed.
/// Shrinks by `interval_step` per `every_points` scored, never below `min_interval`.
pub fn spawn_interval(tuning: &Tuning, score: u64) -> Option<u32> {
    match tuning.obstacle_spawn {
        ObstacleSpawn::Pool => None,
        ObstacleSpawn::Timed {
            base_interval,
            min_interval,
            interval_step,
            every_points,
            ..
        } => {
            let steps = (score / every_points.max(1)).min(u32::MAX as u64) as u32;
            let shrink = steps.saturating_mul(interval_step);
            Some(base_interval.saturating_sub(shrink).max(min_interval))
        }
    }
}

/// Bring one obstacle into play: reuse a parked slot, or grow the pool while
/// under capacity. Returns the slot used, or `None` when every slot is on the road.
pub(crate) fn spawn_obstacle(state: &mut SimulationState) -> Option<usize> {
    let ObstacleSpawn::Timed { capacity, .. } = state.tuning.obstacle_spawn else {
        return None;
    };

    let index = match state.parked.pop() {
        Some(index) => index,
        None => {
            let in_pool = state
                .entities
                .iter()
                .filter(|e| e.kind == EntityKind::Obstacle)
                .count();
            if in_pool >= capacity {
                return None;
            }
            state.entities.push(Entity {
                kind: EntityKind::Obstacle,
                pool: PoolId::Obstacles,
                lateral: 0.0,
                forward: state.tuning.obstacles.far_spawn,
                height: state.tuning.obstacles.height_min,
                speed_factor: state.tuning.obstacles.speed_factor,
                rotation: 0.0,
                active: false,
            });
            state.entities.len() - 1
        }
    };

    let entity = &mut state.entities[index];
    recycle(
        entity,
        &state.tuning.obstacles,
        &mut state.rng,
        state.lane_min,
        state.lane_max,
    );
    entity.active = true;
    log::debug!(
        "Spawned obstacle in slot {} at lateral {:.1}",
        index,
        entity.lateral
    );
    Some(index)
}
