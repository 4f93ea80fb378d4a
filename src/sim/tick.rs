//! Per-tick simulation step
//!
//! One call advances the road by one display refresh. Order within a tick:
//! steer, move and recycle entities, timed spawn, obstacle hits, pickups and
//! scoring, speed ramp. An obstacle hit ends the tick early, so the score of a
//! crashing tick stays at its value from before the tick.

use glam::Vec2;

use super::frame::{FrameResult, GameEvent};
use super::spawn::{recycle, spawn_interval, spawn_obstacle};
use super::state::{EntityKind, GamePhase, SimulationState};
use crate::settings::{ObstacleSpawn, Ramp};

/// Held input for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub move_left: bool,
    pub move_right: bool,
}

/// Advance one tick and return the frame to present.
///
/// Outside `Running` nothing moves; the frame only repeats the current
/// state plus any events raised by commands since the last frame.
pub fn advance(state: &mut SimulationState, input: &TickInput) -> FrameResult {
    let mut events = std::mem::take(&mut state.pending);
    step(state, input, &mut events);
    FrameResult::capture(state, events)
}

/// Advance one tick, appending raised events to `events`
pub fn step(state: &mut SimulationState, input: &TickInput, events: &mut Vec<GameEvent>) {
    if state.phase != GamePhase::Running {
        return;
    }

    let score_before = state.score;
    let speed_before = state.speed;
    state.time_ticks += 1;

    // Player
    state
        .player
        .steer(input, &state.tuning, state.lane_min, state.lane_max);
    state.player.wheel_rotation += state.speed * state.tuning.wheel_spin_factor;

    // Entities
    let passed = advance_entities(state);
    if let Some(interval) = spawn_interval(&state.tuning, state.score) {
        state.spawn_timer += 1;
        if state.spawn_timer >= interval {
            state.spawn_timer = 0;
            spawn_obstacle(state);
        }
    }

    // Obstacle hits
    let player = Vec2::new(state.player.lateral, state.player.forward);
    let shape = state.tuning.collision;
    let crashed = state.entities.iter().any(|e| {
        e.active
            && e.kind == EntityKind::Obstacle
            && shape.hits(e.kind, player, Vec2::new(e.lateral, e.forward))
    });
    if crashed {
        state.phase = GamePhase::GameOver;
        events.push(GameEvent::GameOver {
            final_score: state.score,
        });
        log::info!(
            "Game over at tick {} with score {}",
            state.time_ticks,
            state.score
        );
        return;
    }

    // Pickups and scoring
    let collected = collect_pickups(state, player);
    let pass_reward = (state.speed * state.tuning.pass_reward_factor).round() as u64;
    state.score = state
        .score
        .saturating_add(collected.saturating_mul(state.tuning.pickup_reward))
        .saturating_add(passed.saturating_mul(pass_reward))
        .saturating_add(state.tuning.distance_points_per_tick);

    ramp_speed(state);

    if state.score != score_before {
        events.push(GameEvent::ScoreChanged { score: state.score });
    }
    if state.speed != speed_before {
        events.push(GameEvent::SpeedChanged { speed: state.speed });
    }
}

/// Move every active entity toward the camera and recycle the ones that
/// passed it. Returns how many obstacles drove past the player.
fn advance_entities(state: &mut SimulationState) -> u64 {
    let timed = matches!(state.tuning.obstacle_spawn, ObstacleSpawn::Timed { .. });
    let mut passed = 0;

    for (index, entity) in state.entities.iter_mut().enumerate() {
        if !entity.active {
            continue;
        }
        let pool = entity.pool.tuning(&state.tuning);
        entity.forward += state.speed * entity.speed_factor;
        entity.rotation += pool.spin;

        if entity.forward > pool.near_threshold {
            recycle(entity, pool, &mut state.rng, state.lane_min, state.lane_max);
            if entity.kind == EntityKind::Obstacle {
                passed += 1;
                if timed {
                    entity.active = false;
                    state.parked.push(index);
                }
            }
        }
    }
    passed
}

/// Collect every collectible touching the player. Returns how many were taken.
fn collect_pickups(state: &mut SimulationState, player: Vec2) -> u64 {
    let shape = state.tuning.collision;
    let mut collected = 0;

    for entity in state.entities.iter_mut() {
        if !entity.active
            || entity.kind != EntityKind::Collectible
            || !shape.hits(entity.kind, player, Vec2::new(entity.lateral, entity.forward))
        {
            continue;
        }
        collected += 1;
        if state.tuning.respawn_collected {
            let pool = entity.pool.tuning(&state.tuning);
            recycle(entity, pool, &mut state.rng, state.lane_min, state.lane_max);
        } else {
            entity.active = false;
        }
    }
    collected
}

fn ramp_speed(state: &mut SimulationState) {
    let max = state.tuning.max_speed;
    match state.tuning.ramp {
        Ramp::Continuous { per_tick } => {
            state.speed = (state.speed + per_tick).min(max);
        }
        Ramp::Discrete { step, every_points } => {
            while state.score >= state.next_ramp_at {
                state.speed = (state.speed + step).min(max);
                log::debug!("Speed up to {:.2} at score {}", state.speed, state.score);
                let next = state.next_ramp_at.saturating_add(every_points);
                if next == state.next_ramp_at {
                    break;
                }
                state.next_ramp_at = next;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Tuning;
    use crate::sim::state::{Entity, PoolId};
    use proptest::prelude::*;

    /// Replace the whole pool with a single entity
    fn only(state: &mut SimulationState, kind: EntityKind, lateral: f32, forward: f32) {
        let pool = match kind {
            EntityKind::Obstacle => PoolId::Obstacles,
            _ => PoolId::Collectibles,
        };
        state.entities.clear();
        state.parked.clear();
        state.entities.push(Entity {
            kind,
            pool,
            lateral,
            forward,
            height: 0.0,
            speed_factor: 1.0,
            rotation: 0.0,
            active: true,
        });
    }

    fn quiet_scene() -> Tuning {
        Tuning {
            distance_points_per_tick: 0,
            ..Tuning::scene()
        }
    }

    #[test]
    fn test_obstacle_just_inside_threshold_ends_game() {
        let mut state = SimulationState::new(Tuning::scene(), 1);
        state.score = 42;
        // Gap of (1.5 - ε) before the tick; the obstacle closes 0.15 more
        only(&mut state, EntityKind::Obstacle, 0.0, 5.0 - (1.5 - 0.01));

        let frame = advance(&mut state, &TickInput::default());
        assert_eq!(frame.phase, GamePhase::GameOver);
        assert!(!frame.running);
        assert_eq!(frame.game_over(), Some(42));
        assert_eq!(state.score(), 42);
        assert_eq!(state.speed(), 0.15);
    }

    #[test]
    fn test_obstacle_beside_player_at_threshold_is_a_miss() {
        let mut state = SimulationState::new(Tuning::scene(), 1);
        // Exactly 1.5 to the side once moved level with the player
        only(&mut state, EntityKind::Obstacle, 1.5, 5.0 - 0.15);
        state.speed = 0.15;
        let frame = advance(&mut state, &TickInput::default());
        assert_eq!(frame.phase, GamePhase::Running);
        assert_eq!(frame.game_over(), None);
    }

    #[test]
    fn test_game_over_freezes_simulation() {
        let mut state = SimulationState::new(Tuning::scene(), 1);
        only(&mut state, EntityKind::Obstacle, 0.0, 4.9);
        advance(&mut state, &TickInput::default());
        assert_eq!(state.phase(), GamePhase::GameOver);

        let forward = state.entities()[0].forward;
        let ticks = state.time_ticks();
        let left = TickInput {
            move_left: true,
            move_right: false,
        };
        for _ in 0..10 {
            let frame = advance(&mut state, &left);
            assert!(frame.events.is_empty());
        }
        assert_eq!(state.entities()[0].forward, forward);
        assert_eq!(state.time_ticks(), ticks);
        assert_eq!(state.player().lateral, 0.0);
    }

    #[test]
    fn test_pickup_adds_reward_and_respawns_in_scene() {
        let mut state = SimulationState::new(quiet_scene(), 1);
        only(&mut state, EntityKind::Collectible, 0.0, 4.0);

        let frame = advance(&mut state, &TickInput::default());
        assert_eq!(frame.score, 10);
        assert!(frame.events.contains(&GameEvent::ScoreChanged { score: 10 }));
        // Scene coins go straight back to the far spawn
        let coin = &state.entities()[0];
        assert!(coin.active);
        assert_eq!(coin.forward, -120.0);
    }

    #[test]
    fn test_pickup_removes_collectible_in_sprite() {
        let mut state = SimulationState::new(Tuning::sprite(), 1);
        state.start();
        only(&mut state, EntityKind::Collectible, 0.0, -10.0);

        let frame = advance(&mut state, &TickInput::default());
        assert_eq!(frame.score, 10);
        assert!(!state.entities()[0].active);
        assert_eq!(frame.visible().filter(|e| e.kind == EntityKind::Collectible).count(), 0);

        // Stays gone on later ticks
        advance(&mut state, &TickInput::default());
        assert_eq!(state.score(), 10);
    }

    #[test]
    fn test_distance_points_and_continuous_ramp() {
        let mut state = SimulationState::new(Tuning::scene(), 3);
        state.entities.retain(|e| e.kind != EntityKind::Obstacle);
        let frame = advance(&mut state, &TickInput::default());
        assert_eq!(frame.score, 1);
        assert!((frame.speed - 0.1502).abs() < 1e-6);
        assert!(frame.events.contains(&GameEvent::SpeedChanged { speed: frame.speed }));
    }

    #[test]
    fn test_speed_clamped_at_max() {
        let mut state = SimulationState::new(Tuning::scene(), 3);
        state.entities.retain(|e| e.kind != EntityKind::Obstacle);
        state.speed = 0.4999;
        advance(&mut state, &TickInput::default());
        assert_eq!(state.speed(), 0.5);
        let frame = advance(&mut state, &TickInput::default());
        assert_eq!(state.speed(), 0.5);
        assert!(!frame.events.iter().any(|e| matches!(e, GameEvent::SpeedChanged { .. })));
    }

    #[test]
    fn test_sprite_pass_reward_and_discrete_ramp() {
        let mut state = SimulationState::new(Tuning::sprite(), 8);
        state.start();
        only(&mut state, EntityKind::Obstacle, 100.0, 79.0);
        state.player.lateral = -100.0;
        state.score = 95;

        advance(&mut state, &TickInput::default());
        // round(4.0 * 2.5) = 10 points for passing; crossing 100 adds a speed step
        assert_eq!(state.score(), 105);
        assert_eq!(state.speed(), 4.5);
        assert_eq!(state.next_ramp_at, 200);
        // Passed obstacle is parked at the far spawn
        let obstacle = &state.entities()[0];
        assert!(!obstacle.active);
        assert_eq!(obstacle.forward, -600.0);
        assert_eq!(state.parked, vec![0]);
    }

    #[test]
    fn test_discrete_ramp_stops_at_saturated_threshold() {
        let mut state = SimulationState::new(Tuning::sprite(), 8);
        state.start();
        state.score = u64::MAX;
        state.next_ramp_at = u64::MAX - 50;

        ramp_speed(&mut state);
        assert_eq!(state.next_ramp_at, u64::MAX);
        assert_eq!(state.speed(), 5.0);
    }

    #[test]
    fn test_sprite_obstacle_crash_freezes_final_score() {
        let mut state = SimulationState::new(Tuning::sprite(), 6);
        state.start();
        state.pending.clear();
        state.score = 37;
        // Boxes overlap once |dforward| < (70 + 40) / 2 = 55; one tick at speed 4 leaves 56
        only(&mut state, EntityKind::Obstacle, 10.0, -60.0);

        let frame = advance(&mut state, &TickInput::default());
        assert_eq!(frame.phase, GamePhase::Running);
        assert_eq!(state.entities()[0].forward, -56.0);

        let frame = advance(&mut state, &TickInput::default());
        assert_eq!(frame.phase, GamePhase::GameOver);
        assert_eq!(frame.game_over(), Some(37));
        assert_eq!(frame.score, 37);
        assert_eq!(
            frame
                .events
                .iter()
                .filter(|e| matches!(e, GameEvent::GameOver { .. }))
                .count(),
            1
        );

        // Nothing moves after the crash
        let frame = advance(&mut state, &TickInput::default());
        assert_eq!(frame.score, 37);
        assert_eq!(state.entities()[0].forward, -52.0);
        assert!(frame.events.is_empty());
    }

    #[test]
    fn test_sprite_timed_spawn_reuses_parked_slot() {
        let mut state = SimulationState::new(Tuning::sprite(), 8);
        state.start();
        state.entities.retain(|e| e.kind != EntityKind::Collectible);
        for _ in 0..89 {
            advance(&mut state, &TickInput::default());
        }
        assert_eq!(state.active(EntityKind::Obstacle).count(), 0);
        advance(&mut state, &TickInput::default());
        assert_eq!(state.active(EntityKind::Obstacle).count(), 1);
    }

    #[test]
    fn test_idle_does_not_advance() {
        let mut state = SimulationState::new(Tuning::sprite(), 2);
        let before: Vec<f32> = state.entities().iter().map(|e| e.forward).collect();
        let frame = advance(&mut state, &TickInput::default());
        assert_eq!(frame.phase, GamePhase::Idle);
        assert_eq!(frame.tick, 0);
        let after: Vec<f32> = state.entities().iter().map(|e| e.forward).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_restart_after_game_over() {
        let mut state = SimulationState::new(Tuning::scene(), 4);
        state.score = 300;
        state.speed = 0.3;
        state.player.lateral = 2.0;
        only(&mut state, EntityKind::Obstacle, 2.0, 4.9);
        advance(&mut state, &TickInput::default());
        assert_eq!(state.phase(), GamePhase::GameOver);

        state.restart();
        let frame = advance(&mut state, &TickInput::default());
        assert_eq!(frame.events[0], GameEvent::Restarted);
        assert_eq!(state.phase(), GamePhase::Running);
        assert_eq!(state.player().lateral, 0.0);
        assert_eq!(state.active(EntityKind::Obstacle).count(), 5);
        assert_eq!(state.active(EntityKind::Collectible).count(), 8);
        // One tick has run since the restart
        assert_eq!(frame.tick, 1);
        assert_eq!(frame.score, 1);
    }

    #[test]
    fn test_restart_resets_score_and_speed_exactly() {
        let mut state = SimulationState::new(Tuning::sprite(), 4);
        state.start();
        state.score = 1234;
        state.speed = 9.0;
        state.phase = GamePhase::GameOver;
        state.restart();
        assert_eq!(state.score(), 0);
        assert_eq!(state.speed(), 4.0);
        assert_eq!(state.phase(), GamePhase::Running);
        assert!(!state.entities().is_empty());
    }

    #[test]
    fn test_game_over_fires_once_per_session() {
        let mut state = SimulationState::new(Tuning::scene(), 6);
        let mut game_overs = 0;
        let input = TickInput::default();
        for _ in 0..20_000 {
            let frame = advance(&mut state, &input);
            game_overs += frame
                .events
                .iter()
                .filter(|e| matches!(e, GameEvent::GameOver { .. }))
                .count();
        }
        // Sitting in the middle of the road eventually hits something
        assert_eq!(state.phase(), GamePhase::GameOver);
        assert_eq!(game_overs, 1);
    }

    #[test]
    fn test_determinism() {
        let inputs = [
            TickInput {
                move_left: true,
                move_right: false,
            },
            TickInput::default(),
            TickInput {
                move_left: false,
                move_right: true,
            },
        ];
        let mut a = SimulationState::new(Tuning::scene(), 99999);
        let mut b = SimulationState::new(Tuning::scene(), 99999);
        for i in 0..600 {
            let input = &inputs[i % inputs.len()];
            assert_eq!(advance(&mut a, input), advance(&mut b, input));
        }
    }

    fn input_strategy() -> impl Strategy<Value = TickInput> {
        (any::<bool>(), any::<bool>()).prop_map(|(move_left, move_right)| TickInput {
            move_left,
            move_right,
        })
    }

    fn tuning_strategy() -> impl Strategy<Value = Tuning> {
        prop_oneof![Just(Tuning::scene()), Just(Tuning::sprite())]
    }

    proptest! {
        #[test]
        fn prop_player_stays_in_lane(
            tuning in tuning_strategy(),
            seed in any::<u64>(),
            inputs in prop::collection::vec(input_strategy(), 1..400),
        ) {
            let mut state = SimulationState::new(tuning, seed);
            state.start();
            let (min, max) = state.lane_bounds();
            for input in &inputs {
                let frame = advance(&mut state, input);
                prop_assert!(frame.player.lateral >= min && frame.player.lateral <= max);
                prop_assert!(frame.player.lean.abs() <= state.tuning().lean_max + 1e-6);
            }
        }

        #[test]
        fn prop_no_entity_past_near_threshold(
            tuning in tuning_strategy(),
            seed in any::<u64>(),
            inputs in prop::collection::vec(input_strategy(), 1..400),
        ) {
            let mut state = SimulationState::new(tuning, seed);
            state.start();
            for input in &inputs {
                advance(&mut state, input);
                for entity in state.entities() {
                    let pool = entity.pool.tuning(state.tuning());
                    prop_assert!(entity.forward <= pool.near_threshold);
                }
            }
        }

        #[test]
        fn prop_score_and_speed_monotonic_and_bounded(
            tuning in tuning_strategy(),
            seed in any::<u64>(),
            inputs in prop::collection::vec(input_strategy(), 1..400),
        ) {
            let mut state = SimulationState::new(tuning, seed);
            state.start();
            let max = state.tuning().max_speed;
            let mut last_score = state.score();
            let mut last_speed = state.speed();
            for input in &inputs {
                let frame = advance(&mut state, input);
                prop_assert!(frame.score >= last_score);
                prop_assert!(frame.speed >= last_speed);
                prop_assert!(frame.speed <= max);
                last_score = frame.score;
                last_speed = frame.speed;
            }

            state.restart();
            prop_assert_eq!(state.score(), 0);
            prop_assert_eq!(state.speed(), state.tuning().base_speed);
        }
    }
}
