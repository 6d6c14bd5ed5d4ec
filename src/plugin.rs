use crate::miners::CameraCommand;
use crate::session::MiningSession;
use crate::tuning::GameTuning;
use crate::world::{Coord, RecordingObserver, TerrainObserver};
use bevy::prelude::*;

/// Pause between a cleared cave and the next one (seconds)
pub const CAVE_TRANSITION_SECS: f32 = 2.0;

/// Tiles turned into floor this frame; a whole cave arrives as one event.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct TilesBroken {
    pub coords: Vec<Coord>,
    pub gold: f64,
}

/// Every tile of the current cave is broken.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaveCleared;

/// Requests from the input/UI layer.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub enum PlayerAction {
    LuckUpgrade(f64),
    ValueUpgrade(f64),
    BoostClick,
    Break(Coord),
    Camera(CameraCommand),
}

/// Pending new-cave countdown
#[derive(Resource, Default)]
pub struct CaveTransition {
    timer: Option<Timer>,
}

impl CaveTransition {
    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }
}

/// Forwards terrain callbacks as bevy events.
struct EventBridge<'a, 'w1, 'w2> {
    broken: &'a mut EventWriter<'w1, TilesBroken>,
    cleared: &'a mut EventWriter<'w2, CaveCleared>,
}

impl TerrainObserver for EventBridge<'_, '_, '_> {
    fn on_tile_broken(&mut self, coords: &[Coord], gold_granted: f64) {
        self.broken.send(TilesBroken {
            coords: coords.to_vec(),
            gold: gold_granted,
        });
    }

    fn on_cave_cleared(&mut self) {
        self.cleared.send(CaveCleared);
    }
}

pub struct MiningPlugin {
    pub tuning: GameTuning,
}

impl Plugin for MiningPlugin {
    fn build(&self, app: &mut App) {
        let session = match MiningSession::new(self.tuning.clone()) {
            Ok(session) => session,
            Err(err) => {
                error!("Mining session not started: {}", err);
                return;
            }
        };

        app.insert_resource(session)
            .init_resource::<CaveTransition>()
            .add_event::<TilesBroken>()
            .add_event::<CaveCleared>()
            .add_event::<PlayerAction>()
            .add_systems(Startup, start_first_cave)
            .add_systems(
                Update,
                (handle_player_actions, tick_session, run_cave_transition).chain(),
            );
    }
}

fn start_first_cave(
    mut session: ResMut<MiningSession>,
    mut broken: EventWriter<TilesBroken>,
    mut cleared: EventWriter<CaveCleared>,
) {
    let grid_size = session.grid_size();
    let mut bridge = EventBridge {
        broken: &mut broken,
        cleared: &mut cleared,
    };
    match session.initialize_terrain(grid_size, &mut bridge) {
        Ok(()) => info!("Mining session started on a {}x{} cave", grid_size, grid_size),
        Err(err) => error!("Failed to build the first cave: {}", err),
    }
}

fn handle_player_actions(
    time: Res<Time>,
    mut actions: EventReader<PlayerAction>,
    mut session: ResMut<MiningSession>,
    mut broken: EventWriter<TilesBroken>,
    mut cleared: EventWriter<CaveCleared>,
) {
    let dt = time.delta_seconds();
    let mut bridge = EventBridge {
        broken: &mut broken,
        cleared: &mut cleared,
    };
    for action in actions.read() {
        match *action {
            PlayerAction::LuckUpgrade(multiplier) => session.apply_luck_upgrade(multiplier),
            PlayerAction::ValueUpgrade(multiplier) => session.apply_value_upgrade(multiplier),
            PlayerAction::BoostClick => session.register_boost_click(),
            PlayerAction::Break(coord) => {
                session.player_break(coord, &mut bridge);
            }
            PlayerAction::Camera(command) => session.switch_camera(command, dt),
        }
    }
}

fn tick_session(
    time: Res<Time>,
    transition: Res<CaveTransition>,
    mut session: ResMut<MiningSession>,
    mut broken: EventWriter<TilesBroken>,
    mut cleared: EventWriter<CaveCleared>,
) {
    if transition.is_running() {
        return;
    }
    let mut bridge = EventBridge {
        broken: &mut broken,
        cleared: &mut cleared,
    };
    session.tick(time.delta_seconds(), &mut bridge);
}

fn run_cave_transition(
    time: Res<Time>,
    mut transition: ResMut<CaveTransition>,
    mut cleared_events: EventReader<CaveCleared>,
    mut session: ResMut<MiningSession>,
    mut broken: EventWriter<TilesBroken>,
) {
    if cleared_events.read().next().is_some() && transition.timer.is_none() {
        info!("Cave cleared, next cave in {}s", CAVE_TRANSITION_SECS);
        transition.timer = Some(Timer::from_seconds(CAVE_TRANSITION_SECS, TimerMode::Once));
    }

    let Some(timer) = transition.timer.as_mut() else {
        return;
    };
    if !timer.tick(time.delta()).finished() {
        return;
    }
    transition.timer = None;

    // a fresh cave cannot be cleared already, so only broken tiles need forwarding
    let mut recorded = RecordingObserver::default();
    if let Err(err) = session.request_new_cave(&mut recorded) {
        error!("Failed to build the next cave: {}", err);
    }
    for (coords, gold) in recorded.broken {
        broken.send(TilesBroken { coords, gold });
    }
}
