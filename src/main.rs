use bevy::prelude::*;
use cave_miners::{GameTuning, MiningPlugin};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // optional tuning file as the first argument
    let tuning = match std::env::args().nth(1) {
        Some(path) => match GameTuning::load(&path) {
            Ok(tuning) => tuning,
            Err(err) => {
                error!("{}", err);
                std::process::exit(1);
            }
        },
        None => GameTuning::balanced(),
    };

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Mining Mayhem".into(),
                resolution: (1280.0, 720.0).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(MiningPlugin { tuning })
        .add_systems(Startup, setup)
        .run();
}

fn setup(mut commands: Commands) {
    commands.spawn(Camera2dBundle::default());
    info!("Mining Mayhem initialized");
}
