//! Particle Systems - headless runner
//!
//! Usage: `particle-systems [PRESET | CONFIG.json] [TICKS]`

#[cfg(not(target_arch = "wasm32"))]
use particle_systems::{ConfigError, RunConfig, ScenePreset, sim::ParticleSystem};

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Particle Systems (native) starting...");

    if let Err(e) = run(std::env::args().skip(1).collect()) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Embedders drive ParticleSystem directly on the web
}

#[cfg(not(target_arch = "wasm32"))]
fn run(args: Vec<String>) -> Result<(), ConfigError> {
    let mut config = match args.first() {
        Some(arg) if arg.ends_with(".json") => RunConfig::load(arg)?,
        Some(arg) => {
            let preset = ScenePreset::from_str(arg)
                .ok_or_else(|| ConfigError::UnknownPreset(arg.clone()))?;
            RunConfig::preset(preset)
        }
        None => RunConfig::default(),
    };
    if let Some(ticks) = args.get(1) {
        match ticks.parse() {
            Ok(ticks) => config.ticks = ticks,
            Err(_) => log::warn!("ignoring tick count '{ticks}'"),
        }
    }

    let mut system = ParticleSystem::configure(config.system_config()?)?;
    system.initialize();

    let mut respawned = 0;
    for tick in 1..=config.ticks {
        system.step(config.timestep);
        respawned += system.last_report().respawned;

        if config.log_interval > 0 && tick % config.log_interval == 0 {
            let stats = system.stats();
            log::info!(
                "tick {tick}: {} live, speed mean {:.2} max {:.2}, bounds {:?}..{:?}",
                stats.live,
                stats.mean_speed,
                stats.max_speed,
                stats.bounds_min,
                stats.bounds_max
            );
        }
    }

    log::info!(
        "finished {} ticks ({:.1}s simulated), {respawned} respawns",
        system.tick_count(),
        system.tick_count() as f32 * config.timestep
    );
    Ok(())
}
