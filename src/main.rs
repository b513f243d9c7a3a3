use clap::Parser;
use doze_sensors::config::DozeConfig;
use doze_sensors::dispatch::{DozeEvent, run_dispatch};
use doze_sensors::error::Result;
use doze_sensors::input::simulation::{
    CountingWakeLock, InMemorySensorRegistry, InMemorySettings, run_sensor_simulation,
};
use doze_sensors::metrics::LogMetricsSink;
use doze_sensors::pulse::{PulseCallback, PulseReason};
use doze_sensors::sensors::DozeSensors;
use doze_sensors::settings::UserId;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::time::Duration;

/// Run the doze trigger sensors against simulated hardware.
#[derive(Parser, Debug)]
#[command(name = "doze-sim", version, about)]
struct Args {
    /// JSON device config (defaults to the user config dir)
    #[arg(short, long, env = "DOZE_CONFIG")]
    config: Option<PathBuf>,

    /// Milliseconds between simulated sensor fires
    #[arg(long, default_value_t = 2000)]
    fire_interval_ms: u64,

    /// Stop after this many seconds (runs until Ctrl+C when omitted)
    #[arg(long)]
    duration_secs: Option<u64>,
}

struct LogPulseCallback;

impl PulseCallback for LogPulseCallback {
    fn on_sensor_pulse(&self, reason: PulseReason, sensor_performed_prox_check: bool) -> Result<()> {
        info!(
            "Pulse requested: reason={} ({}), prox_checked={}",
            reason,
            reason.code(),
            sensor_performed_prox_check
        );
        Ok(())
    }
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

#[tokio::main]
async fn main() {
    init_logger();
    info!("Starting doze sensor simulation");

    let args = Args::parse();
    let config_path = args.config.unwrap_or_else(DozeConfig::default_path);
    let config = match DozeConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load {}: {}", config_path.display(), e);
            std::process::exit(1);
        }
    };
    info!("Configuration loaded:");
    info!("  Sig motion: {}", config.pulse_on_sig_motion);
    info!("  Pickup: {}", config.pulse_on_pickup_available());
    info!("  Double tap type: {:?}", config.double_tap_sensor_type);

    let double_tap_type = if config.double_tap_sensor_type.is_empty() {
        "vendor.sim.double_tap"
    } else {
        config.double_tap_sensor_type.as_str()
    };
    let registry = Arc::new(InMemorySensorRegistry::with_default_sensors(double_tap_type));
    let settings = Arc::new(InMemorySettings::new(UserId::SYSTEM));

    let sensors = match DozeSensors::new(
        &config,
        registry.clone(),
        settings.clone(),
        Arc::new(CountingWakeLock::new()),
        Arc::new(LogMetricsSink),
        Arc::new(LogPulseCallback),
    ) {
        Ok(sensors) => sensors,
        Err(e) => {
            log::error!("Failed to create doze sensors: {}", e);
            std::process::exit(1);
        }
    };
    info!("Trigger sensors:\n{}", sensors.dump());

    let (tx, rx) = mpsc::unbounded_channel();
    let dispatch = tokio::spawn(run_dispatch(sensors, rx));
    let _ = tx.send(DozeEvent::Listen(true));

    let simulation = run_sensor_simulation(
        registry,
        settings,
        tx.clone(),
        Duration::from_millis(args.fire_interval_ms),
    );

    match args.duration_secs {
        Some(secs) => {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(secs)) => info!("Duration elapsed"),
                _ = signal::ctrl_c() => info!("Received shutdown signal"),
            }
        }
        None => match signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal"),
            Err(e) => log::error!("Failed to listen for shutdown signal: {}", e),
        },
    }

    simulation.abort();
    let _ = simulation.await;
    drop(tx);

    match dispatch.await {
        Ok(sensors) => info!("Final trigger state:\n{}", sensors.dump()),
        Err(e) => log::error!("Dispatch task failed: {}", e),
    }
    info!("Doze sensor simulation stopped");
}
