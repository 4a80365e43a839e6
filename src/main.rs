use log::{error, info, LevelFilter};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    // --- Logging Setup ---
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info) // Default level
        .filter_module("kbdtrainer::core::router", LevelFilter::Info) // Debounce traces are noisy
        .filter_module("kbdtrainer::game", LevelFilter::Debug)
        .init();

    info!("Application starting...");

    // --- Run Application ---
    if let Err(e) = kbdtrainer::app::run() {
        error!("Application exited with error: {}", e);
        return Err(e);
    }

    info!("Application exited gracefully.");
    Ok(())
}
