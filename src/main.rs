use parcel_viewport::app::host;
use parcel_viewport::config::{load_config, ViewportConfig};
use std::path::PathBuf;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => match load_config(&path) {
            Ok(config) => {
                log::info!("Loaded config from {:?}", path);
                config
            }
            Err(err) => {
                log::warn!("Failed to load config {:?}: {}; using defaults", path, err);
                ViewportConfig::default()
            }
        },
        None => ViewportConfig::default(),
    };

    log::info!("Parcel viewport");
    log::info!("   Left drag moves, right drag orbits, wheel zooms");
    log::info!("   N adds a parcel, Delete removes the selection, ESC exits");

    host::run(config);

    log::info!("Goodbye");
}
