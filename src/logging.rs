use std::io::Write;

use env_logger::{Builder, Target};
use log::LevelFilter;

/// Resolve the log level: explicit argument, then `RUST_LOG`, then info.
pub fn resolve_level(level: Option<&str>) -> LevelFilter {
    level
        .and_then(|l| l.parse::<LevelFilter>().ok())
        .or_else(|| {
            std::env::var("RUST_LOG")
                .ok()
                .and_then(|v| v.parse::<LevelFilter>().ok())
        })
        .unwrap_or(LevelFilter::Info)
}

/// Install the global logger. Safe to call more than once; later calls are ignored.
pub fn init_logging(level: Option<&str>) {
    let log_level = resolve_level(level);

    let result = Builder::new()
        .filter_level(log_level)
        .target(Target::Stderr)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {:5} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init();

    if result.is_ok() {
        log::debug!("Logging initialised at {}", log_level);
    }
}
