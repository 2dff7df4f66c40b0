pub mod config;
pub mod error;
pub mod javafoil;
pub mod logging;
pub mod naca;
pub mod profiler;
pub mod sweep;

pub use error::{SweepError, SweepResult};

#[cfg(feature = "profiling")]
use once_cell::sync::Lazy;
#[cfg(feature = "profiling")]
use parking_lot::Mutex;

#[cfg(feature = "profiling")]
pub static PROFILER: Lazy<Mutex<profiler::Profiler>> =
    Lazy::new(|| Mutex::new(profiler::Profiler::new()));
