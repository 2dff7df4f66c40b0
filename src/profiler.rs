use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Cumulative wall time and call count per pipeline stage.
#[derive(Default)]
pub struct Profiler {
    pub stages: HashMap<&'static str, StageTiming>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct StageTiming {
    pub calls: u64,
    pub total: Duration,
}

impl StageTiming {
    pub fn mean(&self) -> Duration {
        if self.calls == 0 {
            Duration::ZERO
        } else {
            self.total / self.calls as u32
        }
    }
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, stage: &'static str, elapsed: Duration) {
        let entry = self.stages.entry(stage).or_default();
        entry.calls += 1;
        entry.total += elapsed;
    }

    /// Stages ordered by total time, slowest first.
    pub fn report_sorted(&self) -> Vec<(&'static str, StageTiming)> {
        let mut v: Vec<_> = self.stages.iter().map(|(n, t)| (*n, *t)).collect();
        v.sort_by(|a, b| b.1.total.cmp(&a.1.total));
        v
    }

    pub fn clear(&mut self) {
        self.stages.clear();
    }

    pub fn log_and_clear(&mut self) {
        for (name, timing) in self.report_sorted() {
            log::info!(
                "{:<20} {:>6} calls  total {:?}  mean {:?}",
                name,
                timing.calls,
                timing.total,
                timing.mean()
            );
        }
        self.clear();
    }
}

pub struct ProfilerGuard {
    name: &'static str,
    start: Instant,
}

impl ProfilerGuard {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Start timing a stage. With the `profiling` feature the guard reports to
/// the global profiler when dropped.
pub fn start(name: &'static str) -> ProfilerGuard {
    ProfilerGuard {
        name,
        start: Instant::now(),
    }
}

#[cfg(feature = "profiling")]
impl Drop for ProfilerGuard {
    fn drop(&mut self) {
        crate::PROFILER.lock().record(self.name, self.start.elapsed());
    }
}

/// Log collected stage timings. No-op without the `profiling` feature.
pub fn log_report() {
    #[cfg(feature = "profiling")]
    crate::PROFILER.lock().log_and_clear();
}

/// Profile the enclosing scope only when the `profiling` feature is enabled.
#[macro_export]
macro_rules! profile_scope {
    ($name:expr) => {
        #[cfg(feature = "profiling")]
        let _guard = $crate::profiler::start($name);
    };
}
