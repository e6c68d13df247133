use crate::{logging, profiling};

/// Process-wide configuration applied by [`init`](crate::init).
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Fallback log directives when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
    pub benchmark: BenchmarkMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BenchmarkMode {
    /// Benchmarking is disabled
    #[default]
    Off,
    /// Scopes are recorded in-process
    On,
    /// Scopes are recorded and served to external tools such as `puffin_viewer`
    WithWebserver,
}

impl Config {
    pub fn apply(&self) {
        match &self.log_filter {
            Some(filter) => logging::init_with_filter(filter),
            None => logging::init(),
        }

        match self.benchmark {
            BenchmarkMode::Off => {}
            BenchmarkMode::On => profiling::init_profiling(profiling::ProfilingBackend::InProcess),
            BenchmarkMode::WithWebserver => {
                profiling::init_profiling(profiling::ProfilingBackend::PuffinHttp)
            }
        }
    }
}
