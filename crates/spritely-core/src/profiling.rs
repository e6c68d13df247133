//! Profiling utilities based on the `puffin` crate.
//!
//! With the `profiling` feature disabled, the scope macros expand to nothing.

#[cfg(feature = "profiling")]
use std::sync::OnceLock;

#[cfg(feature = "profiling")]
pub use puffin::{profile_function, profile_scope};

#[cfg(not(feature = "profiling"))]
#[macro_export]
macro_rules! profile_function {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "profiling"))]
#[macro_export]
macro_rules! profile_scope {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "profiling"))]
pub use crate::{profile_function, profile_scope};

/// Profiling backend options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfilingBackend {
    /// Record scopes in-process only.
    InProcess,
    /// Also serve profiling data to `puffin_viewer` over HTTP.
    PuffinHttp,
}

/// Address the puffin HTTP server binds to.
pub const PUFFIN_HTTP_ADDR: &str = "0.0.0.0:8585";

#[cfg(feature = "profiling")]
static PROFILING_SERVER: OnceLock<puffin_http::Server> = OnceLock::new();

/// Enable scope recording with the given backend.
#[cfg(feature = "profiling")]
pub fn init_profiling(backend: ProfilingBackend) {
    puffin::set_scopes_on(true);

    if backend == ProfilingBackend::PuffinHttp {
        match puffin_http::Server::new(PUFFIN_HTTP_ADDR) {
            Ok(server) => {
                tracing::info!("Puffin profiler server started on http://{}", PUFFIN_HTTP_ADDR);
                let _ = PROFILING_SERVER.set(server);
            }
            Err(e) => {
                tracing::error!("Failed to start puffin server: {}", e);
            }
        }
    }
}

#[cfg(not(feature = "profiling"))]
pub fn init_profiling(backend: ProfilingBackend) {
    tracing::warn!(?backend, "profiling requested but the `profiling` feature is disabled");
}

/// Mark the start of a new frame. Call once per frame.
#[inline]
pub fn new_frame() {
    #[cfg(feature = "profiling")]
    puffin::GlobalProfiler::lock().new_frame();
}
