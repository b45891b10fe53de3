//! Session runtime based on monoio
//!
//! Every CLI session runs on one thread: requests are issued one at a
//! time and each awaits its response or its timeout before the next starts.
//! The fusion driver picks io_uring when the kernel offers it and falls
//! back to epoll otherwise. The timer is always enabled because request
//! timeouts depend on it.

use monoio::{FusionDriver, RuntimeBuilder};
use tracing::info;

/// Session runtime configuration
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Name used in log lines
    pub name: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            name: "perpdesk-session".to_string(),
        }
    }
}

/// Single-threaded runtime that drives one CLI session to completion.
pub struct SessionRuntime {
    config: RuntimeConfig,
}

impl SessionRuntime {
    /// Create a runtime with the default configuration
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Create a runtime with a custom configuration
    pub fn with_config(config: RuntimeConfig) -> Self {
        Self { config }
    }

    /// Build the monoio runtime and run `f` until its future completes.
    ///
    /// Fails only if the runtime itself cannot be built.
    pub fn start<F, Fut>(self, f: F) -> std::io::Result<Fut::Output>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future,
    {
        let mut runtime = RuntimeBuilder::<FusionDriver>::new()
            .enable_timer()
            .build()?;

        info!("▶️  Starting {}", self.config.name);
        let result = runtime.block_on(f());
        info!("⏹️  {} stopped", self.config.name);

        Ok(result)
    }

    /// Get runtime configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}

impl Default for SessionRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to build a default runtime and run `f` on it
pub fn run_session<F, Fut>(f: F) -> std::io::Result<Fut::Output>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    SessionRuntime::new().start(f)
}
