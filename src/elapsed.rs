use std::time::Instant;
use tracing::debug;

/// Logs how long an operation took once the guard goes out of scope.
pub struct Elapsed {
    operation: &'static str,
    started: Instant,
}

impl Elapsed {
    pub fn start(operation: &'static str) -> Self {
        Self {
            operation,
            started: Instant::now(),
        }
    }
}

impl Drop for Elapsed {
    fn drop(&mut self) {
        debug!(
            "{} finished after {}us",
            self.operation,
            self.started.elapsed().as_micros()
        );
    }
}
