//! Step tracer passed explicitly into the engine entry points
//!
//! The tracer is built once by the caller before a run and only read
//! afterwards. Records go through the `log` facade under the
//! `alm_system::trace` target, so the binary's logger decides where they end up.

use log::debug;

/// Log target used for trace records
pub const TRACE_TARGET: &str = "alm_system::trace";

/// On/off step tracer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tracer {
    enabled: bool,
}

impl Tracer {
    /// Create a tracer
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// A tracer that never emits anything
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record that a named step is being executed
    pub fn step(&self, step: &str) {
        if self.enabled {
            debug!(target: TRACE_TARGET, "Calling {}", step);
        }
    }

    /// Record a step together with a lazily formatted detail message
    pub fn step_with<F: FnOnce() -> String>(&self, step: &str, detail: F) {
        if self.enabled {
            debug!(target: TRACE_TARGET, "Calling {}: {}", step, detail());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_tracer_skips_detail() {
        let tracer = Tracer::disabled();
        assert!(!tracer.is_enabled());
        // The closure must never run when tracing is off
        tracer.step_with("price_bond", || panic!("detail evaluated"));
    }

    #[test]
    fn test_enabled_tracer() {
        let tracer = Tracer::new(true);
        assert!(tracer.is_enabled());
        tracer.step("calibrate_projected");
        tracer.step_with("calibrate_projected", || "year 0".to_string());
    }
}
