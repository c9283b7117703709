//! Diagnostic hooks for the flush/solve cycle.
//!
//! Mirrors the teacher's per-iteration `Callback` trait, retargeted at the
//! events this crate actually produces: stability-ladder retries, flush
//! phase summaries, and reoptimization-tree restart decisions. Nothing in
//! `lp` or `reopt` requires a sink to be installed; a `NoOpDiagnostics` is
//! the default everywhere.

use crate::CoreOptions;
use crate::E;
use crate::Status;

/// One event worth surfacing to a caller-supplied sink.
#[derive(Debug, Clone)]
pub enum DiagnosticEvent<'a> {
    /// The stability ladder (§4.6) is retrying the solve with a looser
    /// setting after `attempt` failed with `status`.
    StabilityRetry {
        attempt: u32,
        status: Status,
        next: &'a str,
    },
    /// A flush pass applied `ndeleted` deletions and `nadded` additions.
    FlushApplied { ndeleted: usize, nadded: usize },
    /// The reoptimization tree decided to restart.
    ReoptRestart { reason: &'a str },
    /// An optimal solution's feasibility recheck (§4.6 "evaluate and
    /// commit") still found a violation after exhausting the fastmip/
    /// fromscratch retries.
    SolutionFeasibilityWarning { violation: E },
}

/// Hook invoked as the LP-management core makes progress. Use when the
/// embedding branch-and-cut loop wants its own logging/monitoring/tracing
/// instead of the default no-op.
pub trait Diagnostics {
    /// Creates a new diagnostics sink from solver options.
    fn new(options: &CoreOptions) -> Self
    where
        Self: Sized;

    /// Called once per event. Must not block for long; the caller is on the
    /// hot path of the solve loop.
    fn report(&mut self, event: &DiagnosticEvent<'_>);
}

/// A diagnostics sink that discards every event.
pub struct NoOpDiagnostics;

impl Diagnostics for NoOpDiagnostics {
    fn new(_options: &CoreOptions) -> Self {
        Self
    }

    fn report(&mut self, _event: &DiagnosticEvent<'_>) {}
}

/// Prints each event to stderr, one line per call.
pub struct EprintDiagnostics;

impl Diagnostics for EprintDiagnostics {
    fn new(_options: &CoreOptions) -> Self {
        Self
    }

    fn report(&mut self, event: &DiagnosticEvent<'_>) {
        match event {
            DiagnosticEvent::StabilityRetry {
                attempt,
                status,
                next,
            } => {
                eprintln!(
                    "[lp] attempt {attempt} failed with {status:?}, retrying with {next}"
                );
            }
            DiagnosticEvent::FlushApplied { ndeleted, nadded } => {
                eprintln!("[lp] flush: -{ndeleted} +{nadded}");
            }
            DiagnosticEvent::ReoptRestart { reason } => {
                eprintln!("[reopt] restart: {reason}");
            }
            DiagnosticEvent::SolutionFeasibilityWarning { violation } => {
                eprintln!("[lp] optimal solution still violates feasibility by {violation}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_accepts_every_event_without_panicking() {
        let mut diag = NoOpDiagnostics;
        diag.report(&DiagnosticEvent::FlushApplied {
            ndeleted: 1,
            nadded: 2,
        });
        diag.report(&DiagnosticEvent::ReoptRestart { reason: "test" });
    }
}
