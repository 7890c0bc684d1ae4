//! Job state machine
//!
//! submitted → QUEUED → RUNNING → {COMPLETED | FAILED}
//!
//! The remote API owns the state; this module only maps and checks it.

mod job_state;

pub use job_state::JobState;

/// Check if a state is terminal (no further transitions possible)
pub trait TerminalState {
    fn is_terminal(&self) -> bool;
}
