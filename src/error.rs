//! Error types for flowseq
//!
//! The interpreter has no recoverable error path: user callables that panic
//! unwind straight out of `run`. What remains are internal-consistency
//! violations, which are bugs in this crate and are raised rather than returned.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// A structural invariant of the stage tree or signal protocol was broken.
    #[error("invariant violation (this is a bug): {context}")]
    InvariantViolation { context: &'static str },

    /// A `Same<A, B>` witness was used where `A` and `B` differ.
    #[error("invariant violation (this is a bug): type witness {from} -> {to} does not hold")]
    WitnessMismatch {
        from: &'static str,
        to: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, FlowError>;

impl FlowError {
    /// Log and abort the current pass.
    #[cold]
    #[track_caller]
    pub fn raise(self) -> ! {
        log::error!("{}", self);
        panic!("{}", self)
    }
}
