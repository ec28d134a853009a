//! Protocol abort conditions.
//!
//! Every fallible function in this crate returns [anyhow::Result]. When a run has to be aborted
//! because the two parties disagree on parameters, or because the caller asked for something the
//! session was not set up for, the [anyhow::Error] carries an [OprfError] which can be recovered
//! with [anyhow::Error::downcast_ref].

use thiserror::Error;

/// Distinguished aborts of the OPRF protocol. None of them is recovered inside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OprfError {
    /// A payload or a collaborator output has a size inconsistent with the negotiated parameters.
    #[error("parameter mismatch on {what}: expected {expected}, got {actual}")]
    ParameterMismatch {
        /// What was being checked.
        what: &'static str,
        /// Size implied by the negotiated parameters.
        expected: usize,
        /// Size actually observed.
        actual: usize,
    },

    /// The requested capacity is outside of the codeword sizing table.
    #[error("capacity {requested} exceeds the supported maximum {max}")]
    CapacityExceeded {
        /// `max(max_batch_size, max_future_evaluations)`.
        requested: usize,
        /// Largest supported capacity.
        max: usize,
    },

    /// `evaluate` was called with more inputs than the session was set up for.
    #[error("batch size {batch_size} exceeds the session maximum {max_batch_size}")]
    BatchSizeExceeded {
        /// Requested batch size.
        batch_size: usize,
        /// Batch size the session was set up for.
        max_batch_size: usize,
    },

    /// `evaluate` was called with an empty batch.
    #[error("batch must contain at least one input")]
    EmptyBatch,

    /// A sender query targets a position outside of the batch.
    #[error("position {index} is out of range for a batch of {batch_size}")]
    PositionOutOfRange {
        /// Queried position.
        index: usize,
        /// Size of the evaluated batch.
        batch_size: usize,
    },
}

/// Returns the [OprfError] carried by `err`, if any.
pub fn abort_reason(err: &anyhow::Error) -> Option<&OprfError> {
    err.chain().find_map(|e| e.downcast_ref::<OprfError>())
}
