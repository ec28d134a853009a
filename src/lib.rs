//! # Batched oblivious PRF over correlated OT
//!
//! This library implements the batched, related-key OPRF of ["Efficient Batched Oblivious PRF with Applications to Private Set Intersection"](https://eprint.iacr.org/2016/799),
//! in its original form (two masked messages per codeword column) and in the optimized form
//! (one correction per column).
//!
//! [oprf] is the main module of this library.
#![warn(missing_docs)]

pub mod bit_matrix;
pub mod channel_utils;
pub mod cli_utils;
pub mod correlation;
pub mod error;
mod hash_utils;
pub mod oprf;
pub mod oprf_demo;
mod parallel;
pub mod prc;
pub mod set_utils;

pub use error::OprfError;
pub use oprf::{OprfConfig, OprfVariant, Receiver, ReceiverOutput, Sender, SenderOutput};
