//! Runs both OPRF roles on one machine, checks the outputs and reports timings.
//!
//! Used by the `oprf_demo` binary.

mod bin;
pub use bin::run;
