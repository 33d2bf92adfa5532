//! Sampling Layer
//!
//! Runs an unbounded sequence of fixed-size sampling sessions: each
//! session performs N probes at a steady cadence, buffers the exit
//! codes in memory, and publishes one session document on completion.
//!
//! # Architecture
//!
//! - [`Cadence`]: drift-correcting probe-start scheduler
//! - [`Prober`]: the probe seam; [`PingProber`] runs the system `ping`
//! - [`Sampler`]: the session loop itself

mod cadence;
mod probe;
mod session;

pub use cadence::Cadence;
pub use probe::{PingProber, ProbeError, Prober, PROBE_FAILURE_CODE};
pub use session::Sampler;
