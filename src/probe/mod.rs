//! HTTP probing of monitor targets

pub mod error;
pub mod prober;

pub use error::ProbeError;
pub use prober::{evaluate, HttpProber, Probe, PROBE_USER_AGENT};
