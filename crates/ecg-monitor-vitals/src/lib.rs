//! # ECG Monitor Vitals
//!
//! Streaming heart-rate estimation state:
//!
//! - [`SampleBuffer`]: fixed-capacity ring over the display window.
//! - [`PeakHistory`]: deduplicated beat times in stream seconds.
//! - [`BpmEstimator`]: median-of-RR estimation with display smoothing.
//! - [`EcgSession`]: owns all of the above and runs one tick at a
//!   time, raw window in, [`TickSnapshot`] out.
//!
//! The session is synchronous and single-owner; the server crate wraps
//! it in its async plumbing.
//!
//! [`TickSnapshot`]: ecg_monitor_core::TickSnapshot

#![forbid(unsafe_code)]

pub mod buffer;
pub mod estimator;
pub mod history;
pub mod session;

pub use buffer::SampleBuffer;
pub use estimator::{BpmEstimator, BpmUpdate};
pub use history::{IngestStats, PeakHistory};
pub use session::EcgSession;
