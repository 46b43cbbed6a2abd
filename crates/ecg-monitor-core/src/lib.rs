//! # ECG Monitor Core
//!
//! Shared types, configuration, and errors for the ECG heart-rate
//! monitor.
//!
//! This crate is the foundation the rest of the workspace builds on:
//!
//! - **Configuration**: [`MonitorConfig`] and [`FilterConfig`] describe
//!   the pipeline (sampling rate, window, filter cutoffs, estimator
//!   thresholds) and are immutable after [`MonitorConfig::validate`].
//!
//! - **Domain types**: [`TickSnapshot`], [`BpmReading`], and
//!   [`Diagnostics`] carry one tick's output from the session to its
//!   consumers (server broadcast, tests, reports).
//!
//! - **Errors**: the [`error`] module defines a per-concern hierarchy
//!   rolled into [`EcgError`].
//!
//! ## Feature Flags
//!
//! - `serde`: serialization support on all wire-facing types
//!
//! ## Example
//!
//! ```rust
//! use ecg_monitor_core::MonitorConfig;
//!
//! let config = MonitorConfig::default();
//! config.validate().unwrap();
//! assert_eq!(config.window_len(), 20_000);
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod types;

pub use config::{FilterConfig, MonitorConfig};
pub use error::{ConfigError, CoreResult, EcgError, LoadError, SignalError};
pub use types::{BpmReading, BpmStatus, Diagnostics, FilterStage, TickSnapshot};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
