//! Error types for the ECG monitor.
//!
//! Uses [`thiserror`] for `Display` and `Error` derivation.
//!
//! # Error Hierarchy
//!
//! - [`EcgError`]: top-level error encompassing all subsystem errors
//! - [`SignalError`]: filter design and application failures
//! - [`LoadError`]: offline record loading failures (always fatal for
//!   the batch path)
//! - [`ConfigError`]: invalid pipeline configuration
//!
//! The streaming pipeline itself never surfaces a [`SignalError`] to the
//! caller: a failing filter stage degrades to pass-through and is
//! reported through diagnostics instead. The error type still exists for
//! design-time validation and for the offline path, where a broken
//! filter is fatal.

use thiserror::Error;

/// A specialized `Result` type for monitor operations.
pub type CoreResult<T> = Result<T, EcgError>;

/// Top-level error type for the ECG monitor.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EcgError {
    /// Signal processing error
    #[error("Signal processing error: {0}")]
    Signal(#[from] SignalError),

    /// Offline record loading error
    #[error("Record load error: {0}")]
    Load(#[from] LoadError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl EcgError {
    /// Returns `true` if the streaming pipeline can continue after this
    /// error (by degrading), `false` if it must abort.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Signal(e) => e.is_recoverable(),
            Self::Load(_) | Self::Config(_) => false,
        }
    }
}

/// Errors from digital filter design and application.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SignalError {
    /// Filter design produced unusable coefficients
    #[error("Filter design failed: {message}")]
    Design {
        /// Description of the design failure
        message: String,
    },

    /// Designed filter has poles on or outside the unit circle
    #[error("Unstable filter: {message}")]
    Unstable {
        /// Description of the instability
        message: String,
    },

    /// Input window too short for the requested operation
    #[error("Insufficient samples: need at least {required}, got {available}")]
    InsufficientSamples {
        /// Minimum required samples
        required: usize,
        /// Available samples
        available: usize,
    },
}

impl SignalError {
    /// Returns `true` if the streaming pipeline can degrade past this
    /// error by skipping the affected stage.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Design { .. } | Self::Unstable { .. } => true,
            Self::InsufficientSamples { .. } => false,
        }
    }
}

/// Errors from loading a persisted ECG record for offline analysis.
///
/// All variants are fatal: the batch job aborts with no partial output.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LoadError {
    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failure
    #[error("Malformed record at row {row}: {message}")]
    Malformed {
        /// 1-based row number of the offending record
        row: usize,
        /// Description of the parse failure
        message: String,
    },

    /// Record holds fewer than two samples
    #[error("Record too short: {count} sample(s), need at least 2")]
    TooFewSamples {
        /// Number of samples found
        count: usize,
    },

    /// Timestamps are not strictly increasing
    #[error("Non-increasing timestamp at row {row}: {current} after {previous}")]
    NonMonotonicTime {
        /// 1-based row number of the offending record
        row: usize,
        /// Timestamp preceding the violation
        previous: f64,
        /// Offending timestamp
        current: f64,
    },

    /// Estimated sampling rate is not a finite positive number
    #[error("Could not estimate sampling rate: {message}")]
    BadSamplingRate {
        /// Description of the failure
        message: String,
    },
}

/// Invalid monitor configuration.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct ConfigError {
    /// Description of the invalid field
    pub message: String,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
