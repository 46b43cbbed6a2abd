//! # ECG Monitor Signal
//!
//! Digital signal processing for the ECG heart-rate monitor:
//!
//! - **Second-order sections**: [`Sos`] biquads and forward filtering
//!   via [`sosfilt`].
//! - **Filter design**: [`design_notch`] and [`design_butter_bandpass`]
//!   produce validated SOS cascades.
//! - **Smoothing**: moving average, sliding median, and order
//!   statistics in [`smooth`].
//! - **The streaming cascade**: [`FilterPipeline`] with per-stage
//!   skip-on-failure.
//! - **Peak detection**: the adaptive streaming detector
//!   [`detect_peaks`] and the offline [`find_peaks_global`].
//!
//! All code here is synchronous and allocation-light; the async world
//! lives in the server crate.

#![forbid(unsafe_code)]

pub mod design;
pub mod peaks;
pub mod pipeline;
pub mod smooth;
pub mod sos;

pub use design::{cascade_gain, design_butter_bandpass, design_notch};
pub use peaks::{detect_peaks, find_peaks_global, PeakDetection};
pub use pipeline::{FilterOutcome, FilterPipeline};
pub use smooth::{median, moving_average, percentile, sliding_median};
pub use sos::{sosfilt, Sos};
