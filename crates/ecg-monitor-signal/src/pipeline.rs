//! Streaming filter cascade.
//!
//! Stage order: mean removal, power-line notch, Butterworth band-pass,
//! sliding-median baseline subtraction. The cascade is stateless
//! across calls: every tick refilters the full window, so there is no
//! delay-line state to keep consistent with the ring buffer.
//!
//! A stage that fails numerically is skipped for that pass: its input
//! flows through unchanged and the skip is reported in the outcome.
//! Display continuity beats filter completeness here, an unfiltered
//! trace is still a trace.

use ecg_monitor_core::{FilterStage, MonitorConfig};
use tracing::warn;

use crate::design::{design_butter_bandpass, design_notch};
use crate::smooth::sliding_median;
use crate::sos::{sosfilt, Sos};

/// Output of one cascade pass.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    /// Filtered signal, same length as the input.
    pub filtered: Vec<f64>,
    /// Stages skipped during this pass, in cascade order.
    pub skipped: Vec<FilterStage>,
}

/// The four-stage streaming filter.
#[derive(Debug, Clone)]
pub struct FilterPipeline {
    notch: Option<Sos>,
    bandpass: Option<Vec<Sos>>,
    baseline_window: usize,
}

impl FilterPipeline {
    /// Builds the cascade for a validated configuration.
    ///
    /// A filter whose design fails is disabled rather than failing the
    /// whole pipeline; the stage then shows up as skipped on every
    /// pass.
    #[must_use]
    pub fn new(config: &MonitorConfig) -> Self {
        let f = &config.filter;
        let notch = match design_notch(f.notch_freq_hz, f.notch_q, config.fs_hz) {
            Ok(sos) => Some(sos),
            Err(e) => {
                warn!(error = %e, "notch design failed, stage disabled");
                None
            }
        };
        let bandpass =
            match design_butter_bandpass(f.band_low_hz, f.band_high_hz, f.band_order, config.fs_hz)
            {
                Ok(sections) => Some(sections),
                Err(e) => {
                    warn!(error = %e, "band-pass design failed, stage disabled");
                    None
                }
            };
        Self {
            notch,
            bandpass,
            baseline_window: config.baseline_window_samples(),
        }
    }

    /// Runs the cascade over one window.
    #[must_use]
    pub fn apply(&self, input: &[f64]) -> FilterOutcome {
        let mut skipped = Vec::new();
        let mut data = input.to_vec();

        // Stage 1: mean removal.
        let mean = data.iter().sum::<f64>() / data.len().max(1) as f64;
        if mean.is_finite() {
            for x in &mut data {
                *x -= mean;
            }
        } else {
            skip(&mut skipped, FilterStage::MeanRemoval);
        }

        // Stage 2: notch.
        match &self.notch {
            Some(sos) => {
                let out = sosfilt(std::slice::from_ref(sos), &data);
                if all_finite(&out) {
                    data = out;
                } else {
                    skip(&mut skipped, FilterStage::Notch);
                }
            }
            None => skip(&mut skipped, FilterStage::Notch),
        }

        // Stage 3: band-pass.
        match &self.bandpass {
            Some(sections) => {
                let out = sosfilt(sections, &data);
                if all_finite(&out) {
                    data = out;
                } else {
                    skip(&mut skipped, FilterStage::BandPass);
                }
            }
            None => skip(&mut skipped, FilterStage::BandPass),
        }

        // Stage 4: baseline subtraction.
        let baseline = sliding_median(&data, self.baseline_window);
        if all_finite(&baseline) {
            for (x, b) in data.iter_mut().zip(&baseline) {
                *x -= b;
            }
        } else {
            skip(&mut skipped, FilterStage::BaselineMedian);
        }

        FilterOutcome {
            filtered: data,
            skipped,
        }
    }
}

fn all_finite(data: &[f64]) -> bool {
    data.iter().all(|x| x.is_finite())
}

fn skip(skipped: &mut Vec<FilterStage>, stage: FilterStage) {
    warn!(stage = stage.name(), "filter stage skipped this pass");
    skipped.push(stage);
}
