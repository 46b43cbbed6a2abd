//! Filter design: power-line notch and Butterworth band-pass.
//!
//! Both designs return SOS cascades ready for [`crate::sos::sosfilt`].
//! The band-pass follows the classical path: analog Butterworth
//! prototype, frequency prewarp, low-pass to band-pass transform,
//! bilinear transform, then gain normalization at the geometric center
//! frequency. Every design is checked for finiteness and stability
//! before it is handed out.

use std::f64::consts::PI;

use ecg_monitor_core::SignalError;
use num_complex::Complex64;

use crate::sos::Sos;

/// Designs a second-order IIR notch at `freq_hz` with quality factor
/// `q` for sampling rate `fs_hz`.
pub fn design_notch(freq_hz: f64, q: f64, fs_hz: f64) -> Result<Sos, SignalError> {
    if !(freq_hz.is_finite() && q.is_finite() && fs_hz.is_finite())
        || freq_hz <= 0.0
        || q <= 0.0
        || freq_hz >= fs_hz / 2.0
    {
        return Err(SignalError::Design {
            message: format!("invalid notch parameters: f0={freq_hz} Hz, Q={q}, fs={fs_hz} Hz"),
        });
    }

    let w0 = 2.0 * freq_hz / fs_hz;
    let bw = w0 / q * PI;
    let w0 = w0 * PI;
    let beta = (bw / 2.0).tan();
    let gain = 1.0 / (1.0 + beta);
    let cos_w0 = w0.cos();

    let sos = Sos::new(
        [gain, -2.0 * cos_w0 * gain, gain],
        [1.0, -2.0 * gain * cos_w0, 2.0 * gain - 1.0],
    );
    check_section(&sos, "notch")?;
    Ok(sos)
}

/// Designs a Butterworth band-pass as an SOS cascade.
///
/// `order` is the low-pass prototype order; the resulting band-pass
/// has `2 * order` poles, i.e. `order` sections. Must be even (odd
/// prototype orders leave a real pole the section pairing cannot
/// absorb).
pub fn design_butter_bandpass(
    low_hz: f64,
    high_hz: f64,
    order: usize,
    fs_hz: f64,
) -> Result<Vec<Sos>, SignalError> {
    let nyquist = fs_hz / 2.0;
    if !(low_hz.is_finite() && high_hz.is_finite() && fs_hz.is_finite())
        || low_hz <= 0.0
        || low_hz >= high_hz
        || high_hz >= nyquist
    {
        return Err(SignalError::Design {
            message: format!("invalid band-pass cutoffs: {low_hz}..{high_hz} Hz at fs={fs_hz} Hz"),
        });
    }
    if order == 0 || order % 2 != 0 {
        return Err(SignalError::Design {
            message: format!("band-pass prototype order must be even and positive, got {order}"),
        });
    }

    // Prewarp cutoffs onto the analog axis for the bilinear transform
    // (internal rate normalized to fs = 2, so the warp constant is 4).
    let warped_low = 4.0 * (PI * low_hz / fs_hz).tan();
    let warped_high = 4.0 * (PI * high_hz / fs_hz).tan();
    let bw = warped_high - warped_low;
    let w0 = (warped_low * warped_high).sqrt();

    // Analog Butterworth prototype poles, upper half-plane only; the
    // lower half is recovered by conjugation when sections are formed.
    let n = order as i32;
    let mut sections = Vec::with_capacity(order);
    for k in 0..n {
        let theta = PI * f64::from(2 * k + n + 1) / f64::from(2 * n);
        let proto = Complex64::new(theta.cos(), theta.sin());
        if proto.im <= 0.0 {
            continue;
        }

        // Low-pass to band-pass: each prototype pole splits in two.
        let s = proto * (bw / 2.0);
        let disc = (s * s - Complex64::new(w0 * w0, 0.0)).sqrt();
        for analog_pole in [s + disc, s - disc] {
            // Bilinear transform, then pair with the conjugate pole.
            let z = (Complex64::new(4.0, 0.0) + analog_pole)
                / (Complex64::new(4.0, 0.0) - analog_pole);
            let sos = Sos {
                b: [1.0, 0.0, -1.0],
                a: [-2.0 * z.re, z.norm_sqr()],
            };
            check_section(&sos, "band-pass")?;
            sections.push(sos);
        }
    }

    // Normalize to unity gain at the (digital) center frequency.
    let center = 2.0 * (w0 / 4.0).atan();
    let gain = cascade_gain(&sections, center);
    if !gain.is_finite() || gain <= 0.0 {
        return Err(SignalError::Design {
            message: format!("degenerate band-pass gain {gain} at center frequency"),
        });
    }
    for b in &mut sections[0].b {
        *b /= gain;
    }

    Ok(sections)
}

/// Magnitude response of an SOS cascade at digital frequency
/// `omega` (radians per sample).
#[must_use]
pub fn cascade_gain(sections: &[Sos], omega: f64) -> f64 {
    let z1 = Complex64::from_polar(1.0, -omega);
    let z2 = z1 * z1;
    sections
        .iter()
        .map(|s| {
            let num = Complex64::new(s.b[0], 0.0) + s.b[1] * z1 + s.b[2] * z2;
            let den = Complex64::new(1.0, 0.0) + s.a[0] * z1 + s.a[1] * z2;
            (num / den).norm()
        })
        .product()
}

fn check_section(sos: &Sos, label: &str) -> Result<(), SignalError> {
    if !sos.is_finite() {
        return Err(SignalError::Design {
            message: format!("{label} design produced non-finite coefficients"),
        });
    }
    if !sos.is_stable() {
        return Err(SignalError::Unstable {
            message: format!("{label} section has poles on or outside the unit circle"),
        });
    }
    Ok(())
}
