//! Second-order sections (biquads) and forward filtering.
//!
//! All filters in the cascade are expressed as SOS chains rather than
//! high-order transfer functions: direct-form coefficients of order 4+
//! lose precision badly at a 2 kHz sampling rate with sub-hertz
//! cutoffs, while biquads stay well conditioned.

/// One second-order section, coefficients normalized so `a0 == 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sos {
    /// Numerator coefficients `[b0, b1, b2]`.
    pub b: [f64; 3],
    /// Denominator coefficients `[a1, a2]` (`a0` implied as 1).
    pub a: [f64; 2],
}

impl Sos {
    /// Builds a section from full numerator/denominator triples,
    /// normalizing by `a0`.
    #[must_use]
    pub fn new(b: [f64; 3], a: [f64; 3]) -> Self {
        let a0 = a[0];
        Self {
            b: [b[0] / a0, b[1] / a0, b[2] / a0],
            a: [a[1] / a0, a[2] / a0],
        }
    }

    /// `true` if every coefficient is a finite number.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.b.iter().chain(self.a.iter()).all(|c| c.is_finite())
    }

    /// Schur-Cohn stability test for a second-order denominator:
    /// both poles strictly inside the unit circle.
    #[must_use]
    pub fn is_stable(&self) -> bool {
        let [a1, a2] = self.a;
        a2.abs() < 1.0 && a1.abs() < 1.0 + a2
    }
}

/// Applies an SOS cascade forward over `input` (Direct Form II
/// transposed, zero initial state). Output length equals input length.
#[must_use]
pub fn sosfilt(sections: &[Sos], input: &[f64]) -> Vec<f64> {
    let mut data = input.to_vec();
    for section in sections {
        let [b0, b1, b2] = section.b;
        let [a1, a2] = section.a;
        let mut z1 = 0.0;
        let mut z2 = 0.0;
        for x in &mut data {
            let y = b0 * *x + z1;
            z1 = b1 * *x - a1 * y + z2;
            z2 = b2 * *x - a2 * y;
            *x = y;
        }
    }
    data
}
