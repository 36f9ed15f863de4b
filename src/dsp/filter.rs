//! IIR filters
//!
//! Second-order Butterworth low/high-pass sections (bilinear transform,
//! Q = 1/sqrt(2)), a fourth-order Butterworth band-pass, direct-form II
//! transposed filtering and zero-phase forward-backward filtering with
//! odd-extension padding and steady-state initial conditions.

use realfft::num_complex::Complex;
use std::f64::consts::{FRAC_1_SQRT_2, PI};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("Cutoff {0} is outside (0, 1) of Nyquist")]
    InvalidCutoff(f64),

    #[error("Invalid filter coefficients")]
    InvalidCoefficients,

    #[error("Input of {len} samples is too short for padding of {padlen}")]
    InputTooShort { len: usize, padlen: usize },

    #[error("Filter output is not finite")]
    Unstable,
}

/// Transfer function `b(z) / a(z)` with `a[0] == 1`
#[derive(Debug, Clone, PartialEq)]
pub struct Iir {
    b: Vec<f64>,
    a: Vec<f64>,
}

impl Iir {
    /// Build from raw coefficients, normalizing by `a[0]`
    pub fn new(b: &[f64], a: &[f64]) -> Result<Self, FilterError> {
        let a0 = *a.first().ok_or(FilterError::InvalidCoefficients)?;
        if b.is_empty() || a0 == 0.0 || !a0.is_finite() {
            return Err(FilterError::InvalidCoefficients);
        }

        let len = a.len().max(b.len());
        let mut b_norm = vec![0.0; len];
        let mut a_norm = vec![0.0; len];
        for (dst, &src) in b_norm.iter_mut().zip(b) {
            *dst = src / a0;
        }
        for (dst, &src) in a_norm.iter_mut().zip(a) {
            *dst = src / a0;
        }

        Ok(Iir {
            b: b_norm,
            a: a_norm,
        })
    }

    /// Second-order Butterworth low-pass
    ///
    /// `cutoff_hz` must lie strictly between 0 and Nyquist.
    pub fn butter_lowpass(cutoff_hz: f64, sample_rate: u32) -> Result<Self, FilterError> {
        let (cos_w, alpha) = section_terms(cutoff_hz, sample_rate)?;
        let b0 = (1.0 - cos_w) / 2.0;
        let b1 = 1.0 - cos_w;
        Iir::new(
            &[b0, b1, b0],
            &[1.0 + alpha, -2.0 * cos_w, 1.0 - alpha],
        )
    }

    /// Second-order Butterworth high-pass
    pub fn butter_highpass(cutoff_hz: f64, sample_rate: u32) -> Result<Self, FilterError> {
        let (cos_w, alpha) = section_terms(cutoff_hz, sample_rate)?;
        let b0 = (1.0 + cos_w) / 2.0;
        let b1 = -(1.0 + cos_w);
        Iir::new(
            &[b0, b1, b0],
            &[1.0 + alpha, -2.0 * cos_w, 1.0 - alpha],
        )
    }

    /// Butterworth band-pass from a second-order low-pass prototype
    ///
    /// The result is fourth order with unity gain at the geometric centre of
    /// the (prewarped) band and -3 dB at both edges.
    pub fn butter_bandpass(low_hz: f64, high_hz: f64, sample_rate: u32) -> Result<Self, FilterError> {
        let low = low_hz / nyquist(sample_rate);
        let high = high_hz / nyquist(sample_rate);
        for edge in [low, high] {
            if !(edge > 0.0 && edge < 1.0) {
                return Err(FilterError::InvalidCutoff(edge));
            }
        }
        if low >= high {
            return Err(FilterError::InvalidCutoff(low));
        }

        // Analog edges prewarped for a bilinear transform at fs = 2
        let fs2 = 4.0;
        let wl = fs2 * (PI * low / 2.0).tan();
        let wh = fs2 * (PI * high / 2.0).tan();
        let bw = wh - wl;
        let w0_sq = wl * wh;

        // Each prototype pole splits into two band-pass poles
        let mut poles = Vec::with_capacity(4);
        for angle in [0.75 * PI, 1.25 * PI] {
            let p = Complex::from_polar(1.0, angle) * (bw / 2.0);
            let root = (p * p - w0_sq).sqrt();
            poles.push(p + root);
            poles.push(p - root);
        }

        // Two analog zeros at s = 0 map to z = 1; the rest land on z = -1
        let mut gain = Complex::new(bw * bw * fs2 * fs2, 0.0);
        let mut denominator = vec![Complex::new(1.0, 0.0)];
        for &pole in &poles {
            gain /= fs2 - pole;
            denominator = mul_root(&denominator, (fs2 + pole) / (fs2 - pole));
        }

        let b: Vec<f64> = [1.0, 0.0, -2.0, 0.0, 1.0].iter().map(|c| c * gain.re).collect();
        let a: Vec<f64> = denominator.iter().map(|c| c.re).collect();
        Iir::new(&b, &a)
    }

    pub fn order(&self) -> usize {
        self.a.len() - 1
    }

    /// Edge padding used by [`filtfilt`]
    pub fn padlen(&self) -> usize {
        3 * self.a.len()
    }

    /// Causal filtering with optional initial state
    pub fn lfilter(&self, input: &[f64], zi: Option<&[f64]>) -> Vec<f64> {
        let n = self.order();
        let mut z = match zi {
            Some(state) if state.len() == n => state.to_vec(),
            _ => vec![0.0; n],
        };

        let mut output = Vec::with_capacity(input.len());
        for &x in input {
            let y = self.b[0] * x + z.first().copied().unwrap_or(0.0);
            for i in 0..n {
                let next = if i + 1 < n { z[i + 1] } else { 0.0 };
                z[i] = self.b[i + 1] * x + next - self.a[i + 1] * y;
            }
            output.push(y);
        }
        output
    }

    /// Filter state for a unit step input at steady state
    pub fn steady_state(&self) -> Vec<f64> {
        let n = self.order();
        let a_sum: f64 = self.a.iter().sum();
        if a_sum.abs() < 1e-12 {
            return vec![0.0; n];
        }
        let gain = self.b.iter().sum::<f64>() / a_sum;

        let mut zi = vec![0.0; n];
        let mut acc = 0.0;
        for k in (1..=n).rev() {
            acc += self.b[k] - self.a[k] * gain;
            zi[k - 1] = acc;
        }
        zi
    }
}

fn nyquist(sample_rate: u32) -> f64 {
    sample_rate as f64 / 2.0
}

/// (cos(w0), alpha) of a Butterworth biquad at `cutoff_hz`
fn section_terms(cutoff_hz: f64, sample_rate: u32) -> Result<(f64, f64), FilterError> {
    let normalized = cutoff_hz / nyquist(sample_rate);
    if !(normalized > 0.0 && normalized < 1.0) {
        return Err(FilterError::InvalidCutoff(normalized));
    }
    let omega = PI * normalized;
    Ok((omega.cos(), omega.sin() / (2.0 * FRAC_1_SQRT_2)))
}

/// Multiply a polynomial in `z^-1` by `(1 - root z^-1)`
fn mul_root(poly: &[Complex<f64>], root: Complex<f64>) -> Vec<Complex<f64>> {
    let mut out = vec![Complex::new(0.0, 0.0); poly.len() + 1];
    for (i, &c) in poly.iter().enumerate() {
        out[i] += c;
        out[i + 1] -= c * root;
    }
    out
}

/// Zero-phase forward-backward filtering
pub fn filtfilt(filter: &Iir, input: &[f32]) -> Result<Vec<f32>, FilterError> {
    let signal: Vec<f64> = input.iter().map(|&s| s as f64).collect();
    let filtered = filtfilt_f64(filter, &signal)?;
    Ok(filtered.into_iter().map(|s| s as f32).collect())
}

fn filtfilt_f64(filter: &Iir, input: &[f64]) -> Result<Vec<f64>, FilterError> {
    let padlen = filter.padlen();
    let len = input.len();
    if len <= padlen {
        return Err(FilterError::InputTooShort { len, padlen });
    }

    // Odd extension on both edges
    let first = input[0];
    let last = input[len - 1];
    let mut extended = Vec::with_capacity(len + 2 * padlen);
    extended.extend((1..=padlen).rev().map(|i| 2.0 * first - input[i]));
    extended.extend_from_slice(input);
    extended.extend((1..=padlen).map(|i| 2.0 * last - input[len - 1 - i]));

    let zi = filter.steady_state();

    let scaled: Vec<f64> = zi.iter().map(|z| z * extended[0]).collect();
    let mut forward = filter.lfilter(&extended, Some(&scaled));

    forward.reverse();
    let scaled: Vec<f64> = zi.iter().map(|z| z * forward[0]).collect();
    let mut backward = filter.lfilter(&forward, Some(&scaled));
    backward.reverse();

    let output = backward[padlen..padlen + len].to_vec();
    if output.iter().any(|s| !s.is_finite()) {
        return Err(FilterError::Unstable);
    }
    Ok(output)
}
