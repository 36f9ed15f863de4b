// Short-time Fourier transform and phase vocoder
// Hann-windowed, centred frames; used for pitch-preserving time stretch

use realfft::num_complex::Complex;
use realfft::{FftError, RealFftPlanner};
use std::f64::consts::PI;
use thiserror::Error;

/// FFT window size in samples
pub const N_FFT: usize = 2048;

/// Hop size in samples (advance between frames)
pub const HOP: usize = 512;

#[derive(Debug, Error)]
pub enum StftError {
    #[error("FFT failed: {0}")]
    Fft(#[from] FftError),

    #[error("Invalid stretch rate: {0}")]
    InvalidRate(f64),
}

type Spectrum = Vec<Complex<f32>>;

/// Periodic Hann window
fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / n as f32).cos())
        .collect()
}

/// Forward STFT with zero padding of `N_FFT / 2` on both sides
fn stft(signal: &[f32], window: &[f32]) -> Result<Vec<Spectrum>, StftError> {
    let pad = N_FFT / 2;
    let mut padded = vec![0.0f32; signal.len() + 2 * pad];
    padded[pad..pad + signal.len()].copy_from_slice(signal);

    let num_frames = 1 + (padded.len() - N_FFT) / HOP;

    let mut planner = RealFftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(N_FFT);

    let mut frames = Vec::with_capacity(num_frames);
    let mut buffer = fft.make_input_vec();
    for frame_idx in 0..num_frames {
        let start = frame_idx * HOP;
        for (i, slot) in buffer.iter_mut().enumerate() {
            *slot = padded[start + i] * window[i];
        }
        let mut spectrum = fft.make_output_vec();
        fft.process(&mut buffer, &mut spectrum)?;
        frames.push(spectrum);
    }

    Ok(frames)
}

/// Inverse STFT by windowed overlap-add, trimmed/padded to `length`
fn istft(frames: &[Spectrum], window: &[f32], length: usize) -> Result<Vec<f32>, StftError> {
    if frames.is_empty() {
        return Ok(vec![0.0; length]);
    }

    let mut planner = RealFftPlanner::<f32>::new();
    let ifft = planner.plan_fft_inverse(N_FFT);

    let total = N_FFT + HOP * (frames.len() - 1);
    let mut output = vec![0.0f32; total];
    let mut window_sum = vec![0.0f32; total];

    let mut scratch = ifft.make_input_vec();
    let mut time = ifft.make_output_vec();
    let last = scratch.len() - 1;
    let scale = 1.0 / N_FFT as f32;

    for (frame_idx, frame) in frames.iter().enumerate() {
        scratch.copy_from_slice(frame);
        // DC and Nyquist bins of a real signal carry no imaginary part
        scratch[0].im = 0.0;
        scratch[last].im = 0.0;
        ifft.process(&mut scratch, &mut time)?;

        let start = frame_idx * HOP;
        for i in 0..N_FFT {
            output[start + i] += time[i] * scale * window[i];
            window_sum[start + i] += window[i] * window[i];
        }
    }

    for (sample, &norm) in output.iter_mut().zip(window_sum.iter()) {
        if norm > 1e-8 {
            *sample /= norm;
        }
    }

    let pad = N_FFT / 2;
    let mut trimmed: Vec<f32> = output.into_iter().skip(pad).take(length).collect();
    trimmed.resize(length, 0.0);
    Ok(trimmed)
}

/// Resynthesize frames at `rate` times the original frame speed
fn phase_vocoder(frames: &[Spectrum], rate: f64) -> Vec<Spectrum> {
    let num_frames = frames.len();
    let num_bins = frames[0].len();
    let zero = vec![Complex::new(0.0f32, 0.0); num_bins];

    let phi_advance: Vec<f64> = (0..num_bins)
        .map(|k| HOP as f64 * PI * k as f64 / (num_bins - 1) as f64)
        .collect();
    let mut phase_acc: Vec<f64> = frames[0].iter().map(|c| c.arg() as f64).collect();

    let num_steps = (num_frames as f64 / rate).ceil() as usize;
    let mut stretched = Vec::with_capacity(num_steps);

    for step_idx in 0..num_steps {
        let step = step_idx as f64 * rate;
        let base = step.floor() as usize;
        if base >= num_frames {
            break;
        }
        let alpha = (step - base as f64) as f32;
        let current = &frames[base];
        let next = frames.get(base + 1).unwrap_or(&zero);

        let mut out = Vec::with_capacity(num_bins);
        for k in 0..num_bins {
            let magnitude = (1.0 - alpha) * current[k].norm() + alpha * next[k].norm();
            out.push(Complex::from_polar(magnitude, phase_acc[k] as f32));

            let mut dphase = next[k].arg() as f64 - current[k].arg() as f64 - phi_advance[k];
            dphase -= 2.0 * PI * (dphase / (2.0 * PI)).round();
            phase_acc[k] = (phase_acc[k] + phi_advance[k] + dphase).rem_euclid(2.0 * PI);
        }
        stretched.push(out);
    }

    stretched
}

/// Change duration by `1 / rate` without changing pitch
///
/// Output length is `round(len / rate)`.
pub fn phase_vocoder_stretch(signal: &[f32], rate: f64) -> Result<Vec<f32>, StftError> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(StftError::InvalidRate(rate));
    }
    if signal.is_empty() {
        return Ok(Vec::new());
    }

    let window = hann_window(N_FFT);
    let frames = stft(signal, &window)?;
    let stretched = phase_vocoder(&frames, rate);
    let length = (signal.len() as f64 / rate).round() as usize;

    istft(&stretched, &window, length)
}
