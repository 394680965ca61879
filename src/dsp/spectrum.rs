use num_complex::{Complex32, Complex64};
use rustfft::FftPlanner;

/// Linear power floor; anything quieter reads as -300 dB instead of -inf.
pub const POWER_FLOOR: f64 = 1e-30;

/// `10*log10(power)`, clamped at [`POWER_FLOOR`].
pub fn power_to_db(power: f64) -> f64 {
    10.0 * power.max(POWER_FLOOR).log10()
}

/// Forward FFT of `samples`, rotated so DC sits in the middle.
pub fn shifted_fft(samples: &[Complex32]) -> Vec<Complex64> {
    if samples.is_empty() {
        return Vec::new();
    }

    let mut buffer: Vec<Complex64> = samples
        .iter()
        .map(|s| Complex64::new(s.re as f64, s.im as f64))
        .collect();

    let fft = FftPlanner::<f64>::new().plan_fft_forward(buffer.len());
    fft.process(&mut buffer);

    let half = buffer.len() / 2;
    buffer.rotate_right(half);
    buffer
}

/// Shifted power spectrum, `10*log10(|X|^2)` per bin.
pub fn power_spectrum_db(samples: &[Complex32]) -> Vec<f64> {
    shifted_fft(samples)
        .iter()
        .map(|x| power_to_db(x.norm_sqr()))
        .collect()
}

/// Centre frequency offset of each shifted bin, in Hz relative to DC.
pub fn bin_frequencies(len: usize, sample_rate: f64) -> Vec<f64> {
    let half = (len / 2) as f64;
    let bin_width = sample_rate / len as f64;
    (0..len).map(|i| (i as f64 - half) * bin_width).collect()
}
