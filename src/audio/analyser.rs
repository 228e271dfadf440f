use rayon::prelude::*;

/// Default analysis window.
pub const DEFAULT_FFT_SIZE: usize = 512;
const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;
const SMOOTHING: f32 = 0.8;

/// Analysis node between the sources and the destinations.
///
/// Keeps the most recent `fft_size` mono samples and derives byte spectra from them the way a
/// browser `AnalyserNode` does: Blackman window, magnitude in decibels mapped onto
/// `[min_db, max_db]`, with exponential smoothing between reads.
#[derive(Clone, Debug)]
pub struct Analyser {
    fft_size: usize,
    ring: Vec<f32>,
    write: usize,
    window: Vec<f32>,
    smoothed: Vec<f32>,
}

impl Default for Analyser {
    fn default() -> Self {
        Self::new(DEFAULT_FFT_SIZE)
    }
}

impl Analyser {
    /// Create an analyser; `fft_size` is rounded up to a power of two, minimum 32.
    pub fn new(fft_size: usize) -> Self {
        let fft_size = fft_size.max(32).next_power_of_two();
        let n = fft_size as f32;
        let window = (0..fft_size)
            .map(|i| {
                let x = std::f32::consts::TAU * i as f32 / n;
                0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos()
            })
            .collect();
        Self {
            fft_size,
            ring: vec![0.0; fft_size],
            write: 0,
            window,
            smoothed: vec![0.0; fft_size / 2],
        }
    }

    /// Window length in samples.
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of frequency bins.
    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Feed interleaved stereo samples, downmixed to mono.
    pub fn push_stereo(&mut self, interleaved: &[f32]) {
        for frame in interleaved.chunks_exact(2) {
            self.ring[self.write] = (frame[0] + frame[1]) * 0.5;
            self.write = (self.write + 1) % self.fft_size;
        }
    }

    /// Forget buffered audio and smoothing history.
    pub fn clear(&mut self) {
        self.ring.fill(0.0);
        self.smoothed.fill(0.0);
        self.write = 0;
    }

    fn ordered(&self) -> impl Iterator<Item = f32> + '_ {
        self.ring[self.write..]
            .iter()
            .chain(self.ring[..self.write].iter())
            .copied()
    }

    /// Waveform as bytes centered on 128.
    pub fn byte_time_domain_data(&self) -> Vec<u8> {
        self.ordered()
            .map(|s| (128.0 * (1.0 + s)).clamp(0.0, 255.0) as u8)
            .collect()
    }

    /// Smoothed spectrum as bytes, `frequency_bin_count` entries.
    pub fn byte_frequency_data(&mut self) -> Vec<u8> {
        let samples: Vec<f32> = self
            .ordered()
            .zip(self.window.iter())
            .map(|(s, w)| s * w)
            .collect();
        let n = self.fft_size;

        let magnitudes: Vec<f32> = (0..n / 2)
            .into_par_iter()
            .map(|k| {
                let step = std::f32::consts::TAU * k as f32 / n as f32;
                let (mut re, mut im) = (0.0f32, 0.0f32);
                for (i, s) in samples.iter().enumerate() {
                    let phase = step * i as f32;
                    re += s * phase.cos();
                    im -= s * phase.sin();
                }
                (re * re + im * im).sqrt() / n as f32
            })
            .collect();

        let range = MAX_DECIBELS - MIN_DECIBELS;
        self.smoothed
            .iter_mut()
            .zip(magnitudes)
            .map(|(prev, mag)| {
                *prev = SMOOTHING * *prev + (1.0 - SMOOTHING) * mag;
                let db = if *prev > 0.0 {
                    20.0 * prev.log10()
                } else {
                    MIN_DECIBELS
                };
                (255.0 * (db - MIN_DECIBELS) / range).clamp(0.0, 255.0) as u8
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/analyser.rs"]
mod tests;
