use std::path::Path;

use crate::foundation::error::{ReelError, ReelResult};
use crate::media::source::{AudioPcm, MIX_SAMPLE_RATE};

/// Mix `pcm` into interleaved stereo `out` (at [`MIX_SAMPLE_RATE`]) starting at source time
/// `start_secs`, scaled by `gain`.
///
/// Source audio is linearly resampled; mono sources are duplicated to both channels. Mixing stops
/// silently at the end of the source.
pub(crate) fn mix_pcm_into(out: &mut [f32], pcm: &AudioPcm, start_secs: f64, gain: f32) {
    if gain == 0.0 || pcm.channels == 0 || pcm.sample_rate == 0 {
        return;
    }
    let src = pcm.interleaved_f32.as_slice();
    let src_channels = usize::from(pcm.channels);
    let src_frames = src.len() / src_channels;
    if src_frames == 0 {
        return;
    }

    let dst_frames = out.len() / 2;
    for dst_frame in 0..dst_frames {
        let rel_sec = (dst_frame as f64) / f64::from(MIX_SAMPLE_RATE);
        let src_pos = (start_secs + rel_sec) * f64::from(pcm.sample_rate);
        if !src_pos.is_finite() || src_pos < 0.0 {
            continue;
        }
        let src_frame0 = src_pos.floor() as usize;
        if src_frame0 >= src_frames {
            break;
        }
        let src_frame1 = (src_frame0 + 1).min(src_frames.saturating_sub(1));
        let frac = (src_pos - src_frame0 as f64) as f32;

        let (l, r) = if src_channels == 1 {
            let v0 = src[src_frame0];
            let v1 = src[src_frame1];
            let v = v0 + ((v1 - v0) * frac);
            (v, v)
        } else {
            let i0 = src_frame0 * src_channels;
            let i1 = src_frame1 * src_channels;
            let l0 = src[i0];
            let l1 = src[i1];
            let r0 = src[i0 + 1];
            let r1 = src[i1 + 1];
            (l0 + ((l1 - l0) * frac), r0 + ((r1 - r0) * frac))
        };

        out[dst_frame * 2] += l * gain;
        out[dst_frame * 2 + 1] += r * gain;
    }
}

/// Clamp mixed samples into `[-1, 1]`.
pub(crate) fn clamp_in_place(samples: &mut [f32]) {
    for s in samples {
        *s = s.clamp(-1.0, 1.0);
    }
}

/// Write interleaved `f32` PCM samples to raw little-endian `.f32le` file.
pub(crate) fn write_pcm_to_f32le_file(
    samples_interleaved: &[f32],
    out_path: &Path,
) -> ReelResult<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ReelError::recorder(format!(
                "failed to create audio output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    let mut bytes = Vec::<u8>::with_capacity(samples_interleaved.len() * 4);
    for &sample in samples_interleaved {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        ReelError::recorder(format!(
            "failed to write audio file '{}': {e}",
            out_path.display()
        ))
    })
}

/// Number of stereo frames covering `dt_secs` at the mix rate, carrying the fractional part.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct FrameBudget {
    carry: f64,
}

impl FrameBudget {
    pub(crate) fn take(&mut self, dt_secs: f64) -> usize {
        let exact = dt_secs.max(0.0) * f64::from(MIX_SAMPLE_RATE) + self.carry;
        let whole = exact.floor();
        self.carry = exact - whole;
        whole as usize
    }

    pub(crate) fn reset(&mut self) {
        self.carry = 0.0;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
