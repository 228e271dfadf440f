use super::*;
use std::sync::Arc;

fn constant_pcm(value: f32, secs: f64, channels: u16) -> AudioPcm {
    let frames = (secs * f64::from(MIX_SAMPLE_RATE)) as usize;
    AudioPcm {
        sample_rate: MIX_SAMPLE_RATE,
        channels,
        interleaved_f32: Arc::new(vec![value; frames * usize::from(channels)]),
    }
}

#[test]
fn mono_is_duplicated_and_gain_applied() {
    let pcm = constant_pcm(0.5, 1.0, 1);
    let mut out = vec![0.0f32; 16];
    mix_pcm_into(&mut out, &pcm, 0.0, 0.5);
    assert!(out.iter().all(|s| (*s - 0.25).abs() < 1e-6));
}

#[test]
fn mixing_stops_at_end_of_source() {
    let pcm = constant_pcm(1.0, 0.001, 2);
    let mut out = vec![0.0f32; 2 * 480];
    mix_pcm_into(&mut out, &pcm, 0.0, 1.0);
    assert!(out[0] > 0.9);
    assert_eq!(out[out.len() - 1], 0.0);
}

#[test]
fn mixing_is_additive_and_clamps() {
    let pcm = constant_pcm(0.8, 1.0, 2);
    let mut out = vec![0.0f32; 8];
    mix_pcm_into(&mut out, &pcm, 0.0, 1.0);
    mix_pcm_into(&mut out, &pcm, 0.0, 1.0);
    assert!((out[0] - 1.6).abs() < 1e-6);
    clamp_in_place(&mut out);
    assert_eq!(out[0], 1.0);
}

#[test]
fn frame_budget_carries_fractions() {
    let mut budget = FrameBudget::default();
    let total: usize = (0..30).map(|_| budget.take(1.0 / 30.0)).sum();
    assert!((47_999..=48_000).contains(&total));
    budget.reset();
    assert_eq!(budget.take(0.0), 0);
}
