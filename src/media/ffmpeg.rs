use std::{
    collections::{HashMap, VecDeque},
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::audio::mix::mix_pcm_into;
use crate::foundation::error::{ReelError, ReelResult};
use crate::media::source::{AudioPcm, MediaSource, ReadyState, SourceFrame};

#[derive(Clone, Debug, serde::Serialize)]
/// Basic metadata about a source video file.
pub struct VideoSourceInfo {
    /// Source path used for probing/decoding.
    pub source_path: PathBuf,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Container duration in seconds.
    pub duration_secs: f64,
    /// Average frame rate of the first video stream.
    pub fps: f64,
    /// Whether ffprobe detected at least one audio stream.
    pub has_audio: bool,
}

#[cfg(feature = "media-ffmpeg")]
fn parse_rate(s: &str) -> Option<f64> {
    let (num, den) = s.split_once('/')?;
    let num: f64 = num.trim().parse().ok()?;
    let den: f64 = den.trim().parse().ok()?;
    (den > 0.0 && num > 0.0).then_some(num / den)
}

/// Probe source video metadata through `ffprobe`.
#[cfg(feature = "media-ffmpeg")]
pub fn probe_video(source_path: &Path) -> ReelResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        avg_frame_rate: Option<String>,
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| ReelError::media(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ReelError::media(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| ReelError::media(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| ReelError::media("no video stream found"))?;
    let width = video_stream
        .width
        .ok_or_else(|| ReelError::media("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| ReelError::media("missing video height from ffprobe"))?;
    let duration_secs = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or(video_stream.duration.as_deref())
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| ReelError::media("missing or invalid duration from ffprobe"))?;
    let fps = video_stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_rate)
        .unwrap_or(30.0);
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        duration_secs,
        fps,
        has_audio,
    })
}

#[cfg(not(feature = "media-ffmpeg"))]
/// Probe source video metadata through `ffprobe`.
///
/// Returns an error when `media-ffmpeg` feature is disabled.
pub fn probe_video(_source_path: &Path) -> ReelResult<VideoSourceInfo> {
    Err(ReelError::media(
        "video clips require the 'media-ffmpeg' feature",
    ))
}

#[cfg(feature = "media-ffmpeg")]
/// Decode up to `frame_count` sequential RGBA frames from source video.
pub(crate) fn decode_video_frames_rgba8(
    source: &VideoSourceInfo,
    start_time_sec: f64,
    frame_count: u32,
) -> ReelResult<Vec<Vec<u8>>> {
    if frame_count == 0 {
        return Ok(Vec::new());
    }

    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-ss", &format!("{start_time_sec:.9}")])
        .arg("-i")
        .arg(&source.source_path)
        .args([
            "-frames:v",
            &frame_count.to_string(),
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "pipe:1",
        ])
        .output()
        .map_err(|e| ReelError::media(format!("failed to run ffmpeg for video decode: {e}")))?;

    if !out.status.success() {
        return Err(ReelError::media(format!(
            "ffmpeg video decode batch failed for '{}': {}",
            source.source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let expected_len = source.width as usize * source.height as usize * 4;
    if expected_len == 0 {
        return Err(ReelError::media(
            "decoded video frame size is zero (invalid source dimensions)",
        ));
    }
    if !out.stdout.len().is_multiple_of(expected_len) {
        return Err(ReelError::media(format!(
            "decoded video batch of {} bytes is not a multiple of {expected_len}",
            out.stdout.len()
        )));
    }

    let available = (out.stdout.len() / expected_len).min(frame_count as usize);
    let mut frames = Vec::with_capacity(available);
    for idx in 0..available {
        let off = idx * expected_len;
        frames.push(out.stdout[off..off + expected_len].to_vec());
    }
    Ok(frames)
}

#[cfg(not(feature = "media-ffmpeg"))]
pub(crate) fn decode_video_frames_rgba8(
    _source: &VideoSourceInfo,
    _start_time_sec: f64,
    _frame_count: u32,
) -> ReelResult<Vec<Vec<u8>>> {
    Err(ReelError::media(
        "video clips require the 'media-ffmpeg' feature",
    ))
}

#[cfg(feature = "media-ffmpeg")]
/// Decode audio from a media file to stereo interleaved `f32` PCM.
pub fn decode_audio_f32_stereo(path: &Path, sample_rate: u32) -> ReelResult<AudioPcm> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| ReelError::media(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        let msg = String::from_utf8_lossy(&out.stderr);
        // A missing audio stream is reported as an error; treat it as silence.
        if msg.contains("Stream specifier")
            || msg.contains("matches no streams")
            || msg.contains("Output file #0 does not contain any stream")
        {
            return Ok(AudioPcm {
                sample_rate,
                channels: 2,
                interleaved_f32: Arc::new(Vec::new()),
            });
        }
        return Err(ReelError::media(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            msg.trim()
        )));
    }

    if !out.stdout.len().is_multiple_of(4) {
        return Err(ReelError::media(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    let mut pcm = Vec::<f32>::with_capacity(out.stdout.len() / 4);
    for chunk in out.stdout.chunks_exact(4) {
        pcm.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }

    Ok(AudioPcm {
        sample_rate,
        channels: 2,
        interleaved_f32: Arc::new(pcm),
    })
}

#[cfg(not(feature = "media-ffmpeg"))]
/// Decode audio from a media file to stereo interleaved `f32` PCM.
///
/// Returns an error when `media-ffmpeg` feature is disabled.
pub fn decode_audio_f32_stereo(_path: &Path, _sample_rate: u32) -> ReelResult<AudioPcm> {
    Err(ReelError::media(
        "audio decoding requires the 'media-ffmpeg' feature",
    ))
}

/// Video file source decoded on demand through `ffmpeg`.
///
/// Frames are decoded in prefetch batches and kept in a small LRU keyed by millisecond position.
/// Audio is decoded once when the source is opened.
pub struct FfmpegVideoSource {
    info: Arc<VideoSourceInfo>,
    audio: AudioPcm,
    frame_cache: HashMap<u64, SourceFrame>,
    lru: VecDeque<u64>,
    capacity: usize,
    prefetch_frames: u32,
    position: f64,
    playing: bool,
    failed: bool,
}

impl FfmpegVideoSource {
    /// Probe and open `path`, decoding its audio track up front.
    pub fn open(path: &Path, sample_rate: u32) -> ReelResult<Self> {
        let info = probe_video(path)?;
        let audio = if info.has_audio {
            decode_audio_f32_stereo(path, sample_rate)?
        } else {
            AudioPcm::silent()
        };
        let capacity = std::env::var("REELCAST_VIDEO_CACHE_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(64);
        let prefetch_frames = std::env::var("REELCAST_VIDEO_PREFETCH_FRAMES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(12);
        tracing::debug!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            duration = info.duration_secs,
            "opened video source"
        );
        Ok(Self {
            info: Arc::new(info),
            audio,
            frame_cache: HashMap::new(),
            lru: VecDeque::new(),
            capacity,
            prefetch_frames,
            position: 0.0,
            playing: false,
            failed: false,
        })
    }

    /// Probed metadata.
    pub fn info(&self) -> &VideoSourceInfo {
        &self.info
    }

    fn step_ms(&self) -> f64 {
        if self.info.fps.is_finite() && self.info.fps > 0.0 {
            1000.0 / self.info.fps
        } else {
            1000.0 / 30.0
        }
    }

    fn key_for_time(&self, t: f64) -> u64 {
        let step = self.step_ms();
        let ms = t.max(0.0) * 1000.0;
        ((ms / step).floor() * step).round() as u64
    }

    fn decode_at(&mut self, t: f64) -> ReelResult<SourceFrame> {
        let key = self.key_for_time(t);
        if let Some(frame) = self.frame_cache.get(&key).cloned() {
            self.touch(key);
            return Ok(frame);
        }

        let frames =
            decode_video_frames_rgba8(&self.info, (key as f64) / 1000.0, self.prefetch_frames)?;
        if frames.is_empty() {
            return Err(ReelError::media(format!(
                "ffmpeg returned no video frames for '{}'",
                self.info.source_path.display()
            )));
        }
        let step = self.step_ms();
        for (offset, rgba) in frames.into_iter().enumerate() {
            let k = ((key as f64) + (offset as f64) * step).round() as u64;
            let frame = SourceFrame {
                width: self.info.width,
                height: self.info.height,
                rgba8_premul: Arc::new(rgba),
            };
            self.insert_frame(k, frame);
        }
        self.frame_cache
            .get(&key)
            .cloned()
            .ok_or_else(|| ReelError::media("decoded batch did not contain requested frame"))
    }

    fn insert_frame(&mut self, key: u64, frame: SourceFrame) {
        self.frame_cache.insert(key, frame);
        self.touch(key);
        while self.lru.len() > self.capacity {
            if let Some(old) = self.lru.pop_front() {
                self.frame_cache.remove(&old);
            }
        }
    }

    fn touch(&mut self, key: u64) {
        if let Some(pos) = self.lru.iter().position(|x| *x == key) {
            self.lru.remove(pos);
        }
        self.lru.push_back(key);
    }
}

impl MediaSource for FfmpegVideoSource {
    fn duration(&self) -> f64 {
        self.info.duration_secs
    }

    fn current_time(&self) -> f64 {
        self.position
    }

    fn ready_state(&self) -> ReadyState {
        if self.failed {
            ReadyState::HaveMetadata
        } else {
            ReadyState::HaveEnoughData
        }
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.info.width, self.info.height)
    }

    fn is_paused(&self) -> bool {
        !self.playing
    }

    fn play(&mut self) -> ReelResult<()> {
        if self.ended() {
            self.position = 0.0;
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn seek(&mut self, secs: f64) {
        self.position = secs.clamp(0.0, self.info.duration_secs);
    }

    fn advance(&mut self, dt_secs: f64) {
        if self.playing && !self.failed {
            self.position = (self.position + dt_secs.max(0.0)).min(self.info.duration_secs);
            if self.position >= self.info.duration_secs {
                self.playing = false;
            }
        }
    }

    fn current_frame(&mut self) -> ReelResult<Option<SourceFrame>> {
        // The last frame of a file can sit slightly before the container duration.
        let t = self
            .position
            .min((self.info.duration_secs - self.step_ms() / 1000.0).max(0.0));
        match self.decode_at(t) {
            Ok(frame) => {
                self.failed = false;
                Ok(Some(frame))
            }
            Err(err) => {
                self.failed = true;
                Err(err)
            }
        }
    }

    fn mix_audio_into(&mut self, start_secs: f64, out: &mut [f32], gain: f32) {
        mix_pcm_into(out, &self.audio, start_secs, gain);
    }

    fn release(&mut self) {
        self.playing = false;
        self.frame_cache.clear();
        self.lru.clear();
        self.audio = AudioPcm::silent();
    }
}

// Decode paths shell out to `ffprobe`/`ffmpeg`; they are covered by `tests/ffmpeg_pipeline.rs`.
#[cfg(all(test, feature = "media-ffmpeg"))]
#[path = "../../tests/unit/media/ffmpeg.rs"]
mod tests;
