use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{Receiver, channel};
use std::thread::JoinHandle;

use crate::audio::mix::write_pcm_to_f32le_file;
use crate::capture::recorder::{MediaRecorder, RecordingProfile, StreamConfig};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::frame::FrameRGBA;

const STDOUT_CHUNK: usize = 64 * 1024;
const AUDIO_BITRATE: &str = "128k";

/// Return `true` when an `ffmpeg` binary can be executed.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn video_codec(profile: RecordingProfile) -> &'static str {
    match profile {
        RecordingProfile::Vp9Webm => "libvpx-vp9",
        RecordingProfile::Webm => "libvpx",
    }
}

struct Session {
    config: StreamConfig,
    child: Child,
    stdin: Option<ChildStdin>,
    chunks: Receiver<Vec<u8>>,
    reader: Option<JoinHandle<()>>,
    video: Vec<u8>,
    audio: Vec<f32>,
    scratch: Vec<u8>,
    frames: u64,
}

/// Recorder encoding WebM with the system `ffmpeg` binary.
///
/// Video is piped as raw RGBA into an encoder whose WebM output is read back on a helper thread.
/// Audio is buffered and muxed into the video with a second `ffmpeg` pass when the recording
/// stops, so the whole file is delivered by [`MediaRecorder::stop`].
pub struct FfmpegRecorder {
    encoders: Option<String>,
    session: Option<Session>,
    work_dir: PathBuf,
}

impl std::fmt::Debug for FfmpegRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegRecorder")
            .field("recording", &self.session.is_some())
            .field("work_dir", &self.work_dir)
            .finish()
    }
}

impl Default for FfmpegRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRecorder {
    /// Recorder using the system temp directory for intermediate files.
    pub fn new() -> Self {
        Self::with_work_dir(std::env::temp_dir().join(format!("reelcast-{}", std::process::id())))
    }

    /// Recorder keeping intermediate files under `work_dir`.
    pub fn with_work_dir(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            encoders: None,
            session: None,
            work_dir: work_dir.into(),
        }
    }

    fn encoder_listing(&mut self) -> &str {
        self.encoders.get_or_insert_with(|| {
            Command::new("ffmpeg")
                .args(["-hide_banner", "-encoders"])
                .stderr(Stdio::null())
                .output()
                .map(|o| String::from_utf8_lossy(&o.stdout).into_owned())
                .unwrap_or_default()
        })
    }

    fn has_encoder(&mut self, name: &str) -> bool {
        self.encoder_listing()
            .lines()
            .any(|l| l.split_whitespace().nth(1) == Some(name))
    }

    fn mux_audio(&mut self, video: &[u8], audio: &[f32], sample_rate: u32) -> ReelResult<Vec<u8>> {
        std::fs::create_dir_all(&self.work_dir).map_err(|e| {
            ReelError::recorder(format!(
                "failed to create work dir '{}': {e}",
                self.work_dir.display()
            ))
        })?;
        let video_path = self.work_dir.join("video.webm");
        let audio_path = self.work_dir.join("audio.f32le");
        std::fs::write(&video_path, video)
            .map_err(|e| ReelError::recorder(format!("failed to stage video: {e}")))?;
        write_pcm_to_f32le_file(audio, &audio_path)?;

        let result = run_mux(&video_path, &audio_path, sample_rate);
        let _ = std::fs::remove_file(&video_path);
        let _ = std::fs::remove_file(&audio_path);
        result
    }
}

fn run_mux(video_path: &Path, audio_path: &Path, sample_rate: u32) -> ReelResult<Vec<u8>> {
    let out = Command::new("ffmpeg")
        .args(["-loglevel", "error", "-i"])
        .arg(video_path)
        .args([
            "-f",
            "f32le",
            "-ar",
            &sample_rate.to_string(),
            "-ac",
            "2",
            "-i",
        ])
        .arg(audio_path)
        .args([
            "-map",
            "0:v:0",
            "-map",
            "1:a:0",
            "-c:v",
            "copy",
            "-c:a",
            "libopus",
            "-b:a",
            AUDIO_BITRATE,
            "-shortest",
            "-f",
            "webm",
            "pipe:1",
        ])
        .output()
        .map_err(|e| ReelError::recorder(format!("failed to run ffmpeg mux: {e}")))?;
    if !out.status.success() {
        return Err(ReelError::recorder(format!(
            "ffmpeg mux exited with status {}: {}",
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    Ok(out.stdout)
}

impl MediaRecorder for FfmpegRecorder {
    fn is_profile_supported(&mut self, profile: RecordingProfile) -> bool {
        self.has_encoder(video_codec(profile))
    }

    fn start(&mut self, config: &StreamConfig) -> ReelResult<()> {
        if self.session.is_some() {
            return Err(ReelError::recorder("recording already in progress"));
        }
        let (w, h) = (config.canvas.width, config.canvas.height);
        if !w.is_multiple_of(2) || !h.is_multiple_of(2) {
            return Err(ReelError::validation(
                "recording width/height must be even (required for yuv420p output)",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .args([
                "-loglevel",
                "error",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "-s",
                &format!("{w}x{h}"),
                "-r",
                &format!("{}/{}", config.fps.num, config.fps.den),
                "-i",
                "pipe:0",
                "-an",
                "-c:v",
                video_codec(config.profile),
                "-b:v",
                &config.video_bitrate.to_string(),
                "-deadline",
                "realtime",
                "-cpu-used",
                "8",
                "-pix_fmt",
                "yuv420p",
                "-f",
                "webm",
                "pipe:1",
            ]);

        let mut child = cmd.spawn().map_err(|e| {
            ReelError::recorder(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReelError::recorder("failed to open ffmpeg stdin"))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelError::recorder("failed to open ffmpeg stdout"))?;

        let (tx, rx) = channel();
        let reader = std::thread::spawn(move || {
            let mut buf = vec![0u8; STDOUT_CHUNK];
            loop {
                match stdout.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        tracing::info!(
            mime = config.profile.mime_type(),
            width = w,
            height = h,
            bitrate = config.video_bitrate,
            "ffmpeg recorder started"
        );
        self.session = Some(Session {
            config: *config,
            child,
            stdin: Some(stdin),
            chunks: rx,
            reader: Some(reader),
            video: Vec::new(),
            audio: Vec::new(),
            scratch: vec![0u8; config.canvas.rgba_len()],
            frames: 0,
        });
        Ok(())
    }

    fn push_video_frame(&mut self, frame: &FrameRGBA) -> ReelResult<()> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| ReelError::recorder("no recording in progress"))?;
        if frame.width != session.config.canvas.width
            || frame.height != session.config.canvas.height
        {
            return Err(ReelError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width,
                frame.height,
                session.config.canvas.width,
                session.config.canvas.height
            )));
        }
        flatten_to_opaque_rgba8(&mut session.scratch, &frame.data, frame.premultiplied)?;
        let stdin = session
            .stdin
            .as_mut()
            .ok_or_else(|| ReelError::recorder("ffmpeg recorder is already finalized"))?;
        stdin.write_all(&session.scratch).map_err(|e| {
            ReelError::recorder(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        session.frames += 1;
        Ok(())
    }

    fn push_audio(&mut self, interleaved: &[f32]) -> ReelResult<()> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| ReelError::recorder("no recording in progress"))?;
        session.audio.extend_from_slice(interleaved);
        Ok(())
    }

    fn take_chunks(&mut self) -> Vec<Vec<u8>> {
        // Encoded video stays here until the audio pass at stop.
        if let Some(session) = self.session.as_mut() {
            for chunk in session.chunks.try_iter() {
                session.video.extend_from_slice(&chunk);
            }
        }
        Vec::new()
    }

    fn stop(&mut self) -> ReelResult<Vec<Vec<u8>>> {
        let mut session = self
            .session
            .take()
            .ok_or_else(|| ReelError::recorder("no recording in progress"))?;
        drop(session.stdin.take());
        if let Some(reader) = session.reader.take() {
            let _ = reader.join();
        }
        for chunk in session.chunks.try_iter() {
            session.video.extend_from_slice(&chunk);
        }
        let video = std::mem::take(&mut session.video);

        let output = session.child.wait_with_output().map_err(|e| {
            ReelError::recorder(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        if !output.status.success() {
            return Err(ReelError::recorder(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        tracing::info!(frames = session.frames, "ffmpeg recorder finished video pass");

        if session.audio.is_empty() {
            return Ok(vec![video]);
        }
        if !self.has_encoder("libopus") {
            tracing::warn!("libopus encoder unavailable, recording has no audio track");
            return Ok(vec![video]);
        }
        let muxed = self.mux_audio(&video, &session.audio, session.config.sample_rate)?;
        Ok(vec![muxed])
    }

    fn abort(&mut self) {
        if let Some(mut session) = self.session.take() {
            drop(session.stdin.take());
            let _ = session.child.kill();
            let _ = session.child.wait();
            if let Some(reader) = session.reader.take() {
                let _ = reader.join();
            }
            tracing::debug!("ffmpeg recorder aborted");
        }
    }
}

/// Composite premultiplied (or straight) RGBA over opaque black.
fn flatten_to_opaque_rgba8(dst: &mut [u8], src: &[u8], src_is_premul: bool) -> ReelResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ReelError::validation(
            "flatten_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if src_is_premul || a == 255 {
            d[..3].copy_from_slice(&s[..3]);
        } else {
            for i in 0..3 {
                d[i] = mul_div255_u16(u16::from(s[i]), a).min(255) as u8;
            }
        }
        d[3] = 255;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/capture/ffmpeg.rs"]
mod tests;
