use std::io::Cursor;

use anyhow::Context;

use crate::foundation::error::{ReelError, ReelResult};
use crate::media::source::{MediaSource, SourceFrame};

/// Maximum thumbnail bounds in pixels.
pub const THUMBNAIL_MAX: (u32, u32) = (160, 90);

/// Opaque clip identifier, unique within one registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClipId(pub(crate) u64);

impl std::fmt::Display for ClipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "clip#{}", self.0)
    }
}

/// Position of a clip in the sequence, recomputed from the live registry each frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipRole {
    /// The registry holds exactly one clip.
    Only,
    /// First of several clips.
    First,
    /// Neither first nor last.
    Middle,
    /// Last of several clips.
    Last,
}

impl ClipRole {
    /// Role of `index` in a sequence of `len` clips, `None` when out of range.
    pub fn for_index(index: usize, len: usize) -> Option<Self> {
        if index >= len {
            return None;
        }
        Some(match (index == 0, index + 1 == len) {
            (true, true) => ClipRole::Only,
            (true, false) => ClipRole::First,
            (false, true) => ClipRole::Last,
            (false, false) => ClipRole::Middle,
        })
    }

    /// Return `true` for the clip that opens the sequence.
    pub fn is_first(self) -> bool {
        matches!(self, ClipRole::Only | ClipRole::First)
    }

    /// Return `true` for the clip that closes the sequence.
    pub fn is_last(self) -> bool {
        matches!(self, ClipRole::Only | ClipRole::Last)
    }
}

/// One accepted source clip.
pub struct Clip {
    id: ClipId,
    display_name: String,
    duration_secs: f64,
    thumbnail: Vec<u8>,
    pub(crate) source: Box<dyn MediaSource>,
}

impl Clip {
    /// Identifier of this clip.
    pub fn id(&self) -> ClipId {
        self.id
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Decoded duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// PNG-encoded thumbnail; empty when no frame was available at accept time.
    pub fn thumbnail_png(&self) -> &[u8] {
        &self.thumbnail
    }

    /// Borrow the media handle.
    pub fn source(&self) -> &dyn MediaSource {
        self.source.as_ref()
    }

    /// Mutably borrow the media handle.
    pub fn source_mut(&mut self) -> &mut dyn MediaSource {
        self.source.as_mut()
    }
}

impl std::fmt::Debug for Clip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clip")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("duration_secs", &self.duration_secs)
            .field("thumbnail_len", &self.thumbnail.len())
            .finish()
    }
}

/// Ordered list of source clips.
#[derive(Debug, Default)]
pub struct ClipRegistry {
    clips: Vec<Clip>,
    next_id: u64,
}

impl ClipRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a source, appending it to the end of the sequence.
    pub fn add(
        &mut self,
        display_name: impl Into<String>,
        mut source: Box<dyn MediaSource>,
    ) -> ReelResult<ClipId> {
        let duration_secs = source.duration();
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(ReelError::validation(format!(
                "clip duration must be finite and > 0, got {duration_secs}"
            )));
        }

        let thumbnail = match source.current_frame() {
            Ok(Some(frame)) => encode_thumbnail_png(&frame)?,
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::warn!(error = %err, "no thumbnail frame available");
                Vec::new()
            }
        };

        let id = ClipId(self.next_id);
        self.next_id += 1;
        let display_name = display_name.into();
        tracing::debug!(%id, name = %display_name, duration_secs, "clip accepted");
        self.clips.push(Clip {
            id,
            display_name,
            duration_secs,
            thumbnail,
            source,
        });
        Ok(id)
    }

    /// Remove a clip and release its decoded resources.
    pub fn remove(&mut self, id: ClipId) -> ReelResult<()> {
        let idx = self
            .index_of(id)
            .ok_or_else(|| ReelError::validation(format!("unknown {id}")))?;
        let mut clip = self.clips.remove(idx);
        clip.source.release();
        tracing::debug!(%id, "clip removed");
        Ok(())
    }

    /// Move the clip at `from` to position `to`.
    pub fn move_clip(&mut self, from: usize, to: usize) -> ReelResult<()> {
        if from >= self.clips.len() || to >= self.clips.len() {
            return Err(ReelError::validation(format!(
                "clip move {from} -> {to} out of range for {} clips",
                self.clips.len()
            )));
        }
        let clip = self.clips.remove(from);
        self.clips.insert(to, clip);
        Ok(())
    }

    /// Clip at `index`.
    pub fn get(&self, index: usize) -> Option<&Clip> {
        self.clips.get(index)
    }

    /// Mutable clip at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Clip> {
        self.clips.get_mut(index)
    }

    /// Current position of `id`.
    pub fn index_of(&self, id: ClipId) -> Option<usize> {
        self.clips.iter().position(|c| c.id == id)
    }

    /// Number of clips.
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// Return `true` when no clips are registered.
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Iterate clips in sequence order.
    pub fn iter(&self) -> impl Iterator<Item = &Clip> {
        self.clips.iter()
    }

    /// Clip ids in sequence order.
    pub fn ids(&self) -> Vec<ClipId> {
        self.clips.iter().map(|c| c.id).collect()
    }

    /// Role of the clip at `index` in the current sequence.
    pub fn role_at(&self, index: usize) -> Option<ClipRole> {
        ClipRole::for_index(index, self.clips.len())
    }

    /// Sum of all clip durations.
    pub fn total_duration_secs(&self) -> f64 {
        self.clips.iter().map(|c| c.duration_secs).sum()
    }

    /// Global timeline offset at which the clip at `index` starts.
    pub fn start_offset_secs(&self, index: usize) -> f64 {
        self.clips.iter().take(index).map(|c| c.duration_secs).sum()
    }
}

fn encode_thumbnail_png(frame: &SourceFrame) -> ReelResult<Vec<u8>> {
    let mut straight = frame.rgba8_premul.as_ref().clone();
    for px in straight.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
    let img = image::RgbaImage::from_raw(frame.width, frame.height, straight)
        .ok_or_else(|| ReelError::media("thumbnail frame byte length mismatch"))?;

    let (max_w, max_h) = THUMBNAIL_MAX;
    let fit = (f64::from(max_w) / f64::from(frame.width))
        .min(f64::from(max_h) / f64::from(frame.height))
        .min(1.0);
    let w = ((f64::from(frame.width) * fit).round() as u32).max(1);
    let h = ((f64::from(frame.height) * fit).round() as u32).max(1);
    let thumb = image::imageops::resize(&img, w, h, image::imageops::FilterType::Triangle);

    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(thumb)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .context("encode thumbnail png")?;
    Ok(bytes)
}

#[cfg(test)]
#[path = "../../tests/unit/clips/registry.rs"]
mod tests;
