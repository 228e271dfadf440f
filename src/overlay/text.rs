use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::core::Affine;
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::draw::affine_to_cpu;

/// Brush type carried by Parley glyph runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl TextBrushRgba8 {
    pub(crate) fn opaque(rgb: [u8; 3]) -> Self {
        Self {
            r: rgb[0],
            g: rgb[1],
            b: rgb[2],
            a: 255,
        }
    }
}

/// Generic family class a text style asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontClass {
    /// Sans-serif faces.
    SansSerif,
    /// Serif faces.
    Serif,
    /// Script and handwriting faces.
    Cursive,
    /// Fixed-width faces.
    Monospace,
}

/// Font file overrides per family class.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontPaths {
    /// Sans-serif face.
    pub sans_serif: Option<PathBuf>,
    /// Serif face.
    pub serif: Option<PathBuf>,
    /// Cursive face.
    pub cursive: Option<PathBuf>,
    /// Monospace face.
    pub monospace: Option<PathBuf>,
}

impl FontPaths {
    fn get(&self, class: FontClass) -> Option<&Path> {
        match class {
            FontClass::SansSerif => self.sans_serif.as_deref(),
            FontClass::Serif => self.serif.as_deref(),
            FontClass::Cursive => self.cursive.as_deref(),
            FontClass::Monospace => self.monospace.as_deref(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct FontKey {
    pub(crate) class: FontClass,
    pub(crate) weight: u16,
}

/// Raw bytes of a resolved face.
#[derive(Clone, Debug)]
pub(crate) struct ResolvedFont {
    pub(crate) key: FontKey,
    pub(crate) bytes: Arc<Vec<u8>>,
    pub(crate) index: u32,
}

impl ResolvedFont {
    pub(crate) fn font_data(&self) -> vello_cpu::peniko::FontData {
        vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(self.bytes.as_ref().clone()),
            self.index,
        )
    }
}

/// Resolves family classes to font bytes.
///
/// Explicit files win; otherwise the system font database is queried (loaded lazily on first
/// use). Results, including misses, are cached per class and weight.
pub struct FontBook {
    paths: FontPaths,
    use_system_fonts: bool,
    db: Option<usvg::fontdb::Database>,
    cache: HashMap<FontKey, Option<ResolvedFont>>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("paths", &self.paths)
            .field("use_system_fonts", &self.use_system_fonts)
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl FontBook {
    /// Font book backed by explicit files and the system font database.
    pub fn new(paths: FontPaths) -> Self {
        Self {
            paths,
            use_system_fonts: true,
            db: None,
            cache: HashMap::new(),
        }
    }

    /// Font book that only uses explicit files.
    pub fn without_system_fonts(paths: FontPaths) -> Self {
        Self {
            use_system_fonts: false,
            ..Self::new(paths)
        }
    }

    pub(crate) fn resolve(&mut self, class: FontClass, weight: u16) -> Option<ResolvedFont> {
        let key = FontKey { class, weight };
        if let Some(hit) = self.cache.get(&key) {
            return hit.clone();
        }
        let found = self.load(key);
        if found.is_none() {
            tracing::debug!(?class, weight, "no font resolved");
        }
        self.cache.insert(key, found.clone());
        found
    }

    fn load(&mut self, key: FontKey) -> Option<ResolvedFont> {
        if let Some(path) = self.paths.get(key.class) {
            match read_font_file(path) {
                Ok(bytes) => {
                    return Some(ResolvedFont {
                        key,
                        bytes: Arc::new(bytes),
                        index: 0,
                    });
                }
                Err(err) => tracing::warn!(error = %err, "font file unusable, trying system fonts"),
            }
        }
        if !self.use_system_fonts {
            return None;
        }

        let db = self.db.get_or_insert_with(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            tracing::debug!(faces = db.len(), "loaded system fonts");
            db
        });

        let family = match key.class {
            FontClass::SansSerif => usvg::fontdb::Family::SansSerif,
            FontClass::Serif => usvg::fontdb::Family::Serif,
            FontClass::Cursive => usvg::fontdb::Family::Cursive,
            FontClass::Monospace => usvg::fontdb::Family::Monospace,
        };
        let families = [family, usvg::fontdb::Family::SansSerif];
        let query = usvg::fontdb::Query {
            families: &families,
            weight: usvg::fontdb::Weight(key.weight),
            stretch: usvg::fontdb::Stretch::Normal,
            style: usvg::fontdb::Style::Normal,
        };
        let id = db.query(&query)?;
        db.with_face_data(id, |data, index| ResolvedFont {
            key,
            bytes: Arc::new(data.to_vec()),
            index,
        })
    }
}

fn read_font_file(path: &Path) -> ReelResult<Vec<u8>> {
    let bytes = std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
    if bytes.is_empty() {
        return Err(ReelError::validation("font file is empty"));
    }
    Ok(bytes)
}

/// Stateful helper for building Parley text layouts from resolved fonts.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    families: HashMap<FontKey, String>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: HashMap::new(),
        }
    }

    /// Shape and lay out a single paragraph.
    pub(crate) fn layout_plain(
        &mut self,
        text: &str,
        font: &ResolvedFont,
        size_px: f32,
        brush: TextBrushRgba8,
        max_width_px: Option<f32>,
    ) -> ReelResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ReelError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let family_name = self.family_name(font)?;
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(max_width_px);
        layout.align(
            max_width_px,
            parley::Alignment::Start,
            parley::AlignmentOptions::default(),
        );
        Ok(layout)
    }

    fn family_name(&mut self, font: &ResolvedFont) -> ReelResult<String> {
        if let Some(name) = self.families.get(&font.key) {
            return Ok(name.clone());
        }
        let families = self.font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(font.bytes.as_ref().clone()),
            None,
        );
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            ReelError::validation("no font families registered from font bytes")
        })?;
        let name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ReelError::validation("registered font family has no name"))?
            .to_string();
        self.families.insert(font.key, name.clone());
        Ok(name)
    }
}

/// Paint every glyph run of `layout` with `transform`.
///
/// `paint_override` replaces the per-run brush (used for drop shadows).
pub(crate) fn fill_layout(
    ctx: &mut vello_cpu::RenderContext,
    layout: &parley::Layout<TextBrushRgba8>,
    font: &vello_cpu::peniko::FontData,
    transform: Affine,
    paint_override: Option<[u8; 4]>,
) {
    ctx.set_transform(affine_to_cpu(transform));
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };

            let [r, g, b, a] = paint_override.unwrap_or_else(|| {
                let brush = run.style().brush;
                [brush.r, brush.g, brush.b, brush.a]
            });
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));

            let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/text.rs"]
mod tests;
