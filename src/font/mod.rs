//! Font resolution and glyph geometry.
//!
//! Text in this crate renders via **vector glyph outlines**:
//! - Discover fonts on the host system via `fontdb`.
//! - Resolve a cascaded font description (family/weight/style) to a concrete
//!   face, falling back silently when the family is unknown.
//! - Extract glyph outlines (move_to/line_to/quad_to/curve_to) from TTF/OTF
//!   via `ttf-parser` and convert them to `lyon::path::Path`.
//! - Provide the per-character advances and kerning-aware string measures the
//!   layout engine consumes.
//!
//! A failed family lookup is a degraded-rendering outcome, never an error:
//! the resolver walks preferred families, then the generic serif fallback,
//! then the first face in the database. Only an empty database is fatal.

use std::{fs, path::PathBuf, sync::Arc};

use fontdb::{Database, Family, Query, Source, Style, Weight, ID};
use lyon::math::point;
use lyon::path::Path;
use ttf_parser::GlyphId;

use crate::text::layout::GlyphProvider;
use crate::text::{FontDescriptor, FontStyle, FontWeight};

/// A stable identifier for a selected font face.
///
/// Internally we keep `fontdb::ID` directly (it's Copy and hashable).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FontFaceId(pub ID);

/// Font selection request.
#[derive(Debug, Clone, Default)]
pub struct FontQuery {
    /// Preferred font family names, in priority order.
    /// Example: `["Helvetica Neue", "Helvetica", "sans-serif"]`
    pub families: Vec<String>,

    /// Weight in CSS terms (100..900). 400 = regular, 700 = bold.
    pub weight: u16,

    /// Italic / oblique.
    pub italic: bool,
}

impl FontQuery {
    /// Build a query from a resolved font descriptor.
    pub fn from_descriptor(font: &FontDescriptor) -> Self {
        Self {
            families: font
                .family
                .iter()
                .cloned()
                .chain(["serif".to_string()])
                .collect(),
            weight: match font.weight {
                FontWeight::Normal => 400,
                FontWeight::Bold => 700,
            },
            italic: matches!(font.style, FontStyle::Italic),
        }
    }
}

/// A resolved face plus enough information to access its bytes.
///
/// - `bytes` contains the full font file/collection.
/// - `index` selects the face within the collection.
#[derive(Debug, Clone)]
pub struct ResolvedFace {
    pub face_id: FontFaceId,
    pub bytes: Arc<[u8]>,
    pub index: u32,
    pub units_per_em: f32,
}

impl ResolvedFace {
    /// Parse the face once and fix a pixel size for glyph queries.
    pub fn sized(&self, px_size: f32) -> Result<SizedFace<'_>, FontError> {
        let face =
            ttf_parser::Face::parse(&self.bytes, self.index).map_err(|_| FontError::ParseFailed)?;
        Ok(SizedFace {
            scale: px_size / self.units_per_em,
            face,
        })
    }
}

/// Errors produced by the font subsystem.
#[derive(thiserror::Error, Debug)]
pub enum FontError {
    #[error("no fonts found on this system")]
    NoFontsAvailable,

    #[error("font face has no file-backed source")]
    NonFileBackedSource,

    #[error("failed to read font file from disk: {0}")]
    ReadFailed(String),

    #[error("failed to parse font face")]
    ParseFailed,
}

/// The primary entrypoint to the font system.
///
/// Owns a `fontdb::Database` of discovered faces and resolves queries against
/// it. Face bytes are shared (`Arc`) so resolved faces stay cheap to clone.
pub struct FontSystem {
    db: Database,
}

impl FontSystem {
    /// Create a new font system and load system fonts.
    pub fn new() -> Result<Self, FontError> {
        let mut db = Database::new();
        db.load_system_fonts();

        if db.faces().next().is_none() {
            return Err(FontError::NoFontsAvailable);
        }

        Ok(Self { db })
    }

    /// Resolve a query to a concrete face.
    ///
    /// Resolution strategy:
    /// - Try each named family in order with the requested weight/style,
    ///   mapping generic names (`serif`, `sans-serif`, `monospace`).
    /// - Fall back to generic serif.
    /// - If still not found, fall back to the first face in the database:
    ///   an unresolvable family degrades, it does not fail.
    pub fn resolve(&self, query: &FontQuery) -> Result<ResolvedFace, FontError> {
        let first_face = self
            .db
            .faces()
            .next()
            .ok_or(FontError::NoFontsAvailable)?
            .id;

        let style = if query.italic {
            Style::Italic
        } else {
            Style::Normal
        };
        let weight = Weight(query.weight.clamp(1, 1000));

        let mut families: Vec<Family<'_>> = Vec::new();
        for f in &query.families {
            let s = f.trim();
            if s.eq_ignore_ascii_case("serif") {
                families.push(Family::Serif);
            } else if s.eq_ignore_ascii_case("sans-serif") || s.eq_ignore_ascii_case("sans") {
                families.push(Family::SansSerif);
            } else if s.eq_ignore_ascii_case("monospace") || s.eq_ignore_ascii_case("mono") {
                families.push(Family::Monospace);
            } else if !s.is_empty() {
                families.push(Family::Name(s));
            }
        }

        let id = self
            .db
            .query(&Query {
                families: &families,
                weight,
                style,
                stretch: fontdb::Stretch::Normal,
            })
            .or_else(|| {
                self.db.query(&Query {
                    families: &[Family::Serif],
                    weight,
                    style,
                    stretch: fontdb::Stretch::Normal,
                })
            })
            .unwrap_or_else(|| {
                log::warn!(
                    "no face matches families {:?}; using database fallback",
                    query.families
                );
                first_face
            });

        let face = self.db.face(id).ok_or(FontError::NoFontsAvailable)?;

        let (path, index) = match &face.source {
            Source::File(p) => (p.to_path_buf(), face.index),
            _ => return Err(FontError::NonFileBackedSource),
        };

        let bytes = read_font_bytes(&path)?;

        // Parse metrics once here so callers can scale correctly.
        let parsed = ttf_parser::Face::parse(&bytes, index).map_err(|_| FontError::ParseFailed)?;
        let units_per_em = f32::from(parsed.units_per_em());

        Ok(ResolvedFace {
            face_id: FontFaceId(id),
            bytes,
            index,
            units_per_em,
        })
    }
}

fn read_font_bytes(path: &PathBuf) -> Result<Arc<[u8]>, FontError> {
    let data = fs::read(path).map_err(|_| FontError::ReadFailed(path.display().to_string()))?;
    Ok(Arc::<[u8]>::from(data))
}

/// A parsed face fixed at a pixel size.
///
/// All returned geometry is in device pixels, y-down, baseline at y = 0
/// (outlines are flipped out of the font's y-up space).
pub struct SizedFace<'a> {
    face: ttf_parser::Face<'a>,
    scale: f32,
}

impl SizedFace<'_> {
    fn glyph(&self, c: char) -> GlyphId {
        // Unknown characters map to the face's missing-glyph slot.
        self.face.glyph_index(c).unwrap_or(GlyphId(0))
    }

    fn advance(&self, glyph: GlyphId) -> f32 {
        f32::from(self.face.glyph_hor_advance(glyph).unwrap_or(0)) * self.scale
    }

    fn pair_kerning(&self, left: GlyphId, right: GlyphId) -> f32 {
        let Some(kern) = self.face.tables().kern else {
            return 0.0;
        };
        for subtable in kern.subtables {
            if !subtable.horizontal || subtable.variable {
                continue;
            }
            if let Some(value) = subtable.glyphs_kerning(left, right) {
                return f32::from(value) * self.scale;
            }
        }
        0.0
    }
}

impl GlyphProvider for SizedFace<'_> {
    fn char_advance(&self, c: char) -> f32 {
        self.advance(self.glyph(c))
    }

    fn measure(&self, text: &str) -> f32 {
        let mut width = 0.0;
        let mut prev: Option<GlyphId> = None;
        for c in text.chars() {
            let glyph = self.glyph(c);
            if let Some(prev) = prev {
                width += self.pair_kerning(prev, glyph);
            }
            width += self.advance(glyph);
            prev = Some(glyph);
        }
        width
    }

    fn outline(&self, c: char) -> Option<Path> {
        let mut builder = LyonOutlineBuilder::new(self.scale);
        // `outline_glyph` returns the bbox; None means "no outline" (spaces).
        self.face.outline_glyph(self.glyph(c), &mut builder)?;
        Some(builder.build())
    }
}

/// Convert `ttf-parser` outline callbacks into a `lyon::path::Path`.
///
/// Scales from font units into device pixels and flips y (fonts are y-up,
/// device space is y-down). A glyph may contain multiple contours; `move_to`
/// starts a new one.
struct LyonOutlineBuilder {
    builder: lyon::path::Builder,
    contour_open: bool,
    scale: f32,
}

impl LyonOutlineBuilder {
    fn new(scale: f32) -> Self {
        Self {
            builder: Path::builder(),
            contour_open: false,
            scale,
        }
    }

    fn p(&self, x: f32, y: f32) -> lyon::math::Point {
        point(x * self.scale, -y * self.scale)
    }

    fn build(mut self) -> Path {
        if self.contour_open {
            self.builder.close();
            self.contour_open = false;
        }
        self.builder.build()
    }
}

impl ttf_parser::OutlineBuilder for LyonOutlineBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        // Close previous contour if it was open.
        if self.contour_open {
            self.builder.close();
        }
        self.builder.begin(self.p(x, y));
        self.contour_open = true;
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(self.p(x, y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.builder
            .quadratic_bezier_to(self.p(x1, y1), self.p(x, y));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.builder
            .cubic_bezier_to(self.p(x1, y1), self.p(x2, y2), self.p(x, y));
    }

    fn close(&mut self) {
        if self.contour_open {
            self.builder.close();
            self.contour_open = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::layout::GlyphProvider as _;

    // Font tests run against whatever faces the host provides; skip quietly
    // on fontless environments (CI containers).
    fn any_face() -> Option<(FontSystem, ResolvedFace)> {
        let fonts = FontSystem::new().ok()?;
        let face = fonts.resolve(&FontQuery::default()).ok()?;
        Some((fonts, face))
    }

    #[test]
    fn resolves_some_face_for_unknown_families() {
        let Some((fonts, _)) = any_face() else {
            return;
        };
        let query = FontQuery {
            families: vec!["definitely-not-a-real-family-name".into()],
            weight: 400,
            italic: false,
        };
        // Must degrade to a fallback, not fail.
        assert!(fonts.resolve(&query).is_ok());
    }

    #[test]
    fn advances_are_positive_and_measure_adds_up() {
        let Some((_, face)) = any_face() else {
            return;
        };
        let sized = face.sized(16.0).unwrap();
        let a = sized.char_advance('a');
        assert!(a > 0.0);
        // Measure of a kern-free pair is the advance sum; with kerning it
        // differs by exactly the pair adjustment.
        let pair = sized.measure("aa");
        let kern = pair - 2.0 * a;
        assert!(kern.abs() < a, "implausible kerning {kern}");
    }

    #[test]
    fn spaces_have_no_outline_but_letters_do() {
        let Some((_, face)) = any_face() else {
            return;
        };
        let sized = face.sized(16.0).unwrap();
        assert!(sized.outline(' ').is_none());
        assert!(sized.outline('H').is_some());
    }
}
