//! Glyph-by-glyph text placement, straight-baseline and on-path.
//!
//! One call lays out one line of literal character content for one text node:
//! - resolve the anchor offset from the run's total measure
//! - walk characters, computing each glyph's advance (kerning, word spacing,
//!   letter spacing) and querying the glyph context for per-glyph overrides
//! - place each glyph either on the baseline or along sampled path geometry,
//!   and append its transformed outline to the output path
//!
//! On a path, a glyph is positioned by its midline: the glyph is centered on
//! the point halfway between its start and end distance along the curve, and
//! rotated to the chord between those two points. Near the path's ends the
//! chord endpoints leave the path, so the local tangent at the midpoint is
//! used instead; elsewhere the chord is more numerically stable than local
//! curvature.

use lyon::path::Path;

use crate::length::{Length, LengthError};
use crate::path::measure::PathMeasure;
use crate::text::context::GlyphContext;
use crate::text::{FontDescriptor, TextAnchor};
use crate::transform::Affine;

/// The shaping-collaborator seam: everything the layout needs from a font,
/// already fixed at a concrete size.
///
/// `measure` must include pairwise kerning so that
/// `measure(ab) - measure(a) - char_advance(b)` recovers the kern adjustment
/// of the pair.
pub trait GlyphProvider {
    /// Advance width of a single character.
    fn char_advance(&self, c: char) -> f32;
    /// Kerning-inclusive width of a string.
    fn measure(&self, text: &str) -> f32;
    /// Outline in device units, y-down, baseline at origin. `None` for
    /// characters without geometry (spaces).
    fn outline(&self, c: char) -> Option<Path>;
}

/// How text distributes along a path.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TextPathMethod {
    /// Glyph advances are taken as-is; text may under- or overshoot the path.
    #[default]
    Align,
    /// Advances are scaled uniformly so the text exactly spans the path.
    Stretch,
}

/// Path geometry for a text-on-path run.
#[derive(Debug)]
pub struct TextPathSpec<'a> {
    pub measure: &'a PathMeasure,
    /// Raw start-offset token, resolved against the path length (so `"25%"`
    /// means a quarter of the way along). Empty means 0.
    pub start_offset: &'a str,
    pub method: TextPathMethod,
}

/// Errors that abort layout of a single node.
#[derive(thiserror::Error, Debug)]
pub enum LayoutError {
    #[error(transparent)]
    InvalidLength(#[from] LengthError),
    /// Font environment failure (empty database, unreadable face). Family
    /// mismatches never surface here; they degrade to a fallback face.
    #[error(transparent)]
    Font(#[from] crate::font::FontError),
}

/// Lay out one line of characters, returning the unioned glyph outlines.
///
/// The context must already carry the node's frame; this function only
/// consumes per-glyph values and never touches frame structure, so a failed
/// layout leaves the stack balanced for the caller's pop.
pub fn layout_line(
    content: &str,
    font: &FontDescriptor,
    glyphs: &dyn GlyphProvider,
    text_path: Option<&TextPathSpec<'_>>,
    ctx: &mut GlyphContext,
) -> Result<Path, LayoutError> {
    let mut output = Path::builder();

    if content.is_empty() {
        return Ok(output.build());
    }

    // Total advance of the run, pre-kerning; the anchor aligns the run's
    // start point relative to this measure.
    let text_measure: f32 = content.chars().map(|c| glyphs.char_advance(c)).sum();
    let mut offset = match font.text_anchor {
        TextAnchor::Start => 0.0,
        TextAnchor::Middle => -text_measure / 2.0,
        TextAnchor::End => -text_measure,
    };

    let mut path_length = 0.0;
    let mut render_scale = 1.0;
    if let Some(tp) = text_path {
        path_length = tp.measure.length();
        if path_length == 0.0 {
            return Ok(output.build());
        }
        if !tp.start_offset.is_empty() {
            offset += Length::parse(tp.start_offset)?.resolve(
                path_length,
                ctx.device_scale(),
                ctx.font_size(),
            );
        }
        if tp.method == TextPathMethod::Stretch && text_measure > 0.0 {
            render_scale = path_length / text_measure;
        }
    }

    let auto_kerning = !font.kerning_set;
    let mut kerning = font.kerning;
    let mut previous = String::new();
    let mut previous_char_width = 0.0;

    for c in content.chars() {
        let char_width = glyphs.char_advance(c) * render_scale;

        if auto_kerning {
            let pair = format!("{previous}{c}");
            let both_width = glyphs.measure(&pair) * render_scale;
            kerning = both_width - previous_char_width - char_width;
            previous_char_width = char_width;
            previous = c.to_string();
        }

        let word_space = if c == ' ' { font.word_spacing } else { 0.0 };
        let advance = char_width + kerning + word_space + font.letter_spacing;

        let x = ctx.next_x(advance);
        let y = ctx.next_y();
        let dx = ctx.next_delta_x();
        let dy = ctx.next_delta_y();
        let r = ctx.next_rotation();

        let startpoint = offset + x + dx - char_width;

        let placement = if let Some(tp) = text_path {
            let endpoint = startpoint + char_width;
            let halfway = char_width / 2.0;
            let midpoint = startpoint + halfway;

            // Glyphs whose midpoint is past the path are not rendered, and
            // neither is anything after them; glyphs before the path's start
            // are skipped individually.
            if midpoint > path_length {
                break;
            }
            if midpoint < 0.0 {
                continue;
            }

            let Some(mid) = tp.measure.sample(midpoint) else {
                break;
            };

            let angle = if startpoint < 0.0 || endpoint > path_length {
                mid.tangent_deg
            } else {
                let (start, end) = match (tp.measure.sample(startpoint), tp.measure.sample(endpoint))
                {
                    (Some(s), Some(e)) => (s, e),
                    _ => break,
                };
                (end.position.y - start.position.y)
                    .atan2(end.position.x - start.position.x)
                    .to_degrees()
            };

            Affine::translate(0.0, y)
                .mul(Affine::translate(mid.position.x, mid.position.y))
                .mul(Affine::rotate_deg(angle))
                .mul(Affine::translate(-halfway, dy))
                .mul(Affine::scale(render_scale, render_scale))
                .mul(Affine::rotate_deg(r))
        } else {
            Affine::translate(startpoint, y + dy).mul(Affine::rotate_deg(r))
        };

        if let Some(outline) = glyphs.outline(c) {
            append_transformed(&mut output, &outline, &placement);
        }
    }

    Ok(output.build())
}

/// Append `outline`, transformed by `placement`, to the output builder.
fn append_transformed(builder: &mut lyon::path::Builder, outline: &Path, placement: &Affine) {
    use lyon::math::point;
    use lyon::path::Event;

    let map = |p: lyon::math::Point| {
        let (x, y) = placement.transform_point(p.x, p.y);
        point(x, y)
    };

    for event in outline.iter() {
        match event {
            Event::Begin { at } => {
                builder.begin(map(at));
            }
            Event::Line { to, .. } => {
                builder.line_to(map(to));
            }
            Event::Quadratic { ctrl, to, .. } => {
                builder.quadratic_bezier_to(map(ctrl), map(to));
            }
            Event::Cubic {
                ctrl1, ctrl2, to, ..
            } => {
                builder.cubic_bezier_to(map(ctrl1), map(ctrl2), map(to));
            }
            Event::End { close, .. } => {
                builder.end(close);
            }
        }
    }
}
