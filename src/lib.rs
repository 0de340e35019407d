//! `penna` library crate root.
//!
//! This crate lays out declarative vector-graphics text (SVG semantics,
//! including text-on-path) into renderable `lyon` path geometry. It is
//! intended to be used as a **library** by a host that owns the element tree:
//! the host walks its tree, pushes/pops glyph-context frames around
//! text-bearing nodes, and receives one outline path per text node to hand to
//! its paint pipeline.
//!
//! Public API philosophy (for now):
//! - Keep modules public so hosts can assemble their own pipelines
//!   (instruction decoding, length resolution and path measurement are all
//!   independently useful).
//! - Provide one stable convenience entrypoint ([`layout_node_text`]) that
//!   wires the common case: cascade the current font, resolve it against the
//!   system font database, lay the line out.
//!
//! Note: this crate does not initialize logging; hosts decide their own
//! logging setup.

pub mod defs;
pub mod font;
pub mod length;
pub mod path;
pub mod text;
pub mod transform;

use font::{FontQuery, FontSystem};
use text::context::GlyphContext;
use text::layout::{LayoutError, TextPathSpec};

/// Lay out one text node's literal content with the context's cascaded font.
///
/// Resolves the cascade result against the system font database (degrading to
/// a fallback face for unknown families), fixes the face at the resolved size
/// times the device scale, and runs the layout engine. The caller has already
/// pushed the node's frame and pops it afterwards, including when this
/// returns an error, which aborts only this node.
pub fn layout_node_text(
    fonts: &FontSystem,
    ctx: &mut GlyphContext,
    content: &str,
    text_path: Option<&TextPathSpec<'_>>,
) -> Result<lyon::path::Path, LayoutError> {
    let font = ctx.font();
    let face = fonts.resolve(&FontQuery::from_descriptor(&font))?;
    let sized = face.sized(font.size * ctx.device_scale())?;
    text::layout::layout_line(content, &font, &sized, text_path, ctx)
}
