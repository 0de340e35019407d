//! Text attributes and the glyph layout context.
//!
//! Submodules:
//! - [`context`]: the per-walk stack of override lists and cascading font
//!   attributes (one frame per nested text-bearing node)
//! - [`layout`]: glyph-by-glyph placement, straight-baseline and on-path
//!
//! This file holds the attribute vocabulary shared by both: the raw per-node
//! font property set ([`FontProps`]) and its fully-resolved cascade result
//! ([`FontDescriptor`]).

pub mod context;
pub mod layout;

/// Fallback font size when no node in scope defines one.
pub const DEFAULT_FONT_SIZE: f32 = 12.0;

/// Horizontal alignment of a text run relative to its own measured width.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TextDecoration {
    #[default]
    None,
    Underline,
    LineThrough,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// Raw font attributes attached to one node. Every field is optional; absent
/// fields fall through to ancestor nodes in the cascade.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontProps {
    pub family: Option<String>,
    pub size: Option<f32>,
    pub weight: Option<FontWeight>,
    pub style: Option<FontStyle>,
    /// An explicit inter-glyph kerning value. Setting it (even to 0) turns
    /// auto-kerning off for the subtree.
    pub kerning: Option<f32>,
    pub letter_spacing: Option<f32>,
    pub word_spacing: Option<f32>,
    pub text_anchor: Option<TextAnchor>,
    pub text_decoration: Option<TextDecoration>,
}

impl FontProps {
    /// Parse the CSS-like shorthand form `"[bold] [italic] [size] family"`.
    ///
    /// Style keywords may appear in any order before the size; `normal` is
    /// accepted and ignored. When the shorthand matches at all, a missing
    /// size falls back to the default 12. Multi-family lists keep only the
    /// first entry, with quotes stripped.
    pub fn parse_shorthand(shorthand: &str) -> Self {
        let mut props = Self::default();
        let mut rest = shorthand.trim();

        loop {
            let Some(word) = rest.split_whitespace().next() else {
                break;
            };
            match word {
                "bold" => props.weight = Some(FontWeight::Bold),
                "italic" => props.style = Some(FontStyle::Italic),
                "normal" => {}
                _ => break,
            }
            rest = rest[word.len()..].trim_start();
        }

        if let Some(word) = rest.split_whitespace().next() {
            let digits = word.trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == '%');
            if let Ok(size) = digits.parse::<f32>() {
                props.size = Some(size);
                rest = rest[word.len()..].trim_start();
            } else {
                props.size = Some(DEFAULT_FONT_SIZE);
            }
        }

        let family = first_family(rest);
        if !family.is_empty() {
            props.family = Some(family);
        }
        props
    }
}

/// Extract the first family of a comma-separated list, unquoted.
fn first_family(list: &str) -> String {
    list.split(',')
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string()
}

/// The result of cascading [`FontProps`] from the innermost node outwards:
/// every field carries a concrete value.
#[derive(Debug, Clone, PartialEq)]
pub struct FontDescriptor {
    pub family: Option<String>,
    pub size: f32,
    pub weight: FontWeight,
    pub style: FontStyle,
    /// Explicit kerning; only meaningful when `kerning_set` is true,
    /// otherwise pairwise auto-kerning applies.
    pub kerning: f32,
    pub kerning_set: bool,
    pub letter_spacing: f32,
    pub word_spacing: f32,
    pub text_anchor: TextAnchor,
    pub text_decoration: TextDecoration,
}

impl Default for FontDescriptor {
    fn default() -> Self {
        Self {
            family: None,
            size: DEFAULT_FONT_SIZE,
            weight: FontWeight::Normal,
            style: FontStyle::Normal,
            kerning: 0.0,
            kerning_set: false,
            letter_spacing: 0.0,
            word_spacing: 0.0,
            text_anchor: TextAnchor::Start,
            text_decoration: TextDecoration::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorthand_full_form() {
        let props = FontProps::parse_shorthand("bold italic 20 Helvetica Neue, Arial");
        assert_eq!(props.weight, Some(FontWeight::Bold));
        assert_eq!(props.style, Some(FontStyle::Italic));
        assert_eq!(props.size, Some(20.0));
        assert_eq!(props.family.as_deref(), Some("Helvetica Neue"));
    }

    #[test]
    fn shorthand_defaults_missing_size() {
        let props = FontProps::parse_shorthand("bold \"Times New Roman\"");
        assert_eq!(props.weight, Some(FontWeight::Bold));
        assert_eq!(props.size, Some(DEFAULT_FONT_SIZE));
        assert_eq!(props.family.as_deref(), Some("Times New Roman"));
    }

    #[test]
    fn shorthand_size_with_unit() {
        let props = FontProps::parse_shorthand("12px serif");
        assert_eq!(props.size, Some(12.0));
        assert_eq!(props.family.as_deref(), Some("serif"));
    }

    #[test]
    fn shorthand_family_only() {
        let props = FontProps::parse_shorthand("Georgia");
        assert_eq!(props.family.as_deref(), Some("Georgia"));
        assert_eq!(props.weight, None);
    }
}
