//! Length tokens and unit resolution.
//!
//! Attribute values like `"40"`, `"50%"` or `"1.5em"` arrive as strings and
//! only become concrete user-space numbers once a reference dimension, the
//! device scale and the current font size are known:
//! - percentages resolve against a reference dimension (viewport width,
//!   height, or a path's total length for start offsets)
//! - font-relative values resolve against the current font size
//! - bare numbers are absolute and scale with the device pixel ratio
//!
//! Resolution is pure; the same token can be resolved repeatedly against
//! different references without side effects.

use std::str::FromStr;

/// A parsed length token, pending resolution.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Length {
    /// A plain number; multiplied by the device scale on resolution.
    Absolute(f32),
    /// A percentage of some reference dimension.
    Percent(f32),
    /// A multiple of the current font size (`em`).
    FontRelative(f32),
}

/// Errors produced when parsing a length token.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LengthError {
    #[error("invalid length token: {0:?}")]
    Invalid(String),
}

impl Length {
    /// Parse a length token.
    ///
    /// Accepted forms: `"12"`, `"12px"` (absolute), `"50%"`, `"1.5em"`.
    /// Callers decide the fallback on error; 0 is the usual choice.
    pub fn parse(token: &str) -> Result<Self, LengthError> {
        let s = token.trim();
        let invalid = || LengthError::Invalid(token.to_string());

        if let Some(num) = s.strip_suffix('%') {
            return num.trim().parse().map(Length::Percent).map_err(|_| invalid());
        }
        if let Some(num) = s.strip_suffix("em") {
            return num
                .trim()
                .parse()
                .map(Length::FontRelative)
                .map_err(|_| invalid());
        }
        // `px` is the canonical absolute unit; a bare number means the same.
        let num = s.strip_suffix("px").unwrap_or(s).trim();
        num.parse().map(Length::Absolute).map_err(|_| invalid())
    }

    /// Resolve against a reference dimension, device scale and font size.
    pub fn resolve(self, reference: f32, scale: f32, font_size: f32) -> f32 {
        match self {
            Length::Absolute(v) => v * scale,
            Length::Percent(p) => p / 100.0 * reference,
            Length::FontRelative(v) => v * font_size,
        }
    }
}

impl FromStr for Length {
    type Err = LengthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Length::parse(s)
    }
}

/// Parse and resolve in one step.
pub fn resolve(token: &str, reference: f32, scale: f32, font_size: f32) -> Result<f32, LengthError> {
    Ok(Length::parse(token)?.resolve(reference, scale, font_size))
}

/// Reference dimension for lengths that respond to both viewport axes at once
/// (circular radii in a non-uniform viewport): the diagonal normalized so that
/// a square viewport yields its side length.
pub fn diagonal_reference(width: f32, height: f32) -> f32 {
    (width * width + height * height).sqrt() * std::f32::consts::FRAC_1_SQRT_2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_resolves_against_reference_only() {
        let len = Length::parse("50%").unwrap();
        // Scale and font size must not affect percentages.
        assert_eq!(len.resolve(200.0, 1.0, 12.0), 100.0);
        assert_eq!(len.resolve(200.0, 3.0, 64.0), 100.0);
    }

    #[test]
    fn em_resolves_against_font_size() {
        let len: Length = "1.5em".parse().unwrap();
        assert_eq!(len.resolve(999.0, 2.0, 12.0), 18.0);
    }

    #[test]
    fn one_step_resolution() {
        assert_eq!(resolve("50%", 200.0, 3.0, 64.0), Ok(100.0));
        assert!(resolve("bogus", 200.0, 1.0, 12.0).is_err());
    }

    #[test]
    fn absolute_scales_with_device_scale() {
        assert_eq!(Length::parse("10").unwrap().resolve(0.0, 2.0, 0.0), 20.0);
        assert_eq!(Length::parse("10px").unwrap().resolve(0.0, 2.0, 0.0), 20.0);
        assert_eq!(Length::parse(" -4 ").unwrap().resolve(0.0, 1.0, 0.0), -4.0);
    }

    #[test]
    fn unparseable_tokens_error() {
        assert!(Length::parse("").is_err());
        assert!(Length::parse("abc").is_err());
        assert!(Length::parse("%").is_err());
        assert!(Length::parse("12ex").is_err());
    }

    #[test]
    fn diagonal_of_square_viewport_is_side() {
        let d = diagonal_reference(100.0, 100.0);
        assert!((d - 100.0).abs() < 1e-3);
    }
}
