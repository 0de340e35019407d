//! Path geometry from the numeric instruction encoding.
//!
//! Between the property-binding layer and the renderer, path geometry travels
//! as a flat numeric stream: each instruction is a type tag followed by that
//! instruction's arguments. For example a line is `2, x, y`: draw from the
//! last point (or 0,0) to `(x, y)`. This module:
//! - decodes a stream into typed [`PathCommand`]s, pre-scaled to device space
//! - lowers commands to a `lyon::path::Path` for measuring and placement
//! - provides [`PathEncoder`], the producing side of the same encoding
//!
//! Arc instructions carry center/radius/start/end angles (radians) plus a
//! direction flag; decoding normalizes them to a start angle and a sweep in
//! degrees. Downstream stroke/fill rendering depends on the arc direction
//! matching source intent, so the normalization is exact, not approximate.

pub mod measure;

use lyon::math::{point, vector, Angle, Point};
use lyon::path::Path;

const CMD_MOVE: u8 = 0;
const CMD_CLOSE: u8 = 1;
const CMD_LINE: u8 = 2;
const CMD_CUBIC: u8 = 3;
const CMD_ARC: u8 = 4;

/// A decoded drawing instruction. Coordinates are in device space (the
/// stream's layout-unit values times the device scale).
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PathCommand {
    MoveTo { x: f32, y: f32 },
    LineTo { x: f32, y: f32 },
    CubicTo { c1: Point, c2: Point, end: Point },
    /// A full or partial circle, as a new contour. `start_deg` and
    /// `sweep_deg` are already normalized; positive sweep follows the
    /// clockwise screen direction (y-down).
    ArcTo {
        center: Point,
        radius: f32,
        start_deg: f32,
        sweep_deg: f32,
    },
    Close,
}

/// Errors produced while decoding an instruction stream.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("unrecognized drawing instruction {tag} at stream offset {offset}")]
    UnrecognizedInstruction { tag: f32, offset: usize },
    #[error("instruction at stream offset {offset} runs past the end of the stream")]
    TruncatedInstruction { offset: usize },
}

/// Floor modulus: always in `[0, y)` for positive `y`, unlike the `%`
/// operator which keeps the dividend's sign.
fn modulus(x: f32, y: f32) -> f32 {
    let rem = x % y;
    if rem < 0.0 {
        rem + y
    } else {
        rem
    }
}

struct Reader<'a> {
    data: &'a [f32],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn next(&mut self, instruction_offset: usize) -> Result<f32, PathError> {
        let value = self
            .data
            .get(self.pos)
            .copied()
            .ok_or(PathError::TruncatedInstruction {
                offset: instruction_offset,
            })?;
        self.pos += 1;
        Ok(value)
    }
}

/// Decode an instruction stream into commands, scaling all coordinates by the
/// device scale.
///
/// A command list always begins with `MoveTo(0, 0)` when the stream's first
/// instruction is not itself a move, so that relative drawing has a defined
/// origin.
pub fn decode(data: &[f32], scale: f32) -> Result<Vec<PathCommand>, PathError> {
    let mut commands = Vec::new();
    let mut reader = Reader { data, pos: 0 };

    while reader.pos < data.len() {
        let offset = reader.pos;
        let tag = reader.next(offset)?;

        // Tags are small non-negative integers; anything else (including
        // NaN or fractional values) is a malformed stream.
        if !(tag.fract() == 0.0 && (0.0..=255.0).contains(&tag)) {
            return Err(PathError::UnrecognizedInstruction { tag, offset });
        }

        match tag as u8 {
            CMD_MOVE => {
                let x = reader.next(offset)? * scale;
                let y = reader.next(offset)? * scale;
                commands.push(PathCommand::MoveTo { x, y });
            }
            CMD_CLOSE => commands.push(PathCommand::Close),
            CMD_LINE => {
                let x = reader.next(offset)? * scale;
                let y = reader.next(offset)? * scale;
                commands.push(PathCommand::LineTo { x, y });
            }
            CMD_CUBIC => {
                let c1 = point(reader.next(offset)? * scale, reader.next(offset)? * scale);
                let c2 = point(reader.next(offset)? * scale, reader.next(offset)? * scale);
                let end = point(reader.next(offset)? * scale, reader.next(offset)? * scale);
                commands.push(PathCommand::CubicTo { c1, c2, end });
            }
            CMD_ARC => {
                let center = point(reader.next(offset)? * scale, reader.next(offset)? * scale);
                let radius = reader.next(offset)? * scale;
                let mut start = reader.next(offset)?.to_degrees();
                let end = reader.next(offset)?.to_degrees();
                let clockwise = reader.next(offset)? == 1.0;

                let mut sweep = end - start;
                if sweep.abs() > 360.0 {
                    sweep = 360.0;
                } else {
                    sweep = modulus(sweep, 360.0);
                }
                if !clockwise && sweep < 360.0 {
                    start = end;
                    sweep = 360.0 - sweep;
                }

                commands.push(PathCommand::ArcTo {
                    center,
                    radius,
                    start_deg: start,
                    sweep_deg: sweep,
                });
            }
            _ => return Err(PathError::UnrecognizedInstruction { tag, offset }),
        }
    }

    if !matches!(commands.first(), Some(PathCommand::MoveTo { .. })) {
        commands.insert(0, PathCommand::MoveTo { x: 0.0, y: 0.0 });
    }

    Ok(commands)
}

/// Lower a command list to a lyon path.
///
/// Contours are tracked explicitly: a move (or an arc, which always opens a
/// new contour) ends any open contour first, and drawing after a close starts
/// a fresh contour at the close point.
pub fn to_lyon(commands: &[PathCommand]) -> Path {
    let mut builder = Path::builder();
    let mut open = false;
    let mut current = point(0.0, 0.0);
    let mut subpath_start = current;

    fn ensure_open(builder: &mut lyon::path::Builder, open: &mut bool, at: Point) {
        if !*open {
            builder.begin(at);
            *open = true;
        }
    }

    for command in commands {
        match *command {
            PathCommand::MoveTo { x, y } => {
                if open {
                    builder.end(false);
                    open = false;
                }
                current = point(x, y);
                subpath_start = current;
            }
            PathCommand::LineTo { x, y } => {
                ensure_open(&mut builder, &mut open, current);
                current = point(x, y);
                builder.line_to(current);
            }
            PathCommand::CubicTo { c1, c2, end } => {
                ensure_open(&mut builder, &mut open, current);
                builder.cubic_bezier_to(c1, c2, end);
                current = end;
            }
            PathCommand::ArcTo {
                center,
                radius,
                start_deg,
                sweep_deg,
            } => {
                if open {
                    builder.end(false);
                    open = false;
                }
                let arc = lyon::geom::Arc {
                    center,
                    radii: vector(radius, radius),
                    start_angle: Angle::degrees(start_deg),
                    sweep_angle: Angle::degrees(sweep_deg),
                    x_rotation: Angle::degrees(0.0),
                };
                builder.begin(arc.from());
                open = true;
                arc.for_each_quadratic_bezier(&mut |segment| {
                    builder.quadratic_bezier_to(segment.ctrl, segment.to);
                });
                current = arc.to();
                subpath_start = arc.from();
            }
            PathCommand::Close => {
                if open {
                    builder.close();
                    open = false;
                }
                current = subpath_start;
            }
        }
    }

    if open {
        builder.end(false);
    }
    builder.build()
}

/// Decode and lower in one step.
pub fn build(data: &[f32], scale: f32) -> Result<Path, PathError> {
    Ok(to_lyon(&decode(data, scale)?))
}

/// Producer for the instruction encoding, mirroring what the property-binding
/// layer serializes. Shape helpers cover the primitive elements that lower to
/// plain path data.
#[derive(Debug, Clone, Default)]
pub struct PathEncoder {
    data: Vec<f32>,
}

impl PathEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(mut self, x: f32, y: f32) -> Self {
        self.data.extend([f32::from(CMD_MOVE), x, y]);
        self
    }

    pub fn line_to(mut self, x: f32, y: f32) -> Self {
        self.data.extend([f32::from(CMD_LINE), x, y]);
        self
    }

    pub fn cubic_to(mut self, c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32) -> Self {
        self.data.extend([f32::from(CMD_CUBIC), c1x, c1y, c2x, c2y, x, y]);
        self
    }

    /// Arc around `(cx, cy)`; angles in radians, direction via `clockwise`.
    pub fn arc(
        mut self,
        cx: f32,
        cy: f32,
        radius: f32,
        start_rad: f32,
        end_rad: f32,
        clockwise: bool,
    ) -> Self {
        self.data.extend([
            f32::from(CMD_ARC),
            cx,
            cy,
            radius,
            start_rad,
            end_rad,
            if clockwise { 1.0 } else { 0.0 },
        ]);
        self
    }

    pub fn close(mut self) -> Self {
        self.data.push(f32::from(CMD_CLOSE));
        self
    }

    pub fn rect(self, x: f32, y: f32, width: f32, height: f32) -> Self {
        self.move_to(x, y)
            .line_to(x + width, y)
            .line_to(x + width, y + height)
            .line_to(x, y + height)
            .close()
    }

    pub fn circle(self, cx: f32, cy: f32, radius: f32) -> Self {
        self.arc(cx, cy, radius, 0.0, std::f32::consts::TAU, true)
    }

    /// Ellipse as four cubic segments (the usual kappa approximation).
    pub fn ellipse(self, cx: f32, cy: f32, rx: f32, ry: f32) -> Self {
        const KAPPA: f32 = 0.552_284_8;
        let (ox, oy) = (rx * KAPPA, ry * KAPPA);
        self.move_to(cx, cy - ry)
            .cubic_to(cx + ox, cy - ry, cx + rx, cy - oy, cx + rx, cy)
            .cubic_to(cx + rx, cy + oy, cx + ox, cy + ry, cx, cy + ry)
            .cubic_to(cx - ox, cy + ry, cx - rx, cy + oy, cx - rx, cy)
            .cubic_to(cx - rx, cy - oy, cx - ox, cy - ry, cx, cy - ry)
            .close()
    }

    pub fn line(self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.move_to(x1, y1).line_to(x2, y2)
    }

    pub fn finish(self) -> Vec<f32> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_scaled_commands() {
        let data = PathEncoder::new()
            .move_to(1.0, 2.0)
            .line_to(3.0, 4.0)
            .close()
            .finish();
        let commands = decode(&data, 2.0).unwrap();
        assert_eq!(
            commands,
            vec![
                PathCommand::MoveTo { x: 2.0, y: 4.0 },
                PathCommand::LineTo { x: 6.0, y: 8.0 },
                PathCommand::Close,
            ]
        );
    }

    #[test]
    fn prepends_implicit_move_to_origin() {
        let data = PathEncoder::new().line_to(5.0, 5.0).finish();
        let commands = decode(&data, 1.0).unwrap();
        assert_eq!(commands[0], PathCommand::MoveTo { x: 0.0, y: 0.0 });
        assert_eq!(commands[1], PathCommand::LineTo { x: 5.0, y: 5.0 });
    }

    #[test]
    fn rejects_unknown_tags_and_truncation() {
        assert_eq!(
            decode(&[9.0, 1.0, 2.0], 1.0),
            Err(PathError::UnrecognizedInstruction { tag: 9.0, offset: 0 })
        );
        assert_eq!(
            decode(&[2.0, 1.0], 1.0),
            Err(PathError::TruncatedInstruction { offset: 0 })
        );
        // The offset reports the failing instruction, not the stream end.
        assert_eq!(
            decode(&[1.0, 2.0, 1.0], 1.0),
            Err(PathError::TruncatedInstruction { offset: 1 })
        );
    }

    #[test]
    fn arc_sweep_clamps_at_full_circle() {
        let data = PathEncoder::new()
            .arc(0.0, 0.0, 10.0, 0.0, 400f32.to_radians(), true)
            .finish();
        let commands = decode(&data, 1.0).unwrap();
        match commands[0] {
            PathCommand::ArcTo {
                start_deg,
                sweep_deg,
                ..
            } => {
                assert!(start_deg.abs() < 1e-3);
                assert!((sweep_deg - 360.0).abs() < 1e-3);
            }
            ref other => panic!("expected arc, got {other:?}"),
        }
    }

    #[test]
    fn counter_clockwise_arc_flips_to_complement() {
        // A 30° span requested counter-clockwise renders as the 330°
        // complement starting at the original end angle.
        let data = PathEncoder::new()
            .arc(0.0, 0.0, 10.0, 0.0, 30f32.to_radians(), false)
            .finish();
        let commands = decode(&data, 1.0).unwrap();
        match commands[0] {
            PathCommand::ArcTo {
                start_deg,
                sweep_deg,
                ..
            } => {
                assert!((start_deg - 30.0).abs() < 1e-3);
                assert!((sweep_deg - 330.0).abs() < 1e-3);
            }
            ref other => panic!("expected arc, got {other:?}"),
        }
    }

    #[test]
    fn negative_sweep_normalizes_before_the_flip() {
        // end - start = -30 wraps to 330 by floor modulus; the
        // counter-clockwise flip then leaves the 30° complement from the end.
        let data = PathEncoder::new()
            .arc(0.0, 0.0, 10.0, 30f32.to_radians(), 0.0, false)
            .finish();
        let commands = decode(&data, 1.0).unwrap();
        match commands[0] {
            PathCommand::ArcTo {
                start_deg,
                sweep_deg,
                ..
            } => {
                assert!(start_deg.abs() < 1e-3);
                assert!((sweep_deg - 30.0).abs() < 1e-3);
            }
            ref other => panic!("expected arc, got {other:?}"),
        }
    }

    #[test]
    fn lowering_survives_draw_after_close() {
        let data = PathEncoder::new()
            .rect(0.0, 0.0, 10.0, 10.0)
            .line_to(20.0, 20.0)
            .finish();
        // Must not panic: the line after close opens a fresh contour.
        let path = build(&data, 1.0).unwrap();
        assert!(path.iter().count() > 0);
    }

    #[test]
    fn circle_lowering_is_closed_in_arc_points() {
        let data = PathEncoder::new().circle(5.0, 5.0, 5.0).finish();
        let path = build(&data, 1.0).unwrap();
        // All points of the lowered arc stay on the circle.
        for event in path.iter() {
            if let lyon::path::Event::Quadratic { to, .. } = event {
                let r = ((to.x - 5.0).powi(2) + (to.y - 5.0).powi(2)).sqrt();
                assert!((r - 5.0).abs() < 0.1, "point off circle: {to:?}");
            }
        }
    }
}
