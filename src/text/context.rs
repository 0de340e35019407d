//! The glyph layout context stack.
//!
//! Nested text-bearing nodes can each attach per-glyph overrides (explicit
//! x/y position lists, rotation lists, dx/dy delta lists) and cascading font
//! attributes. While the tree walk descends, every text node pushes a frame;
//! glyph layout then asks the *stack* (not the node) for the next value of
//! each attribute, one query per glyph.
//!
//! The tricky part is sharing: a node that does not supply its own list for
//! an attribute consumes from the nearest ancestor that did, through the same
//! read cursor that the ancestor itself uses. Override lists therefore live
//! in an arena owned by the stack:
//! - each arena record holds one value list and **one** cursor
//! - frames reference records by index; inheriting a list means referencing
//!   the same record, never copying it
//! - a frame that introduces its own list gets a fresh record, and remembers
//!   the parent record's cursor so the parent's view can be restored when
//!   the frame pops (an overriding child's consumption must not bleed into
//!   later siblings that inherit the ancestor's list)
//!
//! Consumption through a shared record is *not* rolled back on pop: glyphs
//! consumed by a non-overriding child advance the owner's cursor in document
//! order, which is exactly how sequential `x="0 10 20"`-style lists behave
//! across spans.

use crate::length;
use crate::text::{FontDescriptor, FontProps, DEFAULT_FONT_SIZE};

/// One override list plus its single shared read cursor.
#[derive(Debug, Clone)]
struct ListRec<T> {
    values: Vec<T>,
    cursor: usize,
}

impl<T> ListRec<T> {
    fn empty() -> Self {
        Self {
            values: Vec::new(),
            cursor: 0,
        }
    }
}

/// Arena index 0 is the permanently-empty list that unset attributes
/// reference.
const EMPTY: usize = 0;

#[derive(Debug, Clone)]
struct Arena<T> {
    lists: Vec<ListRec<T>>,
}

impl<T: Clone> Arena<T> {
    fn new() -> Self {
        Self {
            lists: vec![ListRec::empty()],
        }
    }

    fn insert(&mut self, values: Vec<T>) -> usize {
        self.lists.push(ListRec { values, cursor: 0 });
        self.lists.len() - 1
    }

    fn cursor(&self, index: usize) -> usize {
        self.lists[index].cursor
    }

    /// Consume one value, advancing the shared cursor; `None` once exhausted.
    fn consume(&mut self, index: usize) -> Option<T> {
        let rec = &mut self.lists[index];
        let value = rec.values.get(rec.cursor).cloned()?;
        rec.cursor += 1;
        Some(value)
    }
}

/// A frame's reference to one attribute's active list, plus the snapshot
/// needed to restore the parent's view on pop.
#[derive(Debug, Copy, Clone)]
struct AttrSlot {
    /// Active arena record for this attribute in this frame.
    list: usize,
    /// The parent frame's record and its cursor at push time.
    parent_list: usize,
    parent_cursor: usize,
}

#[derive(Debug, Clone)]
struct ContextFrame {
    font: FontProps,
    x: AttrSlot,
    y: AttrSlot,
    rotation: AttrSlot,
    delta_x: AttrSlot,
    delta_y: AttrSlot,
}

/// Per-glyph override lists supplied by one text node. Empty or absent lists
/// inherit the parent's.
#[derive(Debug, Clone, Default)]
pub struct TextFrameLists {
    /// Position tokens, raw strings pending resolution (`"10"`, `"50%"`,
    /// `"1em"`).
    pub xs: Option<Vec<String>>,
    pub ys: Option<Vec<String>>,
    /// Pre-resolved values.
    pub rotations: Option<Vec<f32>>,
    pub delta_xs: Option<Vec<f32>>,
    pub delta_ys: Option<Vec<f32>>,
}

/// The stack of text-node frames for one tree walk.
///
/// Strictly scoped to a single walk: push on node enter, pop on node exit,
/// LIFO only. Depth always equals the number of text-bearing ancestors at the
/// current walk position.
#[derive(Debug)]
pub struct GlyphContext {
    scale: f32,
    width: f32,
    height: f32,
    /// Resolved font size of the nearest enclosing non-text context, if any;
    /// the cascade's last stop before the fixed default.
    outer_font_size: Option<f32>,

    tokens: Arena<String>,
    floats: Arena<f32>,
    frames: Vec<ContextFrame>,

    // Running accumulators across glyphs of the current text root.
    x: f32,
    y: f32,
    dx: f32,
    dy: f32,
    rotation: f32,
}

impl GlyphContext {
    /// `scale` is the device pixel ratio; `width`/`height` the viewport in
    /// device pixels (the reference dimensions for percentage positions).
    pub fn new(scale: f32, width: f32, height: f32) -> Self {
        Self {
            scale,
            width,
            height,
            outer_font_size: None,
            tokens: Arena::new(),
            floats: Arena::new(),
            frames: Vec::new(),
            x: 0.0,
            y: 0.0,
            dx: 0.0,
            dy: 0.0,
            rotation: 0.0,
        }
    }

    /// Set the font size inherited from outside the text subtree.
    pub fn with_outer_font_size(mut self, size: f32) -> Self {
        self.outer_font_size = Some(size);
        self
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// The device pixel ratio this context resolves positions with.
    pub fn device_scale(&self) -> f32 {
        self.scale
    }

    fn reset_origin(&mut self) {
        self.x = 0.0;
        self.y = 0.0;
        self.dx = 0.0;
        self.dy = 0.0;
        self.rotation = 0.0;
    }

    fn parent_slot<T: Clone>(arena: &Arena<T>, parent: Option<&AttrSlot>) -> AttrSlot {
        let list = parent.map_or(EMPTY, |slot| slot.list);
        AttrSlot {
            list,
            parent_list: list,
            parent_cursor: arena.cursor(list),
        }
    }

    fn new_slot<T: Clone>(
        arena: &mut Arena<T>,
        parent: Option<&AttrSlot>,
        values: Option<Vec<T>>,
    ) -> AttrSlot {
        let mut slot = Self::parent_slot(arena, parent);
        // An empty supplied list counts as "not supplied".
        if let Some(values) = values.filter(|v| !v.is_empty()) {
            slot.list = arena.insert(values);
        }
        slot
    }

    /// Enter a non-text group that only contributes font attributes. All
    /// override lists pass through unchanged.
    pub fn push_group_frame(&mut self, font: FontProps) {
        let parent = self.frames.last().cloned();
        let p = parent.as_ref();
        let frame = ContextFrame {
            font,
            x: Self::parent_slot(&self.tokens, p.map(|f| &f.x)),
            y: Self::parent_slot(&self.tokens, p.map(|f| &f.y)),
            rotation: Self::parent_slot(&self.floats, p.map(|f| &f.rotation)),
            delta_x: Self::parent_slot(&self.floats, p.map(|f| &f.delta_x)),
            delta_y: Self::parent_slot(&self.floats, p.map(|f| &f.delta_y)),
        };
        self.frames.push(frame);
    }

    /// Enter a text node. Each supplied list becomes this frame's active list
    /// for that attribute with a fresh cursor; the rest inherit. Pass
    /// `reset_origin` when a new text root begins (not when a nested span
    /// continues the same line).
    pub fn push_text_frame(&mut self, font: FontProps, lists: TextFrameLists, reset_origin: bool) {
        if reset_origin {
            self.reset_origin();
        }

        let parent = self.frames.last().cloned();
        let p = parent.as_ref();
        let frame = ContextFrame {
            font,
            x: Self::new_slot(&mut self.tokens, p.map(|f| &f.x), lists.xs),
            y: Self::new_slot(&mut self.tokens, p.map(|f| &f.y), lists.ys),
            rotation: Self::new_slot(&mut self.floats, p.map(|f| &f.rotation), lists.rotations),
            delta_x: Self::new_slot(&mut self.floats, p.map(|f| &f.delta_x), lists.delta_xs),
            delta_y: Self::new_slot(&mut self.floats, p.map(|f| &f.delta_y), lists.delta_ys),
        };
        self.frames.push(frame);
    }

    /// Leave the current node. For every attribute whose list this frame
    /// replaced, the parent record's cursor is restored to its push-time
    /// snapshot; shared (inherited) records keep their advanced cursor.
    pub fn pop_frame(&mut self) {
        let Some(frame) = self.frames.pop() else {
            debug_assert!(false, "pop_frame on an empty context");
            return;
        };

        for slot in [&frame.x, &frame.y] {
            if slot.list != slot.parent_list {
                self.tokens.lists[slot.parent_list].cursor = slot.parent_cursor;
            }
        }
        for slot in [&frame.rotation, &frame.delta_x, &frame.delta_y] {
            if slot.list != slot.parent_list {
                self.floats.lists[slot.parent_list].cursor = slot.parent_cursor;
            }
        }

        if self.frames.is_empty() {
            self.reset_origin();
        }
    }

    fn resolve_position(&self, token: &str, reference: f32, font_size: f32) -> f32 {
        match length::resolve(token, reference, self.scale, font_size) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("bad position token: {err}; falling back to 0");
                0.0
            }
        }
    }

    /// Next glyph x position: consumes an explicit token when one is left
    /// (which overrides, rather than adds to, accumulated x deltas), then
    /// folds in the glyph advance.
    pub fn next_x(&mut self, advance: f32) -> f32 {
        let font_size = self.font_size();
        let list = self.frames.last().map_or(EMPTY, |f| f.x.list);
        if let Some(token) = self.tokens.consume(list) {
            self.x = self.resolve_position(&token, self.width, font_size);
            self.dx = 0.0;
        }
        self.x += advance;
        self.x
    }

    /// Next glyph y position; an explicit token overrides accumulated y
    /// deltas.
    pub fn next_y(&mut self) -> f32 {
        let font_size = self.font_size();
        let list = self.frames.last().map_or(EMPTY, |f| f.y.list);
        if let Some(token) = self.tokens.consume(list) {
            self.y = self.resolve_position(&token, self.height, font_size);
            self.dy = 0.0;
        }
        self.y
    }

    pub fn next_delta_x(&mut self) -> f32 {
        let list = self.frames.last().map_or(EMPTY, |f| f.delta_x.list);
        if let Some(value) = self.floats.consume(list) {
            self.dx += value * self.scale;
        }
        self.dx
    }

    pub fn next_delta_y(&mut self) -> f32 {
        let list = self.frames.last().map_or(EMPTY, |f| f.delta_y.list);
        if let Some(value) = self.floats.consume(list) {
            self.dy += value * self.scale;
        }
        self.dy
    }

    /// Next glyph rotation in degrees. An exhausted list keeps returning its
    /// last value.
    pub fn next_rotation(&mut self) -> f32 {
        let list = self.frames.last().map_or(EMPTY, |f| f.rotation.list);
        if let Some(value) = self.floats.consume(list) {
            self.rotation = value;
        }
        self.rotation
    }

    /// Current font size: innermost frame that sets one, else the enclosing
    /// non-text context, else the default.
    pub fn font_size(&self) -> f32 {
        for frame in self.frames.iter().rev() {
            if let Some(size) = frame.font.size {
                return size;
            }
        }
        self.outer_font_size.unwrap_or(DEFAULT_FONT_SIZE)
    }

    /// Cascade all font attributes, innermost first; the first frame that
    /// sets a field wins.
    pub fn font(&self) -> FontDescriptor {
        let mut family = None;
        let mut weight = None;
        let mut style = None;
        let mut kerning = None;
        let mut letter_spacing = None;
        let mut word_spacing = None;
        let mut text_anchor = None;
        let mut text_decoration = None;

        for frame in self.frames.iter().rev() {
            let font = &frame.font;
            family = family.or_else(|| font.family.clone());
            weight = weight.or(font.weight);
            style = style.or(font.style);
            kerning = kerning.or(font.kerning);
            letter_spacing = letter_spacing.or(font.letter_spacing);
            word_spacing = word_spacing.or(font.word_spacing);
            text_anchor = text_anchor.or(font.text_anchor);
            text_decoration = text_decoration.or(font.text_decoration);
        }

        FontDescriptor {
            family,
            size: self.font_size(),
            weight: weight.unwrap_or_default(),
            style: style.unwrap_or_default(),
            kerning: kerning.unwrap_or(0.0),
            kerning_set: kerning.is_some(),
            letter_spacing: letter_spacing.unwrap_or(0.0),
            word_spacing: word_spacing.unwrap_or(0.0),
            text_anchor: text_anchor.unwrap_or_default(),
            text_decoration: text_decoration.unwrap_or_default(),
        }
    }
}
