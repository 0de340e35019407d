//! Render-pass-scoped definitions.
//!
//! Elements can reference geometry declared elsewhere in the tree by id
//! (`clip-path="url(#frame)"`). The table lives for exactly one render pass
//! and is owned by the pass root; whichever component resolves a reference
//! borrows it. Entries are removed explicitly when their owning node leaves
//! the tree: there is no process-wide registry and no reliance on
//! finalization.

use std::collections::HashMap;

use lyon::path::{FillRule, Path};

/// A clip definition: plain path geometry plus the rule to fill it with.
#[derive(Debug, Clone)]
pub struct ClipDef {
    pub path: Path,
    pub fill_rule: FillRule,
}

/// Id-addressed definitions for one render pass.
#[derive(Debug, Default)]
pub struct DefsTable {
    entries: HashMap<String, ClipDef>,
}

impl DefsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition under `id`, replacing any previous holder.
    pub fn define(&mut self, id: impl Into<String>, def: ClipDef) {
        self.entries.insert(id.into(), def);
    }

    /// Remove the entry when its owning node is removed from the tree.
    pub fn remove(&mut self, id: &str) -> Option<ClipDef> {
        self.entries.remove(id)
    }

    /// Resolve a reference in any of the accepted spellings:
    /// `url(#id)`, `#id`, or a bare `id`.
    pub fn resolve(&self, reference: &str) -> Option<&ClipDef> {
        self.entries.get(reference_id(reference))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn reference_id(reference: &str) -> &str {
    let r = reference.trim();
    let r = r
        .strip_prefix("url(")
        .and_then(|r| r.strip_suffix(')'))
        .unwrap_or(r)
        .trim();
    r.strip_prefix('#').unwrap_or(r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyon::math::point;

    fn square() -> ClipDef {
        let mut b = Path::builder();
        b.begin(point(0.0, 0.0));
        b.line_to(point(1.0, 0.0));
        b.line_to(point(1.0, 1.0));
        b.close();
        ClipDef {
            path: b.build(),
            fill_rule: FillRule::NonZero,
        }
    }

    #[test]
    fn resolves_all_reference_spellings() {
        let mut defs = DefsTable::new();
        defs.define("frame", square());

        assert!(defs.resolve("frame").is_some());
        assert!(defs.resolve("#frame").is_some());
        assert!(defs.resolve("url(#frame)").is_some());
        assert!(defs.resolve(" url( #frame ) ").is_some());
        assert!(defs.resolve("url(#other)").is_none());
    }

    #[test]
    fn removal_is_explicit_and_scoped() {
        let mut defs = DefsTable::new();
        defs.define("a", square());
        assert_eq!(defs.len(), 1);

        assert!(defs.remove("a").is_some());
        assert!(defs.resolve("url(#a)").is_none());
        assert!(defs.is_empty());
        // Removing twice is a no-op, not an error.
        assert!(defs.remove("a").is_none());
    }
}
