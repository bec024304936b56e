//! Source location tracking.
//!
//! Spans are byte-offset half-open ranges into the original source text.
//! The lowering core never interprets source text itself; spans exist so
//! diagnostics and the tree printer can point back at syntax.

use serde::Serialize;

/// A half-open byte range `[start, end)` into the source text.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// The zero span used for synthesized nodes with no source counterpart.
    #[must_use]
    pub const fn empty() -> Self {
        Self { start: 0, end: 0 }
    }

    #[must_use]
    pub const fn len(self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start >= self.end
    }

    /// Smallest span covering both `self` and `other`.
    #[must_use]
    pub fn join(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Slice the originating source text, clamped to the text bounds.
    /// A span that cuts through a multi-byte character yields `""` rather
    /// than panicking; spans come from callers the core cannot vet.
    #[must_use]
    pub fn excerpt(self, source: &str) -> &str {
        let start = (self.start as usize).min(source.len());
        let end = (self.end as usize).clamp(start, source.len());
        source.get(start..end).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_ignores_empty_spans() {
        let a = Span::new(4, 10);
        assert_eq!(a.join(Span::empty()), a);
        assert_eq!(Span::empty().join(a), a);
        assert_eq!(Span::new(2, 5).join(Span::new(8, 12)), Span::new(2, 12));
    }

    #[test]
    fn excerpt_is_clamped() {
        let src = "if (x) {}";
        assert_eq!(Span::new(4, 5).excerpt(src), "x");
        assert_eq!(Span::new(4, 999).excerpt(src), "x) {}");
        assert_eq!(Span::new(999, 1000).excerpt(src), "");
    }

    #[test]
    fn excerpt_tolerates_mid_character_spans() {
        // 'é' occupies bytes 4..6; a span ending inside it is not sliceable.
        let src = "if (état)";
        assert_eq!(Span::new(4, 6).excerpt(src), "é");
        assert_eq!(Span::new(4, 5).excerpt(src), "");
        assert_eq!(Span::new(5, 8).excerpt(src), "");
    }
}
