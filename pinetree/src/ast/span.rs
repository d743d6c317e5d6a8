//! Source positions attached to AST nodes

use serde::{Deserialize, Serialize};

/// A byte range in the source text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl From<Span> for std::ops::Range<usize> {
    fn from(span: Span) -> Self {
        span.start..span.end
    }
}

/// A node together with the source range it was parsed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }

    pub fn boxed(self) -> Box<Spanned<T>> {
        Box::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_to_covers_both() {
        assert_eq!(Span::new(4, 8).to(Span::new(1, 5)), Span::new(1, 8));
        assert_eq!(Span::new(0, 2).to(Span::new(10, 12)), Span::new(0, 12));
    }

    #[test]
    fn test_span_display() {
        assert_eq!(Span::new(3, 9).to_string(), "3..9");
    }

    #[test]
    fn test_span_into_range() {
        let range: std::ops::Range<usize> = Span::new(2, 6).into();
        assert_eq!(range, 2..6);
    }

    #[test]
    fn test_spanned_keeps_span() {
        let s = Spanned::new("x".to_string(), Span::new(7, 8));
        assert_eq!(s.boxed().span, Span::new(7, 8));
    }
}
