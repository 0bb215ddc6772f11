//! Positional lexical state.
//!
//! [`LexicalTracker`] is the seam between boundary detection and language
//! knowledge: given a document and a character offset, report whether that
//! offset is inside a line comment, and if not, whether the surrounding
//! lexical context is settled enough to trust the answer. [`ScanTracker`]
//! is the built-in implementation on top of the line scanner; hosts with a
//! real parser can provide their own.

use std::cell::RefCell;

use sidenote_doc::Document;
use tracing::trace;

use crate::scan::{self, LineShape};
use crate::CommentSyntax;

/// Lexical classification of one character offset.
///
/// The comment extent convention matters to callers walking backward: the
/// offset of a marker's first character is *not* inside the comment (the
/// comment starts strictly after it begins, so a walk can land on the
/// marker and stop), while the offset one past the line's last character is
/// inside, because the following newline or end of text still belongs to
/// the comment line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexState {
    /// Offset falls inside a line comment.
    pub in_comment: bool,
    /// Offset of the comment marker's first character, when `in_comment`.
    pub comment_start: Option<usize>,
    /// False when the offset sits mid-token, e.g. inside an unterminated
    /// string literal, and the in/out answer should not be trusted yet.
    pub parse_complete: bool,
}

impl LexState {
    /// State for plain code: not a comment, parse settled.
    pub fn outside() -> Self {
        Self {
            in_comment: false,
            comment_start: None,
            parse_complete: true,
        }
    }
}

/// Answers lexical queries for a document.
pub trait LexicalTracker {
    /// Implementation name, for diagnostics.
    fn name(&self) -> &'static str;

    /// Classifies `offset` (clamped to the document length).
    fn state_at(&self, doc: &Document, offset: usize) -> LexState;
}

impl<T: LexicalTracker + ?Sized> LexicalTracker for &T {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn state_at(&self, doc: &Document, offset: usize) -> LexState {
        (**self).state_at(doc, offset)
    }
}

struct ShapeCache {
    revision: u64,
    shapes: Vec<LineShape>,
}

/// Line-scanning tracker.
///
/// Scans whole lines with the [`CommentSyntax`] marker pattern and caches
/// the per-line results keyed on the document revision, so repeated queries
/// between edits cost one lookup.
pub struct ScanTracker {
    syntax: CommentSyntax,
    cache: RefCell<Option<ShapeCache>>,
}

impl ScanTracker {
    pub fn new(syntax: CommentSyntax) -> Self {
        Self {
            syntax,
            cache: RefCell::new(None),
        }
    }

    pub fn syntax(&self) -> &CommentSyntax {
        &self.syntax
    }

    fn with_shapes<R>(&self, doc: &Document, f: impl FnOnce(&[LineShape]) -> R) -> R {
        let mut slot = self.cache.borrow_mut();
        let stale = match slot.as_ref() {
            Some(cache) => cache.revision != doc.revision(),
            None => true,
        };
        if stale {
            let shapes: Vec<LineShape> = (0..doc.line_count())
                .map(|idx| line_shape_of(&self.syntax, doc, idx))
                .collect();
            trace!(
                target: "syntax.scan",
                revision = doc.revision(),
                lines = shapes.len(),
                "shape_cache_rebuilt"
            );
            *slot = Some(ShapeCache {
                revision: doc.revision(),
                shapes,
            });
        }
        match slot.as_ref() {
            Some(cache) => f(&cache.shapes),
            None => f(&[]),
        }
    }
}

fn line_shape_of(syntax: &CommentSyntax, doc: &Document, idx: usize) -> LineShape {
    match doc.line(idx) {
        Some(line) => scan::line_shape(syntax, &line),
        None => LineShape {
            blank: true,
            marker_col: None,
        },
    }
}

impl LexicalTracker for ScanTracker {
    fn name(&self) -> &'static str {
        "line-scan"
    }

    fn state_at(&self, doc: &Document, offset: usize) -> LexState {
        if doc.is_empty() {
            return LexState::outside();
        }
        let offset = offset.min(doc.len());
        let idx = doc.line_of(offset);
        let line_start = doc.line_start(idx);
        let shape = self.with_shapes(doc, |shapes| shapes.get(idx).copied());
        let Some(shape) = shape else {
            return LexState::outside();
        };
        if let Some(col) = shape.marker_col {
            let marker = line_start + col;
            if offset > marker && offset <= doc.line_end(idx) {
                return LexState {
                    in_comment: true,
                    comment_start: Some(marker),
                    parse_complete: true,
                };
            }
        }
        let col = offset - line_start;
        let mid_string = match doc.line(idx) {
            Some(line) => scan::in_string_at(&self.syntax, &line, col),
            None => false,
        };
        LexState {
            in_comment: false,
            comment_start: None,
            parse_complete: !mid_string,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tracker() -> ScanTracker {
        ScanTracker::new(CommentSyntax::for_language("rust").unwrap())
    }

    fn doc(text: &str) -> Document {
        Document::from_str("lex.rs", text).unwrap()
    }

    #[test]
    fn inside_comment_reports_marker_start() {
        let doc = doc("let x = 1;\n// note\n");
        let tracker = tracker();
        let state = tracker.state_at(&doc, 14);
        assert!(state.in_comment);
        assert_eq!(state.comment_start, Some(11));
        assert!(state.parse_complete);
    }

    #[test]
    fn marker_start_itself_is_outside() {
        let doc = doc("// note\n");
        let tracker = tracker();
        let state = tracker.state_at(&doc, 0);
        assert!(!state.in_comment);
        let state = tracker.state_at(&doc, 1);
        assert!(state.in_comment);
        assert_eq!(state.comment_start, Some(0));
    }

    #[test]
    fn trailing_newline_of_comment_line_is_inside() {
        let doc = doc("// note\nnext\n");
        let tracker = tracker();
        assert!(tracker.state_at(&doc, 7).in_comment);
        assert!(!tracker.state_at(&doc, 8).in_comment);
    }

    #[test]
    fn end_of_text_after_comment_is_inside() {
        let doc = doc("// tail");
        let tracker = tracker();
        let state = tracker.state_at(&doc, 7);
        assert!(state.in_comment);
        assert_eq!(state.comment_start, Some(0));
    }

    #[test]
    fn offset_inside_string_is_parse_incomplete() {
        let doc = doc("let s = \"ab // c\";\n");
        let tracker = tracker();
        let state = tracker.state_at(&doc, 11);
        assert!(!state.in_comment);
        assert!(!state.parse_complete);
    }

    #[test]
    fn code_before_trailing_comment_is_outside() {
        let doc = doc("let x = 1; // tail\n");
        let tracker = tracker();
        let state = tracker.state_at(&doc, 4);
        assert!(!state.in_comment);
        assert!(state.parse_complete);
        assert!(tracker.state_at(&doc, 12).in_comment);
    }

    #[test]
    fn cache_refreshes_after_edits() {
        let mut doc = doc("// a\n");
        let tracker = tracker();
        assert!(tracker.state_at(&doc, 2).in_comment);
        doc.splice(0, 5, "let x;\n").unwrap();
        let state = tracker.state_at(&doc, 2);
        assert!(!state.in_comment);
    }

    #[test]
    fn empty_document_is_plain_code() {
        let doc = doc("");
        let tracker = tracker();
        assert_eq!(tracker.state_at(&doc, 0), LexState::outside());
    }
}
