//! Indentation re-flow over a char range.
//!
//! Writeback hands the re-flow step the freshly written region plus one
//! following char, so the implementation always sees the line after the
//! region. The reference impl restores a recorded margin inside the region
//! and only touches (reports modified, rewrites nothing) the partially
//! covered following line; editor hosts can substitute their own
//! language-aware indenter through the trait.

use tracing::trace;

use crate::{Document, GuardViolation};

/// What a re-flow pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReflowReport {
    /// Lines whose indentation was rewritten.
    pub reindented: usize,
    /// Whether the pass reached a line it did not fully cover.
    pub touched_following: bool,
    /// Net chars the rewrites added to the range (negative when indentation
    /// shrank). Callers tracking the range extent apply this to its end.
    pub delta: isize,
}

/// Indentation re-flow over an arbitrary char range of a document.
pub trait Reflow {
    fn name(&self) -> &'static str;

    /// Re-indent every line intersecting `[start, end)`. `margin` is the
    /// left margin removed from the region when it was extracted; impls may
    /// ignore it.
    fn reflow(
        &self,
        doc: &mut Document,
        start: usize,
        end: usize,
        margin: &str,
    ) -> Result<ReflowReport, GuardViolation>;
}

impl<T: Reflow + ?Sized> Reflow for &T {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn reflow(
        &self,
        doc: &mut Document,
        start: usize,
        end: usize,
        margin: &str,
    ) -> Result<ReflowReport, GuardViolation> {
        (**self).reflow(doc, start, end, margin)
    }
}

/// Reference re-flow: lines fully inside the range get exactly `margin` as
/// indentation (blank lines stay bare); a partially covered line is touched
/// but left intact.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarginReflow;

impl Reflow for MarginReflow {
    fn name(&self) -> &'static str {
        "margin"
    }

    fn reflow(
        &self,
        doc: &mut Document,
        start: usize,
        end: usize,
        margin: &str,
    ) -> Result<ReflowReport, GuardViolation> {
        let mut report = ReflowReport::default();
        let end = end.min(doc.len());
        if start >= end {
            return Ok(report);
        }
        // Classify lines against the original offsets first; the indent
        // splices below shift offsets but never line membership.
        let first = doc.line_of(start);
        let last = doc.line_of(end - 1);
        let plan: Vec<(usize, bool)> = (first..=last)
            .map(|idx| {
                let fully_inside = doc.line_start(idx) >= start && doc.line_end(idx) < end;
                (idx, fully_inside)
            })
            .collect();
        for (idx, fully_inside) in plan {
            if !fully_inside {
                report.touched_following = true;
                continue;
            }
            if doc.is_blank_line(idx) {
                continue;
            }
            let indent = doc.line_indent(idx);
            if indent == margin {
                continue;
            }
            let line_start = doc.line_start(idx);
            let indent_chars = indent.chars().count();
            doc.splice(line_start, line_start + indent_chars, margin)?;
            report.reindented += 1;
            report.delta += margin.chars().count() as isize - indent_chars as isize;
        }
        // Reaching into the following line counts as a modification report
        // for indented regions even when its text is untouched.
        if report.touched_following && !margin.is_empty() {
            doc.mark_modified();
        }
        trace!(
            target: "doc.reflow",
            start,
            end,
            reindented = report.reindented,
            touched_following = report.touched_following,
            "reflow"
        );
        Ok(report)
    }
}
