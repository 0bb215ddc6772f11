//! Edit session state.
//!
//! A session ties together everything one in-progress comment edit needs:
//! the live boundary marks in the source document, the guard protecting
//! that range, the captured comment [`Marker`], the indentation margin, and
//! the marker-free [`WorkingText`] the host is editing. Sessions are plain
//! state; the operations that create, commit, and tear them down live a
//! crate above, so this crate never mutates a document.

pub mod registry;

pub use registry::{MetricsSnapshot, SessionMetrics, SessionRegistry};

use std::fmt;
use std::ops::Range;

use sidenote_doc::{GuardId, MarkPairId};
use sidenote_syntax::RenderMode;

/// A captured comment marker.
///
/// `raw` is the literal text the pattern matched on the first marker line,
/// e.g. `"//"` or `"/// "`. `canonical` is what writeback re-emits: the raw
/// match with a single trailing space appended when the match lacked one.
/// Two raw matches belong to the same marker when their canonical forms are
/// equal, so `"//"` and `"// "` lines mix freely while `"///"` stays
/// distinct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    raw: String,
    canonical: String,
}

fn canonical_of(raw: &str) -> String {
    if raw.ends_with(' ') {
        raw.to_string()
    } else {
        format!("{raw} ")
    }
}

impl Marker {
    /// Captures the marker from the first successful pattern match.
    pub fn capture(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            canonical: canonical_of(raw),
        }
    }

    /// The literal first match.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The form prepended to every line on writeback.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Whether another line's raw match denotes this same marker.
    pub fn accepts(&self, raw: &str) -> bool {
        canonical_of(raw) == self.canonical
    }
}

/// The marker-free text a host edits between extraction and writeback.
///
/// Offsets into the working text are byte offsets on char boundaries, the
/// same contract as [`String::replace_range`]. The text is guaranteed to
/// end with a newline after extraction; hosts that delete everything leave
/// it empty, which commits back as an empty block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingText {
    text: String,
}

impl WorkingText {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Replaces the whole text.
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Replaces a byte range, as [`String::replace_range`].
    pub fn replace_range(&mut self, range: Range<usize>, replacement: &str) {
        self.text.replace_range(range, replacement);
    }

    /// Appends a newline unless the text is empty or already ends with one.
    pub fn ensure_trailing_newline(&mut self) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
    }

    /// The lines of the text, without terminators.
    pub fn lines(&self) -> std::str::Lines<'_> {
        self.text.lines()
    }

    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }
}

/// Identifier for one edit session, unique per registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub(crate) u64);

impl SessionId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Boundary live, range guarded, working text editable.
    Active,
    /// Torn down; the session record remains only as a receipt.
    Closed,
}

/// One in-progress comment edit.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    boundary: MarkPairId,
    guard: GuardId,
    label: String,
    working: WorkingText,
    marker: Option<Marker>,
    margin: String,
    dropped: Vec<usize>,
    render: RenderMode,
    render_fallback: bool,
    view_token: Option<u64>,
    phase: Phase,
}

impl Session {
    /// Opens an active session over a guarded boundary.
    pub fn open(id: SessionId, boundary: MarkPairId, guard: GuardId, label: String) -> Self {
        Self {
            id,
            boundary,
            guard,
            label,
            working: WorkingText::default(),
            marker: None,
            margin: String::new(),
            dropped: Vec::new(),
            render: RenderMode::Plain,
            render_fallback: false,
            view_token: None,
            phase: Phase::Active,
        }
    }

    /// Installs the results of marker extraction.
    pub fn set_extract(
        &mut self,
        working: WorkingText,
        marker: Option<Marker>,
        margin: String,
        dropped: Vec<usize>,
    ) {
        self.working = working;
        self.marker = marker;
        self.margin = margin;
        self.dropped = dropped;
    }

    /// Records the selected presentation, and whether it was a fallback
    /// after a failed setup hook.
    pub fn set_render(&mut self, mode: RenderMode, fallback: bool) {
        self.render = mode;
        self.render_fallback = fallback;
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn boundary(&self) -> MarkPairId {
        self.boundary
    }

    pub fn guard(&self) -> GuardId {
        self.guard
    }

    /// Replaces the guard after writeback re-protects the new extent.
    pub fn set_guard(&mut self, guard: GuardId) {
        self.guard = guard;
    }

    /// Human-readable owner tag used in guard violations, e.g. `"lib.rs:41"`.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    /// Marks the session closed. State transitions only forward.
    pub fn close(&mut self) {
        self.phase = Phase::Closed;
    }

    pub fn working(&self) -> &WorkingText {
        &self.working
    }

    pub fn working_mut(&mut self) -> &mut WorkingText {
        &mut self.working
    }

    /// Takes the working text out, leaving it empty. Used at teardown.
    pub fn take_working(&mut self) -> WorkingText {
        std::mem::take(&mut self.working)
    }

    pub fn marker(&self) -> Option<&Marker> {
        self.marker.as_ref()
    }

    /// The common indentation removed from every block line at extraction,
    /// restored on writeback.
    pub fn margin(&self) -> &str {
        &self.margin
    }

    /// Indices (within the margin-normalized block) of lines dropped during
    /// extraction because they did not carry the session marker.
    pub fn dropped_lines(&self) -> &[usize] {
        &self.dropped
    }

    pub fn render(&self) -> RenderMode {
        self.render
    }

    /// True when presentation setup failed and the session fell back to
    /// plain.
    pub fn render_fallback(&self) -> bool {
        self.render_fallback
    }

    /// Opaque host-side view handle associated with this session, if any.
    pub fn view_token(&self) -> Option<u64> {
        self.view_token
    }

    pub fn set_view_token(&mut self, token: Option<u64>) {
        self.view_token = token;
    }
}
