//! Session bookkeeping for one document.
//!
//! The registry owns every session opened against a document, allocates
//! their ids, and answers the one query boundary detection needs: is there
//! already an active session whose boundary overlaps a freshly detected
//! run. It also keeps lifetime counters so hosts can expose how the editing
//! core is being used.

use std::sync::atomic::{AtomicU64, Ordering};

use sidenote_doc::Document;
use tracing::trace;

use crate::{Session, SessionId};

/// Lifetime counters for session activity.
///
/// Counters only ever increase; [`SessionMetrics::snapshot`] gives a
/// consistent-enough point-in-time copy for display.
#[derive(Debug, Default)]
pub struct SessionMetrics {
    opened: AtomicU64,
    resumed: AtomicU64,
    committed: AtomicU64,
    discarded: AtomicU64,
    render_fallbacks: AtomicU64,
}

/// Plain-data copy of [`SessionMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub opened: u64,
    pub resumed: u64,
    pub committed: u64,
    pub discarded: u64,
    pub render_fallbacks: u64,
}

impl SessionMetrics {
    pub fn record_opened(&self) {
        self.opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_resumed(&self) {
        self.resumed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_committed(&self) {
        self.committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_discarded(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_render_fallback(&self) {
        self.render_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            opened: self.opened.load(Ordering::Relaxed),
            resumed: self.resumed.load(Ordering::Relaxed),
            committed: self.committed.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            render_fallbacks: self.render_fallbacks.load(Ordering::Relaxed),
        }
    }
}

/// All sessions for one document, active and closed.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Vec<Session>,
    next_id: u64,
    metrics: SessionMetrics,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out the next session id. Ids start at 1 so 0 can mean "no
    /// session" in host-side bookkeeping.
    pub fn allocate_id(&mut self) -> SessionId {
        self.next_id += 1;
        SessionId(self.next_id)
    }

    pub fn insert(&mut self, session: Session) {
        trace!(
            target: "session",
            id = session.id().raw(),
            label = session.label(),
            "session_registered"
        );
        self.sessions.push(session);
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id() == id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id() == id)
    }

    /// Removes a session record entirely.
    pub fn remove(&mut self, id: SessionId) -> Option<Session> {
        let idx = self.sessions.iter().position(|s| s.id() == id)?;
        Some(self.sessions.remove(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    /// Ids of every active session, in creation order.
    pub fn active_ids(&self) -> Vec<SessionId> {
        self.sessions
            .iter()
            .filter(|s| s.is_active())
            .map(|s| s.id())
            .collect()
    }

    /// Finds an active session whose boundary overlaps `[start, end)`.
    ///
    /// Equal extents count as overlap, so re-detecting the exact block of
    /// an open session finds that session. Boundaries of distinct sessions
    /// never overlap each other, so the first hit is the only hit.
    pub fn find_active_overlapping(
        &self,
        doc: &Document,
        start: usize,
        end: usize,
    ) -> Option<SessionId> {
        self.sessions
            .iter()
            .filter(|s| s.is_active())
            .find_map(|s| {
                let (bs, be) = doc.mark_extent(s.boundary())?;
                (bs < end && be > start).then_some(s.id())
            })
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }
}
