//! Session completion tracking.
//!
//! A session is finished when two conditions hold at once: the container
//! has no more entries, and every sub-reader that was opened has raised its
//! completion signal. The conditions become true in no particular order, so
//! [`Lifecycle`] keeps both and reports the transition exactly once.
//!
//! Sub-readers hold a [`Completion`], a one-shot handle that sends the
//! reader's key on a completion channel when it is signalled or dropped.
//! Because signalling consumes the handle, a reader cannot report twice.

use std::fmt;
use std::sync::mpsc::{Receiver, Sender};

/// The two kinds of per-sheet sub-reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReaderKind {
    Worksheet,
    Hyperlinks,
}

/// Identity of a sub-reader within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReaderKey {
    pub kind: ReaderKind,
    pub sheet: u32,
}

impl ReaderKey {
    #[inline]
    pub fn worksheet(sheet: u32) -> Self {
        Self {
            kind: ReaderKind::Worksheet,
            sheet,
        }
    }

    #[inline]
    pub fn hyperlinks(sheet: u32) -> Self {
        Self {
            kind: ReaderKind::Hyperlinks,
            sheet,
        }
    }
}

impl fmt::Display for ReaderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ReaderKind::Worksheet => write!(f, "worksheet {}", self.sheet),
            ReaderKind::Hyperlinks => write!(f, "hyperlinks {}", self.sheet),
        }
    }
}

/// Two-flag completion state machine.
#[derive(Debug, Default)]
pub struct Lifecycle {
    open_readers: usize,
    container_exhausted: bool,
    finished: bool,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sub-reader was created.
    #[inline]
    pub fn reader_opened(&mut self) {
        self.open_readers += 1;
    }

    /// A sub-reader signalled completion.
    ///
    /// Returns `true` if this transition finished the session.
    #[must_use]
    pub fn reader_finished(&mut self) -> bool {
        debug_assert!(self.open_readers > 0, "completion without an open reader");
        self.open_readers = self.open_readers.saturating_sub(1);
        self.try_finish()
    }

    /// The container reported its last entry.
    ///
    /// Returns `true` if this transition finished the session.
    #[must_use]
    pub fn container_exhausted(&mut self) -> bool {
        self.container_exhausted = true;
        self.try_finish()
    }

    fn try_finish(&mut self) -> bool {
        if self.finished || !self.container_exhausted || self.open_readers > 0 {
            return false;
        }
        self.finished = true;
        true
    }

    #[inline]
    pub fn open_readers(&self) -> usize {
        self.open_readers
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.container_exhausted
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// One-shot completion handle owned by a sub-reader.
#[derive(Debug)]
pub struct Completion {
    key: ReaderKey,
    tx: Option<Sender<ReaderKey>>,
}

impl Completion {
    pub(crate) fn new(key: ReaderKey, tx: Sender<ReaderKey>) -> Self {
        Self { key, tx: Some(tx) }
    }

    #[inline]
    pub fn key(&self) -> ReaderKey {
        self.key
    }

    /// Raise the completion signal.
    pub fn signal(mut self) {
        self.send();
    }

    fn send(&mut self) {
        if let Some(tx) = self.tx.take() {
            // The registry owns the receiver for the whole session; a send
            // can only fail after the session itself was dropped.
            let _ = tx.send(self.key);
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        self.send();
    }
}

/// Drain pending completion messages without blocking.
pub(crate) fn pending(rx: &Receiver<ReaderKey>) -> impl Iterator<Item = ReaderKey> + '_ {
    rx.try_iter()
}
