//! Snapshot undo/redo.
//!
//! Every committed mutation is preceded by a deep copy of the whole document
//! pushed onto `past`. Undo swaps the current document with the newest past
//! snapshot and parks the current one on `future`; redo does the reverse.
//!
//! Drag gestures use **batching**: the document is captured when the gesture
//! starts, live previews mutate it without recording, and the gesture's end
//! records the captured start as one undo step if anything changed.

use pd_core::Document;
use std::collections::VecDeque;

pub struct History {
    /// Oldest first; the cap evicts from the front.
    past: VecDeque<Document>,
    future: Vec<Document>,
    /// Maximum undo depth.
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Document captured at the start of the outermost batch.
    batch_start: Option<Document>,
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            max_depth: max_depth.max(1),
            batch_depth: 0,
            batch_start: None,
        }
    }

    /// Record the document as it was before a mutation. Inside a batch this
    /// is a no-op: the batch start already covers it.
    pub fn record(&mut self, snapshot: Document) {
        if self.batch_depth > 0 {
            return;
        }
        self.push(snapshot);
    }

    fn push(&mut self, snapshot: Document) {
        self.past.push_back(snapshot);
        if self.past.len() > self.max_depth {
            self.past.pop_front();
        }
        self.future.clear();
    }

    /// Restore the newest past snapshot into `current`.
    pub fn undo(&mut self, current: &mut Document) -> bool {
        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        self.future.push(std::mem::replace(current, previous));
        true
    }

    /// Reapply the most recently undone snapshot into `current`.
    pub fn redo(&mut self, current: &mut Document) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };
        self.past.push_back(std::mem::replace(current, next));
        true
    }

    /// Start a batch. Only the outermost call captures the document.
    pub fn begin_batch(&mut self, current: &Document) {
        if self.batch_depth == 0 {
            self.batch_start = Some(current.clone());
        }
        self.batch_depth += 1;
    }

    /// End a batch. When the outermost batch closes, records the captured
    /// start as one step if `current` differs from it. Returns whether a step
    /// was recorded.
    pub fn end_batch(&mut self, current: &Document) -> bool {
        if self.batch_depth == 0 {
            return false;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return false;
        }
        match self.batch_start.take() {
            Some(start) if start != *current => {
                self.push(start);
                true
            }
            _ => false,
        }
    }

    /// Abandon every open batch, handing back the captured start document
    /// for the caller to restore. History itself is untouched.
    pub fn cancel_batch(&mut self) -> Option<Document> {
        self.batch_depth = 0;
        self.batch_start.take()
    }

    pub fn in_batch(&self) -> bool {
        self.batch_depth > 0
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.past.len()
    }

    pub fn redo_len(&self) -> usize {
        self.future.len()
    }

    /// Every document history still holds: past, future and an open batch
    /// start.
    pub fn snapshots(&self) -> impl Iterator<Item = &Document> {
        self.past
            .iter()
            .chain(self.future.iter())
            .chain(self.batch_start.iter())
    }

    /// Drop every snapshot and any open batch.
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
        self.batch_depth = 0;
        self.batch_start = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_core::Page;

    fn doc_with_pages(n: usize) -> Document {
        Document {
            pages: (0..n).map(|_| Page::new()).collect(),
        }
    }

    #[test]
    fn undo_then_redo_swaps_documents() {
        let mut history = History::new(10);
        let mut doc = doc_with_pages(1);
        let before = doc.clone();

        history.record(doc.clone());
        doc.pages.push(Page::new());
        let after = doc.clone();

        assert!(history.undo(&mut doc));
        assert_eq!(doc, before);
        assert!(history.redo(&mut doc));
        assert_eq!(doc, after);
        assert!(!history.redo(&mut doc));
    }

    #[test]
    fn record_clears_redo() {
        let mut history = History::new(10);
        let mut doc = doc_with_pages(1);
        history.record(doc.clone());
        doc.pages.push(Page::new());
        history.undo(&mut doc);
        assert!(history.can_redo());

        history.record(doc.clone());
        assert!(!history.can_redo());
    }

    #[test]
    fn depth_cap_drops_oldest() {
        let mut history = History::new(3);
        let mut doc = doc_with_pages(1);
        for _ in 0..5 {
            history.record(doc.clone());
            doc.pages.push(Page::new());
        }
        assert_eq!(history.undo_len(), 3);
        while history.undo(&mut doc) {}
        assert_eq!(doc.pages.len(), 3);
    }

    #[test]
    fn long_sessions_keep_the_newest_steps_in_order() {
        let mut history = History::new(50);
        let mut doc = doc_with_pages(1);
        for _ in 0..500 {
            history.record(doc.clone());
            doc.pages.push(Page::new());
        }
        assert_eq!(history.undo_len(), 50);
        assert!(history.undo(&mut doc));
        assert_eq!(doc.pages.len(), 500);
        while history.undo(&mut doc) {}
        assert_eq!(doc.pages.len(), 451);
    }

    #[test]
    fn snapshots_cover_past_future_and_batch() {
        let mut history = History::new(10);
        let mut doc = doc_with_pages(1);
        history.record(doc.clone());
        doc.pages.push(Page::new());
        history.record(doc.clone());
        doc.pages.push(Page::new());
        history.undo(&mut doc);
        history.begin_batch(&doc);

        let mut sizes: Vec<usize> = history.snapshots().map(|d| d.pages.len()).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, [1, 2, 3]);
    }

    #[test]
    fn batch_records_once_and_only_on_change() {
        let mut history = History::new(10);
        let mut doc = doc_with_pages(1);

        history.begin_batch(&doc);
        history.begin_batch(&doc);
        history.record(doc.clone());
        doc.pages.push(Page::new());
        assert!(!history.end_batch(&doc));
        assert!(history.end_batch(&doc));
        assert_eq!(history.undo_len(), 1);

        history.begin_batch(&doc);
        assert!(!history.end_batch(&doc));
        assert_eq!(history.undo_len(), 1);
    }

    #[test]
    fn cancel_hands_back_start() {
        let mut history = History::new(10);
        let mut doc = doc_with_pages(1);
        let start = doc.clone();
        history.begin_batch(&doc);
        doc.pages.push(Page::new());
        assert_eq!(history.cancel_batch(), Some(start));
        assert!(!history.in_batch());
        assert!(!history.can_undo());
    }
}
