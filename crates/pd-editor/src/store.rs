//! Document store: the single source of truth every surface reads from.
//!
//! Owns the document, the active page, the selection, the current tool, the
//! undo history and the image decode states. All mutations go through here
//! and are synchronous; every committed mutation snapshots the document
//! into history first. Surfaces poll `revision()` or drain `StoreEvent`s to
//! know when to re-render.

use crate::history::History;
use crate::tools::ToolKind;
use pd_core::codec::{self, DeserializationError, SerializationError};
use pd_core::geometry::Bounds;
use pd_core::hit::NodeRef;
use pd_core::layout::{PanelLayout, panel_geometry};
use pd_core::{
    Direction, Document, EditorConfig, ItemMut, ItemRef, NodeDraft, NodeId, NodeKind, NodePatch,
    Page, Panel, Slot,
};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// What the user has selected: an item plus the panel that owns it. A
/// selected panel is its own owner.
pub type Selection = NodeRef;

/// Opaque handle to pixels decoded by the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedImage {
    pub handle: ImageHandle,
    pub natural_width: f32,
    pub natural_height: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure {
    pub reason: String,
}

/// Decode lifecycle of an image node's source. Never persisted.
///
/// States are keyed by node id *and* source, so copies of a node on
/// duplicated pages share a decode until one of them changes `src`.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageState {
    Pending,
    Ready(DecodedImage),
    Failed(DecodeFailure),
}

/// Change notifications for surfaces, in the order they happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    DocumentChanged,
    SelectionChanged,
    ToolChanged,
    ActivePageChanged,
    ImageResolved(NodeId),
}

type ImageKey = (NodeId, String);

/// `(id, src)` of every image node in `doc`.
fn image_sources(doc: &Document) -> impl Iterator<Item = (NodeId, &str)> {
    doc.pages.iter().flat_map(|page| {
        page.nodes().filter_map(|(node, _)| match &node.kind {
            NodeKind::Image { src, .. } => Some((node.id(), src.as_str())),
            _ => None,
        })
    })
}

pub struct Store {
    doc: Document,
    active: usize,
    selection: Option<Selection>,
    tool: ToolKind,
    history: History,
    images: HashMap<ImageKey, ImageState>,
    config: EditorConfig,
    revision: u64,
    events: Vec<StoreEvent>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Store {
    /// An empty single-page store.
    pub fn new(config: EditorConfig) -> Self {
        Self::with_document(Document::new(), config)
    }

    /// A store around an existing document. History starts empty.
    pub fn with_document(doc: Document, config: EditorConfig) -> Self {
        let doc = if doc.pages.is_empty() {
            Document::new()
        } else {
            doc
        };
        Self {
            doc,
            active: 0,
            selection: None,
            tool: ToolKind::Select,
            history: History::new(config.history_depth),
            images: HashMap::new(),
            config,
            revision: 0,
            events: Vec::new(),
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// The page being edited.
    pub fn page(&self) -> &Page {
        &self.doc.pages[self.active]
    }

    fn page_mut(&mut self) -> &mut Page {
        &mut self.doc.pages[self.active]
    }

    pub fn active_page(&self) -> usize {
        self.active
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// The selected item, if the selection still resolves.
    pub fn selected_node(&self) -> Option<ItemRef<'_>> {
        let sel = self.selection?;
        let slot = self.page().locate(sel.id, sel.owner)?;
        self.page().get(slot)
    }

    /// The panel new nodes are added to: the selected panel, or the panel
    /// owning the selected node. `None` means the loose list.
    pub fn active_container(&self) -> Option<NodeId> {
        let sel = self.selection?;
        let page = self.page();
        match page.locate(sel.id, sel.owner)? {
            Slot::Panel(i) => page.panels.get(i).map(Panel::id),
            slot => page.owner_of(slot),
        }
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Bumped on every observable change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn drain_events(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.events)
    }

    // ─── Bookkeeping ─────────────────────────────────────────────────────

    fn notify(&mut self, event: StoreEvent) {
        self.revision += 1;
        if self.events.last() != Some(&event) {
            self.events.push(event);
        }
    }

    fn checkpoint(&mut self) {
        self.history.record(self.doc.clone());
    }

    fn set_selection(&mut self, selection: Option<Selection>) {
        if self.selection != selection {
            self.selection = selection;
            self.notify(StoreEvent::SelectionChanged);
        }
    }

    /// A generated id not yet used on the active page.
    fn fresh_id(&self, prefix: &str) -> NodeId {
        loop {
            let id = NodeId::with_prefix(prefix);
            if !self.page().contains(id) {
                return id;
            }
        }
    }

    fn styled_panel(&self, id: NodeId, bounds: Bounds) -> Panel {
        let mut panel = Panel::new(id, bounds);
        panel.border_width = self.config.panel_border_width;
        panel.border_color = self.config.panel_border_color;
        panel.background_color = self.config.panel_background;
        panel
    }

    // ─── Node operations ─────────────────────────────────────────────────

    /// Append a node to the active container (top of its z-order) and
    /// select it.
    pub fn add_node(&mut self, draft: NodeDraft) -> NodeId {
        let id = self.fresh_id(draft.kind.tag());
        let owner = self.active_container();

        self.checkpoint();
        let node = draft.into_node(id);
        let page = self.page_mut();
        match owner.and_then(|pid| page.panels.iter().position(|p| p.id() == pid)) {
            Some(i) => page.panels[i].children.push(node),
            None => page.loose_elements.push(node),
        }

        log::debug!("added {id:?} to {}", owner.map_or("page".to_string(), |p| format!("{p:?}")));
        self.notify(StoreEvent::DocumentChanged);
        self.set_selection(Some(Selection { id, owner }));
        id
    }

    /// Append one panel and select it.
    pub fn add_panel(&mut self, bounds: Bounds) -> NodeId {
        let id = self.fresh_id("panel");
        self.checkpoint();
        let panel = self.styled_panel(id, bounds);
        self.page_mut().panels.push(panel);

        log::debug!("added panel {id:?} at {bounds:?}");
        self.notify(StoreEvent::DocumentChanged);
        self.set_selection(Some(NodeRef::in_panel(id, id)));
        id
    }

    /// Append the panels of a layout preset as one undo step.
    pub fn add_panel_layout(&mut self, layout: PanelLayout) -> SmallVec<[NodeId; 4]> {
        let c = &self.config;
        let geometry = panel_geometry(layout, c.canvas, c.margin, c.gutter);

        self.checkpoint();
        let mut ids = SmallVec::new();
        for bounds in geometry {
            let id = self.fresh_id("panel");
            let panel = self.styled_panel(id, bounds);
            self.page_mut().panels.push(panel);
            ids.push(id);
        }

        log::debug!("added {layout} layout: {ids:?}");
        self.notify(StoreEvent::DocumentChanged);
        ids
    }

    /// Returns whether an image source changed, which re-queues its decode.
    fn apply(&mut self, slot: Slot, patch: &NodePatch) -> bool {
        match self.page_mut().get_mut(slot) {
            Some(ItemMut::Node(node)) => {
                let before = node.kind.image_src().map(str::to_owned);
                node.apply_patch(patch);
                before.as_deref() != node.kind.image_src()
            }
            Some(ItemMut::Panel(panel)) => {
                panel.apply_patch(patch);
                false
            }
            None => false,
        }
    }

    /// Merge `patch` into a node or panel. A miss is a no-op and records
    /// nothing.
    pub fn update_node(&mut self, id: NodeId, patch: &NodePatch, owner: Option<NodeId>) -> bool {
        let Some(slot) = self.page().locate(id, owner) else {
            log::debug!("update_node: {id:?} not found");
            return false;
        };
        self.checkpoint();
        if self.apply(slot, patch) {
            self.prune_images();
        }
        log::debug!("updated {id:?}");
        self.notify(StoreEvent::DocumentChanged);
        true
    }

    /// Move a node or panel within its owning collection. At the boundary
    /// nothing changes and nothing is recorded.
    pub fn move_node(&mut self, id: NodeId, direction: Direction, owner: Option<NodeId>) -> bool {
        let Some(slot) = self.page().locate(id, owner) else {
            return false;
        };
        let before = self.doc.clone();
        if !self.page_mut().restack(slot, direction) {
            log::trace!("move_node: {id:?} already at the {direction:?} boundary");
            return false;
        }
        self.history.record(before);
        log::debug!("moved {id:?} {direction:?}");
        self.notify(StoreEvent::DocumentChanged);
        true
    }

    /// Remove a node, or a panel together with its children.
    pub fn delete_node(&mut self, id: NodeId, owner: Option<NodeId>) -> bool {
        let Some(slot) = self.page().locate(id, owner) else {
            return false;
        };
        self.checkpoint();
        self.page_mut().remove(slot);
        self.prune_images();

        let dropped_panel = matches!(slot, Slot::Panel(_));
        if let Some(sel) = self.selection
            && (sel.id == id || (dropped_panel && sel.owner == Some(id)))
        {
            self.set_selection(None);
        }
        log::debug!("deleted {id:?}");
        self.notify(StoreEvent::DocumentChanged);
        true
    }

    pub fn delete_selected(&mut self) -> bool {
        match self.selection {
            Some(sel) => self.delete_node(sel.id, sel.owner),
            None => false,
        }
    }

    /// Select an item. The owner is resolved from the page, so a stale hint
    /// still selects the right thing. Unknown ids are ignored.
    pub fn select(&mut self, id: NodeId, owner: Option<NodeId>) -> bool {
        let page = self.page();
        let Some(slot) = page.locate(id, owner) else {
            return false;
        };
        let owner = match slot {
            Slot::Panel(_) => Some(id),
            slot => page.owner_of(slot),
        };
        self.set_selection(Some(Selection { id, owner }));
        true
    }

    pub fn clear_selection(&mut self) {
        self.set_selection(None);
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        self.cancel_gesture();
        if !self.history.undo(&mut self.doc) {
            return false;
        }
        self.after_restore();
        log::debug!("undo");
        true
    }

    pub fn redo(&mut self) -> bool {
        self.cancel_gesture();
        if !self.history.redo(&mut self.doc) {
            return false;
        }
        self.after_restore();
        log::debug!("redo");
        true
    }

    fn after_restore(&mut self) {
        self.clamp_active();
        self.notify(StoreEvent::DocumentChanged);
        self.set_selection(None);
    }

    fn clamp_active(&mut self) {
        let last = self.doc.pages.len().saturating_sub(1);
        if self.active > last {
            self.active = last;
            self.notify(StoreEvent::ActivePageChanged);
        }
    }

    // ─── Gestures ────────────────────────────────────────────────────────

    /// Open a gesture: previews until `end_gesture` become one undo step.
    ///
    /// Gestures never nest. A gesture still open (its end was lost) is
    /// committed first, so it cannot swallow later edits.
    pub fn begin_gesture(&mut self) {
        if self.history.in_batch() {
            log::debug!("begin_gesture: closing a gesture that never ended");
            self.end_gesture();
        }
        self.history.begin_batch(&self.doc);
    }

    /// Apply a transient patch inside an open gesture. Outside one this is
    /// refused, since it would mutate the document without a snapshot.
    pub fn preview_node(&mut self, id: NodeId, patch: &NodePatch, owner: Option<NodeId>) -> bool {
        if !self.history.in_batch() {
            log::warn!("preview_node({id:?}) outside a gesture ignored");
            return false;
        }
        let Some(slot) = self.page().locate(id, owner) else {
            return false;
        };
        self.apply(slot, patch);
        log::trace!("preview {id:?}");
        self.notify(StoreEvent::DocumentChanged);
        true
    }

    /// Close the gesture. Returns whether it recorded an undo step.
    pub fn end_gesture(&mut self) -> bool {
        let recorded = self.history.end_batch(&self.doc);
        if recorded {
            log::debug!("gesture committed");
        }
        recorded
    }

    /// Abandon the open gesture, restoring the document it started from.
    pub fn cancel_gesture(&mut self) {
        if let Some(start) = self.history.cancel_batch()
            && start != self.doc
        {
            self.doc = start;
            self.clamp_active();
            log::debug!("gesture cancelled");
            self.notify(StoreEvent::DocumentChanged);
        }
    }

    pub fn in_gesture(&self) -> bool {
        self.history.in_batch()
    }

    // ─── Tool ────────────────────────────────────────────────────────────

    /// Switch tools. Any open gesture is discarded.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.cancel_gesture();
        if self.tool != tool {
            self.tool = tool;
            log::debug!("tool → {tool:?}");
            self.notify(StoreEvent::ToolChanged);
        }
    }

    // ─── Pages ───────────────────────────────────────────────────────────

    fn activate(&mut self, index: usize) {
        if self.active != index {
            self.active = index;
            self.notify(StoreEvent::ActivePageChanged);
        }
        self.set_selection(None);
    }

    /// Append an empty page and switch to it.
    pub fn add_page(&mut self) -> NodeId {
        self.cancel_gesture();
        self.checkpoint();
        let page = Page::new();
        let id = page.id;
        self.doc.pages.push(page);
        self.notify(StoreEvent::DocumentChanged);
        self.activate(self.doc.pages.len() - 1);
        id
    }

    /// Insert a copy of page `index` right after it and switch to the copy.
    /// Node ids are kept; ids only need to be unique within a page.
    pub fn duplicate_page(&mut self, index: usize) -> Option<NodeId> {
        let mut copy = self.doc.pages.get(index)?.clone();
        self.cancel_gesture();
        self.checkpoint();
        copy.id = NodeId::with_prefix("page");
        let id = copy.id;
        self.doc.pages.insert(index + 1, copy);
        self.notify(StoreEvent::DocumentChanged);
        self.activate(index + 1);
        Some(id)
    }

    /// Remove page `index`. The last remaining page is never removed.
    pub fn delete_page(&mut self, index: usize) -> bool {
        if self.doc.pages.len() <= 1 || index >= self.doc.pages.len() {
            return false;
        }
        self.cancel_gesture();
        self.checkpoint();
        self.doc.pages.remove(index);
        self.prune_images();
        let active = if self.active > index {
            self.active - 1
        } else {
            self.active.min(self.doc.pages.len() - 1)
        };
        self.notify(StoreEvent::DocumentChanged);
        self.activate(active);
        true
    }

    /// Switch the page being edited. Not recorded in history.
    pub fn set_active_page(&mut self, index: usize) -> bool {
        if index >= self.doc.pages.len() {
            return false;
        }
        self.cancel_gesture();
        self.activate(index);
        true
    }

    // ─── Document I/O ────────────────────────────────────────────────────

    /// Replace the whole document as one undo step. Image sources are
    /// re-decoded.
    pub fn load_document(&mut self, doc: Document) {
        if doc.pages.is_empty() {
            log::warn!("load_document: refusing a document without pages");
            return;
        }
        self.cancel_gesture();
        self.checkpoint();
        for (id, src) in image_sources(&doc) {
            self.images.remove(&(id, src.to_owned()));
        }
        self.doc = doc;
        self.prune_images();
        self.notify(StoreEvent::DocumentChanged);
        self.activate(0);
    }

    /// Decode JSON and load it. On error the store is untouched.
    pub fn import_json(&mut self, text: &str) -> Result<(), DeserializationError> {
        let doc = codec::from_json(text).inspect_err(|e| log::warn!("import failed: {e}"))?;
        self.load_document(doc);
        Ok(())
    }

    /// Decode MessagePack and load it. On error the store is untouched.
    pub fn import_msgpack(&mut self, bytes: &[u8]) -> Result<(), DeserializationError> {
        let doc = codec::from_msgpack(bytes).inspect_err(|e| log::warn!("import failed: {e}"))?;
        self.load_document(doc);
        Ok(())
    }

    pub fn export_json(&self) -> Result<String, SerializationError> {
        codec::to_json(&self.doc)
    }

    pub fn export_msgpack(&self) -> Result<Vec<u8>, SerializationError> {
        codec::to_msgpack(&self.doc)
    }

    /// Reset to one empty page with no history.
    pub fn clear(&mut self) {
        self.history.clear();
        self.doc = Document::new();
        self.images.clear();
        self.notify(StoreEvent::DocumentChanged);
        self.active = 0;
        self.set_selection(None);
    }

    // ─── Images ──────────────────────────────────────────────────────────

    /// Image sources on any page that still need decoding, as `(id, src)`
    /// pairs. A node copied onto several pages is listed once.
    pub fn pending_images(&self) -> Vec<(NodeId, String)> {
        let mut pending: Vec<(NodeId, String)> = Vec::new();
        for (id, src) in image_sources(&self.doc) {
            let key = (id, src.to_owned());
            if matches!(self.images.get(&key), None | Some(ImageState::Pending))
                && !pending.contains(&key)
            {
                pending.push(key);
            }
        }
        pending
    }

    /// Record the outcome of decoding `src` for node `id`. Never touches
    /// history or persisted attributes. A result for a node that is gone, or
    /// whose source has since changed, is dropped.
    pub fn resolve_image(
        &mut self,
        id: NodeId,
        src: &str,
        result: Result<DecodedImage, DecodeFailure>,
    ) -> bool {
        if !image_sources(&self.doc).any(|key| key == (id, src)) {
            log::debug!("resolve_image: no {id:?} showing {src:?}, dropping result");
            return false;
        }
        let state = match result {
            Ok(decoded) => ImageState::Ready(decoded),
            Err(failure) => {
                log::warn!("image {id:?} failed to decode: {}", failure.reason);
                ImageState::Failed(failure)
            }
        };
        self.images.insert((id, src.to_owned()), state);
        self.notify(StoreEvent::ImageResolved(id));
        true
    }

    /// Decode state of an image node, preferring the copy on the active
    /// page; `Pending` until resolved.
    pub fn image_state(&self, id: NodeId) -> Option<&ImageState> {
        const PENDING: &ImageState = &ImageState::Pending;
        let on_page = |page: &Page| {
            page.nodes()
                .find_map(|(n, _)| (n.id() == id).then(|| n.kind.image_src()).flatten())
                .map(str::to_owned)
        };
        let src = on_page(self.page()).or_else(|| self.doc.pages.iter().find_map(on_page))?;
        Some(self.images.get(&(id, src)).unwrap_or(PENDING))
    }

    /// Forget decode states no document in the store or its history can
    /// show any more.
    fn prune_images(&mut self) {
        if self.images.is_empty() {
            return;
        }
        let live: HashSet<(NodeId, &str)> = std::iter::once(&self.doc)
            .chain(self.history.snapshots())
            .flat_map(image_sources)
            .collect();
        let before = self.images.len();
        self.images.retain(|(id, src), _| live.contains(&(*id, src.as_str())));
        if self.images.len() < before {
            log::trace!("pruned {} image states", before - self.images.len());
        }
    }

    /// Number of decode states held, resolved or not.
    pub fn image_state_count(&self) -> usize {
        self.images.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_core::defaults;

    #[test]
    fn add_targets_selected_panel() {
        let mut store = Store::default();
        let panel = store.add_panel(Bounds::new(0.0, 0.0, 200.0, 200.0));
        let id = store.add_node(defaults::rect());

        assert_eq!(store.page().panels[0].children.len(), 1);
        assert!(store.page().loose_elements.is_empty());
        assert_eq!(store.selection(), Some(NodeRef::in_panel(id, panel)));
        assert_eq!(store.active_container(), Some(panel));
    }

    #[test]
    fn select_resolves_owner() {
        let mut store = Store::default();
        let panel = store.add_panel(Bounds::new(0.0, 0.0, 200.0, 200.0));
        let child = store.add_node(defaults::sfx());
        store.clear_selection();

        assert!(store.select(child, None));
        assert_eq!(store.selection(), Some(NodeRef::in_panel(child, panel)));
        assert!(!store.select(NodeId::intern("ghost"), None));
    }

    #[test]
    fn update_miss_records_nothing() {
        let mut store = Store::default();
        assert!(!store.update_node(NodeId::intern("missing"), &NodePatch::position(1.0, 1.0), None));
        assert!(!store.can_undo());
    }

    #[test]
    fn preview_outside_gesture_is_refused() {
        let mut store = Store::default();
        let id = store.add_node(defaults::rect());
        assert!(!store.preview_node(id, &NodePatch::position(5.0, 5.0), None));
        assert_eq!(store.page().loose_elements[0].attrs.x, 100.0);
    }

    #[test]
    fn tool_switch_cancels_gesture() {
        let mut store = Store::default();
        let id = store.add_node(defaults::rect());
        let before = store.document().clone();

        store.begin_gesture();
        store.preview_node(id, &NodePatch::position(300.0, 300.0), None);
        store.set_tool(ToolKind::Pen);

        assert_eq!(store.document(), &before);
        assert!(!store.in_gesture());
        assert_eq!(store.tool(), ToolKind::Pen);
    }

    #[test]
    fn events_are_coalesced() {
        let mut store = Store::default();
        store.drain_events();
        let start = store.revision();
        store.add_node(defaults::text());
        assert_eq!(
            store.drain_events(),
            vec![StoreEvent::DocumentChanged, StoreEvent::SelectionChanged]
        );
        assert!(store.revision() > start);
        assert!(store.drain_events().is_empty());
    }
}
