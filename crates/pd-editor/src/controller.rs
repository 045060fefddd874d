//! Selection and transform controller.
//!
//! Bridges rendering-surface events to store calls. The controller owns the
//! `Store` and one instance of every tool; the store's current `ToolKind`
//! picks which tool sees pointer input. Drafts produced by tools are in page
//! coordinates and are converted into the active panel's local frame here.

use crate::input::{InputEvent, Modifiers};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::store::Store;
use crate::tools::{
    EllipseTool, EraserTool, PenTool, PlaceTool, Preview, RectTarget, RectTool, SelectTool, Tool,
    ToolAction, ToolKind,
};
use pd_core::defaults::{self, BubbleVariant};
use pd_core::geometry::to_local;
use pd_core::{
    Direction, ItemRef, NodeAttrs, NodeDraft, NodeId, NodeKind, NodePatch, NodeRef, PanelLayout,
    TransformEnd, fold_node, fold_panel, hit_test,
};
use smallvec::SmallVec;

/// An item being moved by the select tool.
#[derive(Debug, Clone, Copy)]
struct Drag {
    target: NodeRef,
    /// Item position when the drag began, in its owner's frame.
    start: (f32, f32),
    /// Rotation of the owning panel; pointer deltas are unrotated by it.
    frame_rotation: f32,
}

pub struct Controller {
    store: Store,
    select: SelectTool,
    rect: RectTool,
    panel: RectTool,
    ellipse: EllipseTool,
    pen: PenTool,
    text: PlaceTool,
    bubble: PlaceTool,
    sfx: PlaceTool,
    eraser: EraserTool,
    drag: Option<Drag>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(Store::default())
    }
}

impl Controller {
    pub fn new(store: Store) -> Self {
        let min = store.config().min_create_size;
        Self {
            store,
            select: SelectTool::new(),
            rect: RectTool::new(RectTarget::Shape).with_min_size(min),
            panel: RectTool::new(RectTarget::Panel).with_min_size(min),
            ellipse: EllipseTool::new().with_min_size(min),
            pen: PenTool::new(),
            text: PlaceTool::new(ToolKind::Text),
            bubble: PlaceTool::new(ToolKind::Bubble),
            sfx: PlaceTool::new(ToolKind::Sfx),
            eraser: EraserTool::new(),
            drag: None,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn into_store(self) -> Store {
        self.store
    }

    fn active_tool(&mut self) -> Option<&mut dyn Tool> {
        let tool: &mut dyn Tool = match self.store.tool() {
            ToolKind::Select => &mut self.select,
            ToolKind::Pan => return None,
            ToolKind::Rect => &mut self.rect,
            ToolKind::Ellipse => &mut self.ellipse,
            ToolKind::Panel => &mut self.panel,
            ToolKind::Pen => &mut self.pen,
            ToolKind::Text => &mut self.text,
            ToolKind::Bubble => &mut self.bubble,
            ToolKind::Sfx => &mut self.sfx,
            ToolKind::Eraser => &mut self.eraser,
        };
        Some(tool)
    }

    /// The uncommitted shape of the active tool, for the surface to draw.
    pub fn preview(&self) -> Option<Preview> {
        match self.store.tool() {
            ToolKind::Rect => self.rect.preview(),
            ToolKind::Panel => self.panel.preview(),
            ToolKind::Ellipse => self.ellipse.preview(),
            ToolKind::Pen => self.pen.preview(),
            _ => None,
        }
    }

    // ─── Pointer input ───────────────────────────────────────────────────

    /// Feed a pointer event with hit information from the surface.
    pub fn handle_pointer(&mut self, event: &InputEvent, hit: Option<NodeRef>) {
        let Some(tool) = self.active_tool() else {
            return;
        };
        let actions = tool.handle(event, hit);
        for action in actions {
            self.apply(action);
        }
    }

    /// Feed a pointer event, hit-testing the active page on press.
    pub fn handle_pointer_at(&mut self, event: &InputEvent) {
        let hit = match event {
            InputEvent::PointerDown { x, y, .. } => hit_test(self.store.page(), *x, *y),
            _ => None,
        };
        self.handle_pointer(event, hit);
    }

    pub fn pointer_down(&mut self, x: f32, y: f32, modifiers: Modifiers) {
        self.handle_pointer_at(&InputEvent::from_pointer_down(x, y, 1.0, modifiers));
    }

    pub fn pointer_move(&mut self, x: f32, y: f32, modifiers: Modifiers) {
        self.handle_pointer_at(&InputEvent::from_pointer_move(x, y, 1.0, modifiers));
    }

    pub fn pointer_up(&mut self, x: f32, y: f32, modifiers: Modifiers) {
        self.handle_pointer_at(&InputEvent::from_pointer_up(x, y, modifiers));
    }

    fn apply(&mut self, action: ToolAction) {
        match action {
            ToolAction::Select(target) => {
                self.store.select(target.id, target.owner);
            }
            ToolAction::ClearSelection => self.store.clear_selection(),
            ToolAction::BeginDrag(target) => self.begin_drag(target),
            ToolAction::DragBy { dx, dy } => {
                let Some(drag) = self.drag else {
                    return;
                };
                let (lx, ly) = to_local((dx, dy), (0.0, 0.0), drag.frame_rotation);
                let patch = NodePatch::position(drag.start.0 + lx, drag.start.1 + ly);
                self.store
                    .preview_node(drag.target.id, &patch, drag.target.owner);
            }
            ToolAction::EndDrag => {
                if self.drag.take().is_some() {
                    self.store.end_gesture();
                }
            }
            ToolAction::CreateNode(draft) => {
                self.place(draft);
            }
            ToolAction::CreatePanel(bounds) => {
                self.store.add_panel(bounds);
            }
            ToolAction::Delete(target) => {
                self.store.delete_node(target.id, target.owner);
            }
        }
    }

    fn begin_drag(&mut self, target: NodeRef) {
        // A press without a matching release leaves the old drag open.
        if self.drag.take().is_some() {
            self.store.end_gesture();
        }
        let Some(attrs) = self.attrs_of(target) else {
            return;
        };
        if attrs.locked {
            log::debug!("{:?} is locked, not dragging", target.id);
            return;
        }
        let frame_rotation = match target.owner {
            Some(pid) if pid != target.id => self
                .store
                .page()
                .panel(pid)
                .map_or(0.0, |p| p.attrs.rotation),
            _ => 0.0,
        };
        self.store.begin_gesture();
        self.drag = Some(Drag {
            target,
            start: (attrs.x, attrs.y),
            frame_rotation,
        });
    }

    /// Add a draft given in page coordinates to the active container.
    fn place(&mut self, mut draft: NodeDraft) -> NodeId {
        if let Some(panel) = self
            .store
            .active_container()
            .and_then(|pid| self.store.page().panel(pid))
        {
            let a = &panel.attrs;
            (draft.x, draft.y) = to_local((draft.x, draft.y), (a.x, a.y), a.rotation);
        }
        self.store.add_node(draft)
    }

    // ─── Committed transforms ────────────────────────────────────────────

    fn attrs_of(&self, target: NodeRef) -> Option<NodeAttrs> {
        let page = self.store.page();
        let slot = page.locate(target.id, target.owner)?;
        page.get(slot).map(|item| item.attrs().clone())
    }

    /// A drag finished on the surface: commit the new position.
    pub fn drag_end(&mut self, target: NodeRef, x: f32, y: f32) -> bool {
        match self.attrs_of(target) {
            Some(attrs) if !attrs.locked => {
                self.store
                    .update_node(target.id, &NodePatch::position(x, y), target.owner)
            }
            _ => false,
        }
    }

    /// A transform handle was released: fold scale into intrinsic size and
    /// commit.
    pub fn transform_end(&mut self, target: NodeRef, end: TransformEnd) -> bool {
        let page = self.store.page();
        let Some(item) = page
            .locate(target.id, target.owner)
            .and_then(|slot| page.get(slot))
        else {
            return false;
        };
        if item.attrs().locked {
            return false;
        }
        let patch = match item {
            ItemRef::Node(node) => fold_node(node, &end),
            ItemRef::Panel(panel) => fold_panel(panel, &end),
        };
        self.store.update_node(target.id, &patch, target.owner)
    }

    pub fn toggle_visibility(&mut self, target: NodeRef) -> bool {
        let Some(attrs) = self.attrs_of(target) else {
            return false;
        };
        let patch = NodePatch {
            visible: Some(!attrs.visible),
            ..NodePatch::default()
        };
        self.store.update_node(target.id, &patch, target.owner)
    }

    pub fn toggle_lock(&mut self, target: NodeRef) -> bool {
        let Some(attrs) = self.attrs_of(target) else {
            return false;
        };
        let patch = NodePatch {
            locked: Some(!attrs.locked),
            ..NodePatch::default()
        };
        self.store.update_node(target.id, &patch, target.owner)
    }

    /// Crop an image node to the centred preset region.
    pub fn center_crop(&mut self, target: NodeRef) -> bool {
        let page = self.store.page();
        let Some(ItemRef::Node(node)) = page
            .locate(target.id, target.owner)
            .and_then(|slot| page.get(slot))
        else {
            return false;
        };
        let NodeKind::Image { width, height, .. } = node.kind else {
            return false;
        };
        let patch = NodePatch {
            crop: Some(Some(defaults::center_crop(width, height))),
            ..NodePatch::default()
        };
        self.store.update_node(target.id, &patch, target.owner)
    }

    /// Show the whole image again.
    pub fn reset_crop(&mut self, target: NodeRef) -> bool {
        let patch = NodePatch {
            crop: Some(None),
            ..NodePatch::default()
        };
        self.store.update_node(target.id, &patch, target.owner)
    }

    // ─── Toolbar ─────────────────────────────────────────────────────────

    pub fn add_rect(&mut self) -> NodeId {
        self.store.add_node(defaults::rect())
    }

    pub fn add_ellipse(&mut self) -> NodeId {
        self.store.add_node(defaults::ellipse())
    }

    pub fn add_line(&mut self) -> NodeId {
        self.store.add_node(defaults::line())
    }

    pub fn add_text(&mut self) -> NodeId {
        self.store.add_node(defaults::text())
    }

    pub fn add_bubble(&mut self, variant: BubbleVariant) -> NodeId {
        self.store.add_node(defaults::bubble(variant))
    }

    pub fn add_sfx(&mut self) -> NodeId {
        self.store.add_node(defaults::sfx())
    }

    /// Add an image sized to a third of its natural dimensions. A drop
    /// position, in page coordinates, overrides the default placement.
    pub fn add_image(
        &mut self,
        src: impl Into<String>,
        natural_width: f32,
        natural_height: f32,
        position: Option<(f32, f32)>,
    ) -> NodeId {
        let draft = defaults::image(src, natural_width, natural_height);
        match position {
            Some((x, y)) => self.place(draft.at(x, y)),
            None => self.store.add_node(draft),
        }
    }

    pub fn add_panel_layout(&mut self, layout: PanelLayout) -> SmallVec<[NodeId; 4]> {
        self.cancel();
        self.store.add_panel_layout(layout)
    }

    // ─── Tools and keys ──────────────────────────────────────────────────

    /// Drop every uncommitted preview and drag.
    pub fn cancel(&mut self) {
        self.select.cancel();
        self.rect.cancel();
        self.panel.cancel();
        self.ellipse.cancel();
        self.pen.cancel();
        self.text.cancel();
        self.bubble.cancel();
        self.sfx.cancel();
        self.eraser.cancel();
        self.drag = None;
        self.store.cancel_gesture();
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.cancel();
        self.store.set_tool(tool);
    }

    /// Route a key press through the shortcut map. Returns whether the key
    /// was bound.
    pub fn handle_key(&mut self, key: &str, modifiers: Modifiers) -> bool {
        let Some(action) = ShortcutMap::resolve(key, modifiers) else {
            return false;
        };
        log::trace!("shortcut {key:?} → {action:?}");
        match action {
            ShortcutAction::Tool(tool) => self.set_tool(tool),
            ShortcutAction::Undo => {
                self.cancel();
                self.store.undo();
            }
            ShortcutAction::Redo => {
                self.cancel();
                self.store.redo();
            }
            ShortcutAction::Delete => {
                self.cancel();
                self.store.delete_selected();
            }
            ShortcutAction::Deselect => {
                self.cancel();
                self.store.clear_selection();
            }
            ShortcutAction::SendBackward => self.restack_selected(Direction::Down),
            ShortcutAction::BringForward => self.restack_selected(Direction::Up),
            ShortcutAction::SendToBack => self.restack_selected(Direction::Bottom),
            ShortcutAction::BringToFront => self.restack_selected(Direction::Top),
        }
        true
    }

    fn restack_selected(&mut self, direction: Direction) {
        self.cancel();
        if let Some(sel) = self.store.selection() {
            // A selected panel is its own owner; restack it among panels.
            let owner = if sel.owner == Some(sel.id) { None } else { sel.owner };
            self.store.move_node(sel.id, direction, owner);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_core::Bounds;

    #[test]
    fn background_click_clears_selection() {
        let mut ctl = Controller::default();
        ctl.add_rect();
        assert!(ctl.store().selection().is_some());
        ctl.pointer_down(800.0, 500.0, Modifiers::NONE);
        assert_eq!(ctl.store().selection(), None);
    }

    #[test]
    fn locked_nodes_ignore_drag_end() {
        let mut ctl = Controller::default();
        let id = ctl.add_rect();
        let target = NodeRef::loose(id);
        assert!(ctl.toggle_lock(target));
        assert!(!ctl.drag_end(target, 0.0, 0.0));
        assert!(ctl.toggle_lock(target));
        assert!(ctl.drag_end(target, 0.0, 0.0));
    }

    #[test]
    fn lost_pointer_up_does_not_swallow_later_edits() {
        let mut ctl = Controller::default();
        let id = ctl.add_rect();
        let x = |ctl: &Controller| ctl.store().page().loose_elements[0].attrs.x;

        ctl.pointer_down(150.0, 150.0, Modifiers::NONE);
        ctl.pointer_move(170.0, 150.0, Modifiers::NONE);
        // The release never arrives; the next press starts a fresh drag.
        ctl.pointer_down(170.0, 150.0, Modifiers::NONE);
        ctl.pointer_move(190.0, 150.0, Modifiers::NONE);
        ctl.pointer_up(190.0, 150.0, Modifiers::NONE);
        assert!(!ctl.store().in_gesture());
        assert_eq!(x(&ctl), 140.0);

        assert!(ctl.toggle_lock(NodeRef::loose(id)));
        ctl.add_text();

        assert!(ctl.store_mut().undo());
        assert_eq!(ctl.store().page().loose_elements.len(), 1);
        assert!(ctl.store_mut().undo());
        assert!(!ctl.store().page().loose_elements[0].attrs.locked);
        assert!(ctl.store_mut().undo());
        assert_eq!(x(&ctl), 120.0);
        assert!(ctl.store_mut().undo());
        assert_eq!(x(&ctl), 100.0);
        assert!(ctl.store_mut().undo());
        assert!(!ctl.store().can_undo());
    }

    #[test]
    fn center_then_reset_crop() {
        let mut ctl = Controller::default();
        let id = ctl.add_image("wide.png", 1200.0, 300.0, None);
        let target = NodeRef::loose(id);
        let crop = |ctl: &Controller| match &ctl.store().page().loose_elements[0].kind {
            NodeKind::Image { crop, .. } => *crop,
            other => panic!("expected image, got {other:?}"),
        };

        assert!(ctl.center_crop(target));
        assert_eq!(crop(&ctl), Some(Bounds::new(100.0, 0.0, 200.0, 100.0)));
        assert!(ctl.reset_crop(target));
        assert_eq!(crop(&ctl), None);
        assert!(ctl.store_mut().undo());
        assert!(crop(&ctl).is_some());

        let rect = ctl.add_rect();
        assert!(!ctl.center_crop(NodeRef::loose(rect)));
    }

    #[test]
    fn created_nodes_land_in_panel_frame() {
        let mut ctl = Controller::default();
        ctl.store_mut().add_panel(Bounds::new(100.0, 50.0, 300.0, 300.0));
        ctl.set_tool(ToolKind::Text);
        ctl.pointer_down(130.0, 90.0, Modifiers::NONE);

        let panel = &ctl.store().page().panels[0];
        assert_eq!(panel.children.len(), 1);
        let attrs = &panel.children[0].attrs;
        assert!((attrs.x - 30.0).abs() < 1e-4);
        assert!((attrs.y - 40.0).abs() < 1e-4);
    }

    #[test]
    fn escape_cancels_pen_stroke() {
        let mut ctl = Controller::default();
        ctl.set_tool(ToolKind::Pen);
        ctl.pointer_down(10.0, 10.0, Modifiers::NONE);
        ctl.pointer_move(50.0, 50.0, Modifiers::NONE);
        assert!(ctl.preview().is_some());

        assert!(ctl.handle_key("Escape", Modifiers::NONE));
        assert_eq!(ctl.preview(), None);
        ctl.pointer_up(60.0, 60.0, Modifiers::NONE);
        assert!(ctl.store().page().loose_elements.is_empty());
        assert!(!ctl.store().can_undo());
    }
}
