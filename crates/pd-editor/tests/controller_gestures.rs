//! Integration tests: pointer gestures, tools and shortcuts (pd-editor).
//!
//! Feeds raw pointer and key events through the `Controller` and checks the
//! resulting document and history.

use pd_core::codec;
use pd_core::{Bounds, EditorConfig, ItemRef, NodeId, NodeKind, NodeRef, Page, TransformEnd};
use pd_editor::{Controller, Modifiers, Preview, Store, ToolKind};
use pretty_assertions::assert_eq;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn make_controller() -> Controller {
    init();
    let doc = codec::from_json(include_str!("fixtures/strip.json")).expect("fixture should decode");
    Controller::new(Store::with_document(doc, EditorConfig::default()))
}

fn id(s: &str) -> NodeId {
    NodeId::intern(s)
}

fn position(page: &Page, s: &str) -> (f32, f32) {
    let item = page.find(id(s)).expect("item should exist");
    (item.attrs().x, item.attrs().y)
}

const NONE: Modifiers = Modifiers::NONE;
const CMD: Modifiers = Modifiers {
    ctrl: true,
    ..Modifiers::NONE
};

// ─── Select tool ────────────────────────────────────────────────────────

#[test]
fn dragging_a_node_is_one_undo_step() {
    let mut ctl = make_controller();
    ctl.pointer_down(50.0, 30.0, NONE);
    assert_eq!(ctl.store().selection(), Some(NodeRef::loose(id("caption"))));

    ctl.pointer_move(90.0, 50.0, NONE);
    ctl.pointer_move(150.0, 80.0, NONE);
    ctl.pointer_up(150.0, 80.0, NONE);
    assert_eq!(position(ctl.store().page(), "caption"), (140.0, 70.0));

    assert!(ctl.store_mut().undo());
    assert_eq!(position(ctl.store().page(), "caption"), (40.0, 20.0));
    assert!(!ctl.store().can_undo());
}

#[test]
fn dragging_a_panel_child_moves_it_in_panel_space() {
    let mut ctl = make_controller();
    ctl.pointer_down(200.0, 100.0, NONE);
    assert_eq!(
        ctl.store().selection(),
        Some(NodeRef::in_panel(id("shout"), id("frame_a")))
    );
    ctl.pointer_move(210.0, 120.0, NONE);
    ctl.pointer_up(210.0, 120.0, NONE);
    assert_eq!(position(ctl.store().page(), "shout"), (160.0, 50.0));
}

#[test]
fn shift_drag_locks_to_axis() {
    let mut ctl = make_controller();
    ctl.pointer_down(50.0, 30.0, NONE);
    ctl.pointer_move(150.0, 40.0, Modifiers::SHIFT);
    ctl.pointer_up(150.0, 40.0, Modifiers::SHIFT);
    assert_eq!(position(ctl.store().page(), "caption"), (140.0, 20.0));
}

#[test]
fn locked_nodes_select_but_do_not_move() {
    let mut ctl = make_controller();
    assert!(ctl.toggle_lock(NodeRef::loose(id("caption"))));

    ctl.pointer_down(50.0, 30.0, NONE);
    ctl.pointer_move(150.0, 80.0, NONE);
    ctl.pointer_up(150.0, 80.0, NONE);

    assert_eq!(ctl.store().selection(), Some(NodeRef::loose(id("caption"))));
    assert_eq!(position(ctl.store().page(), "caption"), (40.0, 20.0));
    let end = TransformEnd {
        x: 0.0,
        y: 0.0,
        rotation: 45.0,
        scale_x: 2.0,
        scale_y: 2.0,
    };
    assert!(!ctl.transform_end(NodeRef::loose(id("caption")), end));

    // Only the lock toggle is in history.
    assert!(ctl.store_mut().undo());
    assert!(!ctl.store().can_undo());
}

#[test]
fn hidden_toggle_round_trips() {
    let mut ctl = make_controller();
    let target = NodeRef::in_panel(id("ground"), id("frame_a"));
    assert!(ctl.toggle_visibility(target));
    assert!(!ctl.store().page().find(id("ground")).unwrap().attrs().visible);
    assert!(ctl.toggle_visibility(target));
    assert!(ctl.store().page().find(id("ground")).unwrap().attrs().visible);
}

// ─── Transforms ─────────────────────────────────────────────────────────

#[test]
fn text_resize_scales_font_and_resets_scale() {
    let mut ctl = make_controller();
    let end = TransformEnd {
        x: 40.0,
        y: 20.0,
        rotation: 0.0,
        scale_x: 1.5,
        scale_y: 1.5,
    };
    assert!(ctl.transform_end(NodeRef::loose(id("caption")), end));

    let Some(ItemRef::Node(caption)) = ctl.store().page().find(id("caption")) else {
        panic!("caption should exist");
    };
    assert!(matches!(caption.kind, NodeKind::Text { font_size, .. } if font_size == 30.0));
    assert_eq!((caption.attrs.scale_x, caption.attrs.scale_y), (1.0, 1.0));
}

#[test]
fn shrinking_stops_at_the_floor() {
    let mut ctl = make_controller();
    let end = TransformEnd {
        x: 0.0,
        y: 200.0,
        rotation: 0.0,
        scale_x: 0.001,
        scale_y: 0.001,
    };
    assert!(ctl.transform_end(NodeRef::in_panel(id("ground"), id("frame_a")), end));
    let ground = ctl.store().page().find(id("ground")).unwrap();
    let ItemRef::Node(ground) = ground else {
        panic!("ground is a node");
    };
    assert_eq!(ground.kind.size(), Some((5.0, 5.0)));
}

// ─── Creation tools ─────────────────────────────────────────────────────

#[test]
fn small_drags_create_nothing() {
    init();
    let mut ctl = Controller::default();
    ctl.set_tool(ToolKind::Rect);
    ctl.pointer_down(10.0, 10.0, NONE);
    ctl.pointer_move(13.0, 200.0, NONE);
    ctl.pointer_up(13.0, 200.0, NONE);
    assert!(ctl.store().page().loose_elements.is_empty());
    assert!(!ctl.store().can_undo());

    ctl.pointer_down(10.0, 10.0, NONE);
    ctl.pointer_move(60.0, 40.0, NONE);
    assert_eq!(ctl.preview(), Some(Preview::Rect(Bounds::new(10.0, 10.0, 50.0, 30.0))));
    ctl.pointer_up(110.0, 60.0, NONE);
    assert_eq!(ctl.preview(), None);

    let rect = &ctl.store().page().loose_elements[0];
    assert_eq!((rect.attrs.x, rect.attrs.y), (10.0, 10.0));
    assert_eq!(rect.kind.size(), Some((100.0, 50.0)));
    assert_eq!(ctl.store().tool(), ToolKind::Rect);
}

#[test]
fn panel_tool_creates_square_with_shift() {
    init();
    let mut ctl = Controller::default();
    ctl.set_tool(ToolKind::Panel);
    ctl.pointer_down(100.0, 100.0, NONE);
    ctl.pointer_move(300.0, 180.0, Modifiers::SHIFT);
    ctl.pointer_up(300.0, 180.0, Modifiers::SHIFT);

    let panels = &ctl.store().page().panels;
    assert_eq!(panels.len(), 1);
    assert_eq!(panels[0].bounds(), Bounds::new(100.0, 100.0, 200.0, 200.0));
}

#[test]
fn ellipse_tool_creates_circle() {
    init();
    let mut ctl = Controller::default();
    ctl.set_tool(ToolKind::Ellipse);
    ctl.pointer_down(200.0, 200.0, NONE);
    ctl.pointer_up(230.0, 240.0, NONE);

    let node = &ctl.store().page().loose_elements[0];
    assert_eq!((node.attrs.x, node.attrs.y), (200.0, 200.0));
    assert!(matches!(
        node.kind,
        NodeKind::Ellipse { radius_x, radius_y, .. } if radius_x == 50.0 && radius_y == 50.0
    ));
}

#[test]
fn pen_stroke_commits_one_line() {
    init();
    let mut ctl = Controller::default();
    ctl.set_tool(ToolKind::Pen);
    ctl.pointer_down(10.0, 10.0, NONE);
    for i in 1..=5 {
        ctl.pointer_move(10.0 + 10.0 * i as f32, 10.0 + 2.0 * i as f32, NONE);
    }
    assert!(ctl.store().page().loose_elements.is_empty());
    ctl.pointer_up(60.0, 20.0, NONE);

    let lines = &ctl.store().page().loose_elements;
    assert_eq!(lines.len(), 1);
    let NodeKind::Line { points, .. } = &lines[0].kind else {
        panic!("expected a line, got {:?}", lines[0].kind);
    };
    assert_eq!(points.len(), 6);
    assert_eq!(points[0], (0.0, 0.0));
    assert_eq!(points[5], (50.0, 10.0));

    assert!(ctl.store_mut().undo());
    assert!(!ctl.store().can_undo());
}

#[test]
fn click_to_place_lands_in_selected_panel() {
    let mut ctl = make_controller();
    ctl.pointer_down(600.0, 200.0, NONE);
    ctl.pointer_up(600.0, 200.0, NONE);
    assert_eq!(ctl.store().active_container(), Some(id("frame_b")));

    ctl.set_tool(ToolKind::Bubble);
    ctl.pointer_down(460.0, 100.0, NONE);
    ctl.pointer_up(460.0, 100.0, NONE);

    let frame = ctl.store().page().panel(id("frame_b")).unwrap();
    assert_eq!(frame.children.len(), 1);
    let bubble = &frame.children[0];
    assert_eq!(bubble.kind.tag(), "bubble");
    assert_eq!((bubble.attrs.x, bubble.attrs.y), (20.0, 40.0));
}

#[test]
fn eraser_removes_nodes_not_panels() {
    let mut ctl = make_controller();
    ctl.set_tool(ToolKind::Eraser);
    ctl.pointer_down(100.0, 300.0, NONE);
    ctl.pointer_up(100.0, 300.0, NONE);
    assert!(!ctl.store().page().contains(id("ground")));

    ctl.pointer_down(600.0, 100.0, NONE);
    assert!(ctl.store().page().panel(id("frame_b")).is_some());
}

#[test]
fn pan_tool_ignores_pointer() {
    let mut ctl = make_controller();
    let before = ctl.store().document().clone();
    ctl.set_tool(ToolKind::Pan);
    ctl.pointer_down(50.0, 30.0, NONE);
    ctl.pointer_move(300.0, 300.0, NONE);
    ctl.pointer_up(300.0, 300.0, NONE);
    assert_eq!(ctl.store().document(), &before);
    assert_eq!(ctl.store().selection(), None);
}

#[test]
fn switching_tools_mid_drag_discards_it() {
    let mut ctl = make_controller();
    let before = ctl.store().document().clone();
    ctl.pointer_down(50.0, 30.0, NONE);
    ctl.pointer_move(300.0, 300.0, NONE);
    ctl.set_tool(ToolKind::Rect);
    ctl.pointer_up(300.0, 300.0, NONE);

    assert_eq!(ctl.store().document(), &before);
    assert!(!ctl.store().can_undo());
}

// ─── Shortcuts ──────────────────────────────────────────────────────────

#[test]
fn keyboard_edit_flow() {
    let mut ctl = make_controller();
    ctl.store_mut().select(id("caption"), None);
    assert!(ctl.handle_key("Backspace", NONE));
    assert!(!ctl.store().page().contains(id("caption")));

    assert!(ctl.handle_key("z", CMD));
    assert!(ctl.store().page().contains(id("caption")));
    assert!(ctl.handle_key("y", CMD));
    assert!(!ctl.store().page().contains(id("caption")));

    ctl.store_mut().select(id("ground"), None);
    assert!(ctl.handle_key("}", Modifiers { shift: true, ..CMD }));
    let order: Vec<NodeId> = ctl.store().page().panels[0].children.iter().map(|n| n.id()).collect();
    assert_eq!(order, [id("shout"), id("ground")]);

    assert!(ctl.handle_key("Escape", NONE));
    assert_eq!(ctl.store().selection(), None);

    assert!(ctl.handle_key("p", NONE));
    assert_eq!(ctl.store().tool(), ToolKind::Pen);
    assert!(!ctl.handle_key("q", NONE));
}

#[test]
fn panels_restack_among_panels() {
    let mut ctl = make_controller();
    ctl.store_mut().select(id("frame_a"), None);
    assert!(ctl.handle_key("]", CMD));
    let order: Vec<NodeId> = ctl.store().page().panels.iter().map(|p| p.id()).collect();
    assert_eq!(order, [id("frame_b"), id("frame_a")]);

    // Already on top: the key is bound but nothing moves.
    assert!(ctl.handle_key("]", CMD));
    assert_eq!(ctl.store().page().panels[1].id(), id("frame_a"));
}
