//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s so every surface
//! shares one binding table.
//! - Single letters switch tools
//! - Shift adds to the z-order shortcuts: one step becomes all the way

use crate::input::Modifiers;
use crate::tools::ToolKind;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Tool switching ──
    Tool(ToolKind),

    // ── Edit ──
    Undo,
    Redo,
    Delete,

    // ── Z-order ──
    SendBackward,
    BringForward,
    SendToBack,
    BringToFront,

    // ── UI ──
    Deselect,
}

/// Resolves key events into shortcut actions.
///
/// On macOS `meta` is ⌘; elsewhere `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let cmd = modifiers.command();

        // ── Modifier combos first (most specific) ──
        if cmd && modifiers.shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                // Shift turns `[`/`]` into `{`/`}` on most layouts.
                "[" | "{" => Some(ShortcutAction::SendToBack),
                "]" | "}" => Some(ShortcutAction::BringToFront),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "[" => Some(ShortcutAction::SendBackward),
                "]" => Some(ShortcutAction::BringForward),
                _ => None,
            };
        }

        if modifiers.alt {
            return None;
        }

        // ── Single keys ──
        let tool = match key {
            "v" | "V" => ToolKind::Select,
            "h" | "H" => ToolKind::Pan,
            "r" | "R" => ToolKind::Rect,
            "o" | "O" => ToolKind::Ellipse,
            "f" | "F" => ToolKind::Panel,
            "p" | "P" => ToolKind::Pen,
            "t" | "T" => ToolKind::Text,
            "b" | "B" => ToolKind::Bubble,
            "s" | "S" => ToolKind::Sfx,
            "e" | "E" => ToolKind::Eraser,
            "Delete" | "Backspace" => return Some(ShortcutAction::Delete),
            "Escape" => return Some(ShortcutAction::Deselect),
            _ => return None,
        };
        Some(ShortcutAction::Tool(tool))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CMD: Modifiers = Modifiers {
        meta: true,
        ..Modifiers::NONE
    };
    const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };
    const CMD_SHIFT: Modifiers = Modifiers {
        shift: true,
        ..CMD
    };

    #[test]
    fn resolve_tool_shortcuts() {
        let cases = [
            ("v", ToolKind::Select),
            ("h", ToolKind::Pan),
            ("r", ToolKind::Rect),
            ("o", ToolKind::Ellipse),
            ("f", ToolKind::Panel),
            ("p", ToolKind::Pen),
            ("T", ToolKind::Text),
            ("b", ToolKind::Bubble),
            ("s", ToolKind::Sfx),
            ("e", ToolKind::Eraser),
        ];
        for (key, tool) in cases {
            assert_eq!(
                ShortcutMap::resolve(key, Modifiers::NONE),
                Some(ShortcutAction::Tool(tool)),
                "key {key}"
            );
        }
    }

    #[test]
    fn resolve_undo_redo() {
        // Cmd+Z → Undo
        assert_eq!(ShortcutMap::resolve("z", CMD), Some(ShortcutAction::Undo));
        // Ctrl+Z → Undo
        assert_eq!(ShortcutMap::resolve("z", CTRL), Some(ShortcutAction::Undo));
        // Cmd+Shift+Z → Redo
        assert_eq!(ShortcutMap::resolve("Z", CMD_SHIFT), Some(ShortcutAction::Redo));
        // Cmd+Y → Redo
        assert_eq!(ShortcutMap::resolve("y", CMD), Some(ShortcutAction::Redo));
    }

    #[test]
    fn resolve_delete() {
        assert_eq!(
            ShortcutMap::resolve("Delete", Modifiers::NONE),
            Some(ShortcutAction::Delete)
        );
        assert_eq!(
            ShortcutMap::resolve("Backspace", Modifiers::NONE),
            Some(ShortcutAction::Delete)
        );
    }

    #[test]
    fn resolve_z_order() {
        assert_eq!(ShortcutMap::resolve("[", CMD), Some(ShortcutAction::SendBackward));
        assert_eq!(ShortcutMap::resolve("]", CTRL), Some(ShortcutAction::BringForward));
        assert_eq!(ShortcutMap::resolve("{", CMD_SHIFT), Some(ShortcutAction::SendToBack));
        assert_eq!(ShortcutMap::resolve("]", CMD_SHIFT), Some(ShortcutAction::BringToFront));
    }

    #[test]
    fn resolve_escape() {
        assert_eq!(
            ShortcutMap::resolve("Escape", Modifiers::NONE),
            Some(ShortcutAction::Deselect)
        );
    }

    #[test]
    fn letters_with_command_are_not_tools() {
        assert_eq!(ShortcutMap::resolve("r", CMD), None);
        assert_eq!(ShortcutMap::resolve("x", Modifiers::NONE), None);
        let alt = Modifiers {
            alt: true,
            ..Modifiers::NONE
        };
        assert_eq!(ShortcutMap::resolve("v", alt), None);
    }
}
