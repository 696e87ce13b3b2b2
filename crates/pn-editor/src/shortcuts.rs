//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. Lives in Rust
//! so the browser bridge only forwards raw `KeyboardEvent` fields.

use crate::tools::EditingMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Modes ──
    /// Toggle semantics: the current mode's key goes back to Move.
    Mode(EditingMode),

    // ── Edit ──
    Undo,
    Redo,
    Save,
    ClearModel,

    // ── View ──
    ZoomIn,
    ZoomOut,
    ResetView,
}

/// Resolves key events into shortcut actions.
///
/// On macOS `meta` is ⌘; elsewhere `ctrl` plays the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Returns `None` if the combo has no binding.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        _alt: bool,
        meta: bool,
    ) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;

        if cmd && shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                // Shift+= is "+" on most layouts
                "+" => Some(ShortcutAction::ZoomIn),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "s" | "S" => Some(ShortcutAction::Save),
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ResetView),
                "Delete" | "Backspace" => Some(ShortcutAction::ClearModel),
                _ => None,
            };
        }

        if shift {
            return None;
        }

        match key {
            "v" | "V" | "Escape" => Some(ShortcutAction::Mode(EditingMode::Move)),
            "p" | "P" => Some(ShortcutAction::Mode(EditingMode::CreatePlace)),
            "t" | "T" => Some(ShortcutAction::Mode(EditingMode::CreateTransition)),
            "c" | "C" => Some(ShortcutAction::Mode(EditingMode::Connect)),
            "d" | "D" => Some(ShortcutAction::Mode(EditingMode::Delete)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_mode_keys() {
        assert_eq!(
            ShortcutMap::resolve("p", false, false, false, false),
            Some(ShortcutAction::Mode(EditingMode::CreatePlace))
        );
        assert_eq!(
            ShortcutMap::resolve("T", false, false, false, false),
            Some(ShortcutAction::Mode(EditingMode::CreateTransition))
        );
        assert_eq!(
            ShortcutMap::resolve("Escape", false, false, false, false),
            Some(ShortcutAction::Mode(EditingMode::Move))
        );
    }

    #[test]
    fn resolve_undo_redo() {
        assert_eq!(
            ShortcutMap::resolve("z", true, false, false, false),
            Some(ShortcutAction::Undo)
        );
        assert_eq!(
            ShortcutMap::resolve("z", false, true, false, true),
            Some(ShortcutAction::Redo)
        );
        assert_eq!(
            ShortcutMap::resolve("y", true, false, false, false),
            Some(ShortcutAction::Redo)
        );
    }

    #[test]
    fn resolve_edit_and_view() {
        assert_eq!(
            ShortcutMap::resolve("s", false, false, false, true),
            Some(ShortcutAction::Save)
        );
        assert_eq!(
            ShortcutMap::resolve("Delete", true, false, false, false),
            Some(ShortcutAction::ClearModel)
        );
        assert_eq!(
            ShortcutMap::resolve("0", true, false, false, false),
            Some(ShortcutAction::ResetView)
        );
    }

    #[test]
    fn unbound_keys() {
        assert_eq!(ShortcutMap::resolve("q", false, false, false, false), None);
        // plain Delete never clears the model
        assert_eq!(ShortcutMap::resolve("Delete", false, false, false, false), None);
        assert_eq!(ShortcutMap::resolve("P", false, true, false, false), None);
    }
}
