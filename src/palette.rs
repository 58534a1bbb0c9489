//! Command palette.
//!
//! A static catalog of named actions dispatched onto the editor surface.
//! Snippet commands insert at the current cursor offset; action commands
//! delegate to the matching editor operation. Selecting an entry performs
//! its action; closing the palette afterwards is the host's concern.

use crate::{EditorSurface, Result};

/// The named actions available from the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteCommand {
    Heading1,
    Heading2,
    Heading3,
    BulletList,
    NumberedList,
    Quote,
    Image,
    CodeBlock,
    Table,
    TogglePin,
    TogglePreview,
    TaskList,
}

/// A palette catalog entry: display name, group heading, and command.
pub struct PaletteEntry {
    pub name: &'static str,
    pub group: &'static str,
    pub command: PaletteCommand,
}

/// The full palette catalog, in display order.
pub const PALETTE_ENTRIES: [PaletteEntry; 12] = [
    PaletteEntry { name: "Heading 1", group: "Basic Blocks", command: PaletteCommand::Heading1 },
    PaletteEntry { name: "Heading 2", group: "Basic Blocks", command: PaletteCommand::Heading2 },
    PaletteEntry { name: "Heading 3", group: "Basic Blocks", command: PaletteCommand::Heading3 },
    PaletteEntry { name: "Bullet List", group: "Basic Blocks", command: PaletteCommand::BulletList },
    PaletteEntry { name: "Numbered List", group: "Basic Blocks", command: PaletteCommand::NumberedList },
    PaletteEntry { name: "Quote", group: "Basic Blocks", command: PaletteCommand::Quote },
    PaletteEntry { name: "Image", group: "Media", command: PaletteCommand::Image },
    PaletteEntry { name: "Code Block", group: "Media", command: PaletteCommand::CodeBlock },
    PaletteEntry { name: "Table", group: "Media", command: PaletteCommand::Table },
    PaletteEntry { name: "Toggle Pin", group: "Actions", command: PaletteCommand::TogglePin },
    PaletteEntry { name: "Toggle Preview", group: "Actions", command: PaletteCommand::TogglePreview },
    PaletteEntry { name: "Task List", group: "Actions", command: PaletteCommand::TaskList },
];

impl PaletteCommand {
    /// The markdown snippet a command inserts at the cursor, if it is a
    /// snippet command.
    pub fn snippet(self) -> Option<&'static str> {
        match self {
            PaletteCommand::Heading1 => Some("\n# "),
            PaletteCommand::Heading2 => Some("\n## "),
            PaletteCommand::Heading3 => Some("\n### "),
            PaletteCommand::BulletList => Some("\n- "),
            PaletteCommand::NumberedList => Some("\n1. "),
            PaletteCommand::Quote => Some("\n> "),
            PaletteCommand::CodeBlock => Some("\n```\n\n```"),
            PaletteCommand::Table => {
                Some("\n| Header 1 | Header 2 |\n|----------|----------|\n| Cell 1   | Cell 2   |")
            }
            PaletteCommand::TaskList => Some("\n- [ ] "),
            PaletteCommand::Image | PaletteCommand::TogglePin | PaletteCommand::TogglePreview => {
                None
            }
        }
    }
}

/// Looks up a catalog entry by display name, case-insensitively.
pub fn find_command(name: &str) -> Option<PaletteCommand> {
    PALETTE_ENTRIES
        .iter()
        .find(|entry| entry.name.eq_ignore_ascii_case(name.trim()))
        .map(|entry| entry.command)
}

/// What the host must do after a command was dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteOutcome {
    /// The command completed; close the palette.
    Done,
    /// The host must open its file picker and hand the chosen file to
    /// [`EditorSurface::attach_image`].
    PickImage,
}

/// Performs a palette command against the editor surface.
pub async fn dispatch(
    command: PaletteCommand,
    editor: &mut EditorSurface,
) -> Result<PaletteOutcome> {
    match command {
        PaletteCommand::Image => return Ok(PaletteOutcome::PickImage),
        PaletteCommand::TogglePin => {
            editor.toggle_pin().await?;
            return Ok(PaletteOutcome::Done);
        }
        PaletteCommand::TogglePreview => {
            editor.toggle_preview();
            return Ok(PaletteOutcome::Done);
        }
        _ => {}
    }

    if let Some(snippet) = command.snippet() {
        editor.insert_at_cursor(snippet).await?;
    }
    Ok(PaletteOutcome::Done)
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, sync::Arc};

    use pretty_assertions::assert_eq;
    use tokio::sync::Mutex;

    use crate::{Config, MemoryStore, NoteStore};

    use super::*;

    async fn editor() -> (EditorSurface, String) {
        let mut store = NoteStore::open(Box::new(MemoryStore::new())).unwrap();
        let note = store
            .create_note("n".to_string(), String::new(), vec![])
            .unwrap();
        let store = Arc::new(Mutex::new(store));
        let mut editor = EditorSurface::new(store, Config::default());
        editor.open_note(&note.id).await.unwrap();
        (editor, note.id)
    }

    #[test]
    fn catalog_names_are_unique() {
        let names: HashSet<&str> = PALETTE_ENTRIES.iter().map(|e| e.name).collect();
        assert_eq!(names.len(), PALETTE_ENTRIES.len());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(find_command("toggle pin"), Some(PaletteCommand::TogglePin));
        assert_eq!(find_command(" HEADING 1 "), Some(PaletteCommand::Heading1));
        assert_eq!(find_command("no such"), None);
    }

    #[tokio::test]
    async fn snippet_commands_insert_at_the_cursor() {
        let (mut editor, _) = editor().await;
        let outcome = dispatch(PaletteCommand::Heading1, &mut editor).await.unwrap();
        assert_eq!(outcome, PaletteOutcome::Done);
        assert_eq!(editor.buffer(), Some("\n# "));

        let outcome = dispatch(PaletteCommand::TaskList, &mut editor).await.unwrap();
        assert_eq!(outcome, PaletteOutcome::Done);
        assert_eq!(editor.buffer(), Some("\n# \n- [ ] "));
    }

    #[tokio::test]
    async fn table_snippet_renders_as_a_table() {
        let (mut editor, _) = editor().await;
        dispatch(PaletteCommand::Table, &mut editor).await.unwrap();
        let html = editor.render_preview().unwrap();
        assert!(html.contains("<th>Header 1</th>"));
        assert!(html.contains("<td>Cell 1</td>"));
    }

    #[tokio::test]
    async fn toggle_pin_flips_the_store_entry() {
        let (mut editor, id) = editor().await;
        dispatch(PaletteCommand::TogglePin, &mut editor).await.unwrap();

        let store = editor.shared_store();
        let store = store.lock().await;
        assert!(store.note(&id).unwrap().pinned);
    }

    #[tokio::test]
    async fn image_command_defers_to_the_host_picker() {
        let (mut editor, _) = editor().await;
        let outcome = dispatch(PaletteCommand::Image, &mut editor).await.unwrap();
        assert_eq!(outcome, PaletteOutcome::PickImage);
        assert_eq!(editor.buffer(), Some(""));
    }

    #[tokio::test]
    async fn toggle_preview_round_trips() {
        let (mut editor, _) = editor().await;
        assert!(!editor.preview_enabled());
        dispatch(PaletteCommand::TogglePreview, &mut editor).await.unwrap();
        assert!(editor.preview_enabled());
        dispatch(PaletteCommand::TogglePreview, &mut editor).await.unwrap();
        assert!(!editor.preview_enabled());
    }
}
