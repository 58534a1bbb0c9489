//! Persistence for notes and categories.
//!
//! The two collections are serialized as JSON arrays under fixed string keys
//! in a [`LocalStore`], a small key-value abstraction over the profile-local
//! storage medium. Every store mutation is synchronous and immediately
//! followed by a full re-serialization of the affected collection.

use std::{
    collections::HashMap,
    fs,
    io::Write,
    path::PathBuf,
};

use chrono::Utc;
use log::{debug, error, info, warn};
use tempfile::NamedTempFile;
use tokio::sync::mpsc;

use crate::{Category, Config, Note, NotePatch, QbError, Result, StoreEvent};

/// Fixed key under which the note collection is persisted.
pub const NOTES_KEY: &str = "notes";

/// Fixed key under which the category collection is persisted.
pub const CATEGORIES_KEY: &str = "categories";

/// Key-value persistence medium, local to the user's profile.
pub trait LocalStore: Send {
    /// Reads the value stored under `key`, or `None` if it was never written.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
}

/// File-backed [`LocalStore`]: one JSON file per key under a data directory,
/// written atomically via a temporary file in the same directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a file store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: PathBuf) -> Result<Self> {
        if !dir.exists() {
            debug!("Data directory does not exist, creating: {}", dir.display());
            fs::create_dir_all(&dir).map_err(|e| {
                error!("Failed to create data directory: {}", e);
                QbError::DirectoryError { path: dir.clone() }
            })?;
        }
        Ok(Self { dir })
    }

    /// Creates a file store rooted at the configured data directory.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.data_dir.clone())
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl LocalStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let value = fs::read_to_string(&path).map_err(|e| {
            error!("Failed to read {}: {}", path.display(), e);
            QbError::Io(e)
        })?;
        Ok(Some(value))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key);
        debug!("Writing key '{}' to {}", key, path.display());

        // Write-then-rename so a crash mid-write never corrupts the store
        let mut temp_file = NamedTempFile::new_in(&self.dir).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            QbError::Io(e)
        })?;

        temp_file.write_all(value.as_bytes()).map_err(|e| {
            error!("Failed to write to temporary file: {}", e);
            QbError::Io(e)
        })?;

        temp_file.flush().map_err(|e| {
            error!("Failed to flush temporary file: {}", e);
            QbError::Io(e)
        })?;

        temp_file.persist(&path).map_err(|e| {
            error!("Failed to persist file {}: {}", path.display(), e.error);
            QbError::Io(e.error)
        })?;

        Ok(())
    }
}

/// In-memory [`LocalStore`], used by tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Manages the in-memory note and category collections and keeps them
/// synchronized to the backing [`LocalStore`] on every change.
pub struct NoteStore {
    backend: Box<dyn LocalStore>,
    notes: Vec<Note>,
    categories: Vec<Category>,
    subscribers: Vec<mpsc::UnboundedSender<StoreEvent>>,
}

impl NoteStore {
    /// Opens a store over the given backend, loading both collections.
    ///
    /// Missing keys start the corresponding collection empty; a present but
    /// malformed value is surfaced as a serialization error rather than
    /// silently discarding the user's data.
    pub fn open(backend: Box<dyn LocalStore>) -> Result<Self> {
        let notes: Vec<Note> = match backend.read(NOTES_KEY)? {
            Some(json) => serde_json::from_str(&json)?,
            None => Vec::new(),
        };
        let categories: Vec<Category> = match backend.read(CATEGORIES_KEY)? {
            Some(json) => serde_json::from_str(&json)?,
            None => Vec::new(),
        };

        info!(
            "Loaded {} notes and {} categories",
            notes.len(),
            categories.len()
        );

        Ok(Self {
            backend,
            notes,
            categories,
            subscribers: Vec::new(),
        })
    }

    /// All notes, in insertion order. Display ordering is derived by the
    /// list view model, not stored.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// All categories, in creation order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Looks up a note by its identifier.
    pub fn note(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    /// Looks up a category by its identifier.
    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    /// Registers a change-notification subscriber. Dropped receivers are
    /// pruned on the next notification.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<StoreEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    fn notify(&mut self, event: StoreEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn persist_notes(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.notes)?;
        self.backend.write(NOTES_KEY, &json)
    }

    fn persist_categories(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.categories)?;
        self.backend.write(CATEGORIES_KEY, &json)
    }

    /// Creates a new note with defaults and persists the collection.
    pub fn create_note(
        &mut self,
        title: String,
        content: String,
        tags: Vec<String>,
    ) -> Result<Note> {
        let mut note = Note::new(title, content, tags);

        // Identifiers are time-based; disambiguate the rare same-millisecond
        // collision to keep ids unique within the store.
        let mut candidate = note.id.clone();
        let mut attempt = 1;
        while self.note(&candidate).is_some() {
            candidate = format!("{}-{}", note.id, attempt);
            attempt += 1;
        }
        note.id = candidate;

        info!("Creating note: {}", note.id);
        self.notes.push(note.clone());
        self.persist_notes()?;
        self.notify(StoreEvent::NoteCreated { id: note.id.clone() });
        Ok(note)
    }

    /// Applies a partial-field update to an existing note.
    ///
    /// Refreshes the update timestamp, marks the transient saving state, and
    /// persists the collection. Returns the updated note. An empty patch is
    /// a no-op: nothing is written and the timestamp stays put.
    pub fn update_note(&mut self, id: &str, patch: NotePatch) -> Result<Note> {
        let note = self
            .notes
            .iter_mut()
            .find(|note| note.id == id)
            .ok_or_else(|| QbError::NoteNotFound { id: id.to_string() })?;

        if patch.is_empty() {
            return Ok(note.clone());
        }

        if let Some(title) = patch.title {
            note.title = title;
        }
        if let Some(content) = patch.content {
            note.content = content;
        }
        if let Some(tags) = patch.tags {
            note.tags = tags;
        }
        if let Some(category) = patch.category {
            note.category = category;
        }
        if let Some(pinned) = patch.pinned {
            note.pinned = pinned;
        }
        if let Some(images) = patch.images {
            note.images = images;
        }
        note.updated_at = Utc::now();
        note.saving = true;

        let updated = note.clone();
        debug!("Updated note: {}", id);
        self.persist_notes()?;
        self.notify(StoreEvent::NoteUpdated { id: id.to_string() });
        Ok(updated)
    }

    /// Flips the transient saving indicator on a note. The flag is UI-only
    /// and never persisted, so nothing is written to the backend.
    pub fn set_saving(&mut self, id: &str, saving: bool) -> Result<()> {
        let note = self
            .notes
            .iter_mut()
            .find(|note| note.id == id)
            .ok_or_else(|| QbError::NoteNotFound { id: id.to_string() })?;
        note.saving = saving;
        self.notify(StoreEvent::NoteUpdated { id: id.to_string() });
        Ok(())
    }

    /// Removes a note by its identifier and persists the collection.
    pub fn delete_note(&mut self, id: &str) -> Result<()> {
        let before = self.notes.len();
        self.notes.retain(|note| note.id != id);
        if self.notes.len() == before {
            warn!("Cannot delete note {}: not found", id);
            return Err(QbError::NoteNotFound { id: id.to_string() });
        }

        info!("Deleted note: {}", id);
        self.persist_notes()?;
        self.notify(StoreEvent::NoteDeleted { id: id.to_string() });
        Ok(())
    }

    /// Flips a note's pinned flag and returns the new state.
    pub fn toggle_pin(&mut self, id: &str) -> Result<bool> {
        let note = self
            .notes
            .iter_mut()
            .find(|note| note.id == id)
            .ok_or_else(|| QbError::NoteNotFound { id: id.to_string() })?;
        note.pinned = !note.pinned;
        let pinned = note.pinned;

        debug!("Note {} pinned = {}", id, pinned);
        self.persist_notes()?;
        self.notify(StoreEvent::NoteUpdated { id: id.to_string() });
        Ok(pinned)
    }

    /// Creates a category with a randomly assigned palette color.
    pub fn create_category(&mut self, name: String) -> Result<Category> {
        let category = Category::new(name);

        info!("Creating category: {} ({})", category.name, category.id);
        self.categories.push(category.clone());
        self.persist_categories()?;
        self.notify(StoreEvent::CategoryCreated {
            id: category.id.clone(),
        });
        Ok(category)
    }

    /// Removes a category by its identifier.
    ///
    /// Notes referencing the category keep their now-dangling reference; the
    /// category link is a weak reference with no integrity enforcement.
    pub fn delete_category(&mut self, id: &str) -> Result<()> {
        let before = self.categories.len();
        self.categories.retain(|category| category.id != id);
        if self.categories.len() == before {
            return Err(QbError::CategoryNotFound { id: id.to_string() });
        }

        info!("Deleted category: {}", id);
        self.persist_categories()?;
        self.notify(StoreEvent::CategoryDeleted { id: id.to_string() });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn memory_store() -> NoteStore {
        let _ = env_logger::builder().is_test(true).try_init();
        NoteStore::open(Box::new(MemoryStore::new())).unwrap()
    }

    #[test]
    fn create_then_delete_leaves_count_unchanged() {
        let mut store = memory_store();
        store
            .create_note("keep".to_string(), String::new(), vec![])
            .unwrap();
        let before = store.notes().len();

        let note = store
            .create_note("temp".to_string(), String::new(), vec![])
            .unwrap();
        store.delete_note(&note.id).unwrap();

        assert_eq!(store.notes().len(), before);
    }

    #[test]
    fn update_merges_partial_fields_and_bumps_timestamp() {
        let mut store = memory_store();
        let note = store
            .create_note("title".to_string(), "body".to_string(), vec!["a".to_string()])
            .unwrap();

        let patch = NotePatch {
            content: Some("new body".to_string()),
            ..Default::default()
        };
        let updated = store.update_note(&note.id, patch).unwrap();

        assert_eq!(updated.title, "title");
        assert_eq!(updated.content, "new body");
        assert_eq!(updated.tags, vec!["a".to_string()]);
        assert!(updated.updated_at >= note.updated_at);
        assert!(updated.saving);
    }

    #[test]
    fn empty_patch_is_a_no_op() {
        let mut store = memory_store();
        let note = store
            .create_note("n".to_string(), "body".to_string(), vec![])
            .unwrap();

        let unchanged = store.update_note(&note.id, NotePatch::default()).unwrap();

        assert_eq!(unchanged.updated_at, note.updated_at);
        assert!(!unchanged.saving);
    }

    #[test]
    fn update_missing_note_fails() {
        let mut store = memory_store();
        let err = store.update_note("nope", NotePatch::default()).unwrap_err();
        assert!(matches!(err, QbError::NoteNotFound { .. }));
    }

    #[test]
    fn toggle_pin_flips_state() {
        let mut store = memory_store();
        let note = store
            .create_note("n".to_string(), String::new(), vec![])
            .unwrap();
        assert!(store.toggle_pin(&note.id).unwrap());
        assert!(!store.toggle_pin(&note.id).unwrap());
    }

    #[test]
    fn deleting_a_category_leaves_dangling_note_references() {
        let mut store = memory_store();
        let category = store.create_category("Work".to_string()).unwrap();
        let note = store
            .create_note("n".to_string(), String::new(), vec![])
            .unwrap();
        store
            .update_note(
                &note.id,
                NotePatch {
                    category: Some(Some(category.id.clone())),
                    ..Default::default()
                },
            )
            .unwrap();

        store.delete_category(&category.id).unwrap();

        let note = store.note(&note.id).unwrap();
        assert_eq!(note.category.as_deref(), Some(category.id.as_str()));
        assert!(store.category(&category.id).is_none());
    }

    #[test]
    fn collections_survive_a_file_store_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();

        let id = {
            let backend = FileStore::new(path.clone()).unwrap();
            let mut store = NoteStore::open(Box::new(backend)).unwrap();
            store.create_category("Ideas".to_string()).unwrap();
            store
                .create_note("persisted".to_string(), "across reopen".to_string(), vec![])
                .unwrap()
                .id
        };

        let backend = FileStore::new(path).unwrap();
        let store = NoteStore::open(Box::new(backend)).unwrap();
        assert_eq!(store.notes().len(), 1);
        assert_eq!(store.categories().len(), 1);
        let note = store.note(&id).unwrap();
        assert_eq!(note.content, "across reopen");
        assert!(!note.saving);
    }

    #[test]
    fn malformed_persisted_state_is_a_serialization_error() {
        let mut backend = MemoryStore::new();
        backend.write(NOTES_KEY, "{not json").unwrap();
        let err = NoteStore::open(Box::new(backend)).err().unwrap();
        assert!(matches!(err, QbError::Serialization(_)));
    }

    #[tokio::test]
    async fn subscribers_see_store_events() {
        let mut store = memory_store();
        let mut events = store.subscribe();

        let note = store
            .create_note("n".to_string(), String::new(), vec![])
            .unwrap();
        store.toggle_pin(&note.id).unwrap();
        store.delete_note(&note.id).unwrap();

        assert_eq!(
            events.recv().await,
            Some(StoreEvent::NoteCreated { id: note.id.clone() })
        );
        assert_eq!(
            events.recv().await,
            Some(StoreEvent::NoteUpdated { id: note.id.clone() })
        );
        assert_eq!(
            events.recv().await,
            Some(StoreEvent::NoteDeleted { id: note.id })
        );
    }

    #[test]
    fn same_millisecond_ids_are_disambiguated() {
        let mut store = memory_store();
        let a = store
            .create_note("same".to_string(), String::new(), vec![])
            .unwrap();
        let b = store
            .create_note("same".to_string(), String::new(), vec![])
            .unwrap();
        assert_ne!(a.id, b.id);
    }
}
