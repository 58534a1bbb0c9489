//! Editor surface.
//!
//! Binds user input to store mutations: text edits and formatting wraps on
//! the open note's buffer, tag add/remove, image ingestion (file bytes
//! embedded as a data URI and referenced from the body), pin toggling, a
//! markdown preview toggle, and the debounced saving indicator.
//!
//! The open note is a transient copy of the store entry sharing its
//! identifier; every edit is written through to the store immediately. The
//! saving indicator is pure debounce, not a persistence confirmation.

use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use log::{debug, warn};
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
    time::{self, Duration},
};

use crate::{
    image_alt_text, image_data_uri, markdown_to_html, parse_tags, Config, NotePatch, NoteStore,
    QbError, Result,
};

/// Debounced "saving" indicator.
///
/// Each edit marks the state saving and restarts the timer; the flag clears
/// after a quiet period with no further edits. The timer handle is owned
/// here so rescheduling is an explicit cancel-and-respawn.
pub struct SaveIndicator {
    saving: Arc<AtomicBool>,
    quiet: Duration,
    timer: Option<JoinHandle<()>>,
}

impl SaveIndicator {
    pub fn new(quiet: Duration) -> Self {
        Self {
            saving: Arc::new(AtomicBool::new(false)),
            quiet,
            timer: None,
        }
    }

    /// Marks the state saving and restarts the quiet-period timer. When the
    /// timer fires it also clears the transient flag on the store entry.
    pub fn touch(&mut self, store: Arc<Mutex<NoteStore>>, note_id: String) {
        self.saving.store(true, Ordering::SeqCst);
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }

        let saving = Arc::clone(&self.saving);
        // Anchor the quiet period to the edit itself, not to whenever the
        // spawned task is first polled.
        let deadline = time::Instant::now() + self.quiet;
        self.timer = Some(tokio::spawn(async move {
            time::sleep_until(deadline).await;
            saving.store(false, Ordering::SeqCst);
            if let Err(e) = store.lock().await.set_saving(&note_id, false) {
                debug!("Saving indicator clear skipped: {}", e);
            }
        }));
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::SeqCst)
    }
}

impl Drop for SaveIndicator {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// Transient editing copy of a store note.
struct OpenNote {
    id: String,
    content: String,
    /// Byte offset of the text cursor, always on a char boundary
    cursor: usize,
    /// Selected byte range, `start <= end`, both on char boundaries
    selection: Option<(usize, usize)>,
}

/// Binds user input to store mutations for the currently open note.
pub struct EditorSurface {
    store: Arc<Mutex<NoteStore>>,
    config: Config,
    open_note: Option<OpenNote>,
    indicator: SaveIndicator,
    preview_enabled: bool,
}

impl EditorSurface {
    pub fn new(store: Arc<Mutex<NoteStore>>, config: Config) -> Self {
        let quiet = Duration::from_millis(config.autosave_quiet_ms);
        Self {
            store,
            config,
            open_note: None,
            indicator: SaveIndicator::new(quiet),
            preview_enabled: false,
        }
    }

    /// Opens a note for editing, copying its content into the buffer. The
    /// cursor starts at the end of the text.
    pub async fn open_note(&mut self, id: &str) -> Result<()> {
        let note = self
            .store
            .lock()
            .await
            .note(id)
            .cloned()
            .ok_or_else(|| QbError::NoteNotFound { id: id.to_string() })?;

        let cursor = note.content.len();
        self.open_note = Some(OpenNote {
            id: note.id,
            content: note.content,
            cursor,
            selection: None,
        });
        Ok(())
    }

    /// Handle to the shared store, for hosts driving list views alongside
    /// the editor.
    pub fn shared_store(&self) -> Arc<Mutex<NoteStore>> {
        Arc::clone(&self.store)
    }

    pub fn open_note_id(&self) -> Option<&str> {
        self.open_note.as_ref().map(|open| open.id.as_str())
    }

    pub fn buffer(&self) -> Option<&str> {
        self.open_note.as_ref().map(|open| open.content.as_str())
    }

    pub fn cursor(&self) -> Option<usize> {
        self.open_note.as_ref().map(|open| open.cursor)
    }

    pub fn selection(&self) -> Option<(usize, usize)> {
        self.open_note.as_ref().and_then(|open| open.selection)
    }

    pub fn is_saving(&self) -> bool {
        self.indicator.is_saving()
    }

    pub fn preview_enabled(&self) -> bool {
        self.preview_enabled
    }

    pub fn toggle_preview(&mut self) -> bool {
        self.preview_enabled = !self.preview_enabled;
        self.preview_enabled
    }

    /// Renders the current buffer as an HTML preview fragment.
    pub fn render_preview(&self) -> Result<String> {
        Ok(markdown_to_html(&self.require_open()?.content))
    }

    /// Moves the cursor, clearing any selection.
    pub fn set_cursor(&mut self, pos: usize) -> Result<()> {
        let open = self.require_open_mut()?;
        open.cursor = clamp_boundary(&open.content, pos);
        open.selection = None;
        Ok(())
    }

    /// Selects a byte range; the cursor moves to the selection end.
    pub fn select(&mut self, start: usize, end: usize) -> Result<()> {
        let open = self.require_open_mut()?;
        let a = clamp_boundary(&open.content, start);
        let b = clamp_boundary(&open.content, end);
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        open.selection = Some((start, end));
        open.cursor = end;
        Ok(())
    }

    /// Inserts text at the cursor, replacing the selection if one is active.
    pub async fn insert_at_cursor(&mut self, text: &str) -> Result<()> {
        {
            let open = self.require_open_mut()?;
            let (start, end) = match open.selection.take() {
                Some(range) => range,
                None => (open.cursor, open.cursor),
            };
            open.content.replace_range(start..end, text);
            open.cursor = start + text.len();
        }
        self.sync_content().await
    }

    /// Wraps the selection in a formatting marker (`**` for bold, `*` for
    /// italic), restoring the selection around the wrapped text. Without a
    /// selection, inserts a marker pair and leaves the cursor between them.
    pub async fn wrap_selection(&mut self, marker: &str) -> Result<()> {
        {
            let open = self.require_open_mut()?;
            match open.selection {
                Some((start, end)) => {
                    open.content.insert_str(end, marker);
                    open.content.insert_str(start, marker);
                    open.selection = Some((start + marker.len(), end + marker.len()));
                    open.cursor = end + marker.len();
                }
                None => {
                    let at = open.cursor;
                    open.content.insert_str(at, marker);
                    open.content.insert_str(at + marker.len(), marker);
                    open.cursor = at + marker.len();
                }
            }
        }
        self.sync_content().await
    }

    /// Updates the open note's title.
    pub async fn set_title(&mut self, title: &str) -> Result<()> {
        let id = self.require_open()?.id.clone();
        self.store.lock().await.update_note(
            &id,
            NotePatch {
                title: Some(title.to_string()),
                ..Default::default()
            },
        )?;
        self.schedule_saving_clear(id);
        Ok(())
    }

    /// Assigns or clears the open note's category.
    pub async fn set_category(&mut self, category: Option<String>) -> Result<()> {
        let id = self.require_open()?.id.clone();
        self.store.lock().await.update_note(
            &id,
            NotePatch {
                category: Some(category),
                ..Default::default()
            },
        )?;
        self.schedule_saving_clear(id);
        Ok(())
    }

    /// Flips the open note's pinned flag, returning the new state.
    pub async fn toggle_pin(&mut self) -> Result<bool> {
        let id = self.require_open()?.id.clone();
        let pinned = self.store.lock().await.toggle_pin(&id)?;
        self.schedule_saving_clear(id);
        Ok(pinned)
    }

    /// Adds a tag to the open note. Duplicate tags (case-insensitive) are
    /// suppressed; returns whether the tag was actually added.
    pub async fn add_tag(&mut self, tag: &str) -> Result<bool> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Ok(false);
        }
        let id = self.require_open()?.id.clone();

        {
            let mut store = self.store.lock().await;
            let note = store
                .note(&id)
                .ok_or_else(|| QbError::NoteNotFound { id: id.clone() })?;
            if note.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                debug!("Tag '{}' already present on note {}", tag, id);
                return Ok(false);
            }
            let mut tags = note.tags.clone();
            tags.push(tag.to_string());
            store.update_note(
                &id,
                NotePatch {
                    tags: Some(tags),
                    ..Default::default()
                },
            )?;
        }
        self.schedule_saving_clear(id);
        Ok(true)
    }

    /// Adds comma-separated tag input, returning how many tags were added.
    pub async fn add_tags(&mut self, input: &str) -> Result<usize> {
        let mut added = 0;
        for tag in parse_tags(input) {
            if self.add_tag(&tag).await? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Removes a tag from the open note.
    pub async fn remove_tag(&mut self, tag: &str) -> Result<()> {
        let id = self.require_open()?.id.clone();

        {
            let mut store = self.store.lock().await;
            let note = store
                .note(&id)
                .ok_or_else(|| QbError::NoteNotFound { id: id.clone() })?;
            let tags: Vec<String> = note
                .tags
                .iter()
                .filter(|t| !t.eq_ignore_ascii_case(tag))
                .cloned()
                .collect();
            store.update_note(
                &id,
                NotePatch {
                    tags: Some(tags),
                    ..Default::default()
                },
            )?;
        }
        self.schedule_saving_clear(id);
        Ok(())
    }

    /// Reads a file, embeds it as an image data URI, and appends an image
    /// reference to the note body and image list.
    pub async fn attach_image(&mut self, path: &Path) -> Result<()> {
        self.require_open()?;
        let uri = read_image(path, self.config.max_image_bytes).await?;
        self.append_image(path, uri).await
    }

    /// Ingests several files concurrently, as a multi-file drop would.
    ///
    /// Each read completes independently and appends in completion order,
    /// not drop order. Unreadable or non-image files are logged and skipped.
    /// Returns the number of images attached.
    pub async fn attach_images(&mut self, paths: Vec<PathBuf>) -> Result<usize> {
        self.require_open()?;
        let max_bytes = self.config.max_image_bytes;

        let (tx, mut rx) = mpsc::unbounded_channel();
        for path in paths {
            let tx = tx.clone();
            tokio::spawn(async move {
                match read_image(&path, max_bytes).await {
                    Ok(uri) => {
                        let _ = tx.send((path, uri));
                    }
                    Err(e) => warn!("Skipping image {}: {}", path.display(), e),
                }
            });
        }
        drop(tx);

        let mut added = 0;
        while let Some((path, uri)) = rx.recv().await {
            self.append_image(&path, uri).await?;
            added += 1;
        }
        Ok(added)
    }

    async fn append_image(&mut self, path: &Path, uri: String) -> Result<()> {
        let alt = image_alt_text(path);
        let (id, content) = {
            let open = self.require_open_mut()?;
            if !open.content.is_empty() && !open.content.ends_with('\n') {
                open.content.push('\n');
            }
            open.content.push_str(&format!("![{}]({})\n", alt, uri));
            open.cursor = open.content.len();
            open.selection = None;
            (open.id.clone(), open.content.clone())
        };

        {
            let mut store = self.store.lock().await;
            let mut images = store.note(&id).map(|n| n.images.clone()).unwrap_or_default();
            images.push(uri);
            store.update_note(
                &id,
                NotePatch {
                    content: Some(content),
                    images: Some(images),
                    ..Default::default()
                },
            )?;
        }
        self.schedule_saving_clear(id);
        Ok(())
    }

    /// Writes the buffer through to the store and restarts the debounce.
    async fn sync_content(&mut self) -> Result<()> {
        let (id, content) = {
            let open = self.require_open()?;
            (open.id.clone(), open.content.clone())
        };
        self.store.lock().await.update_note(
            &id,
            NotePatch {
                content: Some(content),
                ..Default::default()
            },
        )?;
        self.schedule_saving_clear(id);
        Ok(())
    }

    fn schedule_saving_clear(&mut self, id: String) {
        self.indicator.touch(Arc::clone(&self.store), id);
    }

    fn require_open(&self) -> Result<&OpenNote> {
        self.open_note.as_ref().ok_or(QbError::NoOpenNote)
    }

    fn require_open_mut(&mut self) -> Result<&mut OpenNote> {
        self.open_note.as_mut().ok_or(QbError::NoOpenNote)
    }
}

/// Clamps a byte position into the string and back onto a char boundary.
fn clamp_boundary(text: &str, mut pos: usize) -> usize {
    pos = pos.min(text.len());
    while pos > 0 && !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

async fn read_image(path: &Path, max_bytes: usize) -> Result<String> {
    let bytes = tokio::fs::read(path).await.map_err(QbError::Io)?;
    if bytes.len() > max_bytes {
        return Err(QbError::InvalidImage {
            path: path.to_path_buf(),
            message: format!("{} bytes exceeds the {} byte limit", bytes.len(), max_bytes),
        });
    }
    image_data_uri(path, &bytes)
}
