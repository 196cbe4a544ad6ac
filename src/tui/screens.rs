use crate::app::{App, AppError, DiaryView, EntryDraft, EntryView, PhotoView};
use crate::domain::dates::{format_entry_date, today_utc};

use super::editor::TextBuffer;

pub(crate) const NEW_ENTRY_TITLE: &str = "New Entry";

#[derive(Debug)]
pub(crate) enum Screen {
    DiaryList(DiaryListState),
    Editor(Box<EditorState>),
    Settings(SettingsState),
}

#[derive(Debug, Default)]
pub(crate) struct DiaryListState {
    pub(crate) diaries: Vec<DiaryView>,
    pub(crate) selected: usize,
}

impl DiaryListState {
    pub(crate) fn load(app: &App) -> Result<Self, AppError> {
        Ok(Self {
            diaries: app.list_diaries()?,
            selected: 0,
        })
    }

    /// Reloads the list, keeping the selection on `keep_id` when it still exists.
    pub(crate) fn reload(&mut self, app: &App, keep_id: Option<i64>) -> Result<(), AppError> {
        self.diaries = app.list_diaries()?;
        self.selected = keep_id
            .and_then(|id| self.diaries.iter().position(|diary| diary.id == id))
            .unwrap_or_else(|| self.selected.min(self.diaries.len().saturating_sub(1)));
        Ok(())
    }

    pub(crate) fn selected_diary(&self) -> Option<&DiaryView> {
        self.diaries.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, down: bool) {
        if self.diaries.is_empty() {
            return;
        }
        self.selected = if down {
            (self.selected + 1).min(self.diaries.len() - 1)
        } else {
            self.selected.saturating_sub(1)
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SaveStatus {
    New,
    NotSaved,
    Saved,
}

impl SaveStatus {
    pub(crate) fn label(self) -> &'static str {
        match self {
            SaveStatus::New => "New",
            SaveStatus::NotSaved => "Not Saved",
            SaveStatus::Saved => "Saved",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EditorFocus {
    Text,
    Sidebar,
}

#[derive(Debug)]
pub(crate) struct EditorState {
    pub(crate) diary: DiaryView,
    pub(crate) entries: Vec<EntryView>,
    /// Index into `entries`; `None` while composing a new entry.
    pub(crate) current: Option<usize>,
    pub(crate) title: String,
    pub(crate) date: String,
    pub(crate) buffer: TextBuffer,
    saved_title: String,
    saved_text: String,
    pub(crate) photos: Vec<PhotoView>,
    pub(crate) photo_selected: usize,
    pub(crate) focus: EditorFocus,
}

impl EditorState {
    /// Opens the diary on its most recent entry, or on a blank one.
    pub(crate) fn open(app: &App, diary_id: i64) -> Result<Self, AppError> {
        let diary = app.get_diary(diary_id)?;
        let entries = app.list_entries(diary_id)?;
        let photos = app.list_photos(diary_id)?;
        let current = entries.len().checked_sub(1);
        let mut state = Self {
            diary,
            entries,
            current,
            title: String::new(),
            date: String::new(),
            buffer: TextBuffer::default(),
            saved_title: String::new(),
            saved_text: String::new(),
            photos,
            photo_selected: 0,
            focus: EditorFocus::Text,
        };
        state.load_current();
        Ok(state)
    }

    pub(crate) fn load_current(&mut self) {
        let (title, date, text) = match self.current.and_then(|idx| self.entries.get(idx)) {
            Some(entry) => (entry.title.clone(), entry.date.clone(), entry.text.clone()),
            None => (
                NEW_ENTRY_TITLE.to_string(),
                format_entry_date(today_utc()),
                String::new(),
            ),
        };
        self.buffer = TextBuffer::from_text(&text);
        self.saved_title = title.clone();
        self.saved_text = text;
        self.title = title;
        self.date = date;
    }

    pub(crate) fn current_entry(&self) -> Option<&EntryView> {
        self.current.and_then(|idx| self.entries.get(idx))
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.title != self.saved_title || self.buffer.text() != self.saved_text
    }

    pub(crate) fn status(&self) -> SaveStatus {
        if self.is_dirty() {
            SaveStatus::NotSaved
        } else if self.current.is_none() {
            SaveStatus::New
        } else {
            SaveStatus::Saved
        }
    }

    pub(crate) fn draft(&self) -> EntryDraft {
        EntryDraft {
            id: self.current_entry().map(|entry| entry.id),
            diary_id: self.diary.id,
            title: self.title.clone(),
            text: self.buffer.text(),
            date: Some(self.date.clone()),
        }
    }

    /// Adopts a saved entry as the clean baseline without moving the cursor.
    pub(crate) fn mark_saved(&mut self, app: &App, saved: &EntryView) -> Result<(), AppError> {
        self.entries = app.list_entries(self.diary.id)?;
        self.current = self.entries.iter().position(|entry| entry.id == saved.id);
        self.saved_title = saved.title.clone();
        self.saved_text = saved.text.clone();
        self.title = saved.title.clone();
        Ok(())
    }

    pub(crate) fn reload_photos(&mut self, app: &App) -> Result<(), AppError> {
        self.photos = app.list_photos(self.diary.id)?;
        self.entries = app.list_entries(self.diary.id)?;
        self.photo_selected = self.photo_selected.min(self.photos.len().saturating_sub(1));
        Ok(())
    }

    pub(crate) fn selected_photo(&self) -> Option<&PhotoView> {
        self.photos.get(self.photo_selected)
    }

    pub(crate) fn move_photo_selection(&mut self, down: bool) {
        if self.photos.is_empty() {
            return;
        }
        self.photo_selected = if down {
            (self.photo_selected + 1).min(self.photos.len() - 1)
        } else {
            self.photo_selected.saturating_sub(1)
        };
    }

    /// `[2/5] Title`, or `New Entry: Title`.
    pub(crate) fn position_label(&self) -> String {
        match self.current {
            Some(idx) => format!("[{}/{}] {}", idx + 1, self.entries.len(), self.title),
            None => format!("New Entry: {}", self.title),
        }
    }
}

#[derive(Debug)]
pub(crate) struct SettingsState {
    pub(crate) diary: DiaryView,
    pub(crate) auto_open: bool,
    pub(crate) saved_auto_open: bool,
}

impl SettingsState {
    pub(crate) fn open(app: &App, diary_id: i64) -> Result<Self, AppError> {
        let diary = app.get_diary(diary_id)?;
        let auto_open = app.config().auto_open_diary() == Some(diary.directory_name.as_str());
        Ok(Self {
            diary,
            auto_open,
            saved_auto_open: auto_open,
        })
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.auto_open != self.saved_auto_open
    }
}
