//! Directory browser for choosing a photo to import. Lists subdirectories and image files only.

use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent};

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "webp"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PickerEntry {
    pub(crate) path: PathBuf,
    pub(crate) is_dir: bool,
}

impl PickerEntry {
    pub(crate) fn label(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.is_dir {
            format!("{name}/")
        } else {
            name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PickerOutcome {
    Browsing,
    Picked(PathBuf),
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FilePicker {
    dir: PathBuf,
    entries: Vec<PickerEntry>,
    selected: usize,
    error: Option<String>,
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

fn read_entries(dir: &Path) -> std::io::Result<Vec<PickerEntry>> {
    let mut entries = Vec::new();
    for item in std::fs::read_dir(dir)? {
        let path = item?.path();
        let hidden = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with('.'));
        if hidden {
            continue;
        }
        let is_dir = path.is_dir();
        if is_dir || is_image(&path) {
            entries.push(PickerEntry { path, is_dir });
        }
    }
    // Directories first, then by name.
    entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.path.cmp(&b.path)));
    Ok(entries)
}

impl FilePicker {
    /// Opens at `start` when it is a directory, at its parent when it is a file, otherwise at
    /// the working directory.
    pub(crate) fn open(start: &str) -> Self {
        let start = Path::new(start.trim());
        let dir = if start.is_dir() {
            start.to_path_buf()
        } else {
            match start.parent() {
                Some(parent) if parent.is_dir() => parent.to_path_buf(),
                _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            }
        };
        let mut picker = Self {
            dir,
            entries: Vec::new(),
            selected: 0,
            error: None,
        };
        picker.reload();
        picker
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    pub(crate) fn entries(&self) -> &[PickerEntry] {
        &self.entries
    }

    pub(crate) fn selected(&self) -> usize {
        self.selected
    }

    pub(crate) fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn reload(&mut self) {
        self.selected = 0;
        match read_entries(&self.dir) {
            Ok(entries) => {
                self.entries = entries;
                self.error = None;
            }
            Err(err) => {
                self.entries.clear();
                self.error = Some(format!("cannot read {}: {err}", self.dir.display()));
            }
        }
    }

    fn enter(&mut self, dir: PathBuf) {
        self.dir = dir;
        self.reload();
    }

    fn go_up(&mut self) {
        if let Some(parent) = self.dir.parent().map(Path::to_path_buf) {
            self.enter(parent);
        }
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> PickerOutcome {
        match key.code {
            KeyCode::Esc => return PickerOutcome::Closed,
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.entries.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Backspace | KeyCode::Left | KeyCode::Char('h') => self.go_up(),
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
                if let Some(entry) = self.entries.get(self.selected).cloned() {
                    if entry.is_dir {
                        self.enter(entry.path);
                    } else {
                        return PickerOutcome::Picked(entry.path);
                    }
                }
            }
            _ => {}
        }
        PickerOutcome::Browsing
    }
}
