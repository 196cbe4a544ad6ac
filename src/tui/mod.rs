//! Terminal UI.
//!
//! A ratatui + crossterm shell over [`App`]: diary list, entry editor with a photo sidebar,
//! diary settings, and modal prompts. Every state transition goes through `Tui::handle_key`;
//! drawing only reads state.

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};

use crate::app::{App, AppError, PhotoImport};

mod draw;
mod editor;
mod file_picker;
mod modals;
mod screens;

use modals::{ConfirmAction, Modal, ModalOutcome, PromptAction, Submission};
use screens::{DiaryListState, EditorFocus, EditorState, Screen, SettingsState};

const TOAST_TTL: Duration = Duration::from_secs(3);
const ERROR_TOAST_TTL: Duration = Duration::from_secs(6);
const MAX_TOASTS: usize = 4;

/// Runs the interactive UI until the user quits.
pub fn run(app: App) -> Result<(), AppError> {
    let mut terminal = TerminalSession::new()?;
    let mut tui = Tui::new(app)?;

    while !tui.should_quit {
        tui.toasts.prune(Instant::now());
        terminal.draw(|frame| draw::draw(frame, &tui))?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    tui.handle_key(key);
                }
            }
        }
    }

    tracing::info!("tui closed");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub(crate) struct Toast {
    pub(crate) message: String,
    pub(crate) level: ToastLevel,
    expires_at: Instant,
}

#[derive(Debug, Default)]
pub(crate) struct Toasts {
    items: Vec<Toast>,
}

impl Toasts {
    fn push(&mut self, level: ToastLevel, message: impl Into<String>) {
        let ttl = if level == ToastLevel::Error {
            ERROR_TOAST_TTL
        } else {
            TOAST_TTL
        };
        self.items.push(Toast {
            message: message.into(),
            level,
            expires_at: Instant::now() + ttl,
        });
        if self.items.len() > MAX_TOASTS {
            let overflow = self.items.len() - MAX_TOASTS;
            self.items.drain(..overflow);
        }
    }

    fn info(&mut self, message: impl Into<String>) {
        self.push(ToastLevel::Info, message);
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.push(ToastLevel::Warning, message);
    }

    fn error(&mut self, message: impl Into<String>) {
        self.push(ToastLevel::Error, message);
    }

    /// One toast per reference problem, otherwise the error's display text.
    fn app_error(&mut self, err: &AppError) {
        match err {
            AppError::References(errors) => {
                for message in errors.messages() {
                    self.error(message);
                }
            }
            other => self.error(other.to_string()),
        }
    }

    fn prune(&mut self, now: Instant) {
        self.items.retain(|toast| toast.expires_at > now);
    }

    pub(crate) fn items(&self) -> &[Toast] {
        &self.items
    }
}

pub(crate) struct Tui {
    app: App,
    screen: Screen,
    modal: Option<Modal>,
    toasts: Toasts,
    should_quit: bool,
}

fn is_ctrl(key: &KeyEvent, ch: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(ch)
}

fn delete_photo_message(name: &str, linked: usize) -> String {
    match linked {
        0 => format!("Delete photo '{name}'? (y/n)"),
        1 => format!("Delete photo '{name}'? 1 entry references it and will need editing. (y/n)"),
        n => format!("Delete photo '{name}'? {n} entries reference it and will need editing. (y/n)"),
    }
}

impl Tui {
    /// Starts on the diary list, or directly in the configured auto-open diary.
    pub(crate) fn new(app: App) -> Result<Self, AppError> {
        let list = DiaryListState::load(&app)?;
        let mut tui = Self {
            app,
            screen: Screen::DiaryList(list),
            modal: None,
            toasts: Toasts::default(),
            should_quit: false,
        };

        let auto_open = tui.app.config().auto_open_diary().map(str::to_string);
        if let Some(directory_name) = auto_open {
            match tui.app.find_diary_by_directory(&directory_name)? {
                Some(diary) => tui.open_editor(diary.id),
                None => tui
                    .toasts
                    .warn(format!("auto-open diary '{directory_name}' no longer exists")),
            }
        }
        Ok(tui)
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        if let Some(mut modal) = self.modal.take() {
            match modal.handle_key(key) {
                ModalOutcome::Pending => self.modal = Some(modal),
                ModalOutcome::Cancelled => self.toasts.info("cancelled"),
                ModalOutcome::Closed => {}
                ModalOutcome::Submitted(submission) => self.apply_submission(submission),
            }
            return;
        }

        match self.screen {
            Screen::DiaryList(_) => self.handle_list_key(key),
            Screen::Editor(_) => self.handle_editor_key(key),
            Screen::Settings(_) => self.handle_settings_key(key),
        }
    }

    fn open_editor(&mut self, diary_id: i64) {
        match EditorState::open(&self.app, diary_id) {
            Ok(editor) => {
                self.toasts.info(format!("opened {}", editor.diary.name));
                self.screen = Screen::Editor(Box::new(editor));
            }
            Err(err) => self.toasts.app_error(&err),
        }
    }

    fn back_to_list(&mut self, keep_id: Option<i64>) {
        let mut list = DiaryListState::default();
        match list.reload(&self.app, keep_id) {
            Ok(()) => self.screen = Screen::DiaryList(list),
            Err(err) => self.toasts.app_error(&err),
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        let Screen::DiaryList(list) = &mut self.screen else {
            return;
        };
        if is_ctrl(&key, 'q') {
            self.should_quit = true;
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => list.move_selection(false),
            KeyCode::Down | KeyCode::Char('j') => list.move_selection(true),
            KeyCode::Char('n') => {
                self.modal = Some(Modal::prompt("New diary name", "", PromptAction::NewDiary));
            }
            KeyCode::Char('e') => match list.selected_diary() {
                Some(diary) => {
                    self.modal = Some(Modal::prompt(
                        "Rename diary",
                        &diary.name,
                        PromptAction::RenameDiary(diary.id),
                    ));
                }
                None => self.toasts.warn("no diary selected"),
            },
            KeyCode::Char('s') => match list.selected_diary().map(|diary| diary.id) {
                Some(id) => match SettingsState::open(&self.app, id) {
                    Ok(settings) => self.screen = Screen::Settings(settings),
                    Err(err) => self.toasts.app_error(&err),
                },
                None => self.toasts.warn("no diary selected"),
            },
            KeyCode::Char('r') => {
                let keep = list.selected_diary().map(|diary| diary.id);
                match list.reload(&self.app, keep) {
                    Ok(()) => self.toasts.info("refreshed"),
                    Err(err) => self.toasts.app_error(&err),
                }
            }
            KeyCode::Char('?') => self.modal = Some(Modal::About),
            KeyCode::Enter => match list.selected_diary().map(|diary| diary.id) {
                Some(id) => self.open_editor(id),
                None => self.toasts.warn("create a diary first with 'n'"),
            },
            _ => {}
        }
    }

    fn handle_editor_key(&mut self, key: KeyEvent) {
        let Screen::Editor(editor) = &mut self.screen else {
            return;
        };

        if is_ctrl(&key, 'p') {
            editor.focus = match editor.focus {
                EditorFocus::Text => EditorFocus::Sidebar,
                EditorFocus::Sidebar => EditorFocus::Text,
            };
            return;
        }
        if is_ctrl(&key, 's') {
            self.save_entry();
            return;
        }
        if is_ctrl(&key, 'n') {
            self.next_entry();
            return;
        }
        if is_ctrl(&key, 'b') {
            self.previous_entry();
            return;
        }
        if is_ctrl(&key, 'r') {
            self.modal = Some(Modal::prompt(
                "Rename entry",
                &editor.title,
                PromptAction::RenameEntry,
            ));
            return;
        }

        let focus = editor.focus;
        match focus {
            EditorFocus::Sidebar => self.handle_sidebar_key(key),
            EditorFocus::Text => {
                if key.code == KeyCode::Esc {
                    if editor.is_dirty() {
                        self.toasts
                            .warn("There are unsaved changes! Use Ctrl+S to save before leaving.");
                        return;
                    }
                    let keep = editor.diary.id;
                    self.back_to_list(Some(keep));
                    return;
                }
                editor.buffer.handle_key(key);
            }
        }
    }

    fn handle_sidebar_key(&mut self, key: KeyEvent) {
        let Screen::Editor(editor) = &mut self.screen else {
            return;
        };
        match key.code {
            KeyCode::Esc => editor.focus = EditorFocus::Text,
            KeyCode::Up | KeyCode::Char('k') => editor.move_photo_selection(false),
            KeyCode::Down | KeyCode::Char('j') => editor.move_photo_selection(true),
            KeyCode::Char('i') | KeyCode::Enter => match editor.selected_photo() {
                Some(photo) => {
                    let token = photo.reference.clone();
                    editor.buffer.insert_str(&token);
                    editor.focus = EditorFocus::Text;
                    self.toasts.info(format!("inserted {token}"));
                }
                None => self.toasts.warn("no photo selected"),
            },
            KeyCode::Char('n') => self.modal = Some(Modal::add_photo(editor.diary.id)),
            KeyCode::Char('e') => match editor.selected_photo() {
                Some(photo) => {
                    self.modal = Some(Modal::edit_photo(
                        photo.id,
                        &photo.name,
                        photo.caption.as_deref(),
                    ));
                }
                None => self.toasts.warn("no photo selected"),
            },
            KeyCode::Char('d') => match editor.selected_photo() {
                Some(photo) => match self.app.photo_link_count(photo.id) {
                    Ok(linked) => {
                        self.modal = Some(Modal::Confirm {
                            message: delete_photo_message(&photo.name, linked),
                            action: ConfirmAction::DeletePhoto(photo.id),
                        });
                    }
                    Err(err) => self.toasts.app_error(&err),
                },
                None => self.toasts.warn("no photo selected"),
            },
            _ => {}
        }
    }

    fn save_entry(&mut self) {
        let Screen::Editor(editor) = &mut self.screen else {
            return;
        };
        if editor.current.is_none() && editor.buffer.text().trim().is_empty() {
            self.toasts.warn("Empty entry cannot be saved");
            return;
        }

        match self.app.save_entry(editor.draft()) {
            Ok(saved) => match editor.mark_saved(&self.app, &saved) {
                Ok(()) => self
                    .toasts
                    .info(format!("Entry '{}' saved successfully!", saved.title)),
                Err(err) => self.toasts.app_error(&err),
            },
            Err(err) => self.toasts.app_error(&err),
        }
    }

    fn next_entry(&mut self) {
        let Screen::Editor(editor) = &mut self.screen else {
            return;
        };
        if editor.is_dirty() {
            self.toasts.warn("Save with Ctrl+S before switching entries");
            return;
        }
        match editor.current {
            None => {
                self.toasts.info("Already at the last position (new entry)");
                return;
            }
            Some(idx) if idx + 1 < editor.entries.len() => editor.current = Some(idx + 1),
            Some(_) => editor.current = None,
        }
        editor.load_current();
        let message = match editor.current_entry() {
            Some(entry) => format!("Navigating to: {}", entry.title),
            None => "New entry created".to_string(),
        };
        self.toasts.info(message);
    }

    fn previous_entry(&mut self) {
        let Screen::Editor(editor) = &mut self.screen else {
            return;
        };
        if editor.is_dirty() {
            self.toasts.warn("Save with Ctrl+S before switching entries");
            return;
        }
        if editor.entries.is_empty() {
            self.toasts.info("No entries to navigate");
            return;
        }
        match editor.current {
            None => editor.current = Some(editor.entries.len() - 1),
            Some(0) => {
                self.toasts.info("Already at the first entry");
                return;
            }
            Some(idx) => editor.current = Some(idx - 1),
        }
        editor.load_current();
        if let Some(entry) = editor.current_entry() {
            let message = format!("Navigating to: {}", entry.title);
            self.toasts.info(message);
        }
    }

    fn handle_settings_key(&mut self, key: KeyEvent) {
        let Screen::Settings(settings) = &mut self.screen else {
            return;
        };

        if is_ctrl(&key, 's') {
            let target = if settings.auto_open {
                Some(settings.diary.directory_name.as_str())
            } else if settings.saved_auto_open {
                None
            } else {
                self.toasts.info("nothing to save");
                return;
            };
            match self.app.set_auto_open_diary(target) {
                Ok(()) => {
                    settings.saved_auto_open = settings.auto_open;
                    self.toasts.info("settings saved");
                }
                Err(err) => self.toasts.app_error(&err),
            }
            return;
        }

        let diary_id = settings.diary.id;
        match key.code {
            KeyCode::Char(' ') => settings.auto_open = !settings.auto_open,
            KeyCode::Char('D') => {
                self.modal = Some(Modal::delete_diary(diary_id, &settings.diary.name));
            }
            KeyCode::Char('E') => {
                self.modal = Some(Modal::Confirm {
                    message: format!(
                        "Delete all {} entries of '{}'? (y/n)",
                        settings.diary.entries, settings.diary.name
                    ),
                    action: ConfirmAction::DeleteAllEntries(diary_id),
                });
            }
            KeyCode::Char('P') => {
                self.modal = Some(Modal::Confirm {
                    message: format!(
                        "Delete all {} photos of '{}'? (y/n)",
                        settings.diary.photos, settings.diary.name
                    ),
                    action: ConfirmAction::DeleteAllPhotos(diary_id),
                });
            }
            KeyCode::Esc => {
                if settings.is_dirty() {
                    self.toasts
                        .warn("Unsaved settings! Press Ctrl+S to save or Space to revert.");
                    return;
                }
                self.back_to_list(Some(diary_id));
            }
            _ => {}
        }
    }

    fn apply_submission(&mut self, submission: Submission) {
        if let Err(err) = self.try_apply_submission(submission) {
            self.toasts.app_error(&err);
        }
    }

    fn try_apply_submission(&mut self, submission: Submission) -> Result<(), AppError> {
        match submission {
            Submission::Prompt {
                action: PromptAction::NewDiary,
                value,
            } => {
                let diary = self.app.create_diary(&value)?;
                self.toasts.info(format!("diary '{}' created", diary.name));
                if self.app.config().settings.diary.auto_open_on_creation {
                    self.open_editor(diary.id);
                } else {
                    self.back_to_list(Some(diary.id));
                }
            }
            Submission::Prompt {
                action: PromptAction::RenameDiary(id),
                value,
            } => {
                let diary = self.app.rename_diary(id, &value)?;
                self.toasts.info(format!("diary renamed to '{}'", diary.name));
                self.back_to_list(Some(id));
            }
            Submission::Prompt {
                action: PromptAction::RenameEntry,
                value,
            } => {
                let Screen::Editor(editor) = &mut self.screen else {
                    return Ok(());
                };
                let title = value.trim();
                if title.is_empty() {
                    self.toasts.error("Name cannot be empty");
                    return Ok(());
                }
                let old = std::mem::replace(&mut editor.title, title.to_string());
                self.toasts
                    .info(format!("Title changed from '{old}' to '{title}'; Ctrl+S to save"));
            }
            Submission::AddPhoto {
                diary_id,
                path,
                name,
                caption,
            } => {
                let photo = self.app.ingest_photo(
                    diary_id,
                    PhotoImport {
                        source: PathBuf::from(path.trim()),
                        name: Some(name),
                        caption: Some(caption),
                    },
                )?;
                if let Screen::Editor(editor) = &mut self.screen {
                    editor.reload_photos(&self.app)?;
                    if let Some(idx) = editor.photos.iter().position(|p| p.id == photo.id) {
                        editor.photo_selected = idx;
                    }
                }
                self.toasts
                    .info(format!("photo '{}' added as {}", photo.name, photo.reference));
            }
            Submission::EditPhoto {
                photo_id,
                name,
                caption,
            } => {
                let photo = self
                    .app
                    .update_photo(photo_id, Some(&name), Some(&caption))?;
                if let Screen::Editor(editor) = &mut self.screen {
                    editor.reload_photos(&self.app)?;
                }
                self.toasts.info(format!("photo '{}' updated", photo.name));
            }
            Submission::Confirmed(ConfirmAction::DeletePhoto(photo_id)) => {
                let photo = self.app.delete_photo(photo_id)?;
                if let Screen::Editor(editor) = &mut self.screen {
                    editor.reload_photos(&self.app)?;
                }
                self.toasts.info(format!("photo '{}' deleted", photo.name));
            }
            Submission::Confirmed(ConfirmAction::DeleteAllEntries(diary_id)) => {
                let removed = self.app.delete_all_entries(diary_id)?;
                self.refresh_settings(diary_id)?;
                self.toasts.info(format!("{removed} entries deleted"));
            }
            Submission::Confirmed(ConfirmAction::DeleteAllPhotos(diary_id)) => {
                let removed = self.app.delete_all_photos(diary_id)?;
                self.refresh_settings(diary_id)?;
                self.toasts.info(format!("{removed} photos deleted"));
            }
            Submission::DeleteDiary(diary_id) => {
                let diary = self.app.delete_diary(diary_id)?;
                self.toasts.info(format!("diary '{}' deleted", diary.name));
                self.back_to_list(None);
            }
        }
        Ok(())
    }

    fn refresh_settings(&mut self, diary_id: i64) -> Result<(), AppError> {
        if let Screen::Settings(settings) = &mut self.screen {
            settings.diary = self.app.get_diary(diary_id)?;
        }
        Ok(())
    }
}

struct TerminalSession {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalSession {
    fn new() -> io::Result<Self> {
        enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).map_err(|err| {
            teardown_terminal();
            err
        })?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).map_err(|err| {
            teardown_terminal();
            err
        })?;
        terminal.clear().map_err(|err| {
            teardown_terminal();
            err
        })?;

        Ok(Self { terminal })
    }

    fn draw(&mut self, draw_fn: impl FnOnce(&mut Frame<'_>)) -> io::Result<()> {
        self.terminal.draw(draw_fn)?;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
        teardown_terminal();
    }
}

fn teardown_terminal() {
    let _ = disable_raw_mode();
    let mut stdout = io::stdout();
    let _ = execute!(stdout, LeaveAlternateScreen);
}

#[cfg(test)]
mod tests;
