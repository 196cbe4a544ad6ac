use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{backend::TestBackend, Terminal};
use uuid::Uuid;

use super::modals::Modal;
use super::screens::{EditorFocus, SaveStatus, Screen};
use super::{draw, ToastLevel, Tui};
use crate::app::{App, EntryDraft, PhotoImport};
use crate::config::Config;
use crate::paths::DirectoryLayout;
use crate::store::MemoryStore;

fn unique_home() -> PathBuf {
    let root = std::env::temp_dir().join(format!("pilgrim-tui-test-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&root).expect("temp home should be creatable");
    root
}

fn app_with(home: &Path, tweak: impl FnOnce(&mut Config)) -> App {
    let layout = DirectoryLayout::new(home);
    let mut config = Config::defaults_for(&layout);
    tweak(&mut config);
    App::with_store(Box::new(MemoryStore::new()), layout, config)
}

fn press(tui: &mut Tui, code: KeyCode) {
    tui.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
}

fn ctrl(tui: &mut Tui, ch: char) {
    tui.handle_key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL));
}

fn type_text(tui: &mut Tui, text: &str) {
    for ch in text.chars() {
        press(tui, KeyCode::Char(ch));
    }
}

fn toasts_at(tui: &Tui, level: ToastLevel) -> Vec<String> {
    tui.toasts
        .items()
        .iter()
        .filter(|toast| toast.level == level)
        .map(|toast| toast.message.clone())
        .collect()
}

fn editor(tui: &Tui) -> &super::screens::EditorState {
    match &tui.screen {
        Screen::Editor(editor) => editor,
        other => panic!("expected editor screen, got {other:?}"),
    }
}

fn rendered(tui: &Tui) -> String {
    let mut terminal = Terminal::new(TestBackend::new(100, 30)).expect("test terminal");
    terminal
        .draw(|frame| draw::draw(frame, tui))
        .expect("frame should draw");
    terminal
        .backend()
        .buffer()
        .content()
        .iter()
        .map(|cell| cell.symbol())
        .collect()
}

fn write_photo(home: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = home.join("incoming").join(name);
    std::fs::create_dir_all(path.parent().expect("parent")).expect("incoming dir");
    std::fs::write(&path, content).expect("photo should be writable");
    path
}

#[test]
fn new_diary_prompt_creates_and_selects_diary() {
    let home = unique_home();
    let mut tui = Tui::new(app_with(&home, |_| {})).expect("tui");

    press(&mut tui, KeyCode::Char('n'));
    assert!(matches!(tui.modal, Some(Modal::Prompt { .. })));
    type_text(&mut tui, "Porto");
    press(&mut tui, KeyCode::Enter);

    assert!(tui.modal.is_none());
    match &tui.screen {
        Screen::DiaryList(list) => {
            assert_eq!(list.diaries.len(), 1);
            assert_eq!(list.selected_diary().map(|d| d.name.as_str()), Some("Porto"));
        }
        other => panic!("expected diary list, got {other:?}"),
    }
    assert!(rendered(&tui).contains("Porto"));

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn creation_opens_editor_when_configured() {
    let home = unique_home();
    let app = app_with(&home, |config| config.settings.diary.auto_open_on_creation = true);
    let mut tui = Tui::new(app).expect("tui");

    press(&mut tui, KeyCode::Char('n'));
    type_text(&mut tui, "Lisboa");
    press(&mut tui, KeyCode::Enter);

    let editor = editor(&tui);
    assert_eq!(editor.diary.name, "Lisboa");
    assert_eq!(editor.status(), SaveStatus::New);

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn rejected_save_reports_every_problem_and_stays_dirty() {
    let home = unique_home();
    let mut app = app_with(&home, |_| {});
    app.create_diary("Porto").expect("diary");
    let mut tui = Tui::new(app).expect("tui");

    press(&mut tui, KeyCode::Enter);
    type_text(&mut tui, "see [[photo::deadbeef]] and [[photo::cafe1234]]");
    ctrl(&mut tui, 's');

    let errors = toasts_at(&tui, ToastLevel::Error);
    assert_eq!(errors.len(), 2, "{errors:?}");
    assert!(errors.iter().any(|message| message.contains("deadbeef")));
    assert_eq!(editor(&tui).status(), SaveStatus::NotSaved);
    let diary_id = editor(&tui).diary.id;
    assert!(tui.app.list_entries(diary_id).expect("entries").is_empty());

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn save_then_leave_returns_to_list() {
    let home = unique_home();
    let mut app = app_with(&home, |_| {});
    app.create_diary("Porto").expect("diary");
    let mut tui = Tui::new(app).expect("tui");

    press(&mut tui, KeyCode::Enter);
    ctrl(&mut tui, 's');
    assert_eq!(
        toasts_at(&tui, ToastLevel::Warning),
        vec!["Empty entry cannot be saved".to_string()]
    );

    type_text(&mut tui, "Day one");
    press(&mut tui, KeyCode::Esc);
    assert!(matches!(tui.screen, Screen::Editor(_)));

    ctrl(&mut tui, 's');
    let state = editor(&tui);
    assert_eq!(state.status(), SaveStatus::Saved);
    assert_eq!(state.position_label(), "[1/1] New Entry");
    assert!(rendered(&tui).contains("Day one"));

    press(&mut tui, KeyCode::Esc);
    match &tui.screen {
        Screen::DiaryList(list) => assert_eq!(list.diaries[0].entries, 1),
        other => panic!("expected diary list, got {other:?}"),
    }

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn entry_navigation_walks_history_and_blocks_when_dirty() {
    let home = unique_home();
    let mut app = app_with(&home, |_| {});
    let diary = app.create_diary("Porto").expect("diary");
    for (title, date) in [("Arrival", "2025-07-20"), ("Ribeira", "2025-07-21")] {
        app.save_entry(EntryDraft {
            id: None,
            diary_id: diary.id,
            title: title.to_string(),
            text: format!("{title} notes"),
            date: Some(date.to_string()),
        })
        .expect("entry should save");
    }
    let mut tui = Tui::new(app).expect("tui");
    press(&mut tui, KeyCode::Enter);

    assert_eq!(editor(&tui).current, Some(1));
    ctrl(&mut tui, 'b');
    assert_eq!(editor(&tui).title, "Arrival");
    ctrl(&mut tui, 'b');
    assert_eq!(editor(&tui).current, Some(0));

    type_text(&mut tui, "!");
    ctrl(&mut tui, 'n');
    assert_eq!(editor(&tui).current, Some(0));
    press(&mut tui, KeyCode::Backspace);

    ctrl(&mut tui, 'n');
    ctrl(&mut tui, 'n');
    assert_eq!(editor(&tui).current, None);
    assert_eq!(editor(&tui).status(), SaveStatus::New);

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn rename_prompt_marks_title_unsaved() {
    let home = unique_home();
    let mut app = app_with(&home, |_| {});
    app.create_diary("Porto").expect("diary");
    let mut tui = Tui::new(app).expect("tui");
    press(&mut tui, KeyCode::Enter);

    ctrl(&mut tui, 'r');
    for _ in 0.."New Entry".len() {
        press(&mut tui, KeyCode::Backspace);
    }
    type_text(&mut tui, "Ribeira");
    press(&mut tui, KeyCode::Enter);

    let state = editor(&tui);
    assert_eq!(state.title, "Ribeira");
    assert_eq!(state.status(), SaveStatus::NotSaved);

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn sidebar_inserts_reference_at_cursor() {
    let home = unique_home();
    let mut app = app_with(&home, |_| {});
    let diary = app.create_diary("Porto").expect("diary");
    let photo = app
        .ingest_photo(
            diary.id,
            PhotoImport {
                source: write_photo(&home, "ponte.jpg", b"ponte luis i"),
                name: None,
                caption: Some("at dusk".to_string()),
            },
        )
        .expect("photo should ingest");
    let mut tui = Tui::new(app).expect("tui");
    press(&mut tui, KeyCode::Enter);

    type_text(&mut tui, "Bridge: ");
    ctrl(&mut tui, 'p');
    assert_eq!(editor(&tui).focus, EditorFocus::Sidebar);
    press(&mut tui, KeyCode::Char('i'));

    let state = editor(&tui);
    assert_eq!(state.focus, EditorFocus::Text);
    assert_eq!(state.buffer.text(), format!("Bridge: {}", photo.reference));

    ctrl(&mut tui, 's');
    let saved = tui.app.list_entries(diary.id).expect("entries");
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].photos[0].id, photo.id);

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn sidebar_delete_needs_confirmation() {
    let home = unique_home();
    let mut app = app_with(&home, |_| {});
    let diary = app.create_diary("Porto").expect("diary");
    app.ingest_photo(
        diary.id,
        PhotoImport {
            source: write_photo(&home, "tram.jpg", b"tram 28"),
            name: None,
            caption: None,
        },
    )
    .expect("photo should ingest");
    let mut tui = Tui::new(app).expect("tui");
    press(&mut tui, KeyCode::Enter);
    ctrl(&mut tui, 'p');

    press(&mut tui, KeyCode::Char('d'));
    press(&mut tui, KeyCode::Char('n'));
    assert_eq!(editor(&tui).photos.len(), 1);

    press(&mut tui, KeyCode::Char('d'));
    press(&mut tui, KeyCode::Char('y'));
    assert!(editor(&tui).photos.is_empty());
    assert!(tui.app.list_photos(diary.id).expect("photos").is_empty());

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn delete_confirmation_counts_referencing_entries() {
    let home = unique_home();
    let mut app = app_with(&home, |_| {});
    let diary = app.create_diary("Porto").expect("diary");
    let photo = app
        .ingest_photo(
            diary.id,
            PhotoImport {
                source: write_photo(&home, "ribeira.jpg", b"ribeira at noon"),
                name: None,
                caption: None,
            },
        )
        .expect("photo should ingest");
    for title in ["Day 1", "Day 2"] {
        app.save_entry(EntryDraft {
            id: None,
            diary_id: diary.id,
            title: title.to_string(),
            text: format!("again {}", photo.reference),
            date: None,
        })
        .expect("entry should save");
    }
    let mut tui = Tui::new(app).expect("tui");
    press(&mut tui, KeyCode::Enter);
    ctrl(&mut tui, 'p');

    press(&mut tui, KeyCode::Char('d'));
    match &tui.modal {
        Some(Modal::Confirm { message, .. }) => {
            assert!(
                message.contains("2 entries reference it"),
                "unexpected confirmation: {message}"
            );
        }
        other => panic!("expected confirm modal, got {other:?}"),
    }

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn settings_save_auto_open_and_guard_unsaved_exit() {
    let home = unique_home();
    let mut app = app_with(&home, |_| {});
    let diary = app.create_diary("Porto").expect("diary");
    let mut tui = Tui::new(app).expect("tui");

    press(&mut tui, KeyCode::Char('s'));
    press(&mut tui, KeyCode::Char(' '));
    press(&mut tui, KeyCode::Esc);
    assert!(matches!(tui.screen, Screen::Settings(_)));

    ctrl(&mut tui, 's');
    assert_eq!(
        tui.app.config().auto_open_diary(),
        Some(diary.directory_name.as_str())
    );
    let on_disk = Config::load_or_create(tui.app.layout()).expect("config reload");
    assert_eq!(on_disk.auto_open_diary(), Some(diary.directory_name.as_str()));

    press(&mut tui, KeyCode::Esc);
    assert!(matches!(tui.screen, Screen::DiaryList(_)));

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn settings_type_to_confirm_deletes_diary() {
    let home = unique_home();
    let mut app = app_with(&home, |_| {});
    let diary = app.create_diary("Porto").expect("diary");
    let mut tui = Tui::new(app).expect("tui");

    press(&mut tui, KeyCode::Char('s'));
    press(&mut tui, KeyCode::Char('D'));
    type_text(&mut tui, "Port");
    press(&mut tui, KeyCode::Enter);
    assert!(tui.modal.is_some());
    type_text(&mut tui, "o");
    press(&mut tui, KeyCode::Enter);

    assert!(tui.modal.is_none());
    assert!(matches!(tui.screen, Screen::DiaryList(_)));
    assert!(tui.app.list_diaries().expect("diaries").is_empty());
    assert!(!tui.app.layout().diary_dir(&diary.directory_name).exists());

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn startup_opens_configured_diary_or_warns() {
    let home = unique_home();
    let mut app = app_with(&home, |_| {});
    let diary = app.create_diary("Porto").expect("diary");
    app.set_auto_open_diary(Some(&diary.directory_name))
        .expect("auto-open should save");
    let tui = Tui::new(app).expect("tui");
    assert_eq!(editor(&tui).diary.id, diary.id);

    let missing = app_with(&home, |config| {
        config.settings.diary.auto_open_diary_on_startup = "gone".to_string();
    });
    let tui = Tui::new(missing).expect("tui");
    assert!(matches!(tui.screen, Screen::DiaryList(_)));
    assert_eq!(toasts_at(&tui, ToastLevel::Warning).len(), 1);

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn quit_only_from_diary_list() {
    let home = unique_home();
    let mut app = app_with(&home, |_| {});
    app.create_diary("Porto").expect("diary");
    let mut tui = Tui::new(app).expect("tui");

    press(&mut tui, KeyCode::Enter);
    ctrl(&mut tui, 'q');
    assert!(!tui.should_quit);

    press(&mut tui, KeyCode::Esc);
    press(&mut tui, KeyCode::Char('?'));
    assert!(rendered(&tui).contains("A terminal travel diary."));
    press(&mut tui, KeyCode::Esc);
    press(&mut tui, KeyCode::Char('q'));
    assert!(tui.should_quit);

    let _ = std::fs::remove_dir_all(home);
}
