use super::{App, AppError, EntryDraft, PhotoImport};
use crate::config::Config;
use crate::domain::dates::{format_entry_date, today_utc};
use crate::domain::photo_ref::ReferenceError;
use crate::paths::DirectoryLayout;
use crate::store::MemoryStore;
use std::path::{Path, PathBuf};
use uuid::Uuid;

fn unique_home() -> PathBuf {
    let root = std::env::temp_dir().join(format!("pilgrim-app-test-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&root).expect("temp home should be creatable");
    root
}

fn memory_app(home: &Path) -> App {
    let layout = DirectoryLayout::new(home);
    let config = Config::defaults_for(&layout);
    App::with_store(Box::new(MemoryStore::new()), layout, config)
}

fn sqlite_app(home: &Path) -> App {
    let layout = DirectoryLayout::new(home);
    let config = Config::defaults_for(&layout);
    App::open(layout, config, None).expect("sqlite app should open")
}

fn write_source(home: &Path, folder: &str, file_name: &str, content: &[u8]) -> PathBuf {
    let dir = home.join("incoming").join(folder);
    std::fs::create_dir_all(&dir).expect("source dir should be creatable");
    let path = dir.join(file_name);
    std::fs::write(&path, content).expect("source photo should be writable");
    path
}

fn import(source: PathBuf) -> PhotoImport {
    PhotoImport {
        source,
        name: None,
        caption: None,
    }
}

fn draft(diary_id: i64, title: &str, text: &str) -> EntryDraft {
    EntryDraft {
        id: None,
        diary_id,
        title: title.to_string(),
        text: text.to_string(),
        date: Some("2025-07-20".to_string()),
    }
}

#[test]
fn create_diary_builds_directories_and_unique_slugs() {
    let home = unique_home();
    let mut app = memory_app(&home);

    let first = app.create_diary("Minha Viagem").expect("diary should be created");
    let second = app.create_diary("minha  viagem!").expect("diary should be created");

    assert_eq!(first.directory_name, "minha_viagem");
    assert_eq!(second.directory_name, "minha_viagem_1");
    assert!(app.layout().images_dir("minha_viagem").is_dir());
    assert!(app.layout().images_dir("minha_viagem_1").is_dir());

    let err = app.create_diary("   ").expect_err("blank names are rejected");
    assert!(matches!(err, AppError::InvalidArgument(_)));

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn get_diary_recreates_missing_directory() {
    let home = unique_home();
    let mut app = memory_app(&home);
    let diary = app.create_diary("Acores").expect("diary");
    std::fs::remove_dir_all(app.layout().diary_dir(&diary.directory_name))
        .expect("dir should be removable");

    let shown = app.get_diary(diary.id).expect("diary should load");
    assert!(app.layout().images_dir(&shown.directory_name).is_dir());

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn save_entry_links_every_referenced_photo_once() {
    let home = unique_home();
    let mut app = memory_app(&home);
    let diary = app.create_diary("Porto").expect("diary");
    let bridge = app
        .ingest_photo(diary.id, import(write_source(&home, "a", "bridge.jpg", b"bridge")))
        .expect("photo should ingest");
    let river = app
        .ingest_photo(diary.id, import(write_source(&home, "a", "river.jpg", b"river")))
        .expect("photo should ingest");

    let text = format!(
        "Morning {} then {} and again {}",
        bridge.reference,
        river.reference.to_uppercase().replace("[[PHOTO::", "[[photo::"),
        bridge.reference
    );
    let saved = app
        .save_entry(draft(diary.id, "Day 1", &text))
        .expect("entry should save");

    let linked: Vec<i64> = saved.photos.iter().map(|photo| photo.id).collect();
    assert_eq!(linked, vec![bridge.id, river.id]);
    assert_eq!(saved.text, text);
    assert_eq!(saved.date, "2025-07-20");

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn rejected_save_keeps_stored_entry_untouched() {
    let home = unique_home();
    let mut app = memory_app(&home);
    let diary = app.create_diary("Lisboa").expect("diary");
    let tram = app
        .ingest_photo(diary.id, import(write_source(&home, "a", "tram.jpg", b"tram")))
        .expect("photo");
    let saved = app
        .save_entry(draft(diary.id, "Tram", &format!("Line 28 {}", tram.reference)))
        .expect("entry should save");

    let mut edit = draft(diary.id, "Tram", "[[photo::zzzzzzzz]] and [[photo:abc]] [[photo::12]");
    edit.id = Some(saved.id);
    let err = app.save_entry(edit).expect_err("invalid references reject the save");
    let AppError::References(errors) = err else {
        panic!("expected reference errors, got {err:?}");
    };
    assert_eq!(errors.errors().len(), 2);
    assert!(errors
        .errors()
        .iter()
        .any(|error| matches!(error, ReferenceError::WrongFormat { .. })));
    assert!(errors
        .errors()
        .iter()
        .any(|error| matches!(error, ReferenceError::Malformed { .. })));

    let stored = app.get_entry(saved.id).expect("entry should still exist");
    assert_eq!(stored.text, saved.text);
    assert_eq!(stored.photos.len(), 1);

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn unknown_hash_is_reported_per_token() {
    let home = unique_home();
    let mut app = memory_app(&home);
    let diary = app.create_diary("Braga").expect("diary");

    let err = app
        .save_entry(draft(diary.id, "Bom Jesus", "[[photo::zzzzzzzz]] [[photo::abc]]"))
        .expect_err("bad hashes reject the save");
    let AppError::References(errors) = err else {
        panic!("expected reference errors, got {err:?}");
    };
    assert_eq!(errors.errors().len(), 2);
    assert!(app.list_entries(diary.id).expect("list").is_empty());

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn references_resolve_only_within_the_entry_diary() {
    let home = unique_home();
    let mut app = sqlite_app(&home);
    let porto = app.create_diary("Porto").expect("diary");
    let faro = app.create_diary("Faro").expect("diary");
    let marina = app
        .ingest_photo(faro.id, import(write_source(&home, "a", "marina.jpg", b"marina")))
        .expect("photo");

    let err = app
        .save_entry(draft(porto.id, "Borrowed", &marina.reference))
        .expect_err("another diary's photo must not resolve");
    let AppError::References(errors) = err else {
        panic!("expected reference errors, got {err:?}");
    };
    assert!(matches!(
        errors.errors(),
        [ReferenceError::NotFound { hash }] if *hash == marina.short_hash
    ));
    assert!(app.list_entries(porto.id).expect("list").is_empty());

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn same_photo_in_two_diaries_resolves_to_the_entry_diary() {
    let home = unique_home();
    let mut app = sqlite_app(&home);
    let porto = app.create_diary("Porto").expect("diary");
    let faro = app.create_diary("Faro").expect("diary");
    let source = write_source(&home, "a", "azulejo.jpg", b"blue tiles");
    let in_porto = app.ingest_photo(porto.id, import(source.clone())).expect("photo");
    let in_faro = app.ingest_photo(faro.id, import(source)).expect("photo");
    assert_eq!(in_porto.reference, in_faro.reference);
    assert_ne!(in_porto.id, in_faro.id);

    let saved = app
        .save_entry(draft(porto.id, "Tiles", &in_porto.reference))
        .expect("one match within the diary is not ambiguous");
    let linked: Vec<i64> = saved.photos.iter().map(|photo| photo.id).collect();
    assert_eq!(linked, vec![in_porto.id]);

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn existing_entry_keeps_its_diary_when_draft_points_elsewhere() {
    let home = unique_home();
    let mut app = sqlite_app(&home);
    let porto = app.create_diary("Porto").expect("diary");
    let faro = app.create_diary("Faro").expect("diary");
    let ribeira = app
        .ingest_photo(porto.id, import(write_source(&home, "a", "ribeira.jpg", b"ribeira")))
        .expect("photo");
    let marina = app
        .ingest_photo(faro.id, import(write_source(&home, "b", "marina.jpg", b"marina")))
        .expect("photo");
    let saved = app
        .save_entry(draft(porto.id, "Quay", &ribeira.reference))
        .expect("entry");

    let mut moved = draft(faro.id, "Quay", &marina.reference);
    moved.id = Some(saved.id);
    let err = app.save_entry(moved).expect_err("faro photo is not in the entry's diary");
    assert!(matches!(err, AppError::References(_)));

    let mut kept = draft(faro.id, "Quay again", &ribeira.reference);
    kept.id = Some(saved.id);
    let updated = app.save_entry(kept).expect("porto photo still resolves");
    assert_eq!(updated.diary_id, porto.id);
    assert_eq!(updated.photos[0].id, ribeira.id);
    assert!(app.list_entries(faro.id).expect("list").is_empty());

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn entry_dates_default_to_today_and_are_validated() {
    let home = unique_home();
    let mut app = memory_app(&home);
    let diary = app.create_diary("Evora").expect("diary");

    let mut undated = draft(diary.id, "Temple", "");
    undated.date = None;
    let saved = app.save_entry(undated).expect("entry should save");
    assert_eq!(saved.date, format_entry_date(today_utc()));

    let mut bad = draft(diary.id, "Temple", "");
    bad.date = Some("20/07/2025".to_string());
    assert!(matches!(
        app.save_entry(bad),
        Err(AppError::InvalidArgument(_))
    ));

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn rename_entry_keeps_text_and_links() {
    let home = unique_home();
    let mut app = memory_app(&home);
    let diary = app.create_diary("Sintra").expect("diary");
    let pena = app
        .ingest_photo(diary.id, import(write_source(&home, "a", "pena.jpg", b"pena")))
        .expect("photo");
    let saved = app
        .save_entry(draft(diary.id, "Palace", &pena.reference))
        .expect("entry");

    let renamed = app.rename_entry(saved.id, "Pena Palace").expect("rename");
    assert_eq!(renamed.title, "Pena Palace");
    assert_eq!(renamed.text, saved.text);
    assert_eq!(renamed.photos, saved.photos);
    assert!(matches!(
        app.rename_entry(saved.id, " "),
        Err(AppError::InvalidArgument(_))
    ));

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn ingest_refuses_duplicates_and_avoids_name_collisions() {
    let home = unique_home();
    let mut app = memory_app(&home);
    let diary = app.create_diary("Madeira").expect("diary");

    let first = app
        .ingest_photo(diary.id, import(write_source(&home, "a", "levada.jpg", b"one")))
        .expect("photo");
    assert_eq!(first.name, "levada");
    assert_eq!(first.short_hash.len(), 8);
    assert_eq!(first.reference, format!("[[photo::{}]]", first.short_hash));

    let same_bytes = write_source(&home, "b", "copy.jpg", b"one");
    let err = app
        .ingest_photo(diary.id, import(same_bytes))
        .expect_err("duplicate content is refused");
    assert!(matches!(err, AppError::DuplicatePhoto { id, .. } if id == first.id));

    let second = app
        .ingest_photo(
            diary.id,
            PhotoImport {
                source: write_source(&home, "c", "levada.jpg", b"two"),
                name: Some("Second levada".to_string()),
                caption: Some("  misty  ".to_string()),
            },
        )
        .expect("photo");
    assert!(second.filepath.ends_with("levada_1.jpg"));
    assert_eq!(second.name, "Second levada");
    assert_eq!(second.caption.as_deref(), Some("misty"));
    assert_eq!(app.list_photos(diary.id).expect("list").len(), 2);

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn update_photo_keeps_unspecified_fields() {
    let home = unique_home();
    let mut app = memory_app(&home);
    let diary = app.create_diary("Douro").expect("diary");
    let photo = app
        .ingest_photo(
            diary.id,
            PhotoImport {
                source: write_source(&home, "a", "vines.jpg", b"vines"),
                name: None,
                caption: Some("terraces".to_string()),
            },
        )
        .expect("photo");

    let renamed = app
        .update_photo(photo.id, Some("Vineyards"), None)
        .expect("update");
    assert_eq!(renamed.name, "Vineyards");
    assert_eq!(renamed.caption.as_deref(), Some("terraces"));

    let cleared = app.update_photo(photo.id, None, Some("")).expect("update");
    assert_eq!(cleared.caption, None);

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn delete_photo_removes_file_and_links() {
    let home = unique_home();
    let mut app = memory_app(&home);
    let diary = app.create_diary("Algarve").expect("diary");
    let beach = app
        .ingest_photo(diary.id, import(write_source(&home, "a", "beach.jpg", b"sand")))
        .expect("photo");
    let saved = app
        .save_entry(draft(diary.id, "Beach", &beach.reference))
        .expect("entry");
    assert!(Path::new(&beach.filepath).exists());

    assert_eq!(app.photo_link_count(beach.id).expect("link count"), 1);

    app.delete_photo(beach.id).expect("photo should delete");
    assert!(!Path::new(&beach.filepath).exists());
    assert!(app.entry_photos(saved.id).expect("links").is_empty());
    assert!(matches!(
        app.get_photo(beach.id),
        Err(AppError::NotFound { kind: "photo", .. })
    ));
    assert!(matches!(
        app.photo_link_count(beach.id),
        Err(AppError::NotFound { kind: "photo", .. })
    ));

    let mut resave = draft(diary.id, "Beach", &saved.text);
    resave.id = Some(saved.id);
    let err = app.save_entry(resave).expect_err("dangling token rejects the save");
    let AppError::References(errors) = err else {
        panic!("expected reference errors, got {err:?}");
    };
    assert!(matches!(
        errors.errors(),
        [ReferenceError::NotFound { hash }] if *hash == beach.short_hash
    ));

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn check_references_validates_without_saving() {
    let home = unique_home();
    let mut app = memory_app(&home);
    let diary = app.create_diary("Coimbra").expect("diary");
    let library = app
        .ingest_photo(diary.id, import(write_source(&home, "a", "library.jpg", b"books")))
        .expect("photo");

    let resolved = app
        .check_references(diary.id, &format!("{0} {0}", library.reference))
        .expect("references should validate");
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].id, library.id);
    assert!(app.list_entries(diary.id).expect("list").is_empty());

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn delete_diary_removes_rows_directory_and_auto_open() {
    let home = unique_home();
    let mut app = memory_app(&home);
    let diary = app.create_diary("Gerês").expect("diary");
    let photo = app
        .ingest_photo(diary.id, import(write_source(&home, "a", "falls.jpg", b"water")))
        .expect("photo");
    app.save_entry(draft(diary.id, "Falls", &photo.reference))
        .expect("entry");
    app.set_auto_open_diary(Some(&diary.directory_name))
        .expect("config should save");

    let removed = app.delete_diary(diary.id).expect("diary should delete");
    assert_eq!(removed.entries, 1);
    assert_eq!(removed.photos, 1);
    assert!(!app.layout().diary_dir(&diary.directory_name).exists());
    assert!(app.list_diaries().expect("list").is_empty());
    assert_eq!(app.config().auto_open_diary(), None);
    assert!(matches!(
        app.get_entry(1),
        Err(AppError::NotFound { kind: "entry", .. })
    ));

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn bulk_deletes_clear_entries_and_photos() {
    let home = unique_home();
    let mut app = memory_app(&home);
    let diary = app.create_diary("Minho").expect("diary");
    let photo = app
        .ingest_photo(diary.id, import(write_source(&home, "a", "green.jpg", b"green")))
        .expect("photo");
    app.save_entry(draft(diary.id, "One", &photo.reference))
        .expect("entry");
    app.save_entry(draft(diary.id, "Two", "")).expect("entry");

    assert_eq!(app.delete_all_entries(diary.id).expect("delete"), 2);
    assert_eq!(app.get_diary(diary.id).expect("diary").photos, 1);
    assert_eq!(app.delete_all_photos(diary.id).expect("delete"), 1);
    assert!(!Path::new(&photo.filepath).exists());

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn sqlite_backed_app_round_trips_an_entry() {
    let home = unique_home();
    let diary_id;
    let entry_id;
    {
        let mut app = sqlite_app(&home);
        let diary = app.create_diary("Nazaré").expect("diary");
        let wave = app
            .ingest_photo(diary.id, import(write_source(&home, "a", "wave.jpg", b"wave")))
            .expect("photo");
        let saved = app
            .save_entry(draft(diary.id, "Big wave", &format!("Look {}", wave.reference)))
            .expect("entry");
        diary_id = diary.id;
        entry_id = saved.id;
    }

    let app = sqlite_app(&home);
    let entries = app.list_entries(diary_id).expect("list");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, entry_id);
    assert_eq!(entries[0].photos.len(), 1);

    let _ = std::fs::remove_dir_all(home);
}

#[test]
fn memory_database_type_never_creates_a_file() {
    let home = unique_home();
    let layout = DirectoryLayout::new(&home);
    let mut config = Config::defaults_for(&layout);
    config.database.kind = "memory".to_string();
    let db_file = PathBuf::from(&config.database.url);

    let mut app = App::open(layout, config, None).expect("memory app should open");
    app.create_diary("Scratch").expect("diary");
    assert_eq!(app.list_diaries().expect("list").len(), 1);
    assert!(!db_file.exists());

    let _ = std::fs::remove_dir_all(home);
}
