use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::config::{Config, ConfigError, MEMORY_DATABASE_TYPE};
use crate::domain::dates::{format_entry_date, now_utc_rfc3339, parse_entry_date, today_utc};
use crate::domain::photo_hash::{hash_file, short_hash};
use crate::domain::photo_ref::{reference_token, validate_references, ReferenceErrors};
use crate::domain::slug::unique_directory_name;
use crate::paths::DirectoryLayout;
use crate::store::{
    DiaryRecord, DiaryStore, EntryRecord, MemoryStore, NewEntry, NewPhoto, PhotoRecord,
    SqliteStore, StoreError,
};

pub struct App {
    store: Box<dyn DiaryStore>,
    layout: DirectoryLayout,
    config: Config,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DiaryView {
    pub id: i64,
    pub name: String,
    pub directory_name: String,
    pub path: String,
    pub entries: usize,
    pub photos: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EntryView {
    pub id: i64,
    pub diary_id: i64,
    pub title: String,
    pub date: String,
    pub text: String,
    pub photos: Vec<PhotoView>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PhotoView {
    pub id: i64,
    pub diary_id: i64,
    pub name: String,
    pub caption: Option<String>,
    pub filepath: String,
    pub hash: String,
    pub short_hash: String,
    pub reference: String,
    pub addition_date: String,
}

/// Editor state handed to [`App::save_entry`]. `id: None` creates a new entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryDraft {
    pub id: Option<i64>,
    pub diary_id: i64,
    pub title: String,
    pub text: String,
    /// `YYYY-MM-DD`; today for new entries and the stored date for existing ones when absent.
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PhotoImport {
    pub source: PathBuf,
    pub name: Option<String>,
    pub caption: Option<String>,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    References(#[from] ReferenceErrors),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },
    #[error("photo already in this diary as '{name}' (id {id}, {reference})")]
    DuplicatePhoto {
        id: i64,
        name: String,
        reference: String,
    },
}

impl App {
    /// Builds the store the config asks for. A sqlite store opens `db_override` when given,
    /// otherwise the config's database url.
    pub fn open(
        layout: DirectoryLayout,
        config: Config,
        db_override: Option<&str>,
    ) -> Result<Self, AppError> {
        layout.ensure_home()?;
        let store: Box<dyn DiaryStore> = if config.database.kind == MEMORY_DATABASE_TYPE {
            tracing::warn!("using the in-memory store; nothing will be persisted");
            Box::new(MemoryStore::new())
        } else {
            let db_path = db_override.unwrap_or(&config.database.url).to_string();
            ensure_parent_dir(&db_path)?;
            Box::new(SqliteStore::open(&db_path)?)
        };
        Ok(Self::with_store(store, layout, config))
    }

    pub fn with_store(store: Box<dyn DiaryStore>, layout: DirectoryLayout, config: Config) -> Self {
        Self {
            store,
            layout,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self) -> &DirectoryLayout {
        &self.layout
    }

    /// Persists which diary the TUI opens on start; `None` clears it.
    pub fn set_auto_open_diary(&mut self, directory_name: Option<&str>) -> Result<(), AppError> {
        self.config.settings.diary.auto_open_diary_on_startup =
            directory_name.unwrap_or_default().to_string();
        self.config.save(&self.layout.config_path())?;
        tracing::info!(diary = ?directory_name, "auto-open diary updated");
        Ok(())
    }

    pub fn create_diary(&mut self, name: &str) -> Result<DiaryView, AppError> {
        let name = require_text(name, "diary name")?;
        let taken: HashSet<String> = self
            .store
            .list_diaries()?
            .into_iter()
            .map(|diary| diary.directory_name)
            .collect();
        let layout = &self.layout;
        let directory_name = unique_directory_name(name, |candidate| {
            taken.contains(candidate) || layout.diary_dir(candidate).exists()
        });

        let record = self.store.create_diary(name, &directory_name)?;
        self.layout.ensure_diary_dirs(&record.directory_name)?;
        tracing::info!(diary_id = record.id, directory = %record.directory_name, "diary created");
        self.diary_view(record)
    }

    pub fn list_diaries(&self) -> Result<Vec<DiaryView>, AppError> {
        self.store
            .list_diaries()?
            .into_iter()
            .map(|record| self.diary_view(record))
            .collect()
    }

    pub fn get_diary(&self, id: i64) -> Result<DiaryView, AppError> {
        let record = self.require_diary(id)?;
        self.layout.ensure_diary_dirs(&record.directory_name)?;
        self.diary_view(record)
    }

    pub fn find_diary_by_directory(
        &self,
        directory_name: &str,
    ) -> Result<Option<DiaryView>, AppError> {
        let found = self
            .store
            .list_diaries()?
            .into_iter()
            .find(|diary| diary.directory_name == directory_name);
        found.map(|record| self.diary_view(record)).transpose()
    }

    pub fn rename_diary(&mut self, id: i64, name: &str) -> Result<DiaryView, AppError> {
        let name = require_text(name, "diary name")?;
        let record = self
            .store
            .rename_diary(id, name)?
            .ok_or(AppError::NotFound { kind: "diary", id })?;
        tracing::info!(diary_id = id, "diary renamed");
        self.diary_view(record)
    }

    pub fn delete_diary(&mut self, id: i64) -> Result<DiaryView, AppError> {
        let view = self.diary_view(self.require_diary(id)?)?;
        self.store.delete_diary(id)?;

        let dir = self.layout.diary_dir(&view.directory_name);
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
        if self.config.auto_open_diary() == Some(view.directory_name.as_str()) {
            self.set_auto_open_diary(None)?;
        }
        tracing::info!(
            diary_id = id,
            entries = view.entries,
            photos = view.photos,
            "diary deleted"
        );
        Ok(view)
    }

    pub fn delete_all_entries(&mut self, diary_id: i64) -> Result<usize, AppError> {
        self.require_diary(diary_id)?;
        let removed = self.store.delete_all_entries(diary_id)?;
        tracing::info!(diary_id, removed, "all entries deleted");
        Ok(removed)
    }

    pub fn delete_all_photos(&mut self, diary_id: i64) -> Result<usize, AppError> {
        let diary = self.require_diary(diary_id)?;
        let photos = self.store.list_photos(diary_id)?;
        let removed = self.store.delete_all_photos(diary_id)?;
        for photo in &photos {
            self.remove_owned_file(&diary, photo)?;
        }
        tracing::info!(diary_id, removed, "all photos deleted");
        Ok(removed)
    }

    /// Validates every reference in the draft text against the diary's photos, then
    /// writes the text and the reconciled photo links together. A rejected save
    /// leaves the stored entry untouched.
    pub fn save_entry(&mut self, draft: EntryDraft) -> Result<EntryView, AppError> {
        let title = require_text(&draft.title, "entry title")?;
        let date = match draft.date.as_deref() {
            Some(raw) => Some(normalize_date(raw)?),
            None => None,
        };

        let existing = match draft.id {
            Some(id) => Some(
                self.store
                    .get_entry(id)?
                    .ok_or(AppError::NotFound { kind: "entry", id })?,
            ),
            None => None,
        };
        let diary_id = existing
            .as_ref()
            .map_or(draft.diary_id, |entry| entry.diary_id);
        self.require_diary(diary_id)?;

        let photos = self.store.list_photos(diary_id)?;
        let photo_ids: Vec<i64> = match validate_references(&draft.text, &photos) {
            Ok(resolved) => resolved.iter().map(|photo| photo.id).collect(),
            Err(errors) => {
                tracing::warn!(
                    diary_id,
                    entry_id = ?draft.id,
                    errors = errors.errors().len(),
                    "entry save rejected"
                );
                return Err(errors.into());
            }
        };

        let saved = match existing {
            Some(mut entry) => {
                entry.title = title.to_string();
                entry.text = draft.text;
                if let Some(date) = date {
                    entry.date = date;
                }
                self.store
                    .update_entry(&entry, &photo_ids)?
                    .ok_or(AppError::NotFound {
                        kind: "entry",
                        id: entry.id,
                    })?
            }
            None => {
                let date = date.unwrap_or_else(|| format_entry_date(today_utc()));
                self.store.insert_entry(
                    &NewEntry {
                        diary_id,
                        title,
                        text: &draft.text,
                        date: &date,
                    },
                    &photo_ids,
                )?
            }
        };
        tracing::info!(
            entry_id = saved.id,
            diary_id,
            photos = photo_ids.len(),
            "entry saved"
        );
        self.entry_view(saved)
    }

    /// Runs reference validation without saving anything.
    pub fn check_references(&self, diary_id: i64, text: &str) -> Result<Vec<PhotoView>, AppError> {
        self.require_diary(diary_id)?;
        let photos = self.store.list_photos(diary_id)?;
        let resolved = validate_references(text, &photos)?;
        Ok(resolved.into_iter().map(|photo| photo_view(photo.clone())).collect())
    }

    pub fn get_entry(&self, id: i64) -> Result<EntryView, AppError> {
        let record = self
            .store
            .get_entry(id)?
            .ok_or(AppError::NotFound { kind: "entry", id })?;
        self.entry_view(record)
    }

    pub fn list_entries(&self, diary_id: i64) -> Result<Vec<EntryView>, AppError> {
        self.require_diary(diary_id)?;
        self.store
            .list_entries(diary_id)?
            .into_iter()
            .map(|record| self.entry_view(record))
            .collect()
    }

    pub fn rename_entry(&mut self, id: i64, title: &str) -> Result<EntryView, AppError> {
        let title = require_text(title, "entry title")?;
        let record = self
            .store
            .set_entry_title(id, title)?
            .ok_or(AppError::NotFound { kind: "entry", id })?;
        tracing::info!(entry_id = id, "entry renamed");
        self.entry_view(record)
    }

    /// Photos currently linked to the entry.
    pub fn entry_photos(&self, entry_id: i64) -> Result<Vec<PhotoView>, AppError> {
        if self.store.get_entry(entry_id)?.is_none() {
            return Err(AppError::NotFound {
                kind: "entry",
                id: entry_id,
            });
        }
        Ok(self
            .store
            .entry_photos(entry_id)?
            .into_iter()
            .map(photo_view)
            .collect())
    }

    pub fn delete_entry(&mut self, id: i64) -> Result<EntryView, AppError> {
        let view = self.get_entry(id)?;
        self.store.delete_entry(id)?;
        tracing::info!(entry_id = id, diary_id = view.diary_id, "entry deleted");
        Ok(view)
    }

    /// Hashes the source, refuses content the diary already holds, then copies the
    /// file into the diary's images directory and records it.
    pub fn ingest_photo(
        &mut self,
        diary_id: i64,
        import: PhotoImport,
    ) -> Result<PhotoView, AppError> {
        let diary = self.require_diary(diary_id)?;
        if !import.source.is_file() {
            return Err(AppError::InvalidArgument(format!(
                "photo source '{}' is not a readable file",
                import.source.display()
            )));
        }

        let full_hash = hash_file(&import.source)?;
        if let Some(existing) = self.store.find_photo_by_hash(diary_id, &full_hash)? {
            tracing::warn!(diary_id, photo_id = existing.id, "duplicate photo refused");
            return Err(AppError::DuplicatePhoto {
                id: existing.id,
                reference: reference_token(short_hash(&existing.photo_hash)),
                name: existing.name,
            });
        }

        let images = self.layout.ensure_diary_dirs(&diary.directory_name)?;
        let target = collision_free_target(&images, &import.source)?;
        std::fs::copy(&import.source, &target)?;

        let name = match import.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => default_photo_name(&import.source),
        };
        let caption = import
            .caption
            .as_deref()
            .map(str::trim)
            .filter(|caption| !caption.is_empty());
        let filepath = target.display().to_string();
        let added_at = now_utc_rfc3339();

        let inserted = self.store.insert_photo(&NewPhoto {
            diary_id,
            filepath: &filepath,
            name: &name,
            photo_hash: &full_hash,
            addition_date: &added_at,
            caption,
        });
        let record = match inserted {
            Ok(record) => record,
            Err(err) => {
                let _ = std::fs::remove_file(&target);
                return Err(err.into());
            }
        };
        tracing::info!(
            photo_id = record.id,
            diary_id,
            short_hash = short_hash(&record.photo_hash),
            "photo ingested"
        );
        Ok(photo_view(record))
    }

    pub fn list_photos(&self, diary_id: i64) -> Result<Vec<PhotoView>, AppError> {
        self.require_diary(diary_id)?;
        Ok(self
            .store
            .list_photos(diary_id)?
            .into_iter()
            .map(photo_view)
            .collect())
    }

    pub fn get_photo(&self, id: i64) -> Result<PhotoView, AppError> {
        self.store
            .get_photo(id)?
            .map(photo_view)
            .ok_or(AppError::NotFound { kind: "photo", id })
    }

    /// `None` keeps the stored value; an empty caption clears it.
    pub fn update_photo(
        &mut self,
        id: i64,
        name: Option<&str>,
        caption: Option<&str>,
    ) -> Result<PhotoView, AppError> {
        let current = self
            .store
            .get_photo(id)?
            .ok_or(AppError::NotFound { kind: "photo", id })?;
        let name = match name {
            Some(name) => require_text(name, "photo name")?.to_string(),
            None => current.name,
        };
        let caption = match caption {
            Some(caption) => Some(caption.trim()).filter(|caption| !caption.is_empty()),
            None => current.caption.as_deref(),
        };
        let record = self
            .store
            .update_photo(id, &name, caption)?
            .ok_or(AppError::NotFound { kind: "photo", id })?;
        tracing::info!(photo_id = id, "photo updated");
        Ok(photo_view(record))
    }

    /// Entries whose text links the photo. Their tokens stop resolving once it is deleted.
    pub fn photo_link_count(&self, id: i64) -> Result<usize, AppError> {
        if self.store.get_photo(id)?.is_none() {
            return Err(AppError::NotFound { kind: "photo", id });
        }
        Ok(self.store.count_photo_links(id)?)
    }

    pub fn delete_photo(&mut self, id: i64) -> Result<PhotoView, AppError> {
        let record = self
            .store
            .delete_photo(id)?
            .ok_or(AppError::NotFound { kind: "photo", id })?;
        if let Some(diary) = self.store.get_diary(record.diary_id)? {
            self.remove_owned_file(&diary, &record)?;
        }
        tracing::info!(photo_id = id, diary_id = record.diary_id, "photo deleted");
        Ok(photo_view(record))
    }

    fn require_diary(&self, id: i64) -> Result<DiaryRecord, AppError> {
        self.store
            .get_diary(id)?
            .ok_or(AppError::NotFound { kind: "diary", id })
    }

    fn diary_view(&self, record: DiaryRecord) -> Result<DiaryView, AppError> {
        Ok(DiaryView {
            entries: self.store.count_entries(record.id)?,
            photos: self.store.count_photos(record.id)?,
            path: self
                .layout
                .diary_dir(&record.directory_name)
                .display()
                .to_string(),
            id: record.id,
            name: record.name,
            directory_name: record.directory_name,
        })
    }

    fn entry_view(&self, record: EntryRecord) -> Result<EntryView, AppError> {
        let photos = self
            .store
            .entry_photos(record.id)?
            .into_iter()
            .map(photo_view)
            .collect();
        Ok(EntryView {
            id: record.id,
            diary_id: record.diary_id,
            title: record.title,
            date: record.date,
            text: record.text,
            photos,
        })
    }

    /// Removes the photo's file only when it was copied into the diary's images directory.
    fn remove_owned_file(&self, diary: &DiaryRecord, photo: &PhotoRecord) -> io::Result<()> {
        let images = self.layout.images_dir(&diary.directory_name);
        let file = Path::new(&photo.filepath);
        if !file.starts_with(&images) {
            return Ok(());
        }
        match std::fs::remove_file(file) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

fn photo_view(record: PhotoRecord) -> PhotoView {
    let short = short_hash(&record.photo_hash).to_string();
    PhotoView {
        reference: reference_token(&short),
        short_hash: short,
        id: record.id,
        diary_id: record.diary_id,
        name: record.name,
        caption: record.caption,
        filepath: record.filepath,
        hash: record.photo_hash,
        addition_date: record.addition_date,
    }
}

fn require_text<'a>(raw: &'a str, what: &str) -> Result<&'a str, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidArgument(format!("{what} cannot be empty")));
    }
    Ok(trimmed)
}

fn normalize_date(raw: &str) -> Result<String, AppError> {
    parse_entry_date(raw)
        .map(format_entry_date)
        .map_err(|_| AppError::InvalidArgument(format!("invalid date '{raw}': use YYYY-MM-DD")))
}

fn default_photo_name(source: &Path) -> String {
    source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "photo".to_string())
}

/// `<images>/<file>`, or `<images>/<stem>_N.<ext>` when that name is taken.
fn collision_free_target(images: &Path, source: &Path) -> Result<PathBuf, AppError> {
    let file_name = source.file_name().ok_or_else(|| {
        AppError::InvalidArgument(format!("photo source '{}' has no file name", source.display()))
    })?;
    let candidate = images.join(file_name);
    if !candidate.exists() {
        return Ok(candidate);
    }

    let stem = default_photo_name(source);
    let extension = source
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let mut counter = 1usize;
    loop {
        let candidate = images.join(format!("{stem}_{counter}{extension}"));
        if !candidate.exists() {
            return Ok(candidate);
        }
        counter += 1;
    }
}

fn ensure_parent_dir(path: &str) -> io::Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
