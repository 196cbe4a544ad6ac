//! Persistence seam.
//!
//! `DiaryStore` is the contract the application layer talks to. `SqliteStore` backs the real
//! application; `MemoryStore` keeps everything in process for UI tests and dry runs. The caller
//! picks one when building the [`crate::app::App`].

use thiserror::Error;

pub use crate::db::{DiaryRecord, EntryRecord, NewEntry, NewPhoto, PhotoRecord};
use crate::domain::photo_ref::HashedPhoto;

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("directory name '{0}' is already used by another diary")]
    DirectoryTaken(String),
    #[error("diary {0} does not exist")]
    MissingDiary(i64),
    #[error("diary {0} already holds a photo with this content")]
    DuplicateHash(i64),
}

pub trait DiaryStore {
    fn create_diary(&mut self, name: &str, directory_name: &str)
        -> Result<DiaryRecord, StoreError>;
    fn get_diary(&self, id: i64) -> Result<Option<DiaryRecord>, StoreError>;
    fn list_diaries(&self) -> Result<Vec<DiaryRecord>, StoreError>;
    fn directory_name_exists(&self, directory_name: &str) -> Result<bool, StoreError>;
    fn rename_diary(&mut self, id: i64, name: &str) -> Result<Option<DiaryRecord>, StoreError>;
    /// Removes the diary together with its links, entries and photos, all or nothing.
    fn delete_diary(&mut self, id: i64) -> Result<Option<DiaryRecord>, StoreError>;
    fn count_entries(&self, diary_id: i64) -> Result<usize, StoreError>;
    fn count_photos(&self, diary_id: i64) -> Result<usize, StoreError>;

    /// Inserts the entry and its photo links as one unit.
    fn insert_entry(
        &mut self,
        entry: &NewEntry<'_>,
        photo_ids: &[i64],
    ) -> Result<EntryRecord, StoreError>;
    /// Replaces title, text, date and the full link set as one unit.
    fn update_entry(
        &mut self,
        entry: &EntryRecord,
        photo_ids: &[i64],
    ) -> Result<Option<EntryRecord>, StoreError>;
    fn set_entry_title(&mut self, id: i64, title: &str)
        -> Result<Option<EntryRecord>, StoreError>;
    fn get_entry(&self, id: i64) -> Result<Option<EntryRecord>, StoreError>;
    fn list_entries(&self, diary_id: i64) -> Result<Vec<EntryRecord>, StoreError>;
    fn entry_photos(&self, entry_id: i64) -> Result<Vec<PhotoRecord>, StoreError>;
    fn delete_entry(&mut self, id: i64) -> Result<Option<EntryRecord>, StoreError>;
    fn delete_all_entries(&mut self, diary_id: i64) -> Result<usize, StoreError>;

    fn insert_photo(&mut self, photo: &NewPhoto<'_>) -> Result<PhotoRecord, StoreError>;
    fn get_photo(&self, id: i64) -> Result<Option<PhotoRecord>, StoreError>;
    fn list_photos(&self, diary_id: i64) -> Result<Vec<PhotoRecord>, StoreError>;
    fn find_photo_by_hash(
        &self,
        diary_id: i64,
        photo_hash: &str,
    ) -> Result<Option<PhotoRecord>, StoreError>;
    fn update_photo(
        &mut self,
        id: i64,
        name: &str,
        caption: Option<&str>,
    ) -> Result<Option<PhotoRecord>, StoreError>;
    /// Number of entries whose text currently links the photo.
    fn count_photo_links(&self, photo_id: i64) -> Result<usize, StoreError>;
    fn delete_photo(&mut self, id: i64) -> Result<Option<PhotoRecord>, StoreError>;
    fn delete_all_photos(&mut self, diary_id: i64) -> Result<usize, StoreError>;
}

impl HashedPhoto for PhotoRecord {
    fn full_hash(&self) -> &str {
        &self.photo_hash
    }
}
