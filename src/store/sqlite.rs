use rusqlite::Connection;

use super::{
    DiaryRecord, DiaryStore, EntryRecord, NewEntry, NewPhoto, PhotoRecord, StoreError,
};
use crate::db;

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = db::open_connection(path)?;
        tracing::debug!(path, "opened diary database");
        Ok(Self { conn })
    }

    fn require_diary(&self, diary_id: i64) -> Result<(), StoreError> {
        match db::get_diary(&self.conn, diary_id)? {
            Some(_) => Ok(()),
            None => Err(StoreError::MissingDiary(diary_id)),
        }
    }
}

impl DiaryStore for SqliteStore {
    fn create_diary(
        &mut self,
        name: &str,
        directory_name: &str,
    ) -> Result<DiaryRecord, StoreError> {
        if db::directory_name_exists(&self.conn, directory_name)? {
            return Err(StoreError::DirectoryTaken(directory_name.to_string()));
        }
        let id = db::insert_diary(&self.conn, name, directory_name)?;
        Ok(DiaryRecord {
            id,
            name: name.to_string(),
            directory_name: directory_name.to_string(),
        })
    }

    fn get_diary(&self, id: i64) -> Result<Option<DiaryRecord>, StoreError> {
        Ok(db::get_diary(&self.conn, id)?)
    }

    fn list_diaries(&self) -> Result<Vec<DiaryRecord>, StoreError> {
        Ok(db::list_diaries(&self.conn)?)
    }

    fn directory_name_exists(&self, directory_name: &str) -> Result<bool, StoreError> {
        Ok(db::directory_name_exists(&self.conn, directory_name)?)
    }

    fn rename_diary(&mut self, id: i64, name: &str) -> Result<Option<DiaryRecord>, StoreError> {
        if db::rename_diary(&self.conn, id, name)? == 0 {
            return Ok(None);
        }
        Ok(db::get_diary(&self.conn, id)?)
    }

    fn delete_diary(&mut self, id: i64) -> Result<Option<DiaryRecord>, StoreError> {
        let Some(diary) = db::get_diary(&self.conn, id)? else {
            return Ok(None);
        };
        let tx = self.conn.transaction()?;
        db::delete_entry_links_for_diary(&tx, id)?;
        db::delete_photo_links_for_diary(&tx, id)?;
        let entries = db::delete_entries_for_diary(&tx, id)?;
        let photos = db::delete_photos_for_diary(&tx, id)?;
        db::delete_diary_row(&tx, id)?;
        tx.commit()?;
        tracing::debug!(diary_id = id, entries, photos, "diary rows removed");
        Ok(Some(diary))
    }

    fn count_entries(&self, diary_id: i64) -> Result<usize, StoreError> {
        Ok(db::count_entries(&self.conn, diary_id)?)
    }

    fn count_photos(&self, diary_id: i64) -> Result<usize, StoreError> {
        Ok(db::count_photos(&self.conn, diary_id)?)
    }

    fn insert_entry(
        &mut self,
        entry: &NewEntry<'_>,
        photo_ids: &[i64],
    ) -> Result<EntryRecord, StoreError> {
        self.require_diary(entry.diary_id)?;
        let tx = self.conn.transaction()?;
        let id = db::insert_entry(&tx, entry)?;
        db::replace_entry_photos(&tx, id, photo_ids)?;
        tx.commit()?;
        Ok(EntryRecord {
            id,
            diary_id: entry.diary_id,
            title: entry.title.to_string(),
            text: entry.text.to_string(),
            date: entry.date.to_string(),
        })
    }

    fn update_entry(
        &mut self,
        entry: &EntryRecord,
        photo_ids: &[i64],
    ) -> Result<Option<EntryRecord>, StoreError> {
        let tx = self.conn.transaction()?;
        let changed =
            db::update_entry_content(&tx, entry.id, &entry.title, &entry.text, &entry.date)?;
        if changed == 0 {
            return Ok(None);
        }
        db::replace_entry_photos(&tx, entry.id, photo_ids)?;
        tx.commit()?;
        Ok(db::get_entry(&self.conn, entry.id)?)
    }

    fn set_entry_title(
        &mut self,
        id: i64,
        title: &str,
    ) -> Result<Option<EntryRecord>, StoreError> {
        if db::set_entry_title(&self.conn, id, title)? == 0 {
            return Ok(None);
        }
        Ok(db::get_entry(&self.conn, id)?)
    }

    fn get_entry(&self, id: i64) -> Result<Option<EntryRecord>, StoreError> {
        Ok(db::get_entry(&self.conn, id)?)
    }

    fn list_entries(&self, diary_id: i64) -> Result<Vec<EntryRecord>, StoreError> {
        Ok(db::list_entries(&self.conn, diary_id)?)
    }

    fn entry_photos(&self, entry_id: i64) -> Result<Vec<PhotoRecord>, StoreError> {
        Ok(db::list_entry_photos(&self.conn, entry_id)?)
    }

    fn delete_entry(&mut self, id: i64) -> Result<Option<EntryRecord>, StoreError> {
        let Some(entry) = db::get_entry(&self.conn, id)? else {
            return Ok(None);
        };
        let tx = self.conn.transaction()?;
        db::delete_links_for_entry(&tx, id)?;
        db::delete_entry_row(&tx, id)?;
        tx.commit()?;
        Ok(Some(entry))
    }

    fn delete_all_entries(&mut self, diary_id: i64) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        db::delete_entry_links_for_diary(&tx, diary_id)?;
        let removed = db::delete_entries_for_diary(&tx, diary_id)?;
        tx.commit()?;
        Ok(removed)
    }

    fn insert_photo(&mut self, photo: &NewPhoto<'_>) -> Result<PhotoRecord, StoreError> {
        self.require_diary(photo.diary_id)?;
        if db::find_photo_by_hash(&self.conn, photo.diary_id, photo.photo_hash)?.is_some() {
            return Err(StoreError::DuplicateHash(photo.diary_id));
        }
        let id = db::insert_photo(&self.conn, photo)?;
        Ok(PhotoRecord {
            id,
            diary_id: photo.diary_id,
            filepath: photo.filepath.to_string(),
            name: photo.name.to_string(),
            photo_hash: photo.photo_hash.to_string(),
            addition_date: photo.addition_date.to_string(),
            caption: photo.caption.map(str::to_string),
        })
    }

    fn get_photo(&self, id: i64) -> Result<Option<PhotoRecord>, StoreError> {
        Ok(db::get_photo(&self.conn, id)?)
    }

    fn list_photos(&self, diary_id: i64) -> Result<Vec<PhotoRecord>, StoreError> {
        Ok(db::list_photos(&self.conn, diary_id)?)
    }

    fn find_photo_by_hash(
        &self,
        diary_id: i64,
        photo_hash: &str,
    ) -> Result<Option<PhotoRecord>, StoreError> {
        Ok(db::find_photo_by_hash(&self.conn, diary_id, photo_hash)?)
    }

    fn update_photo(
        &mut self,
        id: i64,
        name: &str,
        caption: Option<&str>,
    ) -> Result<Option<PhotoRecord>, StoreError> {
        if db::update_photo_details(&self.conn, id, name, caption)? == 0 {
            return Ok(None);
        }
        Ok(db::get_photo(&self.conn, id)?)
    }

    fn count_photo_links(&self, photo_id: i64) -> Result<usize, StoreError> {
        Ok(db::count_photo_links(&self.conn, photo_id)?)
    }

    fn delete_photo(&mut self, id: i64) -> Result<Option<PhotoRecord>, StoreError> {
        let Some(photo) = db::get_photo(&self.conn, id)? else {
            return Ok(None);
        };
        let tx = self.conn.transaction()?;
        db::delete_links_for_photo(&tx, id)?;
        db::delete_photo_row(&tx, id)?;
        tx.commit()?;
        Ok(Some(photo))
    }

    fn delete_all_photos(&mut self, diary_id: i64) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        db::delete_photo_links_for_diary(&tx, diary_id)?;
        let removed = db::delete_photos_for_diary(&tx, diary_id)?;
        tx.commit()?;
        Ok(removed)
    }
}
