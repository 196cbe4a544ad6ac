use std::collections::BTreeSet;

use super::{
    DiaryRecord, DiaryStore, EntryRecord, NewEntry, NewPhoto, PhotoRecord, StoreError,
};

/// Process-local store with the same contract as the sqlite one.
#[derive(Debug, Default)]
pub struct MemoryStore {
    next_id: i64,
    diaries: Vec<DiaryRecord>,
    entries: Vec<EntryRecord>,
    photos: Vec<PhotoRecord>,
    // (entry_id, photo_id)
    links: BTreeSet<(i64, i64)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn require_diary(&self, diary_id: i64) -> Result<(), StoreError> {
        if self.diaries.iter().any(|diary| diary.id == diary_id) {
            Ok(())
        } else {
            Err(StoreError::MissingDiary(diary_id))
        }
    }

    fn link_entry(&mut self, entry_id: i64, photo_ids: &[i64]) {
        self.links.retain(|(entry, _)| *entry != entry_id);
        for photo_id in photo_ids {
            if self.photos.iter().any(|photo| photo.id == *photo_id) {
                self.links.insert((entry_id, *photo_id));
            }
        }
    }

    fn entry_ids_for(&self, diary_id: i64) -> BTreeSet<i64> {
        self.entries
            .iter()
            .filter(|entry| entry.diary_id == diary_id)
            .map(|entry| entry.id)
            .collect()
    }

    fn photo_ids_for(&self, diary_id: i64) -> BTreeSet<i64> {
        self.photos
            .iter()
            .filter(|photo| photo.diary_id == diary_id)
            .map(|photo| photo.id)
            .collect()
    }
}

impl DiaryStore for MemoryStore {
    fn create_diary(
        &mut self,
        name: &str,
        directory_name: &str,
    ) -> Result<DiaryRecord, StoreError> {
        if self.directory_name_exists(directory_name)? {
            return Err(StoreError::DirectoryTaken(directory_name.to_string()));
        }
        let diary = DiaryRecord {
            id: self.allocate_id(),
            name: name.to_string(),
            directory_name: directory_name.to_string(),
        };
        self.diaries.push(diary.clone());
        Ok(diary)
    }

    fn get_diary(&self, id: i64) -> Result<Option<DiaryRecord>, StoreError> {
        Ok(self.diaries.iter().find(|diary| diary.id == id).cloned())
    }

    fn list_diaries(&self) -> Result<Vec<DiaryRecord>, StoreError> {
        Ok(self.diaries.clone())
    }

    fn directory_name_exists(&self, directory_name: &str) -> Result<bool, StoreError> {
        Ok(self
            .diaries
            .iter()
            .any(|diary| diary.directory_name == directory_name))
    }

    fn rename_diary(&mut self, id: i64, name: &str) -> Result<Option<DiaryRecord>, StoreError> {
        let Some(diary) = self.diaries.iter_mut().find(|diary| diary.id == id) else {
            return Ok(None);
        };
        diary.name = name.to_string();
        Ok(Some(diary.clone()))
    }

    fn delete_diary(&mut self, id: i64) -> Result<Option<DiaryRecord>, StoreError> {
        let Some(index) = self.diaries.iter().position(|diary| diary.id == id) else {
            return Ok(None);
        };
        self.delete_all_entries(id)?;
        self.delete_all_photos(id)?;
        Ok(Some(self.diaries.remove(index)))
    }

    fn count_entries(&self, diary_id: i64) -> Result<usize, StoreError> {
        Ok(self.entry_ids_for(diary_id).len())
    }

    fn count_photos(&self, diary_id: i64) -> Result<usize, StoreError> {
        Ok(self.photo_ids_for(diary_id).len())
    }

    fn insert_entry(
        &mut self,
        entry: &NewEntry<'_>,
        photo_ids: &[i64],
    ) -> Result<EntryRecord, StoreError> {
        self.require_diary(entry.diary_id)?;
        let record = EntryRecord {
            id: self.allocate_id(),
            diary_id: entry.diary_id,
            title: entry.title.to_string(),
            text: entry.text.to_string(),
            date: entry.date.to_string(),
        };
        self.entries.push(record.clone());
        self.link_entry(record.id, photo_ids);
        Ok(record)
    }

    fn update_entry(
        &mut self,
        entry: &EntryRecord,
        photo_ids: &[i64],
    ) -> Result<Option<EntryRecord>, StoreError> {
        let Some(stored) = self.entries.iter_mut().find(|stored| stored.id == entry.id) else {
            return Ok(None);
        };
        stored.title = entry.title.clone();
        stored.text = entry.text.clone();
        stored.date = entry.date.clone();
        let updated = stored.clone();
        self.link_entry(entry.id, photo_ids);
        Ok(Some(updated))
    }

    fn set_entry_title(
        &mut self,
        id: i64,
        title: &str,
    ) -> Result<Option<EntryRecord>, StoreError> {
        let Some(stored) = self.entries.iter_mut().find(|stored| stored.id == id) else {
            return Ok(None);
        };
        stored.title = title.to_string();
        Ok(Some(stored.clone()))
    }

    fn get_entry(&self, id: i64) -> Result<Option<EntryRecord>, StoreError> {
        Ok(self.entries.iter().find(|entry| entry.id == id).cloned())
    }

    fn list_entries(&self, diary_id: i64) -> Result<Vec<EntryRecord>, StoreError> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.diary_id == diary_id)
            .cloned()
            .collect())
    }

    fn entry_photos(&self, entry_id: i64) -> Result<Vec<PhotoRecord>, StoreError> {
        let linked: BTreeSet<i64> = self
            .links
            .iter()
            .filter(|(entry, _)| *entry == entry_id)
            .map(|(_, photo)| *photo)
            .collect();
        Ok(self
            .photos
            .iter()
            .filter(|photo| linked.contains(&photo.id))
            .cloned()
            .collect())
    }

    fn delete_entry(&mut self, id: i64) -> Result<Option<EntryRecord>, StoreError> {
        let Some(index) = self.entries.iter().position(|entry| entry.id == id) else {
            return Ok(None);
        };
        self.links.retain(|(entry, _)| *entry != id);
        Ok(Some(self.entries.remove(index)))
    }

    fn delete_all_entries(&mut self, diary_id: i64) -> Result<usize, StoreError> {
        let doomed = self.entry_ids_for(diary_id);
        self.links.retain(|(entry, _)| !doomed.contains(entry));
        self.entries.retain(|entry| entry.diary_id != diary_id);
        Ok(doomed.len())
    }

    fn insert_photo(&mut self, photo: &NewPhoto<'_>) -> Result<PhotoRecord, StoreError> {
        self.require_diary(photo.diary_id)?;
        if self
            .find_photo_by_hash(photo.diary_id, photo.photo_hash)?
            .is_some()
        {
            return Err(StoreError::DuplicateHash(photo.diary_id));
        }
        let record = PhotoRecord {
            id: self.allocate_id(),
            diary_id: photo.diary_id,
            filepath: photo.filepath.to_string(),
            name: photo.name.to_string(),
            photo_hash: photo.photo_hash.to_string(),
            addition_date: photo.addition_date.to_string(),
            caption: photo.caption.map(str::to_string),
        };
        self.photos.push(record.clone());
        Ok(record)
    }

    fn get_photo(&self, id: i64) -> Result<Option<PhotoRecord>, StoreError> {
        Ok(self.photos.iter().find(|photo| photo.id == id).cloned())
    }

    fn list_photos(&self, diary_id: i64) -> Result<Vec<PhotoRecord>, StoreError> {
        Ok(self
            .photos
            .iter()
            .filter(|photo| photo.diary_id == diary_id)
            .cloned()
            .collect())
    }

    fn find_photo_by_hash(
        &self,
        diary_id: i64,
        photo_hash: &str,
    ) -> Result<Option<PhotoRecord>, StoreError> {
        Ok(self
            .photos
            .iter()
            .find(|photo| photo.diary_id == diary_id && photo.photo_hash == photo_hash)
            .cloned())
    }

    fn update_photo(
        &mut self,
        id: i64,
        name: &str,
        caption: Option<&str>,
    ) -> Result<Option<PhotoRecord>, StoreError> {
        let Some(stored) = self.photos.iter_mut().find(|photo| photo.id == id) else {
            return Ok(None);
        };
        stored.name = name.to_string();
        stored.caption = caption.map(str::to_string);
        Ok(Some(stored.clone()))
    }

    fn count_photo_links(&self, photo_id: i64) -> Result<usize, StoreError> {
        Ok(self
            .links
            .iter()
            .filter(|(_, photo)| *photo == photo_id)
            .count())
    }

    fn delete_photo(&mut self, id: i64) -> Result<Option<PhotoRecord>, StoreError> {
        let Some(index) = self.photos.iter().position(|photo| photo.id == id) else {
            return Ok(None);
        };
        self.links.retain(|(_, photo)| *photo != id);
        Ok(Some(self.photos.remove(index)))
    }

    fn delete_all_photos(&mut self, diary_id: i64) -> Result<usize, StoreError> {
        let doomed = self.photo_ids_for(diary_id);
        self.links.retain(|(_, photo)| !doomed.contains(photo));
        self.photos.retain(|photo| photo.diary_id != diary_id);
        Ok(doomed.len())
    }
}
