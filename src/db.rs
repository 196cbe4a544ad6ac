use std::time::Duration;

use rusqlite::{params, Connection, DatabaseName, OptionalExtension, Result, Row};

use crate::domain::dates::now_utc_rfc3339;

pub const CURRENT_SCHEMA_VERSION: i64 = 2;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: [Migration; 2] = [
    Migration {
        version: 1,
        name: "baseline_diary_schema_v1",
        sql: r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS travel_diary (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    directory_name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS entry (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    text TEXT NOT NULL,
    date TEXT NOT NULL,
    fk_travel_diary_id INTEGER NOT NULL REFERENCES travel_diary(id)
);

CREATE TABLE IF NOT EXISTS photo (
    id INTEGER PRIMARY KEY,
    filepath TEXT NOT NULL,
    name TEXT NOT NULL,
    photo_hash TEXT NOT NULL,
    addition_date TEXT NOT NULL,
    caption TEXT,
    fk_travel_diary_id INTEGER NOT NULL REFERENCES travel_diary(id)
);

CREATE TABLE IF NOT EXISTS photo_in_entry (
    fk_photo_id INTEGER NOT NULL REFERENCES photo(id),
    fk_entry_id INTEGER NOT NULL REFERENCES entry(id),
    PRIMARY KEY (fk_photo_id, fk_entry_id)
);

CREATE INDEX IF NOT EXISTS idx_entry_diary ON entry(fk_travel_diary_id);
CREATE INDEX IF NOT EXISTS idx_photo_diary ON photo(fk_travel_diary_id);
CREATE INDEX IF NOT EXISTS idx_photo_in_entry_entry ON photo_in_entry(fk_entry_id);
"#,
    },
    Migration {
        version: 2,
        name: "photo_hash_unique_per_diary_v2",
        sql: r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_photo_diary_hash
    ON photo(fk_travel_diary_id, photo_hash);
"#,
    },
];

pub fn open_connection(path: &str) -> Result<Connection> {
    let mut conn = Connection::open(path)?;
    configure_for_speed(&conn)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}

fn configure_for_speed(conn: &Connection) -> Result<()> {
    conn.pragma_update(None::<DatabaseName>, "journal_mode", "WAL")?;
    conn.pragma_update(None::<DatabaseName>, "synchronous", "NORMAL")?;
    conn.pragma_update(None::<DatabaseName>, "foreign_keys", "ON")?;
    conn.pragma_update(None::<DatabaseName>, "temp_store", "MEMORY")?;
    conn.pragma_update(None::<DatabaseName>, "busy_timeout", 5000i64)?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

fn apply_migrations(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
);
"#,
    )?;

    for migration in MIGRATIONS {
        let already_applied: Option<i64> = tx
            .query_row(
                "SELECT version FROM schema_migrations WHERE version = ?1",
                params![migration.version],
                |row| row.get(0),
            )
            .optional()?;

        if already_applied.is_some() {
            continue;
        }

        tracing::debug!(version = migration.version, name = migration.name, "applying migration");
        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![migration.version, migration.name, now_utc_rfc3339()],
        )?;
    }

    tx.execute(
        r#"
INSERT INTO meta (key, value)
VALUES ('schema_version', ?1)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#,
        params![CURRENT_SCHEMA_VERSION.to_string()],
    )?;

    tx.commit()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiaryRecord {
    pub id: i64,
    pub name: String,
    pub directory_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    pub id: i64,
    pub diary_id: i64,
    pub title: String,
    pub text: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoRecord {
    pub id: i64,
    pub diary_id: i64,
    pub filepath: String,
    pub name: String,
    pub photo_hash: String,
    pub addition_date: String,
    pub caption: Option<String>,
}

pub struct NewEntry<'a> {
    pub diary_id: i64,
    pub title: &'a str,
    pub text: &'a str,
    pub date: &'a str,
}

pub struct NewPhoto<'a> {
    pub diary_id: i64,
    pub filepath: &'a str,
    pub name: &'a str,
    pub photo_hash: &'a str,
    pub addition_date: &'a str,
    pub caption: Option<&'a str>,
}

fn diary_from_row(row: &Row<'_>) -> Result<DiaryRecord> {
    Ok(DiaryRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        directory_name: row.get(2)?,
    })
}

fn entry_from_row(row: &Row<'_>) -> Result<EntryRecord> {
    Ok(EntryRecord {
        id: row.get(0)?,
        diary_id: row.get(1)?,
        title: row.get(2)?,
        text: row.get(3)?,
        date: row.get(4)?,
    })
}

fn photo_from_row(row: &Row<'_>) -> Result<PhotoRecord> {
    Ok(PhotoRecord {
        id: row.get(0)?,
        diary_id: row.get(1)?,
        filepath: row.get(2)?,
        name: row.get(3)?,
        photo_hash: row.get(4)?,
        addition_date: row.get(5)?,
        caption: row.get(6)?,
    })
}

const PHOTO_COLUMNS: &str =
    "photo.id, photo.fk_travel_diary_id, photo.filepath, photo.name, photo.photo_hash, \
     photo.addition_date, photo.caption";

pub fn insert_diary(conn: &Connection, name: &str, directory_name: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO travel_diary (name, directory_name) VALUES (?1, ?2)",
        params![name, directory_name],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_diary(conn: &Connection, id: i64) -> Result<Option<DiaryRecord>> {
    conn.query_row(
        "SELECT id, name, directory_name FROM travel_diary WHERE id = ?1",
        params![id],
        diary_from_row,
    )
    .optional()
}

pub fn list_diaries(conn: &Connection) -> Result<Vec<DiaryRecord>> {
    let mut stmt = conn.prepare("SELECT id, name, directory_name FROM travel_diary ORDER BY id")?;
    let rows = stmt.query_map([], diary_from_row)?;
    rows.collect()
}

pub fn directory_name_exists(conn: &Connection, directory_name: &str) -> Result<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM travel_diary WHERE directory_name = ?1)",
        params![directory_name],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub fn rename_diary(conn: &Connection, id: i64, name: &str) -> Result<usize> {
    conn.execute(
        "UPDATE travel_diary SET name = ?2 WHERE id = ?1",
        params![id, name],
    )
}

pub fn delete_diary_row(conn: &Connection, id: i64) -> Result<usize> {
    conn.execute("DELETE FROM travel_diary WHERE id = ?1", params![id])
}

pub fn insert_entry(conn: &Connection, entry: &NewEntry<'_>) -> Result<i64> {
    conn.execute(
        "INSERT INTO entry (title, text, date, fk_travel_diary_id) VALUES (?1, ?2, ?3, ?4)",
        params![entry.title, entry.text, entry.date, entry.diary_id],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_entry(conn: &Connection, id: i64) -> Result<Option<EntryRecord>> {
    conn.query_row(
        "SELECT id, fk_travel_diary_id, title, text, date FROM entry WHERE id = ?1",
        params![id],
        entry_from_row,
    )
    .optional()
}

pub fn list_entries(conn: &Connection, diary_id: i64) -> Result<Vec<EntryRecord>> {
    let mut stmt = conn.prepare(
        r#"
SELECT id, fk_travel_diary_id, title, text, date
FROM entry
WHERE fk_travel_diary_id = ?1
ORDER BY id ASC
"#,
    )?;
    let rows = stmt.query_map(params![diary_id], entry_from_row)?;
    rows.collect()
}

pub fn update_entry_content(
    conn: &Connection,
    id: i64,
    title: &str,
    text: &str,
    date: &str,
) -> Result<usize> {
    conn.execute(
        "UPDATE entry SET title = ?2, text = ?3, date = ?4 WHERE id = ?1",
        params![id, title, text, date],
    )
}

pub fn set_entry_title(conn: &Connection, id: i64, title: &str) -> Result<usize> {
    conn.execute(
        "UPDATE entry SET title = ?2 WHERE id = ?1",
        params![id, title],
    )
}

pub fn delete_entry_row(conn: &Connection, id: i64) -> Result<usize> {
    conn.execute("DELETE FROM entry WHERE id = ?1", params![id])
}

pub fn delete_entries_for_diary(conn: &Connection, diary_id: i64) -> Result<usize> {
    conn.execute(
        "DELETE FROM entry WHERE fk_travel_diary_id = ?1",
        params![diary_id],
    )
}

pub fn count_entries(conn: &Connection, diary_id: i64) -> Result<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM entry WHERE fk_travel_diary_id = ?1",
        params![diary_id],
        |row| row.get(0),
    )?;
    Ok(usize::try_from(count).unwrap_or_default())
}

pub fn insert_photo(conn: &Connection, photo: &NewPhoto<'_>) -> Result<i64> {
    conn.execute(
        r#"
INSERT INTO photo (filepath, name, photo_hash, addition_date, caption, fk_travel_diary_id)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#,
        params![
            photo.filepath,
            photo.name,
            photo.photo_hash,
            photo.addition_date,
            photo.caption,
            photo.diary_id
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_photo(conn: &Connection, id: i64) -> Result<Option<PhotoRecord>> {
    conn.query_row(
        &format!("SELECT {PHOTO_COLUMNS} FROM photo WHERE photo.id = ?1"),
        params![id],
        photo_from_row,
    )
    .optional()
}

pub fn list_photos(conn: &Connection, diary_id: i64) -> Result<Vec<PhotoRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PHOTO_COLUMNS} FROM photo WHERE photo.fk_travel_diary_id = ?1 ORDER BY photo.id"
    ))?;
    let rows = stmt.query_map(params![diary_id], photo_from_row)?;
    rows.collect()
}

pub fn find_photo_by_hash(
    conn: &Connection,
    diary_id: i64,
    photo_hash: &str,
) -> Result<Option<PhotoRecord>> {
    conn.query_row(
        &format!(
            "SELECT {PHOTO_COLUMNS} FROM photo \
             WHERE photo.fk_travel_diary_id = ?1 AND photo.photo_hash = ?2"
        ),
        params![diary_id, photo_hash],
        photo_from_row,
    )
    .optional()
}

pub fn update_photo_details(
    conn: &Connection,
    id: i64,
    name: &str,
    caption: Option<&str>,
) -> Result<usize> {
    conn.execute(
        "UPDATE photo SET name = ?2, caption = ?3 WHERE id = ?1",
        params![id, name, caption],
    )
}

pub fn delete_photo_row(conn: &Connection, id: i64) -> Result<usize> {
    conn.execute("DELETE FROM photo WHERE id = ?1", params![id])
}

pub fn delete_photos_for_diary(conn: &Connection, diary_id: i64) -> Result<usize> {
    conn.execute(
        "DELETE FROM photo WHERE fk_travel_diary_id = ?1",
        params![diary_id],
    )
}

pub fn count_photos(conn: &Connection, diary_id: i64) -> Result<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM photo WHERE fk_travel_diary_id = ?1",
        params![diary_id],
        |row| row.get(0),
    )?;
    Ok(usize::try_from(count).unwrap_or_default())
}

pub fn count_photo_links(conn: &Connection, photo_id: i64) -> Result<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM photo_in_entry WHERE fk_photo_id = ?1",
        params![photo_id],
        |row| row.get(0),
    )?;
    Ok(usize::try_from(count).unwrap_or_default())
}

pub fn replace_entry_photos(conn: &Connection, entry_id: i64, photo_ids: &[i64]) -> Result<()> {
    conn.execute(
        "DELETE FROM photo_in_entry WHERE fk_entry_id = ?1",
        params![entry_id],
    )?;
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO photo_in_entry (fk_photo_id, fk_entry_id) VALUES (?1, ?2)",
    )?;
    for photo_id in photo_ids {
        stmt.execute(params![photo_id, entry_id])?;
    }
    Ok(())
}

pub fn list_entry_photos(conn: &Connection, entry_id: i64) -> Result<Vec<PhotoRecord>> {
    let mut stmt = conn.prepare(&format!(
        r#"
SELECT {PHOTO_COLUMNS}
FROM photo
JOIN photo_in_entry ON photo_in_entry.fk_photo_id = photo.id
WHERE photo_in_entry.fk_entry_id = ?1
ORDER BY photo.id
"#
    ))?;
    let rows = stmt.query_map(params![entry_id], photo_from_row)?;
    rows.collect()
}

pub fn delete_links_for_entry(conn: &Connection, entry_id: i64) -> Result<usize> {
    conn.execute(
        "DELETE FROM photo_in_entry WHERE fk_entry_id = ?1",
        params![entry_id],
    )
}

pub fn delete_links_for_photo(conn: &Connection, photo_id: i64) -> Result<usize> {
    conn.execute(
        "DELETE FROM photo_in_entry WHERE fk_photo_id = ?1",
        params![photo_id],
    )
}

pub fn delete_entry_links_for_diary(conn: &Connection, diary_id: i64) -> Result<usize> {
    conn.execute(
        r#"
DELETE FROM photo_in_entry
WHERE fk_entry_id IN (SELECT id FROM entry WHERE fk_travel_diary_id = ?1)
"#,
        params![diary_id],
    )
}

pub fn delete_photo_links_for_diary(conn: &Connection, diary_id: i64) -> Result<usize> {
    conn.execute(
        r#"
DELETE FROM photo_in_entry
WHERE fk_photo_id IN (SELECT id FROM photo WHERE fk_travel_diary_id = ?1)
"#,
        params![diary_id],
    )
}
