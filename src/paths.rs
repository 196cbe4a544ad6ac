use std::io;
use std::path::{Path, PathBuf};

const DEFAULT_HOME_DIR: &str = ".pilgrim";
const DIARIES_DIR: &str = "diaries";
const DATA_DIR: &str = "data";
const IMAGES_DIR: &str = "images";

/// Where everything pilgrim owns lives on disk.
///
/// ```text
/// <home>/config.toml
/// <home>/database.db
/// <home>/pilgrim.log
/// <home>/diaries/<directory_name>/data/images/
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryLayout {
    home: PathBuf,
}

impl DirectoryLayout {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// Uses `home` when given, otherwise `~/.pilgrim`.
    pub fn resolve(home: Option<PathBuf>) -> io::Result<Self> {
        if let Some(home) = home {
            return Ok(Self::new(home));
        }
        let user_home = dirs::home_dir().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "could not determine the user home directory; pass --home",
            )
        })?;
        Ok(Self::new(user_home.join(DEFAULT_HOME_DIR)))
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    pub fn default_database_path(&self) -> PathBuf {
        self.home.join("database.db")
    }

    pub fn log_path(&self) -> PathBuf {
        self.home.join("pilgrim.log")
    }

    pub fn diaries_root(&self) -> PathBuf {
        self.home.join(DIARIES_DIR)
    }

    pub fn diary_dir(&self, directory_name: &str) -> PathBuf {
        self.diaries_root().join(directory_name)
    }

    pub fn images_dir(&self, directory_name: &str) -> PathBuf {
        self.diary_dir(directory_name).join(DATA_DIR).join(IMAGES_DIR)
    }

    pub fn ensure_home(&self) -> io::Result<()> {
        std::fs::create_dir_all(self.diaries_root())
    }

    /// Creates `<diary>/data/images` if any part of it is missing.
    pub fn ensure_diary_dirs(&self, directory_name: &str) -> io::Result<PathBuf> {
        let images = self.images_dir(directory_name);
        std::fs::create_dir_all(&images)?;
        Ok(images)
    }
}
