use super::{Storage, StorageError};
use regex::Regex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{fs, sync::OnceLock};

/// Stores each key as its own file inside a directory.
/// Other processes pointing at the same directory see the same data, see [`crate::watcher`].
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) the storage directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // keys are user supplied, so scrub anything a file system would choke on.
    fn file_name(key: &str) -> String {
        static INVALID: OnceLock<Regex> = OnceLock::new();
        let re = INVALID
            .get_or_init(|| Regex::new(r#"[/\\?%*:|."<>\s]"#).expect("file name pattern is valid"));
        format!("{}.json", re.replace_all(key, "-"))
    }

    /// Absolute path of the file holding `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(Self::file_name(key))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if !self.dir.is_dir() {
            return Err(StorageError::Unavailable(format!(
                "storage directory {:?} is missing",
                self.dir
            )));
        }
        // write next to the target then rename, so a reader never sees half a file.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
