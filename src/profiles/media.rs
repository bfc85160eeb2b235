use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::AppResult;

// svg excluded: /media is same-origin and svg can carry script.
const AVATAR_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// Uploaded files on disk, served back under `/media`.
#[derive(Clone)]
pub struct MediaStore {
    dir: PathBuf,
}

impl MediaStore {
    pub fn new(dir: impl Into<PathBuf>) -> MediaStore {
        MediaStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The lowercased extension of `file_name` if it is an accepted image type.
    pub fn avatar_extension(file_name: &str) -> Option<String> {
        let (_, ext) = file_name.rsplit_once('.')?;
        let ext = ext.to_ascii_lowercase();
        AVATAR_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
    }

    /// Writes an avatar under a fresh name and returns its path relative to the media root.
    pub async fn save_avatar(&self, ext: &str, data: &[u8]) -> AppResult<String> {
        let relative = format!("avatars/{}.{ext}", Uuid::now_v7().simple());
        let path = self.dir.join(&relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;
        Ok(relative)
    }
}
