//! Local file supplying the object's bytes

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::File;

/// An open, read-only handle on the file to upload
///
/// The handle is closed when the value is dropped, whichever path the
/// upload takes.
#[derive(Debug)]
pub struct LocalSource {
    path: PathBuf,
    file: File,
    len: u64,
}

impl LocalSource {
    /// Open `path` for reading
    ///
    /// Fails if the file is missing, unreadable, or not a regular file.
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).await?;
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }

        Ok(Self {
            path,
            file,
            len: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size in bytes at the time the file was opened
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Hand the underlying handle to a body builder
    pub fn into_file(self) -> File {
        self.file
    }
}
