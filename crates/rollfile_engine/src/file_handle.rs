use std::fmt;
use std::io::Read;

use rollfile_base::tracing::{debug, instrument};
use rollfile_base::{AppendFile, FilePath, PalHandle, RollfileError, RollfileResult, err};

/// The single file a [`crate::RotatingWriter`] currently appends to.
///
/// Handed to the on-open hook, which may inspect the file but cannot write to
/// it. Once closed, only `path`, `initial_size` and reads remain available.
pub struct FileHandle {
    pal: PalHandle,
    path: FilePath,
    file: Option<Box<dyn AppendFile>>,
    initial_size: u64,
}

impl FileHandle {
    /// Open `path` for appending, creating it when missing.
    ///
    /// Returns the handle and whether the file did not exist before.
    #[instrument(skip(pal), fields(path = %path))]
    pub fn open(pal: &PalHandle, path: &FilePath) -> RollfileResult<(Self, bool)> {
        let is_new = !pal.file_exists(path)?;
        let file = pal.open_append(path)?;
        let initial_size = file.size()?;
        debug!(is_new, initial_size, "opened file handle");
        Ok((
            Self {
                pal: pal.clone(),
                path: path.clone(),
                file: Some(file),
                initial_size,
            },
            is_new,
        ))
    }

    pub fn path(&self) -> &FilePath {
        &self.path
    }

    /// File size when the handle was opened.
    pub fn initial_size(&self) -> u64 {
        self.initial_size
    }

    /// Current file size.
    pub fn size(&self) -> RollfileResult<u64> {
        self.open_file()?.size()
    }

    /// Read the whole file through a separate reader. The append position is
    /// not affected.
    pub fn read_contents(&self) -> RollfileResult<Vec<u8>> {
        let mut reader = self.pal.read_file(&self.path)?;
        let mut contents = Vec::new();
        reader
            .read_to_end(&mut contents)
            .map_err(|e| Box::new(RollfileError::file(self.path.as_path(), e)))?;
        Ok(contents)
    }

    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    /// Append all of `data`, returning the number of bytes written.
    pub(crate) fn write(&mut self, data: &[u8]) -> RollfileResult<usize> {
        self.open_file_mut()?.append(data)?;
        Ok(data.len())
    }

    pub(crate) fn sync(&mut self) -> RollfileResult<()> {
        self.open_file_mut()?.sync()
    }

    /// Close the file. Closing an already closed handle does nothing.
    pub(crate) fn close(&mut self) -> RollfileResult<()> {
        match self.file.take() {
            Some(file) => file.close(),
            None => Ok(()),
        }
    }

    fn open_file(&self) -> RollfileResult<&dyn AppendFile> {
        self.file
            .as_deref()
            .ok_or_else(|| err!("file handle for {} is closed", self.path))
    }

    fn open_file_mut(&mut self) -> RollfileResult<&mut Box<dyn AppendFile>> {
        match self.file.as_mut() {
            Some(file) => Ok(file),
            None => Err(err!("file handle for {} is closed", self.path)),
        }
    }
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("path", &self.path)
            .field("initial_size", &self.initial_size)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollfile_base::{MockFailure, MockPal};

    #[test]
    fn test_open_new_file() {
        let mock = MockPal::new();
        let pal = PalHandle::new(mock.clone());

        let (handle, is_new) = FileHandle::open(&pal, &FilePath::from("new.log")).unwrap();

        assert!(is_new);
        assert_eq!(handle.initial_size(), 0);
        assert_eq!(handle.path().as_str(), "new.log");
        assert!(!handle.is_closed());
        assert!(pal.file_exists(&FilePath::from("new.log")).unwrap());
    }

    #[test]
    fn test_open_existing_file_reads_without_moving_append_position() {
        let mock = MockPal::new();
        mock.add_file(FilePath::from("old.log"), b"test string".to_vec());
        let pal = PalHandle::new(mock.clone());

        let (mut handle, is_new) = FileHandle::open(&pal, &FilePath::from("old.log")).unwrap();
        assert!(!is_new);
        assert_eq!(handle.initial_size(), 11);
        assert_eq!(handle.read_contents().unwrap(), b"test string");

        assert_eq!(handle.write(b"!").unwrap(), 1);
        assert_eq!(handle.size().unwrap(), 12);
        assert_eq!(mock.file_contents(&FilePath::from("old.log")).unwrap(), b"test string!");
    }

    #[test]
    fn test_close_is_idempotent_and_blocks_writes() {
        let pal = PalHandle::new(MockPal::new());
        let (mut handle, _) = FileHandle::open(&pal, &FilePath::from("a.log")).unwrap();

        handle.close().unwrap();
        handle.close().unwrap();

        assert!(handle.is_closed());
        assert!(handle.write(b"late").is_err());
        assert!(handle.sync().is_err());
        assert!(handle.size().is_err());
        assert_eq!(handle.read_contents().unwrap(), b"");
    }

    #[test]
    fn test_close_failure_still_releases_handle() {
        let mock = MockPal::new();
        let pal = PalHandle::new(mock.clone());
        let path = FilePath::from("a.log");
        let (mut handle, _) = FileHandle::open(&pal, &path).unwrap();

        mock.inject_failure(MockFailure::Close, path);

        assert!(handle.close().is_err());
        assert!(handle.is_closed());
        assert!(handle.close().is_ok());
    }
}
