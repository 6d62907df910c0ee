use std::io::{Read, Seek};
use std::sync::Arc;

use crate::RollfileResult;

use super::file_path::FilePath;

/// Trait combining Read + Seek for file operations.
///
/// This trait enables returning opaque file handles that support both reading
/// and seeking, useful for different implementations (real files, in-memory buffers, etc.)
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

/* 📖 # Why a dedicated AppendFile trait instead of Box<dyn Write>?

The rotating writer needs more than `Write` from an open file:
- the current size, to seed the offset baseline when reattaching to an existing file
- an explicit sync, for writes that request durability
- an explicit close that reports failures instead of swallowing them in Drop

`append` writes the whole buffer or fails, so a successful call always advances
the file by exactly `data.len()` bytes.
*/

/// An open file positioned for appending.
pub trait AppendFile: Send + std::fmt::Debug {
    /// Append all of `data` to the end of the file.
    fn append(&mut self, data: &[u8]) -> RollfileResult<()>;

    /// Flush buffered data and sync it to storage.
    fn sync(&mut self) -> RollfileResult<()>;

    /// Current size of the file in bytes.
    fn size(&self) -> RollfileResult<u64>;

    /// Close the file, releasing the underlying resource.
    fn close(self: Box<Self>) -> RollfileResult<()>;
}

/// Platform Abstraction Layer (PAL) trait providing filesystem operations.
///
/// Two implementations are provided:
/// - `RealPal`: Uses the real filesystem via `std::fs`
/// - `MockPal`: In-memory implementation for testing
pub trait Pal: std::fmt::Debug + Send + Sync + 'static {
    /// Check if a file exists at the given path.
    fn file_exists(&self, path: &FilePath) -> RollfileResult<bool>;

    /// Open a file for reading.
    fn read_file(&self, path: &FilePath) -> RollfileResult<Box<dyn ReadSeek + 'static>>;

    /// Read entire file contents as a UTF-8 string.
    fn read_file_to_string(&self, path: &FilePath) -> RollfileResult<String> {
        let mut reader = self.read_file(path)?;
        let mut contents = Vec::new();
        reader
            .read_to_end(&mut contents)
            .map_err(|e| Box::new(crate::RollfileError::file(path.as_path(), e)))?;
        String::from_utf8(contents).map_err(|_e| crate::err!("File is not valid UTF-8: {}", path))
    }

    /// Create a directory and all parent directories.
    fn create_directory_all(&self, path: &FilePath) -> RollfileResult<()>;

    /// Open a file for appending, creating it if it does not exist.
    ///
    /// The parent directory must already exist.
    fn open_append(&self, path: &FilePath) -> RollfileResult<Box<dyn AppendFile>>;
}

/// Handle to a PAL implementation, enabling shared ownership.
///
/// Internally wraps `Arc<dyn Pal>` for cheap cloning and thread-safe sharing.
///
/// # Examples
///
/// ```no_run
/// use rollfile_base::{RealPal, PalHandle};
///
/// let pal = PalHandle::new(RealPal::new(".".into()));
/// let pal_clone = pal.clone(); // Cheap clone, shares the same implementation
/// ```
#[derive(Debug, Clone)]
pub struct PalHandle(Arc<dyn Pal>);

impl PalHandle {
    /// Create a new PalHandle from a Pal implementation.
    pub fn new(pal: impl Pal + 'static) -> Self {
        Self(Arc::new(pal))
    }
}

impl std::ops::Deref for PalHandle {
    type Target = dyn Pal;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}
