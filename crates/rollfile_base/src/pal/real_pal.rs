use std::fs;
use std::io::Write;
use std::path::PathBuf;

use tracing::{debug, instrument};

use crate::RollfileError;
use crate::RollfileResult;

use super::FilePath;
use super::traits::{AppendFile, Pal, ReadSeek};

/* 📖 # Why use std::fs instead of async or other crates?

A rotating writer sits directly underneath whatever produces the data and
is called synchronously on every write. std::fs is:
- Sufficient for synchronous append-only file operations
- Requires no external dependencies beyond what we already use
- Easy to understand and maintain
*/

/// Concrete PAL implementation using the real filesystem via std::fs.
///
/// All file paths are resolved relative to a configured base directory,
/// ensuring operations stay within intended boundaries.
#[derive(Debug)]
pub struct RealPal {
    base_dir: PathBuf,
}

impl RealPal {
    /// Create a new RealPal with the given base directory.
    ///
    /// # Arguments
    /// * `base_dir` - All paths will be resolved relative to this directory
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Resolve a FilePath to an absolute filesystem path.
    fn resolve_path(&self, path: &FilePath) -> PathBuf {
        self.base_dir.join(path.as_path())
    }
}

impl Pal for RealPal {
    #[instrument(skip(self), fields(path = %path))]
    fn file_exists(&self, path: &FilePath) -> RollfileResult<bool> {
        let resolved = self.resolve_path(path);
        let exists = resolved.exists();
        debug!(exists, resolved = %resolved.display(), "checked file existence");
        Ok(exists)
    }

    #[instrument(skip(self), fields(path = %path))]
    fn read_file(&self, path: &FilePath) -> RollfileResult<Box<dyn ReadSeek + 'static>> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "opening file for reading");
        let file = fs::File::open(&resolved).map_err(|e| {
            debug!(error = %e, "failed to open file");
            Box::new(RollfileError::file(resolved, e))
        })?;
        Ok(Box::new(file))
    }

    #[instrument(skip(self), fields(path = %path))]
    fn create_directory_all(&self, path: &FilePath) -> RollfileResult<()> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "creating directory and parents");
        fs::create_dir_all(&resolved).map_err(|e| {
            debug!(error = %e, "failed to create directory");
            Box::new(RollfileError::file(resolved, e))
        })?;
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path))]
    fn open_append(&self, path: &FilePath) -> RollfileResult<Box<dyn AppendFile>> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "opening file for appending");
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&resolved)
            .map_err(|e| {
                debug!(error = %e, "failed to open file for appending");
                Box::new(RollfileError::file(resolved.clone(), e))
            })?;
        debug!("file opened successfully");
        Ok(Box::new(RealAppendFile {
            path: resolved,
            file,
        }))
    }
}

/// A real file opened in append mode.
#[derive(Debug)]
struct RealAppendFile {
    path: PathBuf,
    file: fs::File,
}

impl RealAppendFile {
    fn file_error(&self, source: std::io::Error) -> Box<RollfileError> {
        Box::new(RollfileError::file(self.path.clone(), source))
    }
}

impl AppendFile for RealAppendFile {
    fn append(&mut self, data: &[u8]) -> RollfileResult<()> {
        self.file.write_all(data).map_err(|e| self.file_error(e))
    }

    fn sync(&mut self) -> RollfileResult<()> {
        self.file.flush().map_err(|e| self.file_error(e))?;
        self.file.sync_data().map_err(|e| self.file_error(e))
    }

    fn size(&self) -> RollfileResult<u64> {
        let metadata = self.file.metadata().map_err(|e| self.file_error(e))?;
        Ok(metadata.len())
    }

    fn close(mut self: Box<Self>) -> RollfileResult<()> {
        debug!(path = %self.path.display(), "closing file");
        self.file.flush().map_err(|e| self.file_error(e))?;
        // Dropping a File swallows write-back errors, so sync before letting go.
        self.file.sync_all().map_err(|e| self.file_error(e))
    }
}
