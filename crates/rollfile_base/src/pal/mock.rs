use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use crate::RollfileError;
use crate::RollfileResult;

use super::FilePath;
use super::traits::{AppendFile, Pal, ReadSeek};

/* 📖 # Why use HashMap for MockPal storage?

MockPal uses in-memory storage with Arc<Mutex<T>> for several reasons:
1. **Speed**: No filesystem I/O, deterministic and fast for unit tests
2. **Isolation**: No side effects on the real filesystem
3. **Control**: Failures can be injected per operation and path, which is the
   only practical way to exercise the writer's close/open/write error paths
4. **Thread-safe**: Mutex allows concurrent test execution

Appends go straight into the shared map, so a test (or an on-open hook) can
observe file contents while the file is still open.
*/

/// Operations of the mock filesystem that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockFailure {
    CreateDirectory,
    Open,
    Write,
    Sync,
    Close,
}

type FileMap = Arc<Mutex<HashMap<FilePath, Vec<u8>>>>;
type FailureSet = Arc<Mutex<HashSet<(MockFailure, FilePath)>>>;

/// In-memory PAL implementation for testing.
///
/// # Examples
///
/// ```
/// use rollfile_base::{MockPal, Pal, FilePath};
///
/// let mock = MockPal::new();
/// mock.add_file(FilePath::from("test.txt"), b"content".to_vec());
/// let content = mock.read_file_to_string(&FilePath::from("test.txt")).unwrap();
/// assert_eq!(content, "content");
/// ```
#[derive(Debug, Clone)]
pub struct MockPal {
    files: FileMap,
    directories: Arc<Mutex<HashSet<FilePath>>>,
    failures: FailureSet,
}

impl MockPal {
    /// Create a new empty MockPal.
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            directories: Arc::new(Mutex::new(HashSet::new())),
            failures: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Add a file to the mock storage, creating its parent directories.
    pub fn add_file(&self, path: FilePath, content: Vec<u8>) {
        if let Some(parent) = path.parent() {
            self.add_directory(parent);
        }
        self.files.lock().unwrap().insert(path, content);
    }

    /// Add a directory and all of its ancestors to the mock storage.
    pub fn add_directory(&self, path: FilePath) {
        let mut directories = self.directories.lock().unwrap();
        let mut current = Some(path);
        while let Some(dir) = current {
            current = dir.parent();
            directories.insert(dir);
        }
    }

    /// Returns the current contents of a file, if it exists.
    pub fn file_contents(&self, path: &FilePath) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    /// Returns true if the directory has been created.
    pub fn has_directory(&self, path: &FilePath) -> bool {
        self.directories.lock().unwrap().contains(path)
    }

    /// Make the given operation fail for `path` until cleared.
    pub fn inject_failure(&self, failure: MockFailure, path: FilePath) {
        self.failures.lock().unwrap().insert((failure, path));
    }

    /// Remove a previously injected failure.
    pub fn clear_failure(&self, failure: MockFailure, path: FilePath) {
        self.failures.lock().unwrap().remove(&(failure, path));
    }

    fn check_failure(&self, failure: MockFailure, path: &FilePath) -> RollfileResult<()> {
        check_failure(&self.failures, failure, path)
    }
}

fn check_failure(failures: &FailureSet, failure: MockFailure, path: &FilePath) -> RollfileResult<()> {
    if failures
        .lock()
        .unwrap()
        .contains(&(failure, path.clone()))
    {
        return Err(Box::new(RollfileError::file(
            path.as_path(),
            std::io::Error::other(format!("injected {:?} failure", failure)),
        )));
    }
    Ok(())
}

impl Default for MockPal {
    fn default() -> Self {
        Self::new()
    }
}

impl Pal for MockPal {
    fn file_exists(&self, path: &FilePath) -> RollfileResult<bool> {
        let files = self.files.lock().unwrap();
        Ok(files.contains_key(path))
    }

    fn read_file(&self, path: &FilePath) -> RollfileResult<Box<dyn ReadSeek + 'static>> {
        let files = self.files.lock().unwrap();
        let content = files
            .get(path)
            .ok_or_else(|| {
                Box::new(RollfileError::file(
                    path.as_path(),
                    std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("File not found: {}", path),
                    ),
                ))
            })?
            .clone();
        Ok(Box::new(Cursor::new(content)))
    }

    fn create_directory_all(&self, path: &FilePath) -> RollfileResult<()> {
        self.check_failure(MockFailure::CreateDirectory, path)?;
        self.add_directory(path.clone());
        Ok(())
    }

    fn open_append(&self, path: &FilePath) -> RollfileResult<Box<dyn AppendFile>> {
        self.check_failure(MockFailure::Open, path)?;
        if let Some(parent) = path.parent() {
            if !self.has_directory(&parent) {
                return Err(Box::new(RollfileError::file(
                    path.as_path(),
                    std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("Directory not found: {}", parent),
                    ),
                )));
            }
        }
        self.files
            .lock()
            .unwrap()
            .entry(path.clone())
            .or_default();
        Ok(Box::new(MockAppendFile {
            path: path.clone(),
            files: Arc::clone(&self.files),
            failures: Arc::clone(&self.failures),
        }))
    }
}

/// Helper struct appending to a file held by MockPal.
#[derive(Debug)]
struct MockAppendFile {
    path: FilePath,
    files: FileMap,
    failures: FailureSet,
}

impl AppendFile for MockAppendFile {
    fn append(&mut self, data: &[u8]) -> RollfileResult<()> {
        check_failure(&self.failures, MockFailure::Write, &self.path)?;
        self.files
            .lock()
            .unwrap()
            .entry(self.path.clone())
            .or_default()
            .extend_from_slice(data);
        Ok(())
    }

    fn sync(&mut self) -> RollfileResult<()> {
        check_failure(&self.failures, MockFailure::Sync, &self.path)
    }

    fn size(&self) -> RollfileResult<u64> {
        let files = self.files.lock().unwrap();
        Ok(files.get(&self.path).map_or(0, |content| content.len() as u64))
    }

    fn close(self: Box<Self>) -> RollfileResult<()> {
        check_failure(&self.failures, MockFailure::Close, &self.path)
    }
}
