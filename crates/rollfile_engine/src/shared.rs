use std::io;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use rollfile_base::{FilePath, RollfileResult};

use crate::location::Location;
use crate::writer::{RotatingWriter, WriteReport};

/* 📖 # Why wrap the writer instead of locking inside it?

`RotatingWriter` takes `&mut self` for every write, so a single owner needs no
locking at all. Callers that share one writer between threads wrap it here: each
operation holds the lock for the whole resolve, rotate, write and offset update,
so no thread can write through a handle that another thread has just rotated
away, and offsets are never advanced twice from the same baseline.
*/

/// Clonable, thread safe handle to a [`RotatingWriter`].
#[derive(Debug, Clone)]
pub struct SharedWriter(Arc<Mutex<RotatingWriter>>);

impl SharedWriter {
    pub fn new(writer: RotatingWriter) -> Self {
        Self(Arc::new(Mutex::new(writer)))
    }

    pub fn write_report(&self, data: &[u8], flush: bool) -> RollfileResult<WriteReport> {
        self.0.lock().write_report(data, flush)
    }

    pub fn append(&self, data: &[u8]) -> RollfileResult<()> {
        self.0.lock().append(data)
    }

    pub fn write_str(&self, text: &str) -> RollfileResult<()> {
        self.0.lock().write_str(text)
    }

    pub fn flush(&self) -> RollfileResult<()> {
        self.0.lock().flush()
    }

    pub fn close(&self) -> RollfileResult<()> {
        self.0.lock().close()
    }

    pub fn location(&self) -> Location {
        self.0.lock().location()
    }

    pub fn set_location(&self, location: Location) {
        self.0.lock().set_location(location);
    }

    pub fn current_path(&self) -> Option<FilePath> {
        self.0.lock().current_path().cloned()
    }

    pub fn last_write_pos(&self) -> u64 {
        self.0.lock().last_write_pos()
    }

    /// Lock the writer for a sequence of operations that must not interleave
    /// with other threads.
    pub fn lock(&self) -> MutexGuard<'_, RotatingWriter> {
        self.0.lock()
    }
}

impl io::Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(&mut *self.0.lock(), buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::Write::flush(&mut *self.0.lock())
    }
}
