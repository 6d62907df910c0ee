use std::io;

use chrono::{DateTime, FixedOffset};

use rollfile_base::tracing::{debug, info, instrument, warn};
use rollfile_base::{
    ClockHandle, ErrorKind, FilePath, PalHandle, ResultExt, RollfileError, RollfileResult, bail,
};

use crate::config::WriterConfig;
use crate::file_handle::FileHandle;
use crate::hooks::LifecycleHooks;
use crate::layout::PathLayout;
use crate::location::Location;
use crate::resolver::PathResolver;

/// Outcome of a successful [`RotatingWriter::write_report`].
#[derive(Debug)]
pub struct WriteReport {
    /// File the bytes were appended to.
    pub path: FilePath,
    /// Offset within `path` at which the bytes start.
    pub offset: u64,
    /// Number of bytes written.
    pub written: usize,
    /// Failure to close the previous file, when this write rotated away from it.
    pub close_error: Option<Box<RollfileError>>,
    /// Failure to sync after a flushing write. The bytes were still appended.
    pub sync_error: Option<Box<RollfileError>>,
}

/* 📖 # How does a write decide to rotate?

Every write resolves its target path from the clock. If no file is open, or the
resolved path differs from the open one, the writer rotates:

1. create the parent directory of the new path
2. close the old file and fire `on_close(old, true)`
3. open the new file and ask `on_open(handle, is_new)` for approval
4. only then make the new file current

Creating the directory first means a directory failure leaves the old file
attached and untouched. A close failure in step 2 does not stop the rotation;
it is logged and handed back in `WriteReport::close_error`, or folded into a
`Multiple` error when the open fails as well.

When the resolved path equals the open one, nothing touches the filesystem
before the append itself.
*/

/// Appends to a file whose path is derived from the current time, switching to
/// a new file whenever the derived path changes.
#[derive(Debug)]
pub struct RotatingWriter {
    pal: PalHandle,
    clock: ClockHandle,
    resolver: PathResolver,
    hooks: LifecycleHooks,
    location: Location,
    flush_on_write: bool,
    current_path: Option<FilePath>,
    handle: Option<FileHandle>,
    last_write_pos: u64,
    pending_sync_error: Option<Box<RollfileError>>,
}

impl RotatingWriter {
    /// Create a writer whose paths come from a layout such as `logs/2006-01-02.txt`.
    pub fn new(pal: PalHandle, template: &str, hooks: LifecycleHooks) -> RollfileResult<Self> {
        let layout = PathLayout::parse(template)
            .with_context(|| format!("invalid path template '{}'", template))?;
        Ok(Self::with_resolver(pal, PathResolver::template(layout), hooks))
    }

    /// Create a writer whose paths come from `generator`.
    pub fn with_path_generator(
        pal: PalHandle,
        generator: impl Fn(DateTime<FixedOffset>, u64) -> String + Send + Sync + 'static,
        hooks: LifecycleHooks,
    ) -> Self {
        Self::with_resolver(pal, PathResolver::generator(generator), hooks)
    }

    /// Create a writer from a loaded configuration.
    pub fn from_config(
        pal: PalHandle,
        config: &WriterConfig,
        hooks: LifecycleHooks,
    ) -> RollfileResult<Self> {
        let mut writer = Self::new(pal, &config.path_template, hooks)?;
        writer.location = config.location;
        writer.flush_on_write = config.flush_on_write;
        Ok(writer)
    }

    fn with_resolver(pal: PalHandle, resolver: PathResolver, hooks: LifecycleHooks) -> Self {
        Self {
            pal,
            clock: ClockHandle::system(),
            resolver,
            hooks,
            location: Location::default(),
            flush_on_write: false,
            current_path: None,
            handle: None,
            last_write_pos: 0,
            pending_sync_error: None,
        }
    }

    /// Replace the clock used to resolve paths.
    pub fn with_clock(mut self, clock: ClockHandle) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// Sync after every [`append`](Self::append), [`write_str`](Self::write_str)
    /// and `io::Write::write`.
    pub fn with_flush_on_write(mut self, flush_on_write: bool) -> Self {
        self.flush_on_write = flush_on_write;
        self
    }

    /// Write `data` to the file for the current instant, rotating first if needed.
    ///
    /// With `flush` set the file is synced to storage after the write. A failed
    /// sync does not fail the write: the bytes are appended and counted, and the
    /// failure is handed back in [`WriteReport::sync_error`].
    #[instrument(skip(self, data), fields(len = data.len()))]
    pub fn write_report(&mut self, data: &[u8], flush: bool) -> RollfileResult<WriteReport> {
        let resolved = self.resolver.resolve(self.clock.now(), &self.location);

        let mut close_error = None;
        if self.handle.is_none() || self.current_path.as_ref() != Some(&resolved) {
            close_error = self.rotate(resolved)?;
        }

        let Some(handle) = self.handle.as_mut() else {
            bail!("no file open after rotation");
        };
        let offset = self.last_write_pos;
        let written = handle
            .write(data)
            .with_context(|| format!("writing to {}", handle.path()))?;
        self.last_write_pos += written as u64;
        debug!(path = %handle.path(), offset, written, "wrote");

        let sync_error = if flush { handle.sync().err() } else { None }.map(|error| {
            let error = Box::new(error.context(format!("syncing {}", handle.path())));
            warn!(%error, "sync after write failed");
            error
        });

        Ok(WriteReport {
            path: handle.path().clone(),
            offset,
            written,
            close_error,
            sync_error,
        })
    }

    /// Write `data`, discarding the report.
    ///
    /// A failed sync is returned as the error even though the bytes were
    /// appended, so callers must not repeat the write on a sync error.
    pub fn append(&mut self, data: &[u8]) -> RollfileResult<()> {
        let report = self.write_report(data, self.flush_on_write)?;
        match report.sync_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    pub fn write_str(&mut self, text: &str) -> RollfileResult<()> {
        self.append(text.as_bytes())
    }

    /// Sync the open file to storage. Does nothing when no file is open.
    pub fn flush(&mut self) -> RollfileResult<()> {
        match self.handle.as_mut() {
            Some(handle) => handle.sync(),
            None => Ok(()),
        }
    }

    /// Close the open file and fire `on_close(path, false)`.
    ///
    /// Closing without an open file, including a second close, does nothing.
    /// A later write opens the file for the current instant again.
    #[instrument(skip(self))]
    pub fn close(&mut self) -> RollfileResult<()> {
        self.close_current(false)
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Change the location used by subsequent writes.
    pub fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    /// Path of the file most recently opened. Cleared when an open fails or
    /// is vetoed.
    pub fn current_path(&self) -> Option<&FilePath> {
        self.current_path.as_ref()
    }

    /// Offset at which the next write to the current file starts.
    pub fn last_write_pos(&self) -> u64 {
        self.last_write_pos
    }

    /// Number of path resolutions performed so far.
    pub fn iteration(&self) -> u64 {
        self.resolver.iteration()
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    fn rotate(&mut self, target: FilePath) -> RollfileResult<Option<Box<RollfileError>>> {
        if let Some(parent) = target.parent() {
            self.pal
                .create_directory_all(&parent)
                .with_context(|| format!("creating directory for {}", target))?;
        }

        let rotated_from = self
            .current_path
            .clone()
            .filter(|previous| previous != &target);
        let close_error = self.close_current(true).err();
        if let Some(error) = &close_error {
            warn!(%error, "failed to close previous file during rotation");
        }

        match self.open(target) {
            Ok(()) => {
                if let Some(from) = rotated_from {
                    info!(%from, to = ?self.current_path, "rotated");
                }
                Ok(close_error)
            }
            Err(open_error) => match close_error {
                Some(close_error) => Err(ErrorKind::Multiple {
                    errors: vec![*close_error, *open_error],
                    count: 2,
                }
                .into()),
                None => Err(open_error),
            },
        }
    }

    fn open(&mut self, target: FilePath) -> RollfileResult<()> {
        let (mut handle, is_new) = match FileHandle::open(&self.pal, &target) {
            Ok(opened) => opened,
            Err(error) => {
                self.current_path = None;
                self.last_write_pos = 0;
                return Err(Box::new(error.context(format!("opening {}", target))));
            }
        };

        if !self.hooks.approve_open(&handle, is_new) {
            self.current_path = None;
            self.last_write_pos = 0;
            if let Err(error) = handle.close() {
                warn!(%error, path = %target, "failed to close vetoed file");
            }
            warn!(path = %target, "open vetoed by on-open hook");
            return Err(ErrorKind::OpenRejected {
                path: target.into_path_buf(),
            }
            .into());
        }

        self.last_write_pos = if is_new { 0 } else { handle.initial_size() };
        info!(path = %target, is_new, offset = self.last_write_pos, "opened");
        self.current_path = Some(target);
        self.handle = Some(handle);
        Ok(())
    }

    fn close_current(&mut self, did_rotate: bool) -> RollfileResult<()> {
        let Some(mut handle) = self.handle.take() else {
            return Ok(());
        };
        let result = handle
            .close()
            .with_context(|| format!("closing {}", handle.path()));
        self.hooks.notify_close(handle.path(), did_rotate);
        debug!(path = %handle.path(), did_rotate, "closed");
        result
    }
}

/* 📖 # Why does io::Write hold back sync failures?

`io::Write::write` promises that an error means nothing was written, and callers
such as `write_all` retry on that basis. With `flush_on_write` the bytes are
already appended when the sync fails, so `write` reports them as written and the
sync failure surfaces from the next `flush` instead.
*/
impl io::Write for RotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let flush = self.flush_on_write;
        let report = self.write_report(buf, flush)?;
        if let Some(error) = report.sync_error {
            self.pending_sync_error = Some(error);
        }
        Ok(report.written)
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(error) = self.pending_sync_error.take() {
            return Err(error.into());
        }
        Ok(RotatingWriter::flush(self)?)
    }
}

impl Drop for RotatingWriter {
    fn drop(&mut self) {
        if let Err(error) = self.close_current(false) {
            warn!(%error, "failed to close file while dropping writer");
        }
    }
}
