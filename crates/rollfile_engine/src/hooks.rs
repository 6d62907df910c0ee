use std::fmt;

use rollfile_base::FilePath;

use crate::file_handle::FileHandle;

/// Called after a file is opened, with whether the file was newly created.
/// Returning `false` vetoes the open.
pub type OnOpen = Box<dyn Fn(&FileHandle, bool) -> bool + Send + Sync>;

/// Called after a file is closed, with whether the close was caused by rotation.
pub type OnClose = Box<dyn Fn(&FilePath, bool) + Send + Sync>;

/* 📖 # Why closures instead of a listener trait?

Callers typically only care about one of the two events, and usually want to
capture a bit of local state (a counter, a channel sender). Two optional boxed
closures cover that without forcing an impl block on every caller.

Both hooks run synchronously on the writing thread while the writer is
borrowed, so they must not write through the same writer.
*/

/// Optional callbacks around file open and close.
#[derive(Default)]
pub struct LifecycleHooks {
    on_open: Option<OnOpen>,
    on_close: Option<OnClose>,
}

impl LifecycleHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_open(
        mut self,
        hook: impl Fn(&FileHandle, bool) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.on_open = Some(Box::new(hook));
        self
    }

    pub fn on_close(mut self, hook: impl Fn(&FilePath, bool) + Send + Sync + 'static) -> Self {
        self.on_close = Some(Box::new(hook));
        self
    }

    /// Without an open hook every open is approved.
    pub(crate) fn approve_open(&self, handle: &FileHandle, is_new: bool) -> bool {
        self.on_open
            .as_ref()
            .is_none_or(|hook| hook(handle, is_new))
    }

    pub(crate) fn notify_close(&self, path: &FilePath, did_rotate: bool) {
        if let Some(hook) = &self.on_close {
            hook(path, did_rotate);
        }
    }
}

impl fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHooks")
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollfile_base::{MockPal, PalHandle};
    use std::sync::{Arc, Mutex};

    fn open_handle() -> FileHandle {
        let pal = PalHandle::new(MockPal::new());
        let (handle, _) = FileHandle::open(&pal, &FilePath::from("a.log")).unwrap();
        handle
    }

    #[test]
    fn test_missing_hooks_are_noops() {
        let hooks = LifecycleHooks::new();
        assert!(hooks.approve_open(&open_handle(), true));
        hooks.notify_close(&FilePath::from("a.log"), false);
    }

    #[test]
    fn test_hooks_receive_arguments() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let open_calls = Arc::clone(&calls);
        let close_calls = Arc::clone(&calls);
        let hooks = LifecycleHooks::new()
            .on_open(move |handle, is_new| {
                open_calls
                    .lock()
                    .unwrap()
                    .push(format!("open {} {}", handle.path(), is_new));
                false
            })
            .on_close(move |path, did_rotate| {
                close_calls
                    .lock()
                    .unwrap()
                    .push(format!("close {} {}", path, did_rotate));
            });

        assert!(!hooks.approve_open(&open_handle(), true));
        hooks.notify_close(&FilePath::from("a.log"), true);

        assert_eq!(*calls.lock().unwrap(), ["open a.log true", "close a.log true"]);
        assert_eq!(
            format!("{:?}", hooks),
            "LifecycleHooks { on_open: true, on_close: true }"
        );
    }
}
