/* 📖 # What does rollfile_engine do?

It appends to a file whose path is derived from the current time, for example
one file per day from the template `logs/2006-01-02.txt`. When the derived path
changes the writer closes the old file, opens the new one and carries on,
reporting the path and offset of every write and calling optional hooks around
each open and close.

Filesystem and clock access go through the PAL and clock abstractions from
rollfile_base, so the rotation logic can be exercised without real files or
real time.
*/

pub mod config;
pub mod file_handle;
pub mod hooks;
pub mod layout;
pub mod location;
pub mod resolver;
pub mod shared;
pub mod writer;

pub use config::{WriterConfig, load_config, parse_config};
pub use file_handle::FileHandle;
pub use hooks::{LifecycleHooks, OnClose, OnOpen};
pub use layout::PathLayout;
pub use location::Location;
pub use resolver::{PathGenerator, PathResolver};
pub use shared::SharedWriter;
pub use writer::{RotatingWriter, WriteReport};
