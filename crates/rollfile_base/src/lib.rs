/* 📖 # Why have rollfile_base as a core library?
rollfile_base provides the foundational error handling, tracing setup and platform
abstractions (filesystem and clock) used by the rotation engine.
Keeping them apart from the engine lets the engine be tested entirely against
MockPal and MockClock.
*/

pub mod clock;
pub mod error;
pub mod pal;
pub mod tracing;

// Re-export commonly used types for convenience
pub use clock::{Clock, ClockHandle, MockClock, SystemClock};
pub use error::{ErrorKind, ResultExt, RollfileError, RollfileResult};
pub use pal::{AppendFile, FilePath, MockFailure, MockPal, Pal, PalHandle, ReadSeek, RealPal};
