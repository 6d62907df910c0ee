/* 📖 # What is the Platform Abstraction Layer?

The PAL provides a trait-based abstraction over the filesystem operations a
rotating writer needs: existence checks, recursive directory creation, append-mode
opening, and reading back. Key benefits:
- Testability: MockPal allows deterministic unit tests without filesystem access,
  including injected failures for every operation
- Consistency: All filesystem operations use the same error handling

Code depends on the abstraction (Pal trait), not on RealPal or MockPal.
*/

mod file_path;
pub mod mock;
pub mod real_pal;
mod traits;

pub use file_path::FilePath;
pub use mock::{MockFailure, MockPal};
pub use real_pal::RealPal;
pub use traits::{AppendFile, Pal, PalHandle, ReadSeek};
