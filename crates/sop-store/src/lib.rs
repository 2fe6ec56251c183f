//! State repository for State of Play.
//!
//! A repository stores one [`GameRecord`] per game: the state snapshot, the
//! per-type entity collections, the global flags, and the event log. Writes
//! are atomic per record. Implementations are provided for memory, a
//! directory of JSON files, and a wrapper that bounds every call in time.

mod bounded;
mod error;
mod file;
mod memory;
mod record;
mod traits;

pub use bounded::BoundedRepository;
pub use error::{StoreError, StoreResult};
pub use file::FileRepository;
pub use memory::InMemoryRepository;
pub use record::{EntityCollections, GameRecord};
pub use traits::{GameLock, StateRepository};
