//! The synchronization engine behind a chorus room.
//!
//! Everything here is plain, synchronous state. Callers are expected to apply one event
//! at a time per room, see `chorus-collab` for how that is enforced.

mod clock;
mod config;
mod playback;
mod queue;
mod ranking;
mod song;
mod transition;
mod util;
mod votes;

pub use clock::*;
pub use config::*;
pub use playback::*;
pub use queue::*;
pub use ranking::*;
pub use song::*;
pub use transition::*;
pub use util::*;
pub use votes::*;
