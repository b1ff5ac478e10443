//! Path-keyed in-memory filesystem for archterm.
//!
//! The tree is a flat, insertion-ordered table from canonical absolute path
//! to [`Node`]. Sessions each own a deep clone of a parsed template.

pub mod clock;
pub mod memory;
pub mod node;
pub mod path;
pub mod template;

pub use clock::{Clock, FixedClock, SystemClock};
pub use memory::{EPOCH_LABEL, MemoryVfs};
pub use node::{DIR_SIZE, Node, NodeKind};
