pub mod block;
#[allow(clippy::module_inception)]
pub mod cache;
pub mod set;
pub mod victim;

pub use block::Block;
pub use cache::{Cache, Eviction, Location};
pub use set::ReplacementSet;
pub use victim::VictimBuffer;
