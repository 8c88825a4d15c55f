//! Trace-driven model of an L1 / victim buffer / L2 cache hierarchy.
//!
//! Replays `r`/`w` memory accesses against set-associative LRU caches and
//! reports per-level reads, misses and write-backs. Only structural hit/miss
//! accounting is modelled: no timing, prefetching or coherence.
//!
//! ```rust
//! use cache_hierarchy_sim::config::HierarchyConfig;
//! use cache_hierarchy_sim::hierarchy::Hierarchy;
//! use cache_hierarchy_sim::trace::Access;
//!
//! let config = HierarchyConfig::from_dimensions(1024, 2, 32, 0, 0, 0).unwrap();
//! let mut hierarchy = Hierarchy::new(&config).unwrap();
//! hierarchy.process(Access::write(0x40)).unwrap();
//! hierarchy.process(Access::read(0x40)).unwrap();
//! assert_eq!(hierarchy.statistics().l1.read_misses, 0);
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod statistics;
pub mod trace;
