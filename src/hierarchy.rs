//! L1 -> victim buffer -> L2 controller.
//!
//! Each access is handled to completion before the next one:
//!
//! * **Read**: count an L1 read and look it up. On a miss, count the read miss
//!   and probe the victim buffer. A buffered block is swapped back into L1 and
//!   whatever L1 displaces takes its place in the buffer. Otherwise L2, if
//!   present, is probed and its own read/read-miss counters are updated. Reads
//!   never allocate, and nothing is fetched from memory.
//! * **Write**: count an L1 write and classify it with a lookup, counting the
//!   write miss. A miss first reclaims the block from the victim buffer if it is
//!   there; then L1 performs the write, allocating and evicting as needed.
//!
//! Every block L1 evicts moves into the victim buffer, so a block is resident
//! in at most one of the two.

use tracing::{debug, trace};

use crate::cache::{Cache, Eviction, VictimBuffer};
use crate::config::HierarchyConfig;
use crate::error::{ConfigError, Result, SetViolation};
use crate::statistics::Statistics;
use crate::trace::{Access, Op};

pub struct Hierarchy {
    l1: Cache,
    victim: Option<VictimBuffer>,
    l2: Option<Cache>,
}

impl Hierarchy {
    pub fn new(config: &HierarchyConfig) -> std::result::Result<Self, ConfigError> {
        let l1 = Cache::new(&config.l1)?;
        let victim = (config.victim_blocks > 0)
            .then(|| VictimBuffer::new(config.victim_blocks, config.l1.block_size));
        let l2 = config.l2.as_ref().map(Cache::new).transpose()?;
        Ok(Self { l1, victim, l2 })
    }

    pub fn l1(&self) -> &Cache {
        &self.l1
    }

    pub fn l2(&self) -> Option<&Cache> {
        self.l2.as_ref()
    }

    pub fn victim(&self) -> Option<&VictimBuffer> {
        self.victim.as_ref()
    }

    pub fn statistics(&self) -> Statistics {
        Statistics {
            l1: self.l1.stats,
            victim: self.victim.as_ref().map(|vc| vc.stats),
            l2: self.l2.as_ref().map(|l2| l2.stats),
        }
    }

    /// Process a single access.
    pub fn process(&mut self, access: Access) -> std::result::Result<(), SetViolation> {
        match access.op {
            Op::Read => self.read(access.address),
            Op::Write => self.write(access.address),
        }
    }

    /// Process a stream of accesses in order, stopping at the first error.
    /// Returns the number of accesses processed.
    pub fn run<I>(&mut self, accesses: I) -> Result<usize>
    where
        I: IntoIterator<Item = Result<Access>>,
    {
        let mut processed = 0;
        for access in accesses {
            self.process(access?)?;
            processed += 1;
        }
        debug!(processed, "trace exhausted");
        Ok(processed)
    }

    fn read(&mut self, address: u64) -> std::result::Result<(), SetViolation> {
        self.l1.stats.reads += 1;
        if self.l1.access(address)?.is_some() {
            trace!(address, "L1 read hit");
            return Ok(());
        }
        self.l1.stats.read_misses += 1;

        if self.swap_from_victim(address)? {
            return Ok(());
        }

        if let Some(l2) = self.l2.as_mut() {
            l2.stats.reads += 1;
            if l2.access(address)?.is_some() {
                trace!(address, "L2 read hit");
            } else {
                l2.stats.read_misses += 1;
                trace!(address, "L2 read miss");
            }
        }
        Ok(())
    }

    fn write(&mut self, address: u64) -> std::result::Result<(), SetViolation> {
        self.l1.stats.writes += 1;
        if self.l1.access(address)?.is_none() {
            self.l1.stats.write_misses += 1;
            trace!(address, "L1 write miss");
            if self.swap_from_victim(address)? {
                trace!(address, "write reclaimed block from victim buffer");
            }
        }

        if let Some(eviction) = self.l1.write(address)? {
            self.retire(eviction)?;
        }
        Ok(())
    }

    /// Move the block holding `address` from the victim buffer into L1.
    /// Returns whether the buffer had it.
    fn swap_from_victim(&mut self, address: u64) -> std::result::Result<bool, SetViolation> {
        let Some(victim) = self.victim.as_mut() else {
            return Ok(false);
        };
        victim.stats.probes += 1;
        let Some(block) = victim.take(address)? else {
            return Ok(false);
        };
        victim.stats.hits += 1;
        debug!(address, "victim buffer hit, swapping into L1");

        if let Some(eviction) = self.l1.install(address, block.dirty)? {
            self.retire(eviction)?;
        }
        Ok(true)
    }

    /// Hand a block evicted from L1 to the victim buffer, if there is one.
    fn retire(&mut self, eviction: Eviction) -> std::result::Result<(), SetViolation> {
        if let Some(victim) = self.victim.as_mut() {
            let _ = victim.accept(eviction.block_number)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hierarchy(victim_blocks: usize, l2_size: usize) -> Hierarchy {
        let config =
            HierarchyConfig::from_dimensions(1024, 1, 32, victim_blocks, l2_size, 2).unwrap();
        Hierarchy::new(&config).unwrap()
    }

    fn run(h: &mut Hierarchy, accesses: &[Access]) {
        for &access in accesses {
            h.process(access).unwrap();
        }
    }

    #[test]
    fn test_optional_levels_absent() {
        let h = hierarchy(0, 0);
        assert!(h.victim().is_none());
        assert!(h.l2().is_none());
        let stats = h.statistics();
        assert!(stats.victim.is_none());
        assert!(stats.l2.is_none());
    }

    #[test]
    fn test_write_then_read_hits() {
        let mut h = hierarchy(0, 0);
        run(&mut h, &[Access::write(0x100), Access::read(0x104)]);
        let l1 = h.statistics().l1;
        assert_eq!(l1.writes, 1);
        assert_eq!(l1.write_misses, 1);
        assert_eq!(l1.reads, 1);
        assert_eq!(l1.read_misses, 0);
    }

    #[test]
    fn test_read_miss_goes_to_l2_without_victim_buffer() {
        let mut h = hierarchy(0, 8192);
        run(&mut h, &[Access::read(0x0), Access::read(0x0)]);
        let stats = h.statistics();
        assert_eq!(stats.l1.read_misses, 2);
        let l2 = stats.l2.unwrap();
        assert_eq!(l2.reads, 2);
        assert_eq!(l2.read_misses, 2);
    }

    #[test]
    fn test_victim_hit_skips_l2() {
        let mut h = hierarchy(1, 8192);
        // 0x0 and 0x400 conflict in the direct-mapped L1
        run(
            &mut h,
            &[Access::write(0x0), Access::write(0x400), Access::read(0x0)],
        );
        let stats = h.statistics();
        assert_eq!(stats.l1.read_misses, 1);
        assert_eq!(stats.victim.unwrap().hits, 1);
        assert_eq!(stats.l2.unwrap().reads, 0);

        // swapped: 0x0 back in L1, 0x400 in the buffer
        assert!(h.victim().unwrap().find(0x400).is_some());
        assert!(h.victim().unwrap().find(0x0).is_none());
        h.process(Access::read(0x0)).unwrap();
        assert_eq!(h.statistics().l1.read_misses, 1);
    }

    #[test]
    fn test_write_misses_probe_victim_buffer() {
        let mut h = hierarchy(1, 0);
        run(&mut h, &[Access::write(0x0), Access::write(0x0), Access::read(0x20)]);
        let victim = h.statistics().victim.unwrap();
        // one write miss and one read miss; the write hit never looks
        assert_eq!(victim.probes, 2);
        assert_eq!(victim.hits, 0);
    }

    #[test]
    fn test_huge_victim_buffer_builds_without_reserving() {
        let config = HierarchyConfig::from_dimensions(1024, 1, 32, usize::MAX / 4, 0, 0).unwrap();
        let mut h = Hierarchy::new(&config).unwrap();
        assert_eq!(h.victim().unwrap().num_blocks, usize::MAX / 4);
        run(&mut h, &[Access::write(0x0), Access::write(0x400), Access::read(0x0)]);
        assert_eq!(h.statistics().victim.unwrap().hits, 1);
    }

    #[test]
    fn test_write_miss_reclaims_from_victim_buffer() {
        let mut h = hierarchy(2, 0);
        run(
            &mut h,
            &[Access::write(0x0), Access::write(0x400), Access::write(0x0)],
        );
        let stats = h.statistics();
        assert_eq!(stats.l1.write_misses, 3);
        assert_eq!(stats.victim.unwrap().hits, 1);
        // 0x0 evicted dirty, then 0x400 evicted dirty by the swap
        assert_eq!(stats.l1.write_backs, 2);
        let vc = h.victim().unwrap();
        assert_eq!(vc.len(), 1);
        assert!(vc.find(0x400).is_some());
    }
}
