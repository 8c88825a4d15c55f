use fast_math::log2;
use tracing::{debug, info};

use crate::cache::block::Block;
use crate::cache::set::ReplacementSet;
use crate::config::CacheConfig;
use crate::error::{ConfigError, SetViolation};
use crate::statistics::LevelStats;

pub struct Cache {
    pub name: &'static str,
    pub cache_size: usize,
    pub assoc: usize,
    pub block_size: usize,
    pub sets: usize,
    pub index_bits: usize,
    pub block_offset_bits: usize,
    pub tag_bits: usize,
    pub stats: LevelStats,
    cache: Vec<ReplacementSet>,
}

/// Where an address lives in a cache: its set and its tag within that set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Location {
    pub index: usize,
    pub tag: u64,
}

/// A block pushed out of a set to make room.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Eviction {
    /// `address / block_size` of the evicted block.
    pub block_number: u64,
    pub dirty: bool,
}

impl Cache {
    /// Creates a new cache with the given geometry.
    ///
    /// ## Arguments
    /// * `config` - Size, associativity and block size of the cache.
    ///
    /// ## Example
    /// ```rust
    /// use cache_hierarchy_sim::cache::Cache;
    /// use cache_hierarchy_sim::config::CacheConfig;
    ///
    /// let l1 = Cache::new(&CacheConfig::new("L1", 1024, 2, 32)).unwrap();
    /// assert_eq!(l1.sets, 16);
    /// ```
    pub fn new(config: &CacheConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let sets = config.num_sets();
        // Informational only: a set count that is not a power of two still
        // decomposes correctly by division.
        let index_bits = log2(sets as f32).round() as usize;
        let block_offset_bits = log2(config.block_size as f32).round() as usize;
        let tag_bits = 64usize.saturating_sub(index_bits + block_offset_bits);

        info!(
            cache = config.name,
            size = config.size,
            assoc = config.assoc,
            block_size = config.block_size,
            sets,
            index_bits,
            block_offset_bits,
            tag_bits,
            "cache geometry"
        );

        Ok(Self {
            name: config.name,
            cache_size: config.size,
            assoc: config.assoc,
            block_size: config.block_size,
            sets,
            index_bits,
            block_offset_bits,
            tag_bits,
            stats: LevelStats::default(),
            cache: (0..sets).map(|_| ReplacementSet::new(config.assoc)).collect(),
        })
    }

    /// Split a byte address into set index and tag.
    pub fn locate(&self, address: u64) -> Location {
        let block_number = address / self.block_size as u64;
        Location {
            index: (block_number % self.sets as u64) as usize,
            tag: block_number / self.sets as u64,
        }
    }

    /// Inverse of `locate`, at block granularity.
    pub fn block_number(&self, location: Location) -> u64 {
        location.tag * self.sets as u64 + location.index as u64
    }

    /// Read-only view of one set.
    pub fn set(&self, index: usize) -> &ReplacementSet {
        &self.cache[index]
    }

    /// Look the address up, promoting the block on a hit.
    ///
    /// A miss changes nothing: blocks are only allocated by `write` and
    /// `install`. Counters are left to the caller.
    pub fn access(&mut self, address: u64) -> Result<Option<&Block>, SetViolation> {
        let Location { index, tag } = self.locate(address);
        let set = &mut self.cache[index];
        if set.find(tag).is_none() {
            return Ok(None);
        }
        set.promote(tag)?;
        Ok(set.find(tag))
    }

    /// Write to the address.
    ///
    /// On a hit the block is promoted and marked dirty. On a miss a dirty block
    /// is allocated, evicting the LRU block of the set first if it is full.
    ///
    /// Returns the evicted block, if any, so the caller can pass it on.
    pub fn write(&mut self, address: u64) -> Result<Option<Eviction>, SetViolation> {
        let location = self.locate(address);
        let set = &mut self.cache[location.index];
        if set.find(location.tag).is_some() {
            set.promote(location.tag)?;
            set.mark_dirty(location.tag)?;
            return Ok(None);
        }
        self.allocate(location, Block::new(location.tag, true))
    }

    /// Place a block for `address` that arrives from elsewhere in the
    /// hierarchy. The block must not already be resident.
    pub fn install(&mut self, address: u64, dirty: bool) -> Result<Option<Eviction>, SetViolation> {
        let location = self.locate(address);
        self.allocate(location, Block::new(location.tag, dirty))
    }

    fn allocate(
        &mut self,
        location: Location,
        block: Block,
    ) -> Result<Option<Eviction>, SetViolation> {
        let set = &mut self.cache[location.index];
        let evicted = if set.is_full() {
            Some(set.evict_lru()?)
        } else {
            None
        };
        set.insert(block)?;

        let eviction = evicted.map(|victim| Eviction {
            block_number: self.block_number(Location {
                index: location.index,
                tag: victim.tag,
            }),
            dirty: victim.dirty,
        });
        if let Some(eviction) = eviction.filter(|e| e.dirty) {
            self.stats.write_backs += 1;
            debug!(
                cache = self.name,
                block = eviction.block_number,
                "writing back dirty block to next level"
            );
        }
        Ok(eviction)
    }

    /// Print out the contents of every set, most recently used first.
    ///
    /// ## Example
    /// ```text
    /// set     0:     1c D      2a
    /// set     1:      3
    /// ```
    pub fn print_contents(&self) {
        for (i, set) in self.cache.iter().enumerate() {
            print!("set {:>5}:", i);
            for block in set.iter() {
                print!("  {:>6x}", block.tag);
                print!("{}", if block.dirty { " D" } else { "  " });
            }
            println!();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(size: usize, assoc: usize, block_size: usize) -> Cache {
        Cache::new(&CacheConfig::new("L1", size, assoc, block_size)).unwrap()
    }

    #[test]
    fn test_geometry() {
        let l1 = cache(1024, 2, 32);
        assert_eq!(l1.sets, 16);
        assert_eq!(l1.index_bits, 4);
        assert_eq!(l1.block_offset_bits, 5);
        assert_eq!(l1.tag_bits, 55);
    }

    #[test]
    fn test_rejects_bad_geometry() {
        assert!(Cache::new(&CacheConfig::new("L1", 1000, 2, 32)).is_err());
    }

    #[test]
    fn test_locate() {
        let l1 = cache(1024, 1, 32);
        assert_eq!(l1.locate(0x0), Location { index: 0, tag: 0 });
        assert_eq!(l1.locate(0x1f), Location { index: 0, tag: 0 });
        assert_eq!(l1.locate(0x20), Location { index: 1, tag: 0 });
        assert_eq!(l1.locate(0x420), Location { index: 1, tag: 1 });
        assert_eq!(l1.block_number(l1.locate(0x420)), 0x420 / 32);
    }

    #[test]
    fn test_read_miss_does_not_allocate() {
        let mut l1 = cache(1024, 1, 32);
        assert!(l1.access(0x40).unwrap().is_none());
        assert!(l1.access(0x40).unwrap().is_none());
        assert!(l1.set(2).is_empty());
    }

    #[test]
    fn test_write_allocates_dirty_block() {
        let mut l1 = cache(1024, 1, 32);
        assert_eq!(l1.write(0x40).unwrap(), None);
        let block = *l1.access(0x44).unwrap().unwrap();
        assert_eq!(block, Block::new(0, true));
    }

    #[test]
    fn test_write_hit_promotes() {
        let mut l1 = cache(128, 2, 32);
        // two sets; 0x0 and 0x40 share set 0
        l1.write(0x0).unwrap();
        l1.write(0x40).unwrap();
        l1.write(0x0).unwrap();
        let order: Vec<u64> = l1.set(0).iter().map(|b| b.tag).collect();
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn test_dirty_eviction_counts_one_write_back() {
        let mut l1 = cache(1024, 1, 32);
        l1.write(0x0).unwrap();
        let eviction = l1.write(0x400).unwrap();
        assert_eq!(
            eviction,
            Some(Eviction {
                block_number: 0,
                dirty: true
            })
        );
        assert_eq!(l1.stats.write_backs, 1);
    }

    #[test]
    fn test_clean_eviction_counts_no_write_back() {
        let mut l1 = cache(1024, 1, 32);
        l1.install(0x0, false).unwrap();
        let eviction = l1.write(0x400).unwrap().unwrap();
        assert!(!eviction.dirty);
        assert_eq!(l1.stats.write_backs, 0);
    }

    #[test]
    fn test_install_duplicate_is_a_violation() {
        let mut l1 = cache(1024, 2, 32);
        l1.install(0x0, false).unwrap();
        assert_eq!(
            l1.install(0x0, false),
            Err(SetViolation::Duplicate { tag: 0 })
        );
    }
}
