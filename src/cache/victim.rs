use tracing::trace;

use crate::cache::block::Block;
use crate::cache::set::ReplacementSet;
use crate::error::SetViolation;
use crate::statistics::VictimStats;

/// Small fully-associative buffer holding blocks recently evicted from L1.
///
/// It is a single `ReplacementSet` keyed by block number (`address /
/// block_size`), which is the tag of a one-set cache with the same block size.
pub struct VictimBuffer {
    pub num_blocks: usize,
    pub block_size: usize,
    pub stats: VictimStats,
    set: ReplacementSet,
}

impl VictimBuffer {
    pub fn new(num_blocks: usize, block_size: usize) -> Self {
        Self {
            num_blocks,
            block_size,
            stats: VictimStats::default(),
            set: ReplacementSet::new(num_blocks),
        }
    }

    pub fn block_number(&self, address: u64) -> u64 {
        address / self.block_size as u64
    }

    pub fn find(&self, address: u64) -> Option<&Block> {
        self.set.find(self.block_number(address))
    }

    /// Remove the block holding `address`, if buffered.
    pub fn take(&mut self, address: u64) -> Result<Option<Block>, SetViolation> {
        let block_number = self.block_number(address);
        if self.set.find(block_number).is_none() {
            return Ok(None);
        }
        self.set.remove(block_number).map(Some)
    }

    /// Buffer a block evicted from L1 as most recently used, dropping the
    /// buffer's own LRU entry when full. The block arrives clean: its
    /// write-back was accounted when L1 evicted it.
    pub fn accept(&mut self, block_number: u64) -> Result<Option<Block>, SetViolation> {
        let dropped = if self.set.is_full() {
            let dropped = self.set.evict_lru()?;
            self.stats.evictions += 1;
            trace!(block = dropped.tag, "victim buffer dropped block");
            Some(dropped)
        } else {
            None
        };
        self.set.insert(Block::new(block_number, false))?;
        Ok(dropped)
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Print buffered block numbers, most recently used first.
    pub fn print_contents(&self) {
        println!("{} of {} blocks in use", self.len(), self.num_blocks);
        print!("set     0:");
        for block in self.set.iter() {
            print!("  {:>6x}", block.tag);
        }
        println!();
    }
}
