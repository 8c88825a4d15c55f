use serde::Serialize;

/// Counters owned by one cache level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LevelStats {
    pub reads: usize,
    pub read_misses: usize,
    pub writes: usize,
    pub write_misses: usize,
    pub write_backs: usize,
}

impl LevelStats {
    /// (read misses + write misses) / (reads + writes), 0 when idle.
    pub fn miss_rate(&self) -> f64 {
        let accesses = self.reads + self.writes;
        if accesses == 0 {
            return 0.0;
        }
        (self.read_misses + self.write_misses) as f64 / accesses as f64
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VictimStats {
    /// L1 read and write misses that looked in the buffer.
    pub probes: usize,
    /// Probes that found the block and swapped it back into L1.
    pub hits: usize,
    /// Blocks dropped from the buffer to make room.
    pub evictions: usize,
}

/// Snapshot of every level's counters at the end of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub l1: LevelStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub victim: Option<VictimStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l2: Option<LevelStats>,
}

impl Statistics {
    pub fn print_stats(&self) {
        println!("===== Measurements =====");
        println!("a. L1 reads:                   {}", self.l1.reads);
        println!("b. L1 read misses:             {}", self.l1.read_misses);
        println!("c. L1 writes:                  {}", self.l1.writes);
        println!("d. L1 write misses:            {}", self.l1.write_misses);
        println!("e. L1 miss rate:               {:.4}", self.l1.miss_rate());
        println!("f. L1 writebacks:              {}", self.l1.write_backs);
        if let Some(victim) = &self.victim {
            println!("g. VC probes:                  {}", victim.probes);
            println!("h. VC hits (swaps):            {}", victim.hits);
            println!("i. VC evictions:               {}", victim.evictions);
        }
        if let Some(l2) = &self.l2 {
            println!("j. L2 reads:                   {}", l2.reads);
            println!("k. L2 read misses:             {}", l2.read_misses);
            println!("l. L2 writes:                  {}", l2.writes);
            println!("m. L2 write misses:            {}", l2.write_misses);
            println!("n. L2 miss rate:               {:.4}", l2.miss_rate());
            println!("o. L2 writebacks:              {}", l2.write_backs);
        }
    }
}
