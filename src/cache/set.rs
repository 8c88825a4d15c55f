use std::collections::HashMap;

use crate::cache::block::Block;
use crate::error::SetViolation;

#[derive(Clone, Debug)]
struct Node {
    block: Block,
    prev: Option<usize>,
    next: Option<usize>,
}

/// One associative set with strict LRU ordering.
///
/// Blocks live in an arena of slots and are chained from most recently used
/// (`head`) to least recently used (`tail`) by slot index. `slots` maps each
/// resident tag to its slot, so lookups are O(1) and promotion is a pure
/// relinking of indices. The arena grows on demand and freed slots are
/// recycled first, so it never holds more than `assoc` nodes.
#[derive(Clone, Debug)]
pub struct ReplacementSet {
    assoc: usize,
    nodes: Vec<Node>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    slots: HashMap<u64, usize>,
}

impl ReplacementSet {
    pub fn new(assoc: usize) -> Self {
        Self {
            assoc,
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            slots: HashMap::new(),
        }
    }

    pub fn associativity(&self) -> usize {
        self.assoc
    }

    /// Number of resident blocks.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() == self.assoc
    }

    /// Look up a resident block. Does not touch the recency order.
    pub fn find(&self, tag: u64) -> Option<&Block> {
        self.slots.get(&tag).map(|&slot| &self.nodes[slot].block)
    }

    /// The block that the next `evict_lru` would remove.
    pub fn lru(&self) -> Option<&Block> {
        self.tail.map(|slot| &self.nodes[slot].block)
    }

    /// Move a resident block to the most recently used position.
    pub fn promote(&mut self, tag: u64) -> Result<(), SetViolation> {
        let slot = self.slot_of(tag)?;
        if self.head != Some(slot) {
            self.unlink(slot);
            self.push_front(slot);
        }
        debug_assert!(self.is_consistent());
        Ok(())
    }

    /// Set the dirty bit of a resident block without changing its position.
    pub fn mark_dirty(&mut self, tag: u64) -> Result<(), SetViolation> {
        let slot = self.slot_of(tag)?;
        self.nodes[slot].block.dirty = true;
        Ok(())
    }

    /// Remove and return the least recently used block.
    pub fn evict_lru(&mut self) -> Result<Block, SetViolation> {
        let slot = self.tail.ok_or(SetViolation::Empty)?;
        Ok(self.detach(slot))
    }

    /// Remove a specific resident block, handing ownership to the caller.
    pub fn remove(&mut self, tag: u64) -> Result<Block, SetViolation> {
        let slot = self.slot_of(tag)?;
        Ok(self.detach(slot))
    }

    /// Insert a block as most recently used. The caller evicts first when the
    /// set is full, and promotes instead when the tag is already resident.
    pub fn insert(&mut self, block: Block) -> Result<(), SetViolation> {
        if self.slots.contains_key(&block.tag) {
            return Err(SetViolation::Duplicate { tag: block.tag });
        }
        if self.is_full() {
            return Err(SetViolation::Full {
                assoc: self.associativity(),
            });
        }

        let node = Node {
            block,
            prev: None,
            next: None,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };
        let previous = self.slots.insert(block.tag, slot);
        debug_assert!(previous.is_none());
        self.push_front(slot);
        debug_assert!(self.is_consistent());
        Ok(())
    }

    /// Resident blocks from most to least recently used.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            set: self,
            cursor: self.head,
        }
    }

    /// Walks the chain both ways and checks it against the tag map.
    pub fn is_consistent(&self) -> bool {
        let mut count = 0;
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            let node = &self.nodes[slot];
            if node.prev != prev || !node.block.valid {
                return false;
            }
            if self.slots.get(&node.block.tag) != Some(&slot) {
                return false;
            }
            count += 1;
            if count > self.associativity() {
                return false;
            }
            prev = Some(slot);
            cursor = node.next;
        }
        self.tail == prev && count == self.slots.len()
    }

    fn slot_of(&self, tag: u64) -> Result<usize, SetViolation> {
        self.slots
            .get(&tag)
            .copied()
            .ok_or(SetViolation::Absent { tag })
    }

    fn detach(&mut self, slot: usize) -> Block {
        self.unlink(slot);
        let block = self.nodes[slot].block;
        let removed = self.slots.remove(&block.tag);
        debug_assert_eq!(removed, Some(slot));
        self.free.push(slot);
        debug_assert!(self.is_consistent());
        block
    }

    fn unlink(&mut self, slot: usize) {
        let Node { prev, next, .. } = self.nodes[slot];
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
        self.nodes[slot].prev = None;
        self.nodes[slot].next = None;
    }

    fn push_front(&mut self, slot: usize) {
        self.nodes[slot].prev = None;
        self.nodes[slot].next = self.head;
        match self.head {
            Some(h) => self.nodes[h].prev = Some(slot),
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);
    }
}

/// MRU to LRU iterator over a `ReplacementSet`.
#[derive(Debug)]
pub struct Iter<'a> {
    set: &'a ReplacementSet,
    cursor: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Block;

    fn next(&mut self) -> Option<&'a Block> {
        let set: &'a ReplacementSet = self.set;
        let node = &set.nodes[self.cursor?];
        self.cursor = node.next;
        Some(&node.block)
    }
}
