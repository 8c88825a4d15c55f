/// A resident cache block. Its position in the owning set carries the
/// recency; the block itself only records identity and state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Block {
    pub tag: u64,
    pub valid: bool,
    pub dirty: bool,
}

impl Block {
    pub fn new(tag: u64, dirty: bool) -> Self {
        Block {
            tag,
            valid: true,
            dirty,
        }
    }
}
