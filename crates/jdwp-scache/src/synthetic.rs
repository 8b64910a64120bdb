/// Ids of commands issued by the cache itself carry this bit
pub const SYNTHETIC_ID_BIT: u32 = 0x8000_0000;

/// Hands out ids for synthetic commands.
///
/// Ids always have [SYNTHETIC_ID_BIT] set and wrap around within that half of the id space, so a
/// debugger counting up from zero never collides with them.
#[derive(Debug)]
pub struct SyntheticIds {
    next: u32,
}

impl SyntheticIds {
    pub fn new() -> Self {
        Self {
            next: SYNTHETIC_ID_BIT,
        }
    }

    /// The next id for which `in_use` is false
    pub fn next(&mut self, mut in_use: impl FnMut(u32) -> bool) -> u32 {
        loop {
            let id = self.next;
            self.next = id.wrapping_add(1) | SYNTHETIC_ID_BIT;
            if !in_use(id) {
                return id;
            }
        }
    }
}

impl Default for SyntheticIds {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `id` lies in the synthetic half of the id space
pub fn is_synthetic(id: u32) -> bool {
    id & SYNTHETIC_ID_BIT != 0
}
