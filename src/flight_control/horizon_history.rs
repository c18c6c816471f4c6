use bitvec::{bitbox, boxed::BitBox, order::Lsb0};

/// Ring buffer of the most recent horizon quality flags.
///
/// Starts out with every slot marked as "no horizon", so a freshly started controller
/// is in the fail-safe state until the first good horizon arrives.
#[derive(Debug, Clone)]
pub struct HorizonHistory {
    flags: BitBox<usize, Lsb0>,
    next: usize,
}

impl HorizonHistory {
    /// Creates a history remembering `len` cycles, at least one.
    pub fn new(len: usize) -> Self { Self { flags: bitbox![usize, Lsb0; 0; len.max(1)], next: 0 } }

    /// Overwrites the oldest entry.
    pub fn push(&mut self, is_good: bool) {
        self.flags.set(self.next, is_good);
        self.next = (self.next + 1) % self.flags.len();
    }

    /// `true` if any remembered cycle saw a good horizon.
    pub fn any_good(&self) -> bool { self.flags.any() }

    pub fn len(&self) -> usize { self.flags.len() }
}
