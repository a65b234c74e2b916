//! Hazard bookkeeping shared by the stages.
//!
//! The scoreboard answers "may Decode read this register yet?", the flag
//! record answers "may Decode let a BZ through yet?". Both are written by
//! Execute1 and cleared once the writer commits or is flushed, so Decode
//! never has to look at a neighbouring latch.

use crate::cpu::NUM_REGS;

/// Count of announced-but-uncommitted writers per register.
/// A register is valid exactly when its count is zero.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scoreboard {
    pending: [u8; NUM_REGS],
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// An in-flight instruction will write `reg`
    pub fn reserve(&mut self, reg: u8) {
        self.pending[reg as usize] += 1;
    }

    /// The writer of `reg` committed or was squashed
    pub fn release(&mut self, reg: u8) {
        let slot = &mut self.pending[reg as usize];
        *slot = slot.saturating_sub(1);
    }

    pub fn is_valid(&self, reg: u8) -> bool {
        self.pending[reg as usize] == 0
    }

    /// Validity bit of every register, in index order
    pub fn validity(&self) -> [bool; NUM_REGS] {
        self.pending.map(|count| count == 0)
    }
}

/// Tracks the youngest in-flight flag producer (ADD/SUB/MUL).
///
/// BZ reads the zero flag in Execute2 and has no other way to know the flag
/// is current, so Decode holds it for `delay` ticks counted from the tick the
/// producer entered Execute1. With the default of 5 that is the tick the
/// producer commits in Writeback.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlagHazard {
    producer_since: Option<u64>,
    delay: u64,
}

impl FlagHazard {
    pub fn new(delay: u64) -> Self {
        Self { producer_since: None, delay }
    }

    /// A flag producer entered Execute1 at `tick`
    pub fn record_producer(&mut self, tick: u64) {
        self.producer_since = Some(tick);
    }

    /// Whether a BZ sitting in Decode at `tick` must keep waiting
    pub fn blocks_branch(&mut self, tick: u64) -> bool {
        match self.producer_since {
            Some(since) if tick + 1 < since + self.delay => true,
            Some(_) => {
                self.producer_since = None;
                false
            }
            None => false,
        }
    }

    /// The recorded producer was squashed
    pub fn cancel(&mut self) {
        self.producer_since = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_all_valid() {
        let sb = Scoreboard::new();
        assert!(sb.validity().iter().all(|v| *v));
    }

    #[test]
    fn reserve_and_release() {
        let mut sb = Scoreboard::new();
        sb.reserve(5);
        assert!(!sb.is_valid(5));
        assert!(sb.is_valid(6));
        sb.release(5);
        assert!(sb.is_valid(5));
    }

    #[test]
    fn two_writers_keep_register_invalid() {
        let mut sb = Scoreboard::new();
        sb.reserve(3);
        sb.reserve(3);
        // Older writer commits; the younger one is still in flight
        sb.release(3);
        assert!(!sb.is_valid(3));
        sb.release(3);
        assert!(sb.is_valid(3));
    }

    #[test]
    fn release_never_underflows() {
        let mut sb = Scoreboard::new();
        sb.release(0);
        assert!(sb.is_valid(0));
        sb.reserve(0);
        assert!(!sb.is_valid(0));
    }

    #[test]
    fn branch_waits_until_producer_commits() {
        let mut flag = FlagHazard::new(5);
        flag.record_producer(10);
        for tick in 10..14 {
            assert!(flag.blocks_branch(tick), "tick {tick}");
        }
        assert!(!flag.blocks_branch(14));
        // Released once; the record is gone
        assert_eq!(flag, FlagHazard::new(5));
    }

    #[test]
    fn branch_without_producer_passes() {
        let mut flag = FlagHazard::new(5);
        assert!(!flag.blocks_branch(0));
    }

    #[test]
    fn cancelled_producer_releases_branch() {
        let mut flag = FlagHazard::new(5);
        flag.record_producer(3);
        flag.cancel();
        assert!(!flag.blocks_branch(4));
    }

    #[test]
    fn younger_producer_restarts_window() {
        let mut flag = FlagHazard::new(5);
        flag.record_producer(1);
        flag.record_producer(3);
        assert!(flag.blocks_branch(5));
        assert!(!flag.blocks_branch(7));
    }
}
