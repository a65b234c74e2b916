//! Pipeline state
use std::fmt;

use crate::instruction::Instruction;

/// Pipeline state = 7 stage latches
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PipelineState {
    pub fetch: Latch,
    pub decode: Latch,
    pub ex1: Latch,
    pub ex2: Latch,
    pub mem1: Latch,
    pub mem2: Latch,
    pub wb: Latch,
}

impl PipelineState {
    pub fn latch(&self, stage: Stage) -> &Latch {
        match stage {
            Stage::Fetch => &self.fetch,
            Stage::Decode => &self.decode,
            Stage::Execute1 => &self.ex1,
            Stage::Execute2 => &self.ex2,
            Stage::Memory1 => &self.mem1,
            Stage::Memory2 => &self.mem2,
            Stage::Writeback => &self.wb,
        }
    }

    /// No instruction is left anywhere past Fetch
    pub fn is_empty_past_fetch(&self) -> bool {
        Stage::ALL[1..].iter().all(|stage| !self.latch(*stage).occupied)
    }
}

/// One stage latch.
/// `Latch::default()` is the bubble every stage forwards when idle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Latch {
    /// Program counter the instruction was fetched from
    pub pc: u32,

    /// Wrapped instruction
    pub inst: Instruction,

    /// Operand 1
    pub op1: i32,
    /// Operand 2
    pub op2: i32,

    /// Execution or load result
    pub result: i32,
    /// Effective word address of LOAD/STORE
    pub mem_address: i32,
    /// PC if branch is taken
    pub taken_pc: Option<u32>,

    /// A real instruction sits in this latch
    pub occupied: bool,
    /// Stage refuses new work (Fetch after HALT)
    pub busy: bool,
    pub stalled: bool,
    /// Execute1 announced this instruction's destination on the scoreboard
    pub dest_pending: bool,
}

impl Latch {
    pub fn bubble() -> Self {
        Self::default()
    }

    pub fn fetched(pc: u32, inst: Instruction) -> Self {
        Self { pc, inst, occupied: true, ..Self::default() }
    }

    /// Holds an instruction the stage may work on this tick
    pub fn is_active(&self) -> bool {
        self.occupied && !self.busy && !self.stalled
    }
}

/// Renders `pc(4004) ADD,R3,R1,R2`, or `EMPTY` for a bubble
impl fmt::Display for Latch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.occupied {
            write!(f, "pc({}) {}", self.pc, self.inst)
        } else {
            f.write_str("EMPTY")
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Decode,
    Execute1,
    Execute2,
    Memory1,
    Memory2,
    Writeback,
}

impl Stage {
    /// Pipeline order, upstream first
    pub const ALL: [Stage; 7] = [
        Stage::Fetch,
        Stage::Decode,
        Stage::Execute1,
        Stage::Execute2,
        Stage::Memory1,
        Stage::Memory2,
        Stage::Writeback,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Fetch => "Fetch",
            Stage::Decode => "Decode/RF",
            Stage::Execute1 => "Execute1",
            Stage::Execute2 => "Execute2",
            Stage::Memory1 => "Memory1",
            Stage::Memory2 => "Memory2",
            Stage::Writeback => "Writeback",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Opcode;

    #[test]
    fn default_state_is_all_bubbles() {
        let state = PipelineState::default();
        assert!(state.is_empty_past_fetch());
        assert!(Stage::ALL.iter().all(|s| !state.latch(*s).is_active()));
    }

    #[test]
    fn stalled_latch_is_inactive() {
        let inst = Instruction::new(Opcode::Movc, 1, 0, 0, 5).unwrap();
        let mut latch = Latch::fetched(4000, inst);
        assert!(latch.is_active());
        latch.stalled = true;
        assert!(!latch.is_active());
        assert_eq!(latch.to_string(), "pc(4000) MOVC,R1,#5");
        assert_eq!(Latch::bubble().to_string(), "EMPTY");
    }
}
