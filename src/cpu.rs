//! APEX architectural state

use crate::error::SimulatorError;
use crate::error::SimulatorResult;
use crate::memory::DataMemory;
use crate::pipelined::hazard::Scoreboard;

/// Number of architectural registers
pub const NUM_REGS: usize = 32;
/// Address of the first instruction
pub const CODE_BASE: u32 = 4000;
/// Bytes per instruction
pub const PC_STRIDE: u32 = 4;
/// Default data memory size in words
pub const DATA_MEMORY_WORDS: usize = 4000;
/// Ticks a BZ waits behind a flag-producing instruction
pub const BRANCH_DELAY: u64 = 5;

/// CPU state
#[derive(Clone)]
pub struct CPUState {
    /// Program counter
    pub pc: u32,
    /// General purpose registers
    pub gpr: [Register; NUM_REGS],
    /// Outstanding writes per register
    pub scoreboard: Scoreboard,
    /// Zero flag, set by committing ADD/SUB/MUL
    pub zero_flag: bool,
    /// Flat word-addressed data memory
    pub memory: DataMemory,

    /// CPU policy
    pub policy: CPUPolicy,

    /// History of execution
    pub history: CPUHistory,
}

impl CPUState {
    pub fn make(policy: CPUPolicy) -> SimulatorResult<Self> {
        if policy.memory_words == 0 {
            return Err(SimulatorError::ConfigError(
                "data memory must hold at least one word".to_string(),
            ));
        }
        if policy.branch_delay == 0 {
            return Err(SimulatorError::ConfigError(
                "branch delay must be at least one tick".to_string(),
            ));
        }

        Ok(Self {
            pc: CODE_BASE,
            gpr: [Register::new(0); NUM_REGS],
            scoreboard: Scoreboard::new(),
            // The flag reads as set until the first arithmetic commit
            zero_flag: true,
            memory: DataMemory::new(policy.memory_words),
            policy,
            history: CPUHistory::default(),
        })
    }

    /// Reads a register value
    pub fn read_reg(&self, index: u8) -> i32 {
        self.gpr[index as usize].read()
    }

    /// Whether no in-flight instruction still owes this register a value
    pub fn reg_valid(&self, index: u8) -> bool {
        self.scoreboard.is_valid(index)
    }

    /// Increments history cycle count
    pub fn update_cycle_count(&mut self, value: u64) {
        self.history.cycle_count += value;
    }

    /// Increments history instruction count
    pub fn update_inst_count(&mut self, value: u64) {
        self.history.inst_count += value;
    }
}

/// Register file simulation
#[derive(Clone, Copy, Debug)]
pub struct Register {
    /// Current data in the register
    data: i32,
}

impl Register {
    pub fn new(data: i32) -> Self {
        Self { data }
    }

    /// Reads the register
    pub fn read(&self) -> i32 {
        self.data
    }

    /// Writes to register
    pub fn write(&mut self, value: i32) {
        self.data = value;
    }
}

/// CPU policy
#[derive(Clone, Copy, Debug)]
pub struct CPUPolicy {
    /// Print every stage latch each cycle
    pub trace: bool,
    /// Print cycle and instruction counts after simulation
    pub history: bool,
    /// Stop before the cycle budget once the pipeline has drained
    pub drain: bool,
    pub memory_words: usize,
    pub branch_delay: u64,
    /// Registers shown by the final register dump
    pub dump_registers: usize,
    /// Memory words shown by the final memory dump
    pub dump_memory: usize,
}

impl Default for CPUPolicy {
    fn default() -> Self {
        Self {
            trace: false,
            history: false,
            drain: false,
            memory_words: DATA_MEMORY_WORDS,
            branch_delay: BRANCH_DELAY,
            dump_registers: 16,
            dump_memory: 100,
        }
    }
}

/// History module
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CPUHistory {
    pub cycle_count: u64,
    pub inst_count: u64,
    /// Ticks Decode spent holding a stalled instruction
    pub stall_count: u64,
    pub branches_taken: u64,
    /// Instructions squashed by taken branches
    pub flushed_count: u64,
}

impl CPUHistory {
    pub fn cpi(&self) -> f64 {
        if self.inst_count == 0 {
            return 0.0;
        }
        self.cycle_count as f64 / self.inst_count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_state() {
        let cpu = CPUState::make(CPUPolicy::default()).unwrap();
        assert_eq!(cpu.pc, CODE_BASE);
        assert!(cpu.zero_flag);
        assert!((0..NUM_REGS as u8).all(|r| cpu.reg_valid(r) && cpu.read_reg(r) == 0));
        assert_eq!(cpu.memory.len(), DATA_MEMORY_WORDS);
    }

    #[test]
    fn rejects_empty_memory() {
        let policy = CPUPolicy { memory_words: 0, ..CPUPolicy::default() };
        assert!(matches!(
            CPUState::make(policy),
            Err(SimulatorError::ConfigError(_))
        ));
    }

    #[test]
    fn cpi_of_empty_history_is_zero() {
        assert_eq!(CPUHistory::default().cpi(), 0.0);
        let history = CPUHistory { cycle_count: 12, inst_count: 4, ..Default::default() };
        assert_eq!(history.cpi(), 3.0);
    }
}
