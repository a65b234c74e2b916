//! Pipelined implementation

use crate::cpu::CPUPolicy;
use crate::cpu::CPUState;
use crate::cpu::NUM_REGS;
use crate::error::SimulatorError;
use crate::error::SimulatorResult;
use crate::loader::InstructionStore;
use crate::memory::DataMemory;
use crate::pipelined::hazard::FlagHazard;
use crate::pipelined::pipeline::Latch;
use crate::pipelined::pipeline::PipelineState;

pub mod hazard;
pub mod pipeline;
pub mod stages;

/// The APEX pipeline: architectural state, stage latches and hazard records
pub struct Pipeline {
    cpu: CPUState,
    store: InstructionStore,
    state: PipelineState,
    flag: FlagHazard,
    /// Ticks completed so far
    clock: u64,
}

impl Pipeline {
    pub fn new(store: InstructionStore, policy: CPUPolicy) -> SimulatorResult<Self> {
        let cpu = CPUState::make(policy)?;
        Ok(Self {
            cpu,
            store,
            state: PipelineState::default(),
            flag: FlagHazard::new(policy.branch_delay),
            clock: 0,
        })
    }

    /// Advances every stage by one tick.
    ///
    /// Stages run from Writeback back to Fetch so each consumes the latch its
    /// predecessor left on the previous tick.
    pub fn advance_cycle(&mut self) -> SimulatorResult<()> {
        let tick = self.clock;
        tracing::trace!(cycle = tick + 1, pc = self.cpu.pc, "new cycle");

        stages::write_back(&mut self.cpu, &self.state);
        stages::memory2(&mut self.cpu, &mut self.state)?;
        stages::memory1(&mut self.cpu, &mut self.flag, &mut self.state);
        stages::execute2(&mut self.cpu, &mut self.state)?;
        stages::execute1(&mut self.cpu, &mut self.flag, &mut self.state, tick);
        stages::instruction_decode(&mut self.cpu, &mut self.flag, &mut self.state, tick);
        stages::instruction_fetch(&mut self.cpu, &self.store, &mut self.state);

        self.clock += 1;
        self.cpu.update_cycle_count(1);
        Ok(())
    }

    /// Runs exactly `cycles` ticks
    pub fn run(&mut self, cycles: u64) -> SimulatorResult<()> {
        self.run_with(cycles, |_| {})
    }

    /// Runs up to `cycles` ticks, showing `observer` the pipeline as each
    /// tick begins. Stops early once drained if the policy asks for it.
    pub fn run_with<F>(&mut self, cycles: u64, mut observer: F) -> SimulatorResult<()>
    where
        F: FnMut(&PipelineSnapshot),
    {
        if cycles == 0 {
            return Err(SimulatorError::ConfigError(
                "cycle count must be positive".to_string(),
            ));
        }

        for _ in 0..cycles {
            if self.cpu.policy.drain && self.is_drained() {
                tracing::debug!(cycle = self.clock, "pipeline drained");
                break;
            }
            observer(&self.snapshot());
            self.advance_cycle()?;
        }
        Ok(())
    }

    /// Fetch has nothing left to issue and no instruction is in flight
    pub fn is_drained(&self) -> bool {
        let fetch_idle =
            self.state.fetch.busy || self.store.get(self.cpu.pc).is_none();
        fetch_idle && self.state.is_empty_past_fetch()
    }

    /// Read-only view of the pipeline as the next tick will see it
    pub fn snapshot(&self) -> PipelineSnapshot {
        let mut state = self.state;
        state.fetch = self.fetch_preview();
        PipelineSnapshot {
            cycle: self.clock + 1,
            pc: self.cpu.pc,
            state,
        }
    }

    /// The instruction Fetch samples on the next tick.
    /// Decode already holds a copy of the fetch latch, so the latch itself
    /// would show the previous fetch.
    fn fetch_preview(&self) -> Latch {
        let fetch = &self.state.fetch;
        if fetch.busy || fetch.stalled {
            return Latch { busy: fetch.busy, stalled: fetch.stalled, ..Latch::bubble() };
        }
        match self.store.get(self.cpu.pc) {
            Some(inst) => Latch::fetched(self.cpu.pc, inst),
            None => Latch::bubble(),
        }
    }

    /// Register values paired with their validity bits
    pub fn registers(&self) -> RegisterSnapshot {
        RegisterSnapshot {
            values: self.cpu.gpr.map(|r| r.read()),
            valid: self.cpu.scoreboard.validity(),
            zero_flag: self.cpu.zero_flag,
        }
    }

    pub fn memory(&self) -> &DataMemory {
        &self.cpu.memory
    }

    pub fn cpu(&self) -> &CPUState {
        &self.cpu
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn store(&self) -> &InstructionStore {
        &self.store
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }
}

/// Stage latches at the start of a tick.
/// The Fetch entry is the instruction Fetch is about to sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipelineSnapshot {
    /// 1-based cycle number about to execute
    pub cycle: u64,
    pub pc: u32,
    pub state: PipelineState,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegisterSnapshot {
    pub values: [i32; NUM_REGS],
    pub valid: [bool; NUM_REGS],
    pub zero_flag: bool,
}
