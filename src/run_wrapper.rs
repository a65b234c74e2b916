//! A simulator wrapper

use std::path::Path;

use crate::cpu::CPUPolicy;
use crate::error::SimulatorResult;
use crate::loader;
use crate::pipelined::Pipeline;
use crate::report::CycleTrace;
use crate::report::MemoryDump;
use crate::report::ProgramDump;
use crate::report::RegisterDump;

/// Summary of one run
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunStats {
    pub cycles: u64,
    pub instructions: u64,
    pub cpi: f64,
    pub stalls: u64,
    pub branches_taken: u64,
    pub flushed: u64,
}

/// Run simulation on the given program file for up to `cycles` ticks
pub fn run(program: &Path, cycles: u64, policy: CPUPolicy) -> SimulatorResult<RunStats> {
    let store = loader::load_program(program)?;
    tracing::info!(
        program = %program.display(),
        instructions = store.len(),
        "initialized APEX CPU"
    );

    let mut pipe = Pipeline::new(store, policy)?;
    if policy.trace {
        print!("{}", ProgramDump(pipe.store()));
    }
    let stats = run_pipeline(&mut pipe, cycles)?;

    println!(
        "{}",
        RegisterDump { registers: &pipe.registers(), count: policy.dump_registers }
    );
    println!("{}", MemoryDump { memory: pipe.memory(), count: policy.dump_memory });

    if policy.history {
        eprintln!("[HISTORY] # cycles = {}", stats.cycles);
        eprintln!("[HISTORY] # instructions = {}", stats.instructions);
        eprintln!(
            "[HISTORY] CPI = {:.2}, stall cycles = {}, taken branches = {}, flushed = {}",
            stats.cpi, stats.stalls, stats.branches_taken, stats.flushed
        );
    }

    Ok(stats)
}

/// Drives an already built pipeline, printing the stage trace if asked
pub fn run_pipeline(pipe: &mut Pipeline, cycles: u64) -> SimulatorResult<RunStats> {
    if pipe.cpu().policy.trace {
        pipe.run_with(cycles, |snapshot| print!("{}", CycleTrace(snapshot)))?;
    } else {
        pipe.run(cycles)?;
    }

    let history = pipe.cpu().history;
    Ok(RunStats {
        cycles: history.cycle_count,
        instructions: history.inst_count,
        cpi: history.cpi(),
        stalls: history.stall_count,
        branches_taken: history.branches_taken,
        flushed: history.flushed_count,
    })
}
