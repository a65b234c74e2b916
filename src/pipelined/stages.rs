//! The seven APEX stages.
//!
//! Each function is one stage's work for one tick. The engine calls them
//! from Writeback back to Fetch, so a stage always reads the latch its
//! predecessor filled on the previous tick and then overwrites its
//! successor's latch (with its own instruction or a bubble).

use super::hazard::FlagHazard;
use super::pipeline::Latch;
use super::pipeline::PipelineState;
use crate::alu::alu;
use crate::alu::ALUSrc;
use crate::cpu::CPUState;
use crate::cpu::PC_STRIDE;
use crate::error::ExecutionError;
use crate::error::SimulatorResult;
use crate::instruction::Opcode;
use crate::loader::InstructionStore;

/// IF stage
pub fn instruction_fetch(
    cpu: &mut CPUState,
    store: &InstructionStore,
    state: &mut PipelineState,
) {
    let decode_stalled = state.decode.stalled;
    let latch = &mut state.fetch;

    if latch.busy || latch.stalled {
        // Halted; never drop an instruction Decode is still holding
        if !decode_stalled {
            state.decode = Latch::bubble();
        }
        return;
    }

    let pc = cpu.pc;
    *latch = match store.get(pc) {
        Some(inst) => Latch::fetched(pc, inst),
        // Ran off the end of the program
        None => Latch::bubble(),
    };

    if !decode_stalled {
        if latch.occupied {
            cpu.pc = pc + PC_STRIDE;
        }
        state.decode = *latch;
    }
}

/// ID/RF stage
pub fn instruction_decode(
    cpu: &mut CPUState,
    flag: &mut FlagHazard,
    state: &mut PipelineState,
    tick: u64,
) {
    let latch = &mut state.decode;

    if latch.occupied {
        let inst = latch.inst;
        match inst.opcode() {
            Opcode::Add
            | Opcode::Addl
            | Opcode::Sub
            | Opcode::Subl
            | Opcode::Mul
            | Opcode::And
            | Opcode::Or
            | Opcode::Xor
            | Opcode::Load
            | Opcode::Store => {
                if inst.sources().all(|r| cpu.reg_valid(r)) {
                    latch.stalled = false;
                    latch.op1 = cpu.read_reg(inst.rs1());
                    latch.op2 = match inst.controls().alu_src {
                        ALUSrc::REG => cpu.read_reg(inst.rs2()),
                        ALUSrc::IMM => inst.imm(),
                    };
                } else {
                    latch.stalled = true;
                }
            }
            Opcode::Bz => latch.stalled = flag.blocks_branch(tick),
            Opcode::Halt => {
                state.fetch.busy = true;
                tracing::debug!(pc = latch.pc, "HALT decoded, fetch stopped");
            }
            // No register file read needed
            Opcode::Movc | Opcode::Nop => {}
        }

        if latch.stalled {
            cpu.history.stall_count += 1;
            tracing::trace!(pc = latch.pc, inst = %inst, "decode stalled");
        }
    }

    state.ex1 = if latch.is_active() { *latch } else { Latch::bubble() };
}

/// EX1 stage: announce pending writes
pub fn execute1(
    cpu: &mut CPUState,
    flag: &mut FlagHazard,
    state: &mut PipelineState,
    tick: u64,
) {
    if state.decode.stalled {
        state.ex1.stalled = true;
    }
    let latch = &mut state.ex1;

    if latch.is_active() {
        let controls = latch.inst.controls();
        if controls.reg_write {
            cpu.scoreboard.reserve(latch.inst.rd());
            latch.dest_pending = true;
        }
        if controls.sets_flag {
            flag.record_producer(tick);
        }
        state.ex2 = *latch;
    } else {
        state.ex2 = Latch::bubble();
    }
}

/// EX2 stage: compute results, addresses and branch targets
pub fn execute2(cpu: &mut CPUState, state: &mut PipelineState) -> SimulatorResult<()> {
    if state.ex1.stalled {
        state.ex2.stalled = true;
    }
    let latch = &mut state.ex2;

    if !latch.is_active() {
        state.mem1 = Latch::bubble();
        return Ok(());
    }

    let inst = latch.inst;
    match inst.opcode() {
        Opcode::Movc => latch.result = inst.imm(),
        Opcode::Add
        | Opcode::Addl
        | Opcode::Sub
        | Opcode::Subl
        | Opcode::Mul
        | Opcode::And
        | Opcode::Or
        | Opcode::Xor => {
            if let Some(op) = inst.controls().alu_op {
                latch.result = alu(op, latch.op1, latch.op2);
            }
        }
        Opcode::Load => latch.mem_address = latch.op1.wrapping_add(inst.imm()),
        // STORE R_value, R_base, #offset
        Opcode::Store => latch.mem_address = latch.op2.wrapping_add(inst.imm()),
        Opcode::Bz => {
            if cpu.zero_flag {
                latch.taken_pc = Some(branch_target(latch.pc, inst.imm())?);
            }
        }
        Opcode::Nop | Opcode::Halt => {}
    }

    state.mem1 = *latch;
    Ok(())
}

/// `pc + offset`, rounded down to an instruction boundary.
/// Targets below the first instruction are rejected.
pub fn branch_target(pc: u32, offset: i32) -> SimulatorResult<u32> {
    let target = pc as i64 + offset as i64;
    let aligned = target - target.rem_euclid(PC_STRIDE as i64);
    u32::try_from(aligned)
        .ok()
        .filter(|t| InstructionStore::index(*t).is_some())
        .ok_or_else(|| ExecutionError::InvalidBranchTarget { pc, target }.into())
}

/// MEM1 stage: commit taken branches
pub fn memory1(cpu: &mut CPUState, flag: &mut FlagHazard, state: &mut PipelineState) {
    if state.ex2.stalled {
        state.mem1.stalled = true;
    }

    if !state.mem1.is_active() {
        state.mem2 = Latch::bubble();
        return;
    }

    if let Some(target) = state.mem1.taken_pc {
        tracing::debug!(from = state.mem1.pc, to = target, "branch taken");
        cpu.pc = target;
        cpu.history.branches_taken += 1;
        flush(cpu, flag, state);
    }

    state.mem2 = state.mem1;
}

/// Squashes the instructions fetched down the fall-through path
fn flush(cpu: &mut CPUState, flag: &mut FlagHazard, state: &mut PipelineState) {
    for latch in [&mut state.decode, &mut state.ex1, &mut state.ex2] {
        if !latch.occupied {
            *latch = Latch::bubble();
            continue;
        }
        if latch.dest_pending {
            cpu.scoreboard.release(latch.inst.rd());
        }
        if latch.inst.controls().sets_flag {
            // Older producers have committed before the branch left Decode
            flag.cancel();
        }
        if latch.inst.controls().halt {
            // The HALT that stopped Fetch was on the wrong path
            state.fetch.busy = false;
        }
        cpu.history.flushed_count += 1;
        tracing::debug!(pc = latch.pc, inst = %latch.inst, "flushed");
        *latch = Latch::bubble();
    }
}

/// MEM2 stage
pub fn memory2(cpu: &mut CPUState, state: &mut PipelineState) -> SimulatorResult<()> {
    if state.mem1.stalled {
        state.mem2.stalled = true;
    }
    let latch = &mut state.mem2;

    if !latch.is_active() {
        state.wb = Latch::bubble();
        return Ok(());
    }

    let controls = latch.inst.controls();
    if controls.mem_write {
        cpu.memory.write(latch.mem_address, latch.op1)?;
    } else if controls.mem_read {
        latch.result = cpu.memory.read(latch.mem_address)?;
    }

    state.wb = *latch;
    Ok(())
}

/// WB stage
/// Returns whether an instruction completed this tick
pub fn write_back(cpu: &mut CPUState, state: &PipelineState) -> bool {
    let latch = &state.wb;
    if !latch.is_active() {
        return false;
    }

    let inst = latch.inst;
    if inst.controls().reg_write {
        cpu.gpr[inst.rd() as usize].write(latch.result);
        if latch.dest_pending {
            cpu.scoreboard.release(inst.rd());
        }
        if inst.controls().sets_flag {
            cpu.zero_flag = latch.result == 0;
        }
    }

    cpu.update_inst_count(1);
    true
}
