//! Human-readable dumps of a run: program listing, per-cycle stage trace, registers, memory

use std::fmt;

use crate::loader::InstructionStore;
use crate::memory::DataMemory;
use crate::pipelined::pipeline::Stage;
use crate::pipelined::PipelineSnapshot;
use crate::pipelined::RegisterSnapshot;

/// Code memory listing, one row per instruction
pub struct ProgramDump<'a>(pub &'a InstructionStore);

impl fmt::Display for ProgramDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<9} {:<9} {:<9} {:<9} {:<9}", "opcode", "rd", "rs1", "rs2", "imm")?;
        for inst in self.0.instructions() {
            writeln!(
                f,
                "{:<9} {:<9} {:<9} {:<9} {:<9}",
                inst.opcode().mnemonic(),
                inst.rd(),
                inst.rs1(),
                inst.rs2(),
                inst.imm()
            )?;
        }
        Ok(())
    }
}

/// Every stage latch for one cycle, upstream first
pub struct CycleTrace<'a>(pub &'a PipelineSnapshot);

impl fmt::Display for CycleTrace<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.0;
        writeln!(f, "--------------------------------")?;
        writeln!(f, "Clock Cycle #: {}", snapshot.cycle)?;
        writeln!(f, "--------------------------------")?;
        for stage in Stage::ALL {
            writeln!(f, "{:<15}: {}", stage.name(), snapshot.state.latch(stage))?;
        }
        Ok(())
    }
}

/// The first `count` registers with their validity
pub struct RegisterDump<'a> {
    pub registers: &'a RegisterSnapshot,
    pub count: usize,
}

impl fmt::Display for RegisterDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\t**************  REGISTERS  ************")?;
        let regs = self.registers;
        for (i, (value, valid)) in
            regs.values.iter().zip(regs.valid).take(self.count).enumerate()
        {
            let status = if valid { "VALID" } else { "INVALID" };
            writeln!(f, "\t |REG[{i}]| \t |Value={value}| \t |Status='{status}'|")?;
        }
        writeln!(f, "\t |ZERO FLAG| \t |Value={}|", regs.zero_flag as i32)
    }
}

/// The first `count` words of data memory
pub struct MemoryDump<'a> {
    pub memory: &'a DataMemory,
    pub count: usize,
}

impl fmt::Display for MemoryDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\t**************  MEMORY  ************")?;
        for (i, value) in self.memory.words().iter().take(self.count).enumerate() {
            writeln!(f, "\t |MEM[{i}]| \t |Value={value}|")?;
        }
        Ok(())
    }
}
