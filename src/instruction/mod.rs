//! Instruction representation

use std::fmt;

use crate::alu::ALUOp;
use crate::alu::ALUSrc;
use crate::cpu::NUM_REGS;
use crate::error::SimulatorError;
use crate::error::SimulatorResult;

pub mod decode_helper;

/// Wrapped instruction.
/// Only built through [`Instruction::new`], so register indices always fit
/// the register file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Instruction {
    opcode: Opcode,
    /// Destination register
    rd: u8,
    /// Source register 1
    rs1: u8,
    /// Source register 2
    rs2: u8,
    /// Literal operand
    imm: i32,
    controls: Controls,
}

impl Instruction {
    /// Builds an instruction, rejecting register indices outside the file.
    /// Fields an opcode does not use are still checked so that a latch never
    /// carries an index the register file cannot serve.
    pub fn new(
        opcode: Opcode,
        rd: u8,
        rs1: u8,
        rs2: u8,
        imm: i32,
    ) -> SimulatorResult<Self> {
        if let Some(bad) = [rd, rs1, rs2].into_iter().find(|r| *r as usize >= NUM_REGS)
        {
            return Err(SimulatorError::InvalidInstructionError(format!(
                "{opcode} uses register R{bad}, only R0..R{} exist",
                NUM_REGS - 1
            )));
        }

        let controls = decode_helper::get_controls(opcode);
        Ok(Self { opcode, rd, rs1, rs2, imm, controls })
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn rd(&self) -> u8 {
        self.rd
    }

    pub fn rs1(&self) -> u8 {
        self.rs1
    }

    pub fn rs2(&self) -> u8 {
        self.rs2
    }

    pub fn imm(&self) -> i32 {
        self.imm
    }

    /// Control signals
    pub fn controls(&self) -> Controls {
        self.controls
    }

    /// Registers that must be valid before Decode may read them
    pub fn sources(&self) -> impl Iterator<Item = u8> {
        let (first, second) = match self.opcode {
            Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::And
            | Opcode::Or
            | Opcode::Xor
            | Opcode::Store => (Some(self.rs1), Some(self.rs2)),
            Opcode::Addl | Opcode::Subl | Opcode::Load => (Some(self.rs1), None),
            Opcode::Movc | Opcode::Bz | Opcode::Nop | Opcode::Halt => (None, None),
        };
        first.into_iter().chain(second)
    }
}

impl Default for Instruction {
    fn default() -> Self {
        Self {
            opcode: Opcode::Nop,
            rd: 0,
            rs1: 0,
            rs2: 0,
            imm: 0,
            controls: Controls::default(),
        }
    }
}

/// Renders the instruction the way APEX listings spell it, e.g. `ADD,R3,R1,R2`
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Opcode::*;
        let op = self.opcode;
        match op {
            Movc => write!(f, "{op},R{},#{}", self.rd, self.imm),
            Add | Sub | Mul | And | Or | Xor => {
                write!(f, "{op},R{},R{},R{}", self.rd, self.rs1, self.rs2)
            }
            Addl | Subl | Load => {
                write!(f, "{op},R{},R{},#{}", self.rd, self.rs1, self.imm)
            }
            Store => write!(f, "{op},R{},R{},#{}", self.rs1, self.rs2, self.imm),
            Bz => write!(f, "{op},#{}", self.imm),
            Nop | Halt => write!(f, "{op}"),
        }
    }
}

/// APEX opcode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Opcode {
    Movc,
    Add,
    Addl,
    Sub,
    Subl,
    Mul,
    And,
    Or,
    Xor,
    Load,
    Store,
    Bz,
    #[default]
    Nop,
    Halt,
}

impl Opcode {
    pub const ALL: [Opcode; 14] = [
        Opcode::Movc,
        Opcode::Add,
        Opcode::Addl,
        Opcode::Sub,
        Opcode::Subl,
        Opcode::Mul,
        Opcode::And,
        Opcode::Or,
        Opcode::Xor,
        Opcode::Load,
        Opcode::Store,
        Opcode::Bz,
        Opcode::Nop,
        Opcode::Halt,
    ];

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Movc => "MOVC",
            Opcode::Add => "ADD",
            Opcode::Addl => "ADDL",
            Opcode::Sub => "SUB",
            Opcode::Subl => "SUBL",
            Opcode::Mul => "MUL",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Xor => "XOR",
            Opcode::Load => "LOAD",
            Opcode::Store => "STORE",
            Opcode::Bz => "BZ",
            Opcode::Nop => "NOP",
            Opcode::Halt => "HALT",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Control signals
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Controls {
    pub mem_read: bool,
    pub mem_write: bool,
    pub reg_write: bool,
    /// Commits update the zero flag
    pub sets_flag: bool,
    pub halt: bool,
    pub alu_op: Option<ALUOp>,
    pub alu_src: ALUSrc,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_register_out_of_range() {
        assert!(Instruction::new(Opcode::Add, 32, 1, 2, 0).is_err());
        let inst = Instruction::new(Opcode::Add, 31, 1, 2, 0).unwrap();
        assert_eq!((inst.rd(), inst.rs1(), inst.rs2()), (31, 1, 2));
        assert!(inst.controls().sets_flag);
    }

    #[test]
    fn sources_follow_operand_shape() {
        let add = Instruction::new(Opcode::Add, 3, 1, 2, 0).unwrap();
        assert_eq!(add.sources().collect::<Vec<_>>(), vec![1, 2]);

        let addl = Instruction::new(Opcode::Addl, 3, 1, 9, 4).unwrap();
        assert_eq!(addl.sources().collect::<Vec<_>>(), vec![1]);

        let store = Instruction::new(Opcode::Store, 0, 4, 5, 8).unwrap();
        assert_eq!(store.sources().collect::<Vec<_>>(), vec![4, 5]);

        let movc = Instruction::new(Opcode::Movc, 1, 0, 0, 5).unwrap();
        assert_eq!(movc.sources().count(), 0);
    }

    #[test]
    fn display_matches_listing_format() {
        let cases = [
            (Instruction::new(Opcode::Movc, 1, 0, 0, 5).unwrap(), "MOVC,R1,#5"),
            (Instruction::new(Opcode::Add, 3, 1, 2, 0).unwrap(), "ADD,R3,R1,R2"),
            (Instruction::new(Opcode::Load, 4, 2, 0, 8).unwrap(), "LOAD,R4,R2,#8"),
            (Instruction::new(Opcode::Store, 0, 3, 0, 0).unwrap(), "STORE,R3,R0,#0"),
            (Instruction::new(Opcode::Bz, 0, 0, 0, -8).unwrap(), "BZ,#-8"),
            (Instruction::default(), "NOP"),
        ];
        for (inst, text) in cases {
            assert_eq!(inst.to_string(), text);
        }
    }
}
