//! Decoding helper functions.

use std::str::FromStr;

use super::Controls;
use super::Opcode;
use crate::alu::ALUOp;
use crate::alu::ALUSrc;
use crate::error::ParseErrorKind;

pub fn get_controls(opcode: Opcode) -> Controls {
    use Opcode::*;

    Controls {
        mem_read: matches!(opcode, Load),
        mem_write: matches!(opcode, Store),
        reg_write: matches!(
            opcode,
            Movc | Load | Add | Addl | Sub | Subl | Mul | And | Or | Xor
        ),
        sets_flag: matches!(opcode, Add | Sub | Mul),
        halt: matches!(opcode, Halt),
        alu_op: match opcode {
            Add | Addl => Some(ALUOp::ADD),
            Sub | Subl => Some(ALUOp::SUB),
            Mul => Some(ALUOp::MUL),
            And => Some(ALUOp::AND),
            Or => Some(ALUOp::OR),
            Xor => Some(ALUOp::XOR),
            Movc | Load | Store | Bz | Nop | Halt => None,
        },
        alu_src: match opcode {
            Addl | Subl => ALUSrc::IMM,
            _ => ALUSrc::REG,
        },
    }
}

/// Operand layout an opcode is written with in program text
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OperandShape {
    /// `rd, #imm`
    DestLiteral,
    /// `rd, rs1, rs2`
    DestTwoSources,
    /// `rd, rs1, #imm`
    DestSourceLiteral,
    /// `rs1, rs2, #imm`
    TwoSourcesLiteral,
    /// `#imm`
    Literal,
    /// no operands
    Bare,
}

impl OperandShape {
    pub fn arity(self) -> usize {
        match self {
            OperandShape::DestLiteral => 2,
            OperandShape::DestTwoSources
            | OperandShape::DestSourceLiteral
            | OperandShape::TwoSourcesLiteral => 3,
            OperandShape::Literal => 1,
            OperandShape::Bare => 0,
        }
    }
}

pub fn operand_shape(opcode: Opcode) -> OperandShape {
    use Opcode::*;
    match opcode {
        Movc => OperandShape::DestLiteral,
        Add | Sub | Mul | And | Or | Xor => OperandShape::DestTwoSources,
        Addl | Subl | Load => OperandShape::DestSourceLiteral,
        Store => OperandShape::TwoSourcesLiteral,
        Bz => OperandShape::Literal,
        Nop | Halt => OperandShape::Bare,
    }
}

impl FromStr for Opcode {
    type Err = ParseErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        // Older listings spell XOR as EX-OR
        if upper == "EX-OR" {
            return Ok(Opcode::Xor);
        }
        Opcode::ALL
            .into_iter()
            .find(|op| op.mnemonic() == upper)
            .ok_or(ParseErrorKind::UnknownOpcode(s.to_string()))
    }
}
