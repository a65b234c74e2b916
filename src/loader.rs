//! Utility functions for turning APEX program text into an instruction store

use std::path::Path;

use crate::cpu::CODE_BASE;
use crate::cpu::NUM_REGS;
use crate::cpu::PC_STRIDE;
use crate::error::LoadError;
use crate::error::ParseErrorKind;
use crate::error::SimulatorResult;
use crate::instruction::decode_helper::operand_shape;
use crate::instruction::decode_helper::OperandShape;
use crate::instruction::Instruction;
use crate::instruction::Opcode;

/// Immutable program image, addressed by PC
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InstructionStore {
    instructions: Vec<Instruction>,
}

impl InstructionStore {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// Converts a PC into an index into the store
    pub fn index(pc: u32) -> Option<usize> {
        let offset = pc.checked_sub(CODE_BASE)?;
        if offset % PC_STRIDE != 0 {
            return None;
        }
        Some((offset / PC_STRIDE) as usize)
    }

    /// Instruction at `pc`, or `None` past either end of the program
    pub fn get(&self, pc: u32) -> Option<Instruction> {
        Self::index(pc).and_then(|i| self.instructions.get(i).copied())
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }
}

/// Reads and parses a program file
pub fn load_program(path: &Path) -> SimulatorResult<InstructionStore> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| LoadError::FileReadError(path.to_path_buf(), e))?;
    parse_program(&content, path)
}

/// Parses program text; `path` only labels errors
pub fn parse_program(content: &str, path: &Path) -> SimulatorResult<InstructionStore> {
    let mut instructions = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        let code = line.split(';').next().unwrap_or_default().trim();
        // Skip empty lines
        if code.is_empty() {
            continue;
        }

        let inst = parse_line(code).map_err(|kind| LoadError::ParseError {
            path: path.to_path_buf(),
            line: line_num + 1,
            kind,
        })?;
        instructions.push(inst);
    }

    if instructions.is_empty() {
        return Err(LoadError::EmptyProgram(path.to_path_buf()).into());
    }

    tracing::debug!(count = instructions.len(), "loaded program");
    Ok(InstructionStore::new(instructions))
}

/// Parses one instruction such as `ADD,R3,R1,R2` or `MOVC R1, #5`
pub fn parse_line(code: &str) -> Result<Instruction, ParseErrorKind> {
    let mut tokens = code
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty());
    let opcode: Opcode = tokens.next().unwrap_or_default().parse()?;
    let operands: Vec<&str> = tokens.collect();

    let shape = operand_shape(opcode);
    if operands.len() != shape.arity() {
        return Err(ParseErrorKind::OperandCount {
            opcode: opcode.to_string(),
            expected: shape.arity(),
            found: operands.len(),
        });
    }

    let (rd, rs1, rs2, imm) = match shape {
        OperandShape::DestLiteral => {
            (register(operands[0])?, 0, 0, literal(operands[1])?)
        }
        OperandShape::DestTwoSources => (
            register(operands[0])?,
            register(operands[1])?,
            register(operands[2])?,
            0,
        ),
        OperandShape::DestSourceLiteral => (
            register(operands[0])?,
            register(operands[1])?,
            0,
            literal(operands[2])?,
        ),
        OperandShape::TwoSourcesLiteral => (
            0,
            register(operands[0])?,
            register(operands[1])?,
            literal(operands[2])?,
        ),
        OperandShape::Literal => (0, 0, 0, literal(operands[0])?),
        OperandShape::Bare => (0, 0, 0, 0),
    };

    // Indices were range-checked above
    Instruction::new(opcode, rd, rs1, rs2, imm)
        .map_err(|_| ParseErrorKind::RegisterOutOfRange(NUM_REGS as u32))
}

fn register(token: &str) -> Result<u8, ParseErrorKind> {
    let digits = token
        .strip_prefix('R')
        .or_else(|| token.strip_prefix('r'))
        .ok_or_else(|| ParseErrorKind::ExpectedRegister(token.to_string()))?;
    let index: u32 = digits
        .parse()
        .map_err(|_| ParseErrorKind::ExpectedRegister(token.to_string()))?;
    if index as usize >= NUM_REGS {
        return Err(ParseErrorKind::RegisterOutOfRange(index));
    }
    Ok(index as u8)
}

fn literal(token: &str) -> Result<i32, ParseErrorKind> {
    token
        .strip_prefix('#')
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| ParseErrorKind::ExpectedLiteral(token.to_string()))
}
