use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the simulator
#[derive(Error, Debug)]
pub enum SimulatorError {
    #[error("Failed to load program: {0}")]
    LoadError(#[from] LoadError),

    #[error("CPU execution error: {0}")]
    ExecutionError(#[from] ExecutionError),

    #[error("Memory error: {0}")]
    MemoryError(#[from] MemoryError),

    #[error("Invalid instruction: {0}")]
    InvalidInstructionError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

/// Errors related to reading program files
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read program file '{0}': {1}")]
    FileReadError(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse '{path}' at line {line}: {kind}")]
    ParseError { path: PathBuf, line: usize, kind: ParseErrorKind },

    #[error("Program '{0}' contains no instructions")]
    EmptyProgram(PathBuf),
}

/// Specific kinds of program text errors
#[derive(Error, Debug, PartialEq)]
pub enum ParseErrorKind {
    #[error("Unknown opcode '{0}'")]
    UnknownOpcode(String),

    #[error("Expected {expected} operands for {opcode}, found {found}")]
    OperandCount { opcode: String, expected: usize, found: usize },

    #[error("Expected a register like 'R3', found '{0}'")]
    ExpectedRegister(String),

    #[error("Expected a literal like '#-4', found '{0}'")]
    ExpectedLiteral(String),

    #[error("Register index {0} is out of range")]
    RegisterOutOfRange(u32),
}

/// Errors related to CPU execution
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Branch at PC={pc} resolves to {target}, outside the program")]
    InvalidBranchTarget { pc: u32, target: i64 },
}

/// Errors related to memory operations
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Memory access error at address {address}: {kind}")]
    AccessError { address: i64, kind: MemoryErrorKind },
}

/// Specific kinds of memory errors
#[derive(Error, Debug)]
pub enum MemoryErrorKind {
    #[error("Attempted to read outside data memory of {0} words")]
    ReadOutOfBounds(usize),

    #[error("Attempted to write outside data memory of {0} words")]
    WriteOutOfBounds(usize),
}

/// Type alias for Result with SimulatorError
pub type SimulatorResult<T> = Result<T, SimulatorError>;
