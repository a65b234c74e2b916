//! ALU implementation

/// Performs an atomic ALU operation
/// All arithmetic wraps on 32-bit overflow
pub fn alu(op: ALUOp, op1: i32, op2: i32) -> i32 {
    match op {
        ALUOp::ADD => op1.wrapping_add(op2),
        ALUOp::SUB => op1.wrapping_sub(op2),
        ALUOp::MUL => op1.wrapping_mul(op2),
        ALUOp::AND => op1 & op2,
        ALUOp::OR => op1 | op2,
        // APEX XOR is a "differs" test, not a bitwise XOR
        ALUOp::XOR => (op1 != op2) as i32,
    }
}

/// Selector for ALU src2 input
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum ALUSrc {
    // From register
    #[default]
    REG,
    // From immediate
    IMM,
}

/// Set of ALU operations needed for APEX
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum ALUOp {
    // Arithmetic
    #[default]
    ADD,
    SUB,
    MUL,
    // Logical
    AND,
    OR,
    XOR,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_wraps() {
        assert_eq!(alu(ALUOp::ADD, i32::MAX, 1), i32::MIN);
        assert_eq!(alu(ALUOp::SUB, 3, 5), -2);
        assert_eq!(alu(ALUOp::MUL, 6, -7), -42);
    }

    #[test]
    fn logical_ops() {
        assert_eq!(alu(ALUOp::AND, 0b1100, 0b1010), 0b1000);
        assert_eq!(alu(ALUOp::OR, 0b1100, 0b1010), 0b1110);
    }

    #[test]
    fn xor_reports_inequality() {
        assert_eq!(alu(ALUOp::XOR, 7, 7), 0);
        assert_eq!(alu(ALUOp::XOR, 7, 6), 1);
        assert_eq!(alu(ALUOp::XOR, -1, 0), 1);
    }
}
