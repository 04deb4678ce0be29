use thiserror::Error;

use super::Address;

#[derive(Error, Debug)]
pub enum Error {
    #[error("program image is {word_count} words, but memory only addresses 32768 words")]
    ImageTooLarge { word_count: usize },

    #[error("unknown opcode {opcode} at address {pc:#06x}")]
    UnknownOpcode { opcode: u16, pc: Address },

    #[error("operand {operand} at address {pc:#06x} is out of the valid range (must be < 32776)")]
    InvalidOperand { operand: u16, pc: Address },

    #[error("operand {operand} at address {pc:#06x} cannot be used as a destination, destinations must be register references")]
    InvalidDestination { operand: u16, pc: Address },

    #[error("division by zero in `mod` at address {pc:#06x}")]
    DivideByZero { pc: Address },

    #[error("memory address {address:#06x} is out of range (must be < 32768)")]
    OutOfRangeMemory { address: u16 },

    #[error("stack underflow: `pop` on an empty stack at address {pc:#06x}")]
    StackUnderflow { pc: Address },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
