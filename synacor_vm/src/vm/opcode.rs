use std::convert::TryFrom;

use super::error::Error;
use super::Address;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Opcode {
    /// Stop execution.
    Halt,

    /// `dst(a) <- val(b)`
    Set,

    /// Push `val(a)` onto the stack.
    Push,

    /// Pop the stack into `dst(a)`. Errors on an empty stack.
    Pop,

    /// `dst(a) <- val(b) == val(c)`
    Eq,

    /// `dst(a) <- val(b) > val(c)`
    Gt,

    /// `PC <- val(a)`
    Jmp,

    /// `PC <- val(b)` if `val(a) != 0`, else fall through.
    Jt,

    /// `PC <- val(b)` if `val(a) == 0`, else fall through.
    Jf,

    /// `dst(a) <- (val(b) + val(c)) mod 32768`
    Add,

    /// `dst(a) <- (val(b) * val(c)) mod 32768`
    Mult,

    /// `dst(a) <- val(b) mod val(c)`. Errors if `val(c) == 0`.
    Mod,

    /// `dst(a) <- val(b) & val(c)`
    And,

    /// `dst(a) <- val(b) | val(c)`
    Or,

    /// `dst(a) <- (!val(b)) & 0x7FFF`
    Not,

    /// `dst(a) <- memory.load(val(b))`
    Rmem,

    /// `memory.store(val(a), val(b))`
    Wmem,

    /// Push the return address, then `PC <- val(a)`.
    Call,

    /// Pop the stack into `PC`. Halts on an empty stack.
    Ret,

    /// Write the byte `val(a) mod 256` to output.
    Out,

    /// Read a byte into `dst(a)`. Halts on EOF.
    In,

    /// No effect.
    Noop,
}

impl Opcode {
    /// The number of operand words that follow this opcode in the
    /// instruction stream.
    pub fn operand_count(self) -> usize {
        match self {
            Opcode::Halt => 0,
            Opcode::Set => 2,
            Opcode::Push => 1,
            Opcode::Pop => 1,
            Opcode::Eq => 3,
            Opcode::Gt => 3,
            Opcode::Jmp => 1,
            Opcode::Jt => 2,
            Opcode::Jf => 2,
            Opcode::Add => 3,
            Opcode::Mult => 3,
            Opcode::Mod => 3,
            Opcode::And => 3,
            Opcode::Or => 3,
            Opcode::Not => 2,
            Opcode::Rmem => 2,
            Opcode::Wmem => 2,
            Opcode::Call => 1,
            Opcode::Ret => 0,
            Opcode::Out => 1,
            Opcode::In => 1,
            Opcode::Noop => 0,
        }
    }

    /// Decode an opcode at `pc`, used only to attach the address to the
    /// error if `word` isn't one of the 22 defined opcodes.
    pub fn try_decode(word: u16, pc: Address) -> Result<Opcode, Error> {
        Opcode::try_from(word).map_err(|_| Error::UnknownOpcode { opcode: word, pc })
    }
}

impl TryFrom<u16> for Opcode {
    type Error = ();

    fn try_from(word: u16) -> Result<Self, Self::Error> {
        match word {
            0 => Ok(Opcode::Halt),
            1 => Ok(Opcode::Set),
            2 => Ok(Opcode::Push),
            3 => Ok(Opcode::Pop),
            4 => Ok(Opcode::Eq),
            5 => Ok(Opcode::Gt),
            6 => Ok(Opcode::Jmp),
            7 => Ok(Opcode::Jt),
            8 => Ok(Opcode::Jf),
            9 => Ok(Opcode::Add),
            10 => Ok(Opcode::Mult),
            11 => Ok(Opcode::Mod),
            12 => Ok(Opcode::And),
            13 => Ok(Opcode::Or),
            14 => Ok(Opcode::Not),
            15 => Ok(Opcode::Rmem),
            16 => Ok(Opcode::Wmem),
            17 => Ok(Opcode::Call),
            18 => Ok(Opcode::Ret),
            19 => Ok(Opcode::Out),
            20 => Ok(Opcode::In),
            21 => Ok(Opcode::Noop),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_decode_accepts_every_defined_opcode() {
        for word in 0..=21u16 {
            assert!(Opcode::try_decode(word, 0).is_ok(), "opcode {} should decode", word);
        }
    }

    #[test]
    fn try_decode_rejects_unknown_opcode() {
        let result = Opcode::try_decode(22, 7);

        assert!(matches!(
            result,
            Err(Error::UnknownOpcode { opcode: 22, pc: 7 })
        ));
    }

    #[test]
    fn try_decode_rejects_register_reference_as_opcode() {
        let result = Opcode::try_decode(32768, 0);

        assert!(result.is_err());
    }
}
