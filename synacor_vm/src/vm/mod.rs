mod error;
pub mod io;
mod memory;
mod opcode;
mod stack;

use memory::Memory;
use opcode::Opcode;
use stack::Stack;

pub use error::Error;
pub use io::VmIo;

pub type Result<A> = std::result::Result<A, Error>;

pub type Word = u16;
pub type Address = u16;

pub const REGISTER_COUNT: usize = 8;

/// The lowest word that denotes a register reference rather than a literal.
const REGISTER_BASE: u16 = 32768;

/// The highest word that denotes a register reference. Words above this are
/// reserved and always invalid as an operand.
const REGISTER_MAX: u16 = REGISTER_BASE + REGISTER_COUNT as u16 - 1;

/// `State` tracks whether the fetch-decode-dispatch loop should keep
/// stepping. There is no "errored" state: an `Err` from `step`/`run` means
/// the caller should stop calling the engine, full stop.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum State {
    Running,
    Halted,
}

/// `Engine` owns every piece of mutable VM state — registers, memory, the
/// operand stack, and the program counter — and executes the
/// fetch-decode-dispatch loop over it. There are no module-level globals;
/// multiple `Engine`s can coexist in one process.
#[derive(Debug)]
pub struct Engine {
    registers: [Word; REGISTER_COUNT],
    memory: Memory,
    stack: Stack,
    pc: Address,
    state: State,
}

impl Engine {
    /// Build an `Engine` whose memory is initialized from `words` (as
    /// produced by `synacor_image::Image`). The program counter starts at 0
    /// and all registers start at 0, per the reset contract in the image
    /// loader's documentation.
    pub fn new(words: &[Word]) -> Result<Engine> {
        Ok(Engine {
            registers: [0; REGISTER_COUNT],
            memory: Memory::from_words(words)?,
            stack: Stack::new(),
            pc: 0,
            state: State::Running,
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn pc(&self) -> Address {
        self.pc
    }

    pub fn register(&self, index: usize) -> Word {
        self.registers[index]
    }

    /// Run until `halt`, a clean EOF on `in`, a `ret` on an empty stack, or
    /// an error.
    pub fn run(&mut self, io: &mut impl VmIo) -> Result<()> {
        while self.state == State::Running {
            self.step(io)?;
        }

        Ok(())
    }

    /// Execute a single instruction. A no-op if the engine has already
    /// halted.
    pub fn step(&mut self, io: &mut impl VmIo) -> Result<()> {
        if self.state == State::Halted {
            return Ok(());
        }

        let pc = self.pc;
        let opcode = Opcode::try_decode(self.memory.load(pc)?, pc)?;

        let operand_count = opcode.operand_count();
        let mut operands = [0 as Word; 3];
        for (i, slot) in operands.iter_mut().enumerate().take(operand_count) {
            *slot = self.memory.load(pc + 1 + i as Address)?;
        }
        let operands = &operands[..operand_count];

        log::trace!("{:#06x}: {:?} {:?}", pc, opcode, operands);

        // Default fallthrough PC; instructions that jump or halt override it below.
        let next_pc = pc + 1 + operand_count as Address;
        self.pc = next_pc;

        self.execute(pc, opcode, operands, next_pc, io)
    }

    fn execute(
        &mut self,
        pc: Address,
        opcode: Opcode,
        operands: &[Word],
        next_pc: Address,
        io: &mut impl VmIo,
    ) -> Result<()> {
        match opcode {
            Opcode::Halt => {
                self.state = State::Halted;
            }

            Opcode::Set => {
                let value = self.val(pc, operands[1])?;
                *self.dst(pc, operands[0])? = value;
            }

            Opcode::Push => {
                let value = self.val(pc, operands[0])?;
                self.stack.push(value);
            }

            Opcode::Pop => {
                let value = self.stack.pop().ok_or(Error::StackUnderflow { pc })?;
                *self.dst(pc, operands[0])? = value;
            }

            Opcode::Eq => {
                let b = self.val(pc, operands[1])?;
                let c = self.val(pc, operands[2])?;
                *self.dst(pc, operands[0])? = (b == c) as Word;
            }

            Opcode::Gt => {
                let b = self.val(pc, operands[1])?;
                let c = self.val(pc, operands[2])?;
                *self.dst(pc, operands[0])? = (b > c) as Word;
            }

            Opcode::Jmp => {
                self.pc = self.val(pc, operands[0])?;
            }

            Opcode::Jt => {
                let a = self.val(pc, operands[0])?;
                let b = self.val(pc, operands[1])?;
                if a != 0 {
                    self.pc = b;
                }
            }

            Opcode::Jf => {
                let a = self.val(pc, operands[0])?;
                let b = self.val(pc, operands[1])?;
                if a == 0 {
                    self.pc = b;
                }
            }

            Opcode::Add => {
                let b = self.val(pc, operands[1])? as u32;
                let c = self.val(pc, operands[2])? as u32;
                *self.dst(pc, operands[0])? = ((b + c) % 32768) as Word;
            }

            Opcode::Mult => {
                let b = self.val(pc, operands[1])? as u32;
                let c = self.val(pc, operands[2])? as u32;
                *self.dst(pc, operands[0])? = ((b * c) % 32768) as Word;
            }

            Opcode::Mod => {
                let b = self.val(pc, operands[1])?;
                let c = self.val(pc, operands[2])?;
                if c == 0 {
                    return Err(Error::DivideByZero { pc });
                }
                *self.dst(pc, operands[0])? = b % c;
            }

            Opcode::And => {
                let b = self.val(pc, operands[1])?;
                let c = self.val(pc, operands[2])?;
                *self.dst(pc, operands[0])? = b & c;
            }

            Opcode::Or => {
                let b = self.val(pc, operands[1])?;
                let c = self.val(pc, operands[2])?;
                *self.dst(pc, operands[0])? = b | c;
            }

            Opcode::Not => {
                let b = self.val(pc, operands[1])?;
                *self.dst(pc, operands[0])? = (!b) & 0x7FFF;
            }

            Opcode::Rmem => {
                let address = self.val(pc, operands[1])?;
                let value = self.memory.load(address)?;
                *self.dst(pc, operands[0])? = value;
            }

            Opcode::Wmem => {
                let address = self.val(pc, operands[0])?;
                let value = self.val(pc, operands[1])?;
                self.memory.store(address, value)?;
            }

            Opcode::Call => {
                let address = self.val(pc, operands[0])?;
                self.stack.push(next_pc);
                self.pc = address;
            }

            Opcode::Ret => match self.stack.pop() {
                Some(address) => self.pc = address,
                None => self.state = State::Halted,
            },

            Opcode::Out => {
                let value = self.val(pc, operands[0])?;
                io.write_byte((value % 256) as u8)?;
            }

            Opcode::In => match io.read_byte()? {
                Some(byte) => {
                    *self.dst(pc, operands[0])? = byte as Word;
                }
                None => {
                    self.state = State::Halted;
                }
            },

            Opcode::Noop => {}
        }

        Ok(())
    }

    /// Resolve an operand's value: a literal is itself, a register
    /// reference is the register's contents, anything else is invalid.
    fn val(&self, pc: Address, operand: Word) -> Result<Word> {
        if operand < REGISTER_BASE {
            Ok(operand)
        } else if operand <= REGISTER_MAX {
            Ok(self.registers[(operand - REGISTER_BASE) as usize])
        } else {
            Err(Error::InvalidOperand { operand, pc })
        }
    }

    /// Resolve an operand as a destination: must be a register reference.
    fn dst(&mut self, pc: Address, operand: Word) -> Result<&mut Word> {
        if (REGISTER_BASE..=REGISTER_MAX).contains(&operand) {
            Ok(&mut self.registers[(operand - REGISTER_BASE) as usize])
        } else {
            Err(Error::InvalidDestination { operand, pc })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::io::BufferIo;

    fn run_program(words: &[Word], input: &[u8]) -> (Engine, BufferIo) {
        let mut engine = Engine::new(words).unwrap();
        let mut io = BufferIo::with_input(input.to_vec());
        engine.run(&mut io).unwrap();
        (engine, io)
    }

    #[test]
    fn print_a_and_halt() {
        let (engine, io) = run_program(&[19, 65, 0], &[]);

        assert_eq!(io.output_str(), "A");
        assert_eq!(engine.state(), State::Halted);
    }

    #[test]
    fn set_and_read_a_register() {
        let (_, io) = run_program(&[1, 32768, 42, 19, 32768, 0], &[]);

        assert_eq!(io.output, vec![42]);
    }

    #[test]
    fn call_and_return() {
        let (_, io) = run_program(&[17, 5, 19, 89, 0, 19, 88, 18], &[]);

        assert_eq!(io.output_str(), "XY");
    }

    #[test]
    fn conditional_jump_skips_false_branch() {
        let (_, io) = run_program(&[1, 32768, 0, 8, 32768, 9, 19, 78, 0, 19, 89, 0], &[]);

        assert_eq!(io.output_str(), "Y");
    }

    #[test]
    fn echoes_one_byte_from_input() {
        let (_, io) = run_program(&[20, 32768, 19, 32768, 0], b"Q");

        assert_eq!(io.output_str(), "Q");
    }

    #[test]
    fn add_wraps_modulo_32768() {
        let (_, io) = run_program(&[9, 32768, 32767, 2, 19, 32768, 0], &[]);

        assert_eq!(io.output, vec![1]);
    }

    #[test]
    fn add_32767_and_1_stores_zero() {
        let mut engine = Engine::new(&[9, 32768, 32767, 1, 0]).unwrap();
        let mut io = BufferIo::new();
        engine.run(&mut io).unwrap();

        assert_eq!(engine.register(0), 0);
    }

    #[test]
    fn mult_32767_squared_wraps_to_one() {
        let mut engine = Engine::new(&[10, 32768, 32767, 32767, 0]).unwrap();
        let mut io = BufferIo::new();
        engine.run(&mut io).unwrap();

        assert_eq!(engine.register(0), 1);
    }

    #[test]
    fn not_zero_is_all_ones_masked_to_15_bits() {
        let mut engine = Engine::new(&[14, 32768, 0, 0]).unwrap();
        let mut io = BufferIo::new();
        engine.run(&mut io).unwrap();

        assert_eq!(engine.register(0), 32767);
    }

    #[test]
    fn not_32767_is_zero() {
        let mut engine = Engine::new(&[14, 32768, 32767, 0]).unwrap();
        let mut io = BufferIo::new();
        engine.run(&mut io).unwrap();

        assert_eq!(engine.register(0), 0);
    }

    #[test]
    fn mod_by_zero_is_an_error() {
        let mut engine = Engine::new(&[11, 32768, 10, 0]).unwrap();
        let mut io = BufferIo::new();

        assert!(matches!(engine.run(&mut io), Err(Error::DivideByZero { .. })));
    }

    #[test]
    fn operand_32776_is_invalid() {
        let mut engine = Engine::new(&[19, 32776, 0]).unwrap();
        let mut io = BufferIo::new();

        assert!(matches!(engine.run(&mut io), Err(Error::InvalidOperand { operand: 32776, .. })));
    }

    #[test]
    fn rmem_address_32768_is_an_error() {
        let mut engine = Engine::new(&[15, 32768, 32768, 0]).unwrap();
        let mut io = BufferIo::new();

        assert!(matches!(
            engine.run(&mut io),
            Err(Error::OutOfRangeMemory { address: 32768 })
        ));
    }

    #[test]
    fn wmem_address_32768_is_an_error() {
        let mut engine = Engine::new(&[16, 32768, 1, 0]).unwrap();
        let mut io = BufferIo::new();

        assert!(matches!(
            engine.run(&mut io),
            Err(Error::OutOfRangeMemory { address: 32768 })
        ));
    }

    #[test]
    fn pop_on_empty_stack_is_an_error() {
        let mut engine = Engine::new(&[3, 32768, 0]).unwrap();
        let mut io = BufferIo::new();

        assert!(matches!(engine.run(&mut io), Err(Error::StackUnderflow { .. })));
    }

    #[test]
    fn ret_on_empty_stack_halts_cleanly() {
        let mut engine = Engine::new(&[18]).unwrap();
        let mut io = BufferIo::new();

        engine.run(&mut io).unwrap();

        assert_eq!(engine.state(), State::Halted);
    }

    #[test]
    fn push_then_pop_roundtrips_and_leaves_stack_empty() {
        let mut engine = Engine::new(&[2, 99, 3, 32768, 0]).unwrap();
        let mut io = BufferIo::new();

        engine.run(&mut io).unwrap();

        assert_eq!(engine.register(0), 99);
    }

    #[test]
    fn noop_only_advances_pc() {
        let mut engine = Engine::new(&[21, 0]).unwrap();
        let mut io = BufferIo::new();

        engine.step(&mut io).unwrap();

        assert_eq!(engine.pc(), 1);
        assert_eq!(engine.state(), State::Running);
    }

    #[test]
    fn eof_on_in_halts_cleanly() {
        let mut engine = Engine::new(&[20, 32768, 0]).unwrap();
        let mut io = BufferIo::new();

        engine.run(&mut io).unwrap();

        assert_eq!(engine.state(), State::Halted);
    }

    #[test]
    fn unknown_opcode_is_an_error() {
        let mut engine = Engine::new(&[22]).unwrap();
        let mut io = BufferIo::new();

        assert!(matches!(engine.run(&mut io), Err(Error::UnknownOpcode { opcode: 22, .. })));
    }

    #[test]
    fn literal_destination_is_an_error() {
        let mut engine = Engine::new(&[1, 5, 5, 0]).unwrap();
        let mut io = BufferIo::new();

        assert!(matches!(engine.run(&mut io), Err(Error::InvalidDestination { operand: 5, .. })));
    }

    #[test]
    fn destination_aliasing_reads_operands_before_writing() {
        // add r0 r0 5, with r0 initialized to 3 via set: `b` must read the old
        // r0 (3) before the destination write, giving 3 + 5 = 8.
        let mut engine = Engine::new(&[1, 32768, 3, 9, 32768, 32768, 5, 0]).unwrap();
        let mut io = BufferIo::new();

        engine.run(&mut io).unwrap();

        assert_eq!(engine.register(0), 8);
    }
}
