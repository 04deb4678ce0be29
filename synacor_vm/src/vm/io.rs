use std::collections::VecDeque;
use std::io::{self, Read, Write};

/// `VmIo` is the engine's view of the outside world: one byte in, one byte
/// out. It plays the same role for the `in`/`out` instructions that `Bus`
/// plays for `rmem`/`wmem` — an interface the engine depends on without
/// knowing whether the other end is a terminal, a file, or an in-memory
/// buffer in a test.
pub trait VmIo {
    /// Read one byte. `Ok(None)` signals a clean EOF, which halts the VM
    /// rather than erroring.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    fn write_byte(&mut self, byte: u8) -> io::Result<()>;
}

/// The production `VmIo`: real process stdin/stdout.
pub struct StdIo {
    stdin: io::Stdin,
    stdout: io::Stdout,
}

impl StdIo {
    pub fn new() -> StdIo {
        StdIo {
            stdin: io::stdin(),
            stdout: io::stdout(),
        }
    }
}

impl Default for StdIo {
    fn default() -> StdIo {
        StdIo::new()
    }
}

impl VmIo for StdIo {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];

        match self.stdin.lock().read(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            Err(e) => Err(e),
        }
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.stdout.lock().write_all(&[byte])?;
        self.stdout.lock().flush()
    }
}

/// An in-memory `VmIo` used by tests: reads come from a pre-loaded queue of
/// bytes (exhausting it behaves like EOF) and writes accumulate in `output`.
#[derive(Debug, Default)]
pub struct BufferIo {
    input: VecDeque<u8>,
    pub output: Vec<u8>,
}

impl BufferIo {
    pub fn new() -> BufferIo {
        BufferIo::default()
    }

    pub fn with_input(input: impl Into<Vec<u8>>) -> BufferIo {
        BufferIo {
            input: input.into().into(),
            output: Vec::new(),
        }
    }

    pub fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

impl VmIo for BufferIo {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.input.pop_front())
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.output.push(byte);
        Ok(())
    }
}
