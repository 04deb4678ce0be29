pub mod vm;

pub use vm::{Engine, Error, Result, State};
pub use vm::io::{BufferIo, StdIo, VmIo};
