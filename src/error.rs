use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::memory::parse::ParseError;
use crate::memory::{Address, Byte};
use crate::processor::Instruction;

/// Errors raised before execution starts, while a program is loaded
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("couldn't find file `{}`", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}", ParseErrors(.0))]
    Parse(Vec<ParseError>),
}

struct ParseErrors<'a>(&'a [ParseError]);

impl fmt::Display for ParseErrors<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse program ({} errors)", self.0.len())?;
        for err in self.0 {
            write!(f, "\n  {}", err)?;
        }
        Ok(())
    }
}

/// Errors raised while a program executes. Any of them halts the processor.
#[derive(Debug, Error)]
pub enum Fault {
    #[error("unknown instruction 0x{opcode:02X} (0b{opcode:08b}) at address 0x{pc:02X}")]
    UnknownInstruction { opcode: Byte, pc: Address },
    #[error("invalid register R{register} at address 0x{pc:02X}")]
    InvalidRegister { register: Byte, pc: Address },
    #[error("unsupported ALU operation {instruction} at address 0x{pc:02X}")]
    UnsupportedAluOperation { instruction: Instruction, pc: Address },
    #[error("stack overflow at address 0x{pc:02X}")]
    StackOverflow { pc: Address },
    #[error("stack underflow at address 0x{pc:02X} (SP = 0x{sp:02X})")]
    StackUnderflow { pc: Address, sp: Byte },
    #[error("program counter ran past the end of memory at address 0x{pc:02X}")]
    ProgramCounterOverflow { pc: Address },
    #[error("processor is halted")]
    Halted,
    #[error("failed to write output")]
    Output(#[from] io::Error),
}
