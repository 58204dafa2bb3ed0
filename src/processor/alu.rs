use crate::error::Fault;
use crate::memory::Byte;

use super::{Instruction, Processor};

/// The condition flags written by CMP.
///
/// The flags describe register B relative to register A: `greater` means
/// B is greater than A and `less` means B is less than A. A comparison only
/// ever sets a flag; flags raised by an earlier comparison stay raised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags {
    pub equal: bool,
    pub less: bool,
    pub greater: bool,
}

impl Flags {
    /// Packs the flags into the `00000LGE` layout of the FL register
    pub fn bits(&self) -> Byte {
        (self.less as Byte) << 2 | (self.greater as Byte) << 1 | self.equal as Byte
    }
}

impl Processor {
    /// Applies an ALU operation to registers `a` and `b`. Arithmetic wraps
    /// at 8 bits and stores its result in `a`.
    pub fn alu(&mut self, op: Instruction, a: usize, b: usize) -> Result<(), Fault> {
        match op {
            Instruction::ADD => {
                self.reg[a] = self.reg[a].wrapping_add(self.reg[b]);
            }
            Instruction::MUL => {
                self.reg[a] = self.reg[a].wrapping_mul(self.reg[b]);
            }
            Instruction::CMP => {
                let (x, y) = (self.reg[a], self.reg[b]);
                if x == y {
                    self.fl.equal = true;
                } else if x < y {
                    self.fl.greater = true;
                } else {
                    self.fl.less = true;
                }
            }
            _ => {
                return Err(Fault::UnsupportedAluOperation {
                    instruction: op,
                    pc: self.pc,
                })
            }
        }

        Ok(())
    }
}
