use crate::error::Fault;
use crate::memory::{Byte, Memory};

use super::{Processor, SP};

impl Processor {
    /// Decrements SP, then stores `value` at the new top of the stack
    pub fn push(&mut self, memory: &mut Memory, value: Byte) -> Result<(), Fault> {
        let sp = self.reg[SP]
            .checked_sub(1)
            .ok_or(Fault::StackOverflow { pc: self.pc })?;

        self.reg[SP] = sp;
        memory.write_byte(sp, value);
        Ok(())
    }

    /// Reads the top of the stack, then increments SP
    pub fn pop(&mut self, memory: &Memory) -> Result<Byte, Fault> {
        let sp = self.reg[SP];
        let next = sp
            .checked_add(1)
            .ok_or(Fault::StackUnderflow { pc: self.pc, sp })?;

        let value = memory.read_byte(sp);
        self.reg[SP] = next;
        Ok(value)
    }
}
