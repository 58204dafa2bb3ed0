use std::io::Write;

use crate::error::Fault;
use crate::memory::{Address, Byte, Memory};
use log::*;

mod alu;
mod instruction;
mod stack;

pub use alu::Flags;
pub use instruction::Instruction;

/// Number of registers in the register file
pub const REGISTER_COUNT: usize = 8;
/// Register reserved for the stack pointer
pub const SP: usize = 7;
/// Initial value of the stack pointer. The stack grows down from here.
pub const STACK_BASE: Byte = 0xF4;

/// Lifecycle of a processor. Halted is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Idle,
    Running,
    Halted,
}

/// Emulates the LS-8 CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Processor {
    /// Program counter
    pub pc: Address,
    /// General purpose registers. R7 doubles as the stack pointer.
    pub reg: [Byte; REGISTER_COUNT],
    /// Condition flags, written by CMP
    pub fl: Flags,
    state: State,
}

impl Default for Processor {
    /// Initializes a new CPU
    fn default() -> Self {
        Self::new()
    }
}

impl Processor {
    /// Initializes a new CPU with the program counter at address 0
    pub fn new() -> Self {
        let mut reg = [0; REGISTER_COUNT];
        reg[SP] = STACK_BASE;

        Self {
            pc: 0,
            reg,
            fl: Flags::default(),
            state: State::Idle,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Whether the fetch-decode-execute loop should keep going
    pub fn is_running(&self) -> bool {
        self.state == State::Running
    }

    /// Reads the operand `n` bytes after the current opcode
    fn operand(&self, memory: &Memory, n: Byte) -> Result<Byte, Fault> {
        let address = self
            .pc
            .checked_add(n)
            .ok_or(Fault::ProgramCounterOverflow { pc: self.pc })?;
        Ok(memory.read_byte(address))
    }

    /// Reads operand `n` as a register index
    fn register(&self, memory: &Memory, n: Byte) -> Result<usize, Fault> {
        let register = self.operand(memory, n)?;
        if register as usize >= REGISTER_COUNT {
            return Err(Fault::InvalidRegister {
                register,
                pc: self.pc,
            });
        }

        Ok(register as usize)
    }

    /// Moves the program counter past `instruction` and its operands
    fn advance(&mut self, instruction: Instruction) -> Result<(), Fault> {
        self.pc = self
            .pc
            .checked_add(instruction.size())
            .ok_or(Fault::ProgramCounterOverflow { pc: self.pc })?;
        Ok(())
    }

    /// Executes a single, already decoded instruction. Every arm is
    /// responsible for moving the program counter.
    pub fn execute_instruction<W: Write>(
        &mut self,
        instruction: Instruction,
        memory: &mut Memory,
        out: &mut W,
    ) -> Result<(), Fault> {
        match instruction {
            Instruction::HLT => {
                self.state = State::Halted;

                debug!("HLT");
            }
            Instruction::LDI => {
                let r = self.register(memory, 1)?;
                let value = self.operand(memory, 2)?;
                self.reg[r] = value;
                self.advance(instruction)?;

                debug!("LDI R{} {}", r, value);
            }
            Instruction::PRN => {
                let r = self.register(memory, 1)?;
                writeln!(out, "{}", self.reg[r])?;
                self.advance(instruction)?;

                debug!("PRN R{}: {}", r, self.reg[r]);
            }
            Instruction::ADD | Instruction::MUL | Instruction::CMP => {
                let a = self.register(memory, 1)?;
                let b = self.register(memory, 2)?;
                self.alu(instruction, a, b)?;
                self.advance(instruction)?;

                debug!("{} R{} R{}", instruction, a, b);
            }
            Instruction::PUSH => {
                let r = self.register(memory, 1)?;
                self.push(memory, self.reg[r])?;
                self.advance(instruction)?;

                debug!("PUSH R{}", r);
            }
            Instruction::POP => {
                let r = self.register(memory, 1)?;
                self.reg[r] = self.pop(memory)?;
                self.advance(instruction)?;

                debug!("POP R{}", r);
            }
            Instruction::CALL => {
                let r = self.register(memory, 1)?;
                let target = self.reg[r];
                let ret = self
                    .pc
                    .checked_add(instruction.size())
                    .ok_or(Fault::ProgramCounterOverflow { pc: self.pc })?;
                self.push(memory, ret)?;
                self.pc = target;

                debug!("CALL R{}: 0x{:02X}", r, target);
            }
            Instruction::RET => {
                self.pc = self.pop(memory)?;

                debug!("RET 0x{:02X}", self.pc);
            }
            Instruction::JMP => {
                let r = self.register(memory, 1)?;
                self.pc = self.reg[r];

                debug!("JMP R{}: 0x{:02X}", r, self.pc);
            }
            Instruction::JEQ | Instruction::JNE => {
                let r = self.register(memory, 1)?;
                let jump = match instruction {
                    Instruction::JEQ => self.fl.equal,
                    _ => !self.fl.equal,
                };

                if jump {
                    self.pc = self.reg[r];
                } else {
                    self.advance(instruction)?;
                }

                debug!("{} R{}: {}", instruction, r, jump);
            }
        }

        Ok(())
    }

    /// Fetches and decodes the instruction at the program counter
    fn fetch(&self, memory: &Memory) -> Result<Instruction, Fault> {
        let opcode = memory.read_byte(self.pc);
        Instruction::try_from(opcode).map_err(|_| Fault::UnknownInstruction {
            opcode,
            pc: self.pc,
        })
    }

    /// Runs one execution step. A fault halts the processor.
    pub fn step<W: Write>(&mut self, memory: &mut Memory, out: &mut W) -> Result<(), Fault> {
        match self.state {
            State::Halted => return Err(Fault::Halted),
            State::Idle => self.state = State::Running,
            State::Running => {}
        }

        trace!("{}", self.trace(memory));

        let result = self
            .fetch(memory)
            .and_then(|instruction| self.execute_instruction(instruction, memory, out));

        if let Err(err) = &result {
            error!("{}", err);
            self.state = State::Halted;
        }

        result
    }

    /// Run program until a halt instruction or a fault is met
    pub fn run<W: Write>(&mut self, memory: &mut Memory, out: &mut W) -> Result<(), Fault> {
        if self.state == State::Halted {
            return Err(Fault::Halted);
        }
        self.state = State::Running;

        while self.is_running() {
            self.step(memory, out)?;
        }

        info!("Program halted at 0x{:02X}", self.pc);

        Ok(())
    }

    /// Renders the CPU state as a single line
    pub fn trace(&self, memory: &Memory) -> String {
        let mut line = format!(
            "TRACE: {:02X} {:02X} | {:02X} {:02X} {:02X} |",
            self.pc,
            self.fl.bits(),
            memory.read_byte(self.pc),
            memory.read_byte(self.pc.wrapping_add(1)),
            memory.read_byte(self.pc.wrapping_add(2)),
        );

        for value in &self.reg {
            line.push_str(&format!(" {:02X}", value));
        }

        line
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::write_instructions;
    use color_eyre::eyre::Result;

    use crate::processor::Instruction::*;

    fn run(mem: &mut Memory) -> Result<(Processor, String)> {
        let mut cpu = Processor::new();
        let mut out: Vec<u8> = Vec::new();
        cpu.run(mem, &mut out)?;

        Ok((cpu, String::from_utf8(out)?))
    }

    #[test]
    fn test_initial_state() -> Result<()> {
        let cpu = Processor::new();

        assert_eq!(cpu.pc, 0);
        assert_eq!(cpu.reg, [0, 0, 0, 0, 0, 0, 0, 0xF4]);
        assert_eq!(cpu.fl, Flags::default());
        assert_eq!(cpu.state(), State::Idle);
        assert!(!cpu.is_running());

        Ok(())
    }

    #[test]
    fn test_halt() -> Result<()> {
        let mut mem = Memory::default();
        write_instructions!(mem : 0 => HLT);

        let (cpu, out) = run(&mut mem)?;

        assert_eq!(cpu.state(), State::Halted);
        assert!(!cpu.is_running());
        assert_eq!(cpu.pc, 0);
        assert_eq!(out, "");

        Ok(())
    }

    #[test]
    fn test_load_immediate_and_print() -> Result<()> {
        let mut mem = Memory::default();
        write_instructions!(mem : 0 => LDI, 0, 8, PRN, 0, HLT);

        let (cpu, out) = run(&mut mem)?;

        assert_eq!(out, "8\n");
        assert_eq!(cpu.reg[0], 8);
        assert_eq!(cpu.pc, 5);

        Ok(())
    }

    #[test]
    fn test_step_advances_by_instruction_size() -> Result<()> {
        let mut mem = Memory::default();
        write_instructions!(mem : 0 => LDI, 1, 2, LDI, 2, 3, ADD, 1, 2, PRN, 1, HLT);
        let mut cpu = Processor::new();
        let mut out: Vec<u8> = Vec::new();

        let mut pcs = Vec::new();
        while cpu.is_running() || cpu.state() == State::Idle {
            cpu.step(&mut mem, &mut out)?;
            pcs.push(cpu.pc);
        }

        assert_eq!(pcs, [3, 6, 9, 11, 11]);
        assert_eq!(out, b"5\n");

        Ok(())
    }

    #[test]
    fn test_unknown_instruction() -> Result<()> {
        let mut mem = Memory::default();
        write_instructions!(mem : 0 => LDI, 0, 1, 0xFF);
        let mut cpu = Processor::new();

        let err = cpu.run(&mut mem, &mut io::sink()).unwrap_err();

        assert!(matches!(
            err,
            Fault::UnknownInstruction {
                opcode: 0xFF,
                pc: 3
            }
        ));
        assert_eq!(cpu.state(), State::Halted);

        Ok(())
    }

    #[test]
    fn test_halted_is_terminal() -> Result<()> {
        let mut mem = Memory::default();
        write_instructions!(mem : 0 => HLT);
        let mut cpu = Processor::new();
        cpu.run(&mut mem, &mut io::sink())?;

        assert!(matches!(cpu.run(&mut mem, &mut io::sink()), Err(Fault::Halted)));
        assert!(matches!(cpu.step(&mut mem, &mut io::sink()), Err(Fault::Halted)));

        Ok(())
    }

    #[test]
    fn test_operands_past_end_of_memory() -> Result<()> {
        let mut mem = Memory::default();
        write_instructions!(mem : 0 => LDI, 0, 0xFE, JMP, 0);
        mem.write_byte(0xFE, LDI as Byte);
        mem.write_byte(0xFF, 0);

        let mut cpu = Processor::new();
        let err = cpu.run(&mut mem, &mut io::sink()).unwrap_err();

        assert!(matches!(err, Fault::ProgramCounterOverflow { pc: 0xFE }));

        Ok(())
    }

    #[test]
    fn test_jump() -> Result<()> {
        let mut mem = Memory::default();
        write_instructions!(mem : 0 => LDI, 0, 7, JMP, 0, PRN, 0, PRN, 0, HLT);

        let (_, out) = run(&mut mem)?;

        assert_eq!(out, "7\n");

        Ok(())
    }

    #[test]
    fn test_conditional_jumps() -> Result<()> {
        // R2 points at the PRN at address 19
        let mut mem = Memory::default();
        write_instructions!(mem : 0 =>
            LDI, 0, 5,
            LDI, 1, 5,
            LDI, 2, 19,
            CMP, 0, 1,
            JNE, 2,
            JEQ, 2,
            HLT,
            HLT,
            HLT,
            PRN, 0,
            HLT
        );

        let (cpu, out) = run(&mut mem)?;

        assert_eq!(out, "5\n");
        assert_eq!(cpu.pc, 21);

        Ok(())
    }

    #[test]
    fn test_jne_without_equal_flag() -> Result<()> {
        let mut mem = Memory::default();
        write_instructions!(mem : 0 =>
            LDI, 0, 3,
            LDI, 1, 5,
            LDI, 2, 17,
            CMP, 0, 1,
            JEQ, 2,
            JNE, 2,
            HLT,
            PRN, 1,
            HLT
        );

        let (cpu, out) = run(&mut mem)?;

        assert_eq!(out, "5\n");
        assert!(cpu.fl.greater);

        Ok(())
    }

    #[test]
    fn test_trace() -> Result<()> {
        let mut mem = Memory::default();
        write_instructions!(mem : 0 => LDI, 0, 8, PRN, 0, HLT);
        let mut cpu = Processor::new();
        cpu.reg[1] = 0xAB;

        assert_eq!(
            cpu.trace(&mem),
            "TRACE: 00 00 | 82 00 08 | 00 AB 00 00 00 00 00 F4"
        );

        cpu.fl.greater = true;
        assert!(cpu.trace(&mem).starts_with("TRACE: 00 02 |"));

        Ok(())
    }

    #[test]
    fn test_invalid_register() -> Result<()> {
        let mut mem = Memory::default();
        write_instructions!(mem : 0 => LDI, 9, 42, PRN, 1, HLT);
        let mut cpu = Processor::new();
        let mut out: Vec<u8> = Vec::new();

        let err = cpu.run(&mut mem, &mut out).unwrap_err();

        assert!(matches!(
            err,
            Fault::InvalidRegister {
                register: 9,
                pc: 0
            }
        ));
        assert_eq!(cpu.reg[1], 0);
        assert!(out.is_empty());
        assert_eq!(cpu.state(), State::Halted);

        Ok(())
    }

    #[test]
    fn test_invalid_second_register() -> Result<()> {
        let mut mem = Memory::default();
        write_instructions!(mem : 0 => LDI, 0, 2, MUL, 0, 8, HLT);
        let mut cpu = Processor::new();

        let err = cpu.run(&mut mem, &mut io::sink()).unwrap_err();

        assert!(matches!(
            err,
            Fault::InvalidRegister {
                register: 8,
                pc: 3
            }
        ));
        assert_eq!(cpu.reg[0], 2);

        Ok(())
    }

    #[test]
    fn test_advance_past_end_of_memory() -> Result<()> {
        let mut mem = Memory::default();
        write_instructions!(mem : 0 => LDI, 1, 0xFE, JMP, 1);
        write_instructions!(mem : 0xFE => PRN, 0);
        let mut cpu = Processor::new();
        let mut out: Vec<u8> = Vec::new();

        let err = cpu.run(&mut mem, &mut out).unwrap_err();

        assert!(matches!(err, Fault::ProgramCounterOverflow { pc: 0xFE }));
        assert_eq!(cpu.pc, 0xFE);
        assert_eq!(out, b"0\n");

        Ok(())
    }

    #[test]
    fn test_call_return_address_past_end_of_memory() -> Result<()> {
        let mut mem = Memory::default();
        write_instructions!(mem : 0 => LDI, 1, 0xFE, JMP, 1);
        write_instructions!(mem : 0xFE => CALL, 1);
        let mut cpu = Processor::new();

        let err = cpu.run(&mut mem, &mut io::sink()).unwrap_err();

        assert!(matches!(err, Fault::ProgramCounterOverflow { pc: 0xFE }));
        assert_eq!(cpu.reg[SP], STACK_BASE);

        Ok(())
    }
}
