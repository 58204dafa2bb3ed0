use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::memory::Byte;

macro_rules! instructions {
    ( $( $( #[doc = $doc:expr] )+ $name:ident = $repr:literal , )+ ) => {
        /// The LS-8 instruction set. The two highest bits of an opcode hold
        /// the number of operand bytes that follow it.
        #[repr(u8)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[derive(TryFromPrimitive, IntoPrimitive)]
        pub enum Instruction {
            $(
                $( #[doc = $doc] )+
                $name = $repr,
            )+
        }

        impl Instruction {
            pub const ALL: &'static [Self] = &[
                $( Self::$name , )+
            ];

            pub fn name(&self) -> &'static str {
                match self {
                    $( Self::$name => stringify!($name) , )+
                }
            }
        }

        impl ::std::fmt::Display for Instruction {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $( Self::$name => f.write_str(stringify!($name)) , )+
                }
            }
        }
    }
}

instructions! {
    /// Stop the execution of the program
    HLT = 0b0000_0001,
    /// Return from a subroutine to the address on top of the stack
    RET = 0b0001_0001,
    /// Push a register onto the stack
    /// @param reg The register to push
    PUSH = 0b0100_0101,
    /// Pop the top of the stack into a register
    /// @param reg The destination register
    POP = 0b0100_0110,
    /// Print the decimal value of a register
    /// @param reg The register to print
    PRN = 0b0100_0111,
    /// Call the subroutine whose address is held in a register
    /// @param reg The register holding the address
    CALL = 0b0101_0000,
    /// Jump to the address held in a register
    /// @param reg The register holding the address
    JMP = 0b0101_0100,
    /// Jump if the equal flag is set
    /// @param reg The register holding the address
    JEQ = 0b0101_0101,
    /// Jump if the equal flag is clear
    /// @param reg The register holding the address
    JNE = 0b0101_0110,
    /// Load an immediate value into a register
    /// @param reg The destination register
    /// @param value The value to load
    LDI = 0b1000_0010,
    /// Add two registers and store the result in the first
    /// @param reg_a The first operand and destination
    /// @param reg_b The second operand
    ADD = 0b1010_0000,
    /// Multiply two registers and store the result in the first
    /// @param reg_a The first operand and destination
    /// @param reg_b The second operand
    MUL = 0b1010_0010,
    /// Compare two registers and set the matching flag
    /// @param reg_a The first operand
    /// @param reg_b The second operand
    CMP = 0b1010_0111,
}

impl Instruction {
    /// Number of operand bytes following the opcode
    pub fn operands(self) -> Byte {
        Byte::from(self) >> 6
    }

    /// Total length of the instruction in bytes, opcode included
    pub fn size(self) -> Byte {
        1 + self.operands()
    }
}
