pub mod parse;

pub type Byte = u8; // 1 byte
pub type Address = u8; // memory is addressed with a single byte

/// Number of addressable cells
pub const MEMORY_SIZE: usize = 256;

/// Emulates the 256 byte RAM of the LS-8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Memory {
    /// The actual data of the memory
    pub data: [Byte; MEMORY_SIZE],
}

impl Default for Memory {
    /// Initializes the memory
    fn default() -> Self {
        Memory {
            data: [0; MEMORY_SIZE],
        }
    }
}

impl Memory {
    /// Reads a byte from the memory
    pub fn read_byte(&self, position: Address) -> Byte {
        self.data[position as usize]
    }

    /// Writes a byte to the memory
    pub fn write_byte(&mut self, position: Address, value: Byte) {
        self.data[position as usize] = value;
    }

    /// Writes an array of bytes to the memory
    ///
    /// # Panics
    ///
    /// Panics if `data` does not fit between `position` and the end of memory.
    pub fn write_array(&mut self, position: Address, data: &[Byte]) {
        let start = position as usize;
        self.data[start..start + data.len()].copy_from_slice(data);
    }

    /// Logs every non-empty 16 byte row of the memory
    pub fn dump(&self) {
        for (row, chunk) in self.data.chunks(16).enumerate() {
            if chunk.iter().all(|&byte| byte == 0) {
                continue;
            }

            let bytes = chunk
                .iter()
                .map(|byte| format!("{:02X}", byte))
                .collect::<Vec<_>>()
                .join(" ");
            log::info!("{:02X}: {}", row * 16, bytes);
        }
    }
}

/// Writes a block of instructions directly into the memory
#[macro_export]
macro_rules! write_instructions {
    ( $mem:ident : $pos:expr => $( $byte:expr ),+ $(,)? ) => {
        $mem.write_array($pos, &[
            $(
                $byte as $crate::memory::Byte,
            )+
        ]);
    };
}
