//! Machine sizing.

/// Default number of code cells.
pub const DEFAULT_CODE_SIZE: usize = 10_000;

/// Default number of memory cells shared by stack and heap.
pub const DEFAULT_MEMORY_SIZE: usize = 10_000;

/// Sizes of the code store and of the data memory.
///
/// The stack starts at `memory_size` and grows down; the heap starts at
/// `0` and grows up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineConfig {
    pub code_size: usize,
    pub memory_size: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            code_size: DEFAULT_CODE_SIZE,
            memory_size: DEFAULT_MEMORY_SIZE,
        }
    }
}

impl MachineConfig {
    pub fn with_code_size(mut self, code_size: usize) -> Self {
        self.code_size = code_size;
        self
    }

    pub fn with_memory_size(mut self, memory_size: usize) -> Self {
        self.memory_size = memory_size;
        self
    }
}
