//! The data pointer, an index into the machine's memory that wraps around at both ends instead
//! of running off the tape.

use std::ops::{Add, Sub};
use std::fmt::{Display, Formatter};

/// Number of cells in the machine's memory.
pub const MEMORY_SIZE: usize = 0x10000;

#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Default)]
pub struct DataPointer(usize);

impl DataPointer {
  /// Reduces `idx` modulo the memory size.
  pub fn new(idx: usize) -> DataPointer {
    DataPointer(idx % MEMORY_SIZE)
  }

  /// Converts the pointer to an index into memory. Always less than `MEMORY_SIZE`.
  pub fn idx(&self) -> usize {
    self.0
  }
}

impl Display for DataPointer {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "M[{}]", self.0)
  }
}

// Move right
impl Add<usize> for DataPointer {
  type Output = DataPointer;
  fn add(self, rhs: usize) -> DataPointer {
    DataPointer::new(self.0 + rhs % MEMORY_SIZE)
  }
}

// Move left
impl Sub<usize> for DataPointer {
  type Output = DataPointer;
  fn sub(self, rhs: usize) -> DataPointer {
    DataPointer::new(self.0 + MEMORY_SIZE - rhs % MEMORY_SIZE)
  }
}
