use std::convert::TryFrom;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::Display as StrumDisplay;

/// Storage for one memory cell. Narrower widths are emulated with `CellWidth::mask`.
pub type Cell = u32;

/// Width of every memory cell in bits, fixed for the whole run.
#[derive(
  StrumDisplay, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,             Eq, PartialEq, Debug, Hash
)]
#[repr(u8)]
pub enum CellWidth {
  #[strum(serialize = "8 bit")]
  Eight     = 8,
  #[strum(serialize = "16 bit")]
  Sixteen   = 16,
  #[strum(serialize = "32 bit")]
  ThirtyTwo = 32,
}

impl Default for CellWidth {
  fn default() -> CellWidth {
    CellWidth::Eight
  }
}

impl CellWidth {
  pub fn bits(&self) -> u8 {
    Into::<u8>::into(*self)
  }

  /// `(1 << bits) - 1`, computed wide enough that 32 bit cells do not overflow the shift.
  pub fn mask(&self) -> Cell {
    ((1u64 << self.bits() as u64) - 1) as Cell
  }

  pub fn from_bits(bits: u8) -> Option<CellWidth> {
    CellWidth::try_from(bits).ok()
  }
}
