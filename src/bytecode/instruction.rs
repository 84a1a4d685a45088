use std::convert::TryFrom;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display as StrumDisplay, EnumIter, IntoStaticStr};

/// A single octal digit of ROM output. Always in `0..8`.
pub type Digit = u8;

/**
  Instructions of the tape machine.

  The discriminant of each variant is its octal digit in the ROM, so the order the variants are
  listed below is significant. The hardware decodes the digits in exactly this order.
  Order-dependencies:
      ```
      Instruction::digit()
      Instruction::from_digit()
      rom::EPILOGUE
      ```
*/
#[derive(
  StrumDisplay, IntoStaticStr, EnumIter, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,       PartialEq,        Debug,          Hash
)]
#[repr(u8)]
pub enum Instruction {
  MoveRight,  // >
  MoveLeft,   // <
  Increment,  // +
  Decrement,  // -
  Output,     // .
  Input,      // ,
  LoopOpen,   // [
  LoopClose,  // ]
}

impl Instruction {
  /// Maps a source character to its instruction. Comments, whitespace, and anything else that
  /// is not one of the eight characters map to `None`.
  pub fn from_source(c: u8) -> Option<Instruction> {
    match c {
      b'>' => Some(Instruction::MoveRight),
      b'<' => Some(Instruction::MoveLeft),
      b'+' => Some(Instruction::Increment),
      b'-' => Some(Instruction::Decrement),
      b'.' => Some(Instruction::Output),
      b',' => Some(Instruction::Input),
      b'[' => Some(Instruction::LoopOpen),
      b']' => Some(Instruction::LoopClose),
      _    => None
    }
  }

  /// The source character denoting this instruction.
  pub fn source_char(&self) -> char {
    match self {
      Instruction::MoveRight => '>',
      Instruction::MoveLeft  => '<',
      Instruction::Increment => '+',
      Instruction::Decrement => '-',
      Instruction::Output    => '.',
      Instruction::Input     => ',',
      Instruction::LoopOpen  => '[',
      Instruction::LoopClose => ']',
    }
  }

  /// The octal digit encoding this instruction in a ROM.
  pub fn digit(&self) -> Digit {
    Into::<u8>::into(*self)
  }

  pub fn from_digit(digit: Digit) -> Option<Instruction> {
    Instruction::try_from(digit).ok()
  }
}

/// Maps a source character straight to its ROM digit.
pub fn source_digit(c: u8) -> Option<Digit> {
  Instruction::from_source(c).map(|instruction| instruction.digit())
}

/// Counts the characters of `source` that denote instructions.
pub fn instruction_count(source: &[u8]) -> usize {
  source.iter().filter(|c| Instruction::from_source(**c).is_some()).count()
}


#[cfg(test)]
mod tests {
  use super::*;
  use strum::IntoEnumIterator;

  #[test]
  fn digits_follow_declaration_order(){
    let digits: Vec<Digit> = Instruction::iter().map(|i| i.digit()).collect();
    assert_eq!(digits, vec![0, 1, 2, 3, 4, 5, 6, 7]);
  }

  #[test]
  fn source_characters(){
    let source: String = Instruction::iter().map(|i| i.source_char()).collect();
    assert_eq!(source, "><+-.,[]");
    for c in source.bytes() {
      assert_eq!(Instruction::from_source(c).map(|i| i.source_char()), Some(c as char));
    }
  }

  #[test]
  fn inert_characters(){
    for c in b"abc XYZ\t\n#!0123456789{}()".iter() {
      assert_eq!(Instruction::from_source(*c), None);
      assert_eq!(source_digit(*c), None);
    }
  }

  #[test]
  fn digit_inverse(){
    for instruction in Instruction::iter() {
      assert_eq!(Instruction::from_digit(instruction.digit()), Some(instruction));
    }
    assert_eq!(Instruction::from_digit(8), None);
    assert_eq!(Instruction::from_digit(255), None);
  }

  #[test]
  fn count_ignores_comments(){
    assert_eq!(instruction_count(b"++ add two\n[->+<] move it"), 8);
    assert_eq!(instruction_count(b""), 0);
    assert_eq!(instruction_count(b"no instructions here"), 0);
  }

  #[test]
  fn names(){
    assert_eq!(Instruction::LoopOpen.to_string(), "LoopOpen");
    let name: &'static str = Instruction::Output.into();
    assert_eq!(name, "Output");
  }

}
