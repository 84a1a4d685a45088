/*!
  Encoding of a program into a logisim-evolution ROM image.

  The image is a header line followed by one octal digit per instruction. Around the program
  the encoder places a prologue and an epilogue that the hardware needs:

    prologue: `><`      The CPU may not address memory correctly before its first moves.
    epilogue: `[-]+[]`  Clears the current cell, sets it to one, and spins forever.

*/

use std::fmt::{Display, Formatter};

use super::instruction::{Digit, Instruction};

pub const ROM_HEADER: &str = "v3.0 hex words plain";
pub const PROLOGUE: &[u8] = b"><";
pub const EPILOGUE: &[u8] = b"[-]+[]";
/// Logisim wants the words split into lines; we start a new line every 16 tokens.
pub const TOKENS_PER_LINE: usize = 16;

/// Total size of the virtual instruction space written to a ROM, counting inert characters.
pub fn rom_instruction_count(source: &[u8]) -> usize {
  PROLOGUE.len() + source.len() + EPILOGUE.len()
}

/// Gets the `n`th character to be written to a ROM, which is either part of the prologue, the
/// source itself, or part of the epilogue.
pub fn nth_rom_character(source: &[u8], n: usize) -> u8 {
  if n < PROLOGUE.len() {
    PROLOGUE[n]
  } else if n < PROLOGUE.len() + source.len() {
    source[n - PROLOGUE.len()]
  } else {
    EPILOGUE[n - PROLOGUE.len() - source.len()]
  }
}

/**
  The contents of a ROM: prologue, program, and epilogue instructions in order. Inert
  characters of the source never make it into an image.

  The `Display` impl renders the logisim text format, so writing an image is just
  `print!("{}", image)`.
*/
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RomImage {
  instructions: Vec<Instruction>
}

impl RomImage {

  pub fn new(instructions: Vec<Instruction>) -> RomImage {
    RomImage{ instructions }
  }

  /// Encodes `source`. Never fails; unknown characters are simply left out.
  pub fn encode(source: &[u8]) -> RomImage {
    let instructions =
      (0..rom_instruction_count(source))
        .filter_map(|n| Instruction::from_source(nth_rom_character(source, n)))
        .collect();
    RomImage{ instructions }
  }

  pub fn instructions(&self) -> &[Instruction] {
    &self.instructions
  }

  pub fn digits(&self) -> Vec<Digit> {
    self.instructions.iter().map(Instruction::digit).collect()
  }

  pub fn len(&self) -> usize {
    self.instructions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.instructions.is_empty()
  }

  /**
    The program between the prologue and the epilogue. Returns `None` if the image does not
    begin with the prologue and end with the epilogue, i.e. it was not produced by `encode`.
  */
  pub fn program(&self) -> Option<&[Instruction]> {
    let prologue = padding(PROLOGUE);
    let epilogue = padding(EPILOGUE);

    if self.instructions.len() < prologue.len() + epilogue.len()
      || !self.instructions.starts_with(&prologue)
      || !self.instructions.ends_with(&epilogue) {
      return None;
    }
    Some(&self.instructions[prologue.len()..self.instructions.len() - epilogue.len()])
  }

  /// Renders the program back as source text. Comments in the original source are lost.
  pub fn program_source(&self) -> Option<String> {
    self.program()
        .map(|program| program.iter().map(Instruction::source_char).collect())
  }

  /// Renders every instruction of the image as source text, padding included.
  pub fn source(&self) -> String {
    self.instructions.iter().map(Instruction::source_char).collect()
  }
}

fn padding(characters: &[u8]) -> Vec<Instruction> {
  characters.iter().filter_map(|c| Instruction::from_source(*c)).collect()
}

impl Display for RomImage {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    writeln!(f, "{}", ROM_HEADER)?;
    for (count, instruction) in self.instructions.iter().enumerate() {
      let separator =
        match (count + 1) % TOKENS_PER_LINE {
          0 => '\n',
          _ => ' '
        };
      write!(f, "{}{}", instruction.digit(), separator)?;
    }
    Ok(())
  }
}
